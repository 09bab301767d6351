//! Catalog service (books)

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::book::{Book, BookDetails, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books as seen by `viewer` (favorite flags depend on it)
    pub async fn search_books(
        &self,
        query: &BookQuery,
        viewer: Option<Uuid>,
    ) -> AppResult<(Vec<BookDetails>, i64)> {
        query.validate()?;
        self.repository.books.search(query, viewer).await
    }

    pub async fn get_book(&self, id: Uuid, viewer: Option<Uuid>) -> AppResult<BookDetails> {
        self.repository.books.get_details(id, viewer).await
    }

    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;
        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = %created.id, "Book created");
        Ok(created)
    }

    pub async fn update_book(&self, id: Uuid, book: UpdateBook) -> AppResult<Book> {
        book.validate()?;
        self.repository.books.update(id, &book).await
    }

    pub async fn delete_book(&self, id: Uuid) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = %id, "Book deleted");
        Ok(())
    }
}
