//! Catalog queries against a real database

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use bookshelf_server::{
    error::AppError,
    models::{book::CreateBook, BookQuery, BookSort, BookStatus},
    repository::{LifecycleStore, PgLifecycleStore, Repository},
};

async fn insert_user(pool: &PgPool, email: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email, name, role) VALUES ($1, $2, 'Reader', 'user')")
        .bind(id)
        .bind(email)
        .execute(pool)
        .await
        .unwrap();
    id
}

/// Insert a book created `age_days` ago so orderings are deterministic
async fn insert_aged_book(repo: &Repository, category_id: Uuid, title: &str, age_days: i64) -> Uuid {
    let book = repo
        .books
        .create(&CreateBook {
            title: title.to_string(),
            author: "Some Author".to_string(),
            publisher: "Some Publisher".to_string(),
            year: 2001,
            description: "A book description".to_string(),
            category_id,
            image: None,
        })
        .await
        .unwrap();

    sqlx::query("UPDATE books SET created_at = $2 WHERE id = $1")
        .bind(book.id)
        .bind(Utc::now() - Duration::days(age_days))
        .execute(&repo.pool)
        .await
        .unwrap();
    book.id
}

fn titles(books: &[bookshelf_server::models::BookDetails]) -> Vec<&str> {
    books.iter().map(|details| details.book.title.as_str()).collect()
}

fn sorted(sort_by: BookSort) -> BookQuery {
    BookQuery {
        sort_by: Some(sort_by),
        ..Default::default()
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn search_reports_favorites_and_holder(pool: PgPool) {
    let repo = Repository::new(pool.clone());
    let store = PgLifecycleStore::new(pool.clone());
    let category = repo.categories.create("Fiction").await.unwrap();
    let reader = insert_user(&pool, "a@example.org").await;
    let other = insert_user(&pool, "b@example.org").await;
    let dune = insert_aged_book(&repo, category.id, "Dune", 1).await;

    repo.favorites.add(reader, dune).await.unwrap();
    repo.favorites.add(other, dune).await.unwrap();
    store.reserve(dune, reader, Utc::now()).await.unwrap();

    let (books, total) = repo.books.search(&BookQuery::default(), Some(reader)).await.unwrap();
    assert_eq!(total, 1);
    let details = &books[0];
    assert_eq!(details.book.status, BookStatus::Reserved);
    assert_eq!(details.category_name.as_deref(), Some("Fiction"));
    assert_eq!(details.holder_email.as_deref(), Some("a@example.org"));
    assert_eq!(details.favorite_count, 2);
    assert!(details.is_favorite);

    let anonymous = repo.books.get_details(dune, None).await.unwrap();
    assert_eq!(anonymous.favorite_count, 2);
    assert!(!anonymous.is_favorite);
    assert_eq!(anonymous.holder_email.as_deref(), Some("a@example.org"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn available_book_has_no_holder(pool: PgPool) {
    let repo = Repository::new(pool.clone());
    let category = repo.categories.create("Fiction").await.unwrap();
    let book = insert_aged_book(&repo, category.id, "Emma", 1).await;

    let details = repo.books.get_details(book, Some(Uuid::new_v4())).await.unwrap();

    assert_eq!(details.book.id, book);
    assert_eq!(details.holder_email, None);
    assert_eq!(details.favorite_count, 0);
    assert!(!details.is_favorite);

    let missing = repo.books.get_details(Uuid::new_v4(), None).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn search_orders_by_favorites_and_creation(pool: PgPool) {
    let repo = Repository::new(pool.clone());
    let category = repo.categories.create("Fiction").await.unwrap();
    let oldest = insert_aged_book(&repo, category.id, "Oldest", 30).await;
    let middle = insert_aged_book(&repo, category.id, "Middle", 20).await;
    insert_aged_book(&repo, category.id, "Newest", 10).await;

    for email in ["a@example.org", "b@example.org"] {
        let user = insert_user(&pool, email).await;
        repo.favorites.add(user, middle).await.unwrap();
    }
    let user = insert_user(&pool, "c@example.org").await;
    repo.favorites.add(user, oldest).await.unwrap();

    let (books, _) = repo.books.search(&sorted(BookSort::FavMost), None).await.unwrap();
    assert_eq!(titles(&books), ["Middle", "Oldest", "Newest"]);

    let (books, _) = repo.books.search(&sorted(BookSort::FavLeast), None).await.unwrap();
    assert_eq!(titles(&books), ["Newest", "Oldest", "Middle"]);

    let (books, _) = repo.books.search(&sorted(BookSort::AddedNew), None).await.unwrap();
    assert_eq!(titles(&books), ["Newest", "Middle", "Oldest"]);

    let (books, _) = repo.books.search(&sorted(BookSort::AddedOld), None).await.unwrap();
    assert_eq!(titles(&books), ["Oldest", "Middle", "Newest"]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn search_paginates_and_counts_all_matches(pool: PgPool) {
    let repo = Repository::new(pool.clone());
    let category = repo.categories.create("Fiction").await.unwrap();
    for (age, title) in ["Alpha", "Beta", "Gamma"].into_iter().enumerate() {
        insert_aged_book(&repo, category.id, title, age as i64 + 1).await;
    }

    let query = BookQuery {
        page: Some(2),
        limit: Some(2),
        ..Default::default()
    };
    let (books, total) = repo.books.search(&query, None).await.unwrap();

    assert_eq!(total, 3);
    assert_eq!(titles(&books), ["Gamma"]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn favorite_filter_is_empty_for_anonymous_callers(pool: PgPool) {
    let repo = Repository::new(pool.clone());
    let category = repo.categories.create("Fiction").await.unwrap();
    let reader = insert_user(&pool, "a@example.org").await;
    let dune = insert_aged_book(&repo, category.id, "Dune", 2).await;
    insert_aged_book(&repo, category.id, "Emma", 1).await;
    repo.favorites.add(reader, dune).await.unwrap();

    let query = BookQuery {
        favorite: Some(true),
        ..Default::default()
    };

    let (books, total) = repo.books.search(&query, None).await.unwrap();
    assert_eq!(total, 0);
    assert!(books.is_empty());

    let (books, total) = repo.books.search(&query, Some(reader)).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(titles(&books), ["Dune"]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn referenced_category_cannot_be_deleted(pool: PgPool) {
    let repo = Repository::new(pool.clone());
    let used = repo.categories.create("Fiction").await.unwrap();
    let unused = repo.categories.create("Poetry").await.unwrap();
    insert_aged_book(&repo, used.id, "Dune", 1).await;

    let result = repo.categories.delete(used.id).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    repo.categories.delete(unused.id).await.unwrap();
    let missing = repo.categories.delete(unused.id).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn only_available_books_can_be_deleted(pool: PgPool) {
    let repo = Repository::new(pool.clone());
    let store = PgLifecycleStore::new(pool.clone());
    let category = repo.categories.create("Fiction").await.unwrap();
    let reader = insert_user(&pool, "a@example.org").await;
    let book = insert_aged_book(&repo, category.id, "Dune", 1).await;

    store.reserve(book, reader, Utc::now()).await.unwrap();
    let result = repo.books.delete(book).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert_eq!(repo.books.get_by_id(book).await.unwrap().status, BookStatus::Reserved);

    sqlx::query(
        "UPDATE books SET status = 'available', reserved_by = NULL, reserved_at = NULL WHERE id = $1",
    )
    .bind(book)
    .execute(&pool)
    .await
    .unwrap();

    repo.books.delete(book).await.unwrap();
    let missing = repo.books.get_by_id(book).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}
