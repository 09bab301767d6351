//! Book lifecycle against a real database

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use bookshelf_server::{
    error::{AppError, LifecycleError},
    models::{book::BookStatus, Book},
    repository::{LifecycleStore, PgLifecycleStore},
    services::lifecycle::LifecycleService,
};

async fn insert_user(pool: &PgPool, email: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email, name, role) VALUES ($1, $2, $3, 'user')")
        .bind(id)
        .bind(email)
        .bind(email.split('@').next().unwrap_or(email))
        .execute(pool)
        .await
        .unwrap();
    id
}

async fn insert_book(pool: &PgPool, title: &str) -> Uuid {
    let category: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO categories (name) VALUES ('Fiction')
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query_scalar(
        r#"
        INSERT INTO books (title, author, publisher, year, description, category_id)
        VALUES ($1, 'Some Author', 'Some Publisher', 2001, 'A book description', $2)
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(category)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn fetch_book(pool: &PgPool, id: Uuid) -> Book {
    sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn all_books_consistent(pool: &PgPool) -> bool {
    let books = sqlx::query_as::<_, Book>("SELECT * FROM books")
        .fetch_all(pool)
        .await
        .unwrap();
    books.iter().all(|book| book.check_invariants().is_ok())
}

async fn open_borrowings(pool: &PgPool, user_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM borrowings WHERE user_id = $1 AND returned_at IS NULL")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn days_ago(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn reserve_marks_book_reserved(pool: PgPool) {
    let store = PgLifecycleStore::new(pool.clone());
    let user = insert_user(&pool, "a@example.org").await;
    let book = insert_book(&pool, "Dune").await;

    let reserved = store.reserve(book, user, Utc::now()).await.unwrap();

    assert_eq!(reserved.status, BookStatus::Reserved);
    assert_eq!(reserved.reserved_by, Some(user));
    assert!(reserved.reserved_at.is_some());
    assert!(all_books_consistent(&pool).await);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn reserve_unavailable_book_fails_without_changes(pool: PgPool) {
    let store = PgLifecycleStore::new(pool.clone());
    let a = insert_user(&pool, "a@example.org").await;
    let b = insert_user(&pool, "b@example.org").await;
    let book = insert_book(&pool, "Dune").await;
    store.reserve(book, a, Utc::now()).await.unwrap();
    let before = fetch_book(&pool, book).await;

    let result = store.reserve(book, b, Utc::now()).await;

    assert!(matches!(
        result,
        Err(AppError::Lifecycle(LifecycleError::NotAvailable))
    ));
    let after = fetch_book(&pool, book).await;
    assert_eq!(after.reserved_by, before.reserved_by);
    assert_eq!(after.reserved_at, before.reserved_at);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn reserve_missing_book_is_not_found(pool: PgPool) {
    let store = PgLifecycleStore::new(pool.clone());
    let user = insert_user(&pool, "a@example.org").await;

    let result = store.reserve(Uuid::new_v4(), user, Utc::now()).await;

    assert!(matches!(
        result,
        Err(AppError::Lifecycle(LifecycleError::BookNotFound))
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn open_reservation_blocks_a_second_reservation(pool: PgPool) {
    let store = PgLifecycleStore::new(pool.clone());
    let a = insert_user(&pool, "a@example.org").await;
    let b1 = insert_book(&pool, "Dune").await;
    let b2 = insert_book(&pool, "Hyperion").await;
    store.reserve(b1, a, Utc::now()).await.unwrap();

    let result = store.reserve(b2, a, Utc::now()).await;

    assert!(matches!(
        result,
        Err(AppError::Lifecycle(LifecycleError::AlreadyBorrowing))
    ));
    assert_eq!(fetch_book(&pool, b2).await.status, BookStatus::Available);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn approve_requires_the_reserving_user(pool: PgPool) {
    let store = PgLifecycleStore::new(pool.clone());
    let a = insert_user(&pool, "a@example.org").await;
    let b = insert_user(&pool, "b@example.org").await;
    let book = insert_book(&pool, "Dune").await;

    let result = store.approve(book, a, Utc::now()).await;
    assert!(matches!(
        result,
        Err(AppError::Lifecycle(LifecycleError::NotReserved))
    ));

    store.reserve(book, a, Utc::now()).await.unwrap();
    let result = store.approve(book, b, Utc::now()).await;
    assert!(matches!(
        result,
        Err(AppError::Lifecycle(LifecycleError::ReservedByAnotherUser))
    ));

    assert_eq!(fetch_book(&pool, book).await.reserved_by, Some(a));
    assert_eq!(open_borrowings(&pool, b).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn approve_then_return_restores_availability(pool: PgPool) {
    let store = PgLifecycleStore::new(pool.clone());
    let a = insert_user(&pool, "a@example.org").await;
    let book = insert_book(&pool, "Dune").await;

    store.reserve(book, a, Utc::now()).await.unwrap();
    let (borrowed, borrowing) = store.approve(book, a, Utc::now()).await.unwrap();
    assert_eq!(borrowed.status, BookStatus::Borrowed);
    assert_eq!(borrowed.borrowed_by, Some(a));
    assert_eq!(borrowed.reserved_by, None);
    assert_eq!(borrowed.borrowed_at, Some(borrowing.borrowed_at));
    assert_eq!(open_borrowings(&pool, a).await, 1);

    let (returned, closed) = store.return_book(book, a, Utc::now()).await.unwrap();
    assert_eq!(returned.status, BookStatus::Available);
    assert_eq!(returned.borrowed_by, None);
    assert_eq!(closed.id, borrowing.id);
    assert!(closed.returned_at.is_some());

    let borrowings: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM borrowings WHERE user_id = $1 AND book_id = $2 AND returned_at IS NOT NULL",
    )
    .bind(a)
    .bind(book)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(borrowings, 1);
    assert_eq!(open_borrowings(&pool, a).await, 0);
    assert!(all_books_consistent(&pool).await);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn return_without_open_borrowing_is_not_found(pool: PgPool) {
    let store = PgLifecycleStore::new(pool.clone());
    let a = insert_user(&pool, "a@example.org").await;
    let book = insert_book(&pool, "Dune").await;

    let result = store.return_book(book, a, Utc::now()).await;

    assert!(matches!(
        result,
        Err(AppError::Lifecycle(LifecycleError::NoOpenBorrowing))
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn borrower_cannot_reserve_until_return(pool: PgPool) {
    let store = PgLifecycleStore::new(pool.clone());
    let a = insert_user(&pool, "a@example.org").await;
    let b1 = insert_book(&pool, "Dune").await;
    let c = insert_book(&pool, "Hyperion").await;

    store.reserve(b1, a, Utc::now()).await.unwrap();
    store.approve(b1, a, Utc::now()).await.unwrap();

    let blocked = store.reserve(c, a, Utc::now()).await;
    assert!(matches!(
        blocked,
        Err(AppError::Lifecycle(LifecycleError::AlreadyBorrowing))
    ));

    store.return_book(b1, a, Utc::now()).await.unwrap();
    let reserved = store.reserve(c, a, Utc::now()).await.unwrap();
    assert_eq!(reserved.status, BookStatus::Reserved);
    assert_eq!(reserved.reserved_by, Some(a));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn sweep_releases_only_stale_reservations(pool: PgPool) {
    let store = PgLifecycleStore::new(pool.clone());
    let lifecycle = LifecycleService::new(std::sync::Arc::new(store.clone()), Duration::days(3));
    let now = Utc::now();
    let a = insert_user(&pool, "a@example.org").await;
    let b = insert_user(&pool, "b@example.org").await;
    let stale = insert_book(&pool, "Dune").await;
    let fresh = insert_book(&pool, "Hyperion").await;

    store.reserve(stale, a, days_ago(now, 4)).await.unwrap();
    store.reserve(fresh, b, days_ago(now, 1)).await.unwrap();

    let released = lifecycle.release_expired_reservations(now).await.unwrap();
    assert_eq!(released, 1);
    assert_eq!(fetch_book(&pool, stale).await.status, BookStatus::Available);
    assert_eq!(fetch_book(&pool, fresh).await.status, BookStatus::Reserved);

    // Second sweep at the same instant has nothing left to do
    let released = lifecycle.release_expired_reservations(now).await.unwrap();
    assert_eq!(released, 0);
    assert!(all_books_consistent(&pool).await);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn sweep_frees_the_user_for_another_reservation(pool: PgPool) {
    let store = PgLifecycleStore::new(pool.clone());
    let now = Utc::now();
    let a = insert_user(&pool, "a@example.org").await;
    let b1 = insert_book(&pool, "Dune").await;
    let b2 = insert_book(&pool, "Hyperion").await;

    store.reserve(b1, a, days_ago(now, 3)).await.unwrap();
    assert!(store.reserve(b2, a, now).await.is_err());

    // Reserved exactly three days ago: expired
    let released = store.release_expired(days_ago(now, 3), now).await.unwrap();
    assert_eq!(released, 1);

    let reserved = store.reserve(b2, a, now).await.unwrap();
    assert_eq!(reserved.reserved_by, Some(a));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn concurrent_reservations_have_one_winner(pool: PgPool) {
    let store = PgLifecycleStore::new(pool.clone());
    let book = insert_book(&pool, "Dune").await;
    let mut users = Vec::new();
    for i in 0..8 {
        users.push(insert_user(&pool, &format!("reader{}@example.org", i)).await);
    }

    let attempts = users.iter().map(|&user| {
        let store = store.clone();
        tokio::spawn(async move { store.reserve(book, user, Utc::now()).await })
    });
    let mut winners = 0;
    for attempt in attempts.collect::<Vec<_>>() {
        match attempt.await.unwrap() {
            Ok(_) => winners += 1,
            Err(AppError::Lifecycle(LifecycleError::NotAvailable)) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(winners, 1);
    assert!(all_books_consistent(&pool).await);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn concurrent_reservations_by_one_user_reserve_one_book(pool: PgPool) {
    let store = PgLifecycleStore::new(pool.clone());
    let user = insert_user(&pool, "a@example.org").await;
    let mut books = Vec::new();
    for i in 0..5 {
        books.push(insert_book(&pool, &format!("Volume {}", i)).await);
    }

    let attempts: Vec<_> = books
        .iter()
        .map(|&book| {
            let store = store.clone();
            tokio::spawn(async move { store.reserve(book, user, Utc::now()).await })
        })
        .collect();
    let mut winners = 0;
    for attempt in attempts {
        if attempt.await.unwrap().is_ok() {
            winners += 1;
        }
    }

    let reserved: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE reserved_by = $1")
        .bind(user)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(winners, 1);
    assert_eq!(reserved, 1);
}
