//! Data models for Bookshelf

pub mod book;
pub mod borrowing;
pub mod category;
pub mod favorite;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookDetails, BookQuery, BookSort, BookStatus};
pub use borrowing::{Borrowing, BorrowingDetails, BorrowingKey};
pub use category::Category;
pub use favorite::Favorite;
pub use user::{Role, SessionUser, User};
