//! Integration tests
//!
//! `api_tests` drive the router in-process and need no database.
//! `catalog_tests` and `lifecycle_tests` run against PostgreSQL through
//! `sqlx::test` and are ignored by default: `DATABASE_URL=... cargo test -- --ignored`.

mod api_tests;
mod catalog_tests;
mod lifecycle_tests;
