//! Background tasks.
//!
//! Each submodule provides a long-running async loop intended to be spawned
//! via `tokio::spawn` and stopped through a [`tokio_util::sync::CancellationToken`].

pub mod reservation_expiry;

pub use reservation_expiry::ReservationSweeper;
