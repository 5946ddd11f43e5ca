//! Filesystem side of a migration: administrative paths and backup file copies.

mod admin;
mod atomic;
mod copy;
mod helpers;
mod io_copy;
mod space;
mod transfer;
mod util;

pub use admin::{admin_path, same_location};
pub use copy::safe_copy_and_rename;
pub use helpers::io_error_with_help;
pub use io_copy::DurabilityMode;
pub use transfer::{AdminShareTransfer, FileTransfer};
