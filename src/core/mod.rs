//! The core module holds the error type shared by the rest of the library.

pub mod error;
