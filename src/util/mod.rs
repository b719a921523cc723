//! Various utilities and common patterns.

pub mod byte_size;
pub mod extent;
