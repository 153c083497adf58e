//! Public error type for the tress-core crate.
//!
//! [`TressError`] covers everything that can go wrong before a scan
//! starts. Once a [`RasterScanner`](crate::RasterScanner) exists, no
//! operation on it can fail.

mod error;

pub use error::TressError;
