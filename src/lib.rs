//! Tresser - incremental darkest-neighbour image filter
//!
//! Host side of the `tress-core` engine: image decoding and encoding, a
//! CLI that filters files, and an HTTP server that runs filter jobs in the
//! background. This library exposes modules for integration testing.

pub mod api;
pub mod error;
pub mod models;
pub mod rendering;
pub mod server;
pub mod services;
