//! Darkest-neighbour search.
//!
//! [`DarkestFinder`] scans the square neighbourhood around a target pixel
//! and returns its minimum-luma color. Each column strip of a neighbourhood
//! is reduced to its darkest pixel once and remembered in a
//! [`ColumnCache`], so sweeping a row only scans one new column per target
//! pixel.
//!
//! # Cache strategies
//!
//! | Strategy | Memory | Lifetime of an entry |
//! |----------|--------|----------------------|
//! | [`CacheStrategy::Ring`] | fixed `size` slots | until a column with the same `x % size` overwrites it |
//! | [`CacheStrategy::Full`] | one slot per pixel | whole scan |
//!
//! Both return exactly the same colors as a naive scan; only speed and
//! memory differ.

mod cache;
mod darkest;
mod grid;

pub use cache::{CacheStrategy, ColumnCache, DEFAULT_RING_SIZE};
pub use darkest::DarkestFinder;
pub use grid::{PixelGrid, RgbaImage};
