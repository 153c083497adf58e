//! Color darkening transform.
//!
//! The transform nudges hues apart (warm hues toward magenta, cool hues
//! toward cyan), pushes saturation halfway to its maximum and lowers the
//! value channel by a fixed amount. [`ColorDarkener`] memoizes results per
//! input color.

mod darkener;

pub use darkener::{darken_uncached, tress_shift, ColorDarkener};
