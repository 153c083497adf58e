//! Per-column darkest-pixel cache.

use crate::color::{Color, Luma};

/// Ring size used by [`CacheStrategy::default()`].
///
/// Large enough to hold every column of the widest supported
/// neighbourhood (`2 * 100 + 1`), so a row sweep never evicts a column it
/// still needs.
pub const DEFAULT_RING_SIZE: usize = 256;

/// How the column cache is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStrategy {
    /// Fixed ring of `size` slots indexed by `x % size`.
    Ring { size: usize },
    /// One slot per pixel (`width × height`), allocated on first use.
    Full,
}

impl Default for CacheStrategy {
    fn default() -> Self {
        CacheStrategy::Ring {
            size: DEFAULT_RING_SIZE,
        }
    }
}

/// The darkest pixel of one column strip, together with its luma.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Shade {
    pub color: Color,
    pub luma: Luma,
}

/// A cached strip result. The tag fields make a hit exact: a slot that
/// was last written for another column, row or radius is a miss.
#[derive(Debug, Clone, Copy)]
struct ColumnEntry {
    column: usize,
    row: usize,
    radius: usize,
    shade: Option<Shade>,
}

/// Remembers the darkest pixel of column strips already scanned.
///
/// A strip is identified by its column, the target row it was centred on
/// and the radius, so entries from a previous row are never reused.
#[derive(Debug, Clone)]
pub struct ColumnCache {
    strategy: CacheStrategy,
    slots: Vec<Option<ColumnEntry>>,
    /// Grid width the `Full` layout was allocated for.
    width: usize,
}

impl ColumnCache {
    pub fn new(strategy: CacheStrategy) -> Self {
        let slots = match strategy {
            // A zero-sized ring would make `x % size` panic
            CacheStrategy::Ring { size } => vec![None; size.max(1)],
            CacheStrategy::Full => Vec::new(),
        };
        Self {
            strategy,
            slots,
            width: 0,
        }
    }

    #[inline]
    pub fn strategy(&self) -> CacheStrategy {
        self.strategy
    }

    /// Number of slots currently allocated.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.slots.fill(None);
    }

    /// Make sure the `Full` layout matches the grid. Reallocating drops all
    /// entries, since they were computed for a differently shaped grid.
    pub(crate) fn prepare(&mut self, width: usize, height: usize) {
        if self.strategy == CacheStrategy::Full
            && (self.width != width || self.slots.len() != width * height)
        {
            self.slots = vec![None; width * height];
            self.width = width;
        }
    }

    #[inline]
    fn slot(&self, column: usize, row: usize) -> usize {
        match self.strategy {
            CacheStrategy::Ring { .. } => column % self.slots.len(),
            CacheStrategy::Full => row * self.width + column,
        }
    }

    /// Look up the strip for `column` centred on `row`.
    ///
    /// The outer `Option` is the hit/miss; the inner one is `None` for a
    /// strip that had no in-bounds pixels.
    #[inline]
    pub(crate) fn get(&self, column: usize, row: usize, radius: usize) -> Option<Option<Shade>> {
        let entry = self.slots.get(self.slot(column, row))?.as_ref()?;
        (entry.column == column && entry.row == row && entry.radius == radius)
            .then_some(entry.shade)
    }

    #[inline]
    pub(crate) fn insert(&mut self, column: usize, row: usize, radius: usize, shade: Option<Shade>) {
        let slot = self.slot(column, row);
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = Some(ColumnEntry {
                column,
                row,
                radius,
                shade,
            });
        }
    }
}
