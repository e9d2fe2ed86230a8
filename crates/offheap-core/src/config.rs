//! Bulk-build configuration parameters.

use crate::error::ArrayError;

/// Configuration for building an array from an iterator of unknown length.
///
/// The builder starts at `initial_capacity` slots (or the iterator's lower
/// size hint, if larger), multiplies the capacity by `growth_factor` each
/// time it fills up, and trims to the exact count once the input is drained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildConfig {
    /// Capacity of the first allocation, in elements.
    ///
    /// Default: 4. Must be at least 1.
    pub initial_capacity: usize,

    /// Multiplier applied to the capacity when the buffer is full.
    ///
    /// Default: 2. Must be at least 2 so growth is geometric.
    pub growth_factor: usize,
}

impl BuildConfig {
    /// Default initial capacity.
    pub const DEFAULT_INITIAL_CAPACITY: usize = 4;

    /// Default growth factor (doubling).
    pub const DEFAULT_GROWTH_FACTOR: usize = 2;

    /// Create a config with the given initial capacity and default growth.
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            growth_factor: Self::DEFAULT_GROWTH_FACTOR,
        }
    }

    /// Check that the parameters describe geometric growth from a non-empty start.
    pub fn validate(&self) -> Result<(), ArrayError> {
        if self.initial_capacity == 0 {
            return Err(ArrayError::invalid("initial_capacity must be at least 1"));
        }
        if self.growth_factor < 2 {
            return Err(ArrayError::invalid(format!(
                "growth_factor must be at least 2, got {}",
                self.growth_factor
            )));
        }
        Ok(())
    }

    /// Capacity after one growth step from `current`.
    ///
    /// Saturates instead of overflowing; the allocator rejects the
    /// resulting size if it cannot be represented.
    pub fn grow(&self, current: usize) -> usize {
        current.max(1).saturating_mul(self.growth_factor)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INITIAL_CAPACITY)
    }
}
