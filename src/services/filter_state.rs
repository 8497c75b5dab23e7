use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Resets the owning table to its first page.
pub type ResetPage = Arc<dyn Fn() + Send + Sync>;

/// A filter value whose only setter resets pagination first.
///
/// There is no way to change the value without running the reset; callers
/// cannot forget it.
pub struct FilterState<T> {
    value: Arc<RwLock<T>>,
    reset_page: ResetPage,
}

impl<T> Clone for FilterState<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            reset_page: Arc::clone(&self.reset_page),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for FilterState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterState")
            .field("value", &*self.value.read())
            .finish()
    }
}

impl<T: Clone> FilterState<T> {
    pub fn new(initial: T, reset_page: ResetPage) -> Self {
        Self {
            value: Arc::new(RwLock::new(initial)),
            reset_page,
        }
    }

    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Resets the page, then stores `next`. Runs the reset even when `next`
    /// equals the current value.
    pub fn set(&self, next: T) {
        (self.reset_page)();
        *self.value.write() = next;
    }

    pub fn update(&self, next: impl FnOnce(&T) -> T) {
        (self.reset_page)();
        let mut value = self.value.write();
        let updated = next(&value);
        *value = updated;
    }
}
