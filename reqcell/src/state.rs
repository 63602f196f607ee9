//! Request state snapshots.

use std::{fmt, ops::Deref};

use tokio::sync::watch;

/// State of a request cell at one point in time.
///
/// A snapshot is obtained by borrowing it from a [cell](crate::RequestCell)
/// or a [watcher](crate::Watcher), or by cloning it out of either.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestState<T> {
    pub(crate) value: T,
    pub(crate) loading: bool,
    pub(crate) loaded: bool,
}

impl<T> RequestState<T> {
    pub(crate) fn new(value: T) -> Self {
        Self { value, loading: false, loaded: false }
    }

    /// Returns a reference to the current value.
    ///
    /// This is the most recently committed result of the wrapped operation,
    /// the value written by [set](crate::RequestCell::set), or the default
    /// value if neither has happened yet.
    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Consumes the snapshot and returns the value.
    #[inline]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Returns whether a triggered operation is currently pending.
    #[inline]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Returns whether the value was produced by a completed load or a
    /// manual set, as opposed to still being the construction-time default.
    ///
    /// This distinguishes a cell that has never produced data from one whose
    /// operation completed without data, even though both expose the default
    /// value.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

/// Returns a reference to the state of a request cell.
pub struct Ref<'a, T>(pub(crate) watch::Ref<'a, RequestState<T>>);

impl<T> Deref for Ref<'_, T> {
    type Target = RequestState<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> fmt::Debug for Ref<'_, T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", &**self)
    }
}
