//! Normalization of operation outcomes.

use std::convert::Infallible;

/// An outcome of a request operation.
///
/// Settling maps the output of the wrapped operation onto the two ways a
/// request can end: successfully with an optional value, or unsuccessfully
/// with an error.
///
/// Implementations are provided for plain values, optional values and their
/// fallible counterparts, so an operation can return whichever of these
/// fits it best:
///
/// | operation returns      | success value | error |
/// |------------------------|---------------|-------|
/// | `T`                    | `Some(T)`     | never |
/// | `Option<T>`            | `Option<T>`   | never |
/// | `Result<T, E>`         | `Some(T)`     | `E`   |
/// | `Result<Option<T>, E>` | `Option<T>`   | `E`   |
///
/// A success value of [None] makes the cell fall back to its default value.
pub trait Settle<T> {
    /// Error produced when the operation fails.
    type Error;

    /// Settles the outcome into an optional value or an error.
    fn settle(self) -> Result<Option<T>, Self::Error>;
}

impl<T> Settle<T> for T {
    type Error = Infallible;

    fn settle(self) -> Result<Option<T>, Self::Error> {
        Ok(Some(self))
    }
}

impl<T> Settle<T> for Option<T> {
    type Error = Infallible;

    fn settle(self) -> Result<Option<T>, Self::Error> {
        Ok(self)
    }
}

impl<T, E> Settle<T> for Result<T, E> {
    type Error = E;

    fn settle(self) -> Result<Option<T>, Self::Error> {
        self.map(Some)
    }
}

impl<T, E> Settle<T> for Result<Option<T>, E> {
    type Error = E;

    fn settle(self) -> Result<Option<T>, Self::Error> {
        self
    }
}
