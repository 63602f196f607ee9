//! Watching the state of a request cell.

use futures::{ready, Stream};
use std::{
    error::Error,
    fmt,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::watch;
use tokio_util::sync::ReusableBoxFuture;

use crate::state::{Ref, RequestState};

/// An error occurred during waiting for a state change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangedError {
    /// The request cell has been dropped.
    Closed,
}

impl fmt::Display for ChangedError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
        }
    }
}

impl Error for ChangedError {}

/// Observes the state of a request cell.
///
/// Instances are created by [RequestCell::subscribe](crate::RequestCell::subscribe).
/// A watcher can be cloned and every clone tracks seen changes separately.
///
/// This can be converted into a [Stream](futures::Stream) of states by
/// wrapping it into a [WatcherStream].
#[derive(Clone)]
pub struct Watcher<T> {
    rx: watch::Receiver<RequestState<T>>,
}

impl<T> fmt::Debug for Watcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Watcher").finish()
    }
}

impl<T> Watcher<T> {
    pub(crate) fn new(rx: watch::Receiver<RequestState<T>>) -> Self {
        Self { rx }
    }

    /// Returns a reference to the most recently published state.
    #[inline]
    pub fn borrow(&self) -> Ref<'_, T> {
        Ref(self.rx.borrow())
    }

    /// Returns a reference to the most recently published state and marks
    /// that state as seen.
    #[inline]
    pub fn borrow_and_update(&mut self) -> Ref<'_, T> {
        Ref(self.rx.borrow_and_update())
    }

    /// Wait for a state change notification, then mark the newest state as
    /// seen.
    #[inline]
    pub async fn changed(&mut self) -> Result<(), ChangedError> {
        self.rx.changed().await.map_err(|_| ChangedError::Closed)
    }
}

/// A wrapper around a [Watcher] that implements [Stream](futures::Stream).
///
/// This stream will always start by yielding the current state when it is
/// polled, regardless of whether it has already been seen by the watcher.
/// It ends when the request cell is dropped.
///
/// Note that intermediate states may be missed when the cell changes faster
/// than the stream is polled.
pub struct WatcherStream<T> {
    inner: ReusableBoxFuture<'static, (Result<(), ChangedError>, Watcher<T>)>,
}

impl<T> fmt::Debug for WatcherStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("WatcherStream").finish()
    }
}

impl<T> WatcherStream<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a new `WatcherStream`.
    pub fn new(watcher: Watcher<T>) -> Self {
        Self { inner: ReusableBoxFuture::new(async move { (Ok(()), watcher) }) }
    }

    async fn make_future(mut watcher: Watcher<T>) -> (Result<(), ChangedError>, Watcher<T>) {
        let result = watcher.changed().await;
        (result, watcher)
    }
}

impl<T> Stream for WatcherStream<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = RequestState<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context) -> Poll<Option<Self::Item>> {
        let (result, mut watcher) = ready!(self.inner.poll(cx));
        match result {
            Ok(()) => {
                let state = watcher.borrow_and_update().clone();
                self.inner.set(Self::make_future(watcher));
                Poll::Ready(Some(state))
            }
            Err(_) => {
                self.inner.set(Self::make_future(watcher));
                Poll::Ready(None)
            }
        }
    }
}

impl<T> Unpin for WatcherStream<T> {}

impl<T> From<Watcher<T>> for WatcherStream<T>
where
    T: Send + Sync + 'static,
{
    fn from(watcher: Watcher<T>) -> Self {
        Self::new(watcher)
    }
}
