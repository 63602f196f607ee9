//! Observable request cell.

use futures::{future::BoxFuture, FutureExt};
use std::{
    convert::Infallible,
    fmt,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tokio::sync::watch;

use crate::{
    settle::Settle,
    state::{Ref, RequestState},
    watcher::Watcher,
};

type BoxOp<T, A, E> = Box<dyn Fn(A) -> BoxFuture<'static, Result<Option<T>, E>> + Send + Sync>;

/// Default handler function for request errors.
///
/// Logs the error as a warning.
pub fn default_on_err<E>(err: E)
where
    E: fmt::Display,
{
    tracing::warn!("request failed: {}", err);
}

/// Request cell configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cfg<T> {
    /// Value exposed before the first load and after a reset.
    ///
    /// The cell also falls back to this value when the operation settles
    /// successfully without producing a value.
    pub default: T,
    /// Whether triggering the operation is disabled.
    ///
    /// A disabled cell ignores [load](RequestCell::load) entirely and never
    /// changes its loading flag. Its value can still be changed with
    /// [set](RequestCell::set).
    ///
    /// By default false.
    pub disabled: bool,
}

impl<T> Cfg<T> {
    /// Creates a configuration with the given default value.
    pub fn new(default: T) -> Self {
        Self { default, disabled: false }
    }
}

impl<T> Default for Cfg<T>
where
    T: Default,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// An observable cell tracking one on-demand asynchronous operation.
///
/// The cell owns the operation and exposes its lifecycle as a
/// [RequestState]: whether a run is currently pending and the most recently
/// committed value. [load](Self::load) triggers a run, [set](Self::set)
/// writes a value directly and [subscribe](Self::subscribe) hands out
/// [watchers](Watcher) that observe every state change.
///
/// Overlapping runs are permitted and each run is numbered. Only the outcome
/// of the most recently triggered run is committed, so a slow response can
/// never overwrite the result of a newer run.
///
/// Failures of the operation never propagate to the caller of
/// [load](Self::load). They are passed to the error handler, which logs them
/// by default and can be replaced with
/// [set_error_handler](Self::set_error_handler).
pub struct RequestCell<T, A = (), E = Infallible> {
    op: BoxOp<T, A, E>,
    tx: watch::Sender<RequestState<T>>,
    default: T,
    disabled: bool,
    issued: AtomicU64,
    on_err: Arc<dyn Fn(E) + Send + Sync>,
}

impl<T, A, E> fmt::Debug for RequestCell<T, A, E>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RequestCell")
            .field("state", &*self.tx.borrow())
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

impl<T, A, E> RequestCell<T, A, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    /// Creates a request cell around the given operation, using the default
    /// value of `T`.
    ///
    /// The operation may return its value plainly, optionally or wrapped in
    /// a [Result], see [Settle].
    pub fn new<F, Fut>(op: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Settle<T, Error = E>,
        E: fmt::Display,
        T: Default,
    {
        Self::with_cfg(op, Cfg::default())
    }

    /// Creates a request cell around the given operation, with the given
    /// default value.
    pub fn with_default<F, Fut>(op: F, default: T) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Settle<T, Error = E>,
        E: fmt::Display,
    {
        Self::with_cfg(op, Cfg::new(default))
    }

    /// Creates a request cell around the given operation, with the given
    /// configuration.
    pub fn with_cfg<F, Fut>(op: F, cfg: Cfg<T>) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Settle<T, Error = E>,
        E: fmt::Display,
    {
        let Cfg { default, disabled } = cfg;
        let (tx, _rx) = watch::channel(RequestState::new(default.clone()));

        Self {
            op: Box::new(move |arg| {
                let fut = op(arg);
                async move { fut.await.settle() }.boxed()
            }),
            tx,
            default,
            disabled,
            issued: AtomicU64::new(0),
            on_err: Arc::new(default_on_err),
        }
    }

    /// Returns a reference to the current state.
    #[inline]
    pub fn borrow(&self) -> Ref<'_, T> {
        Ref(self.tx.borrow())
    }

    /// Returns a clone of the current value.
    #[inline]
    pub fn get(&self) -> T {
        self.tx.borrow().value.clone()
    }

    /// Returns whether a triggered operation is currently pending.
    #[inline]
    pub fn is_loading(&self) -> bool {
        self.tx.borrow().loading
    }

    /// Returns whether the current value was produced by a completed load or
    /// a manual set.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.tx.borrow().loaded
    }

    /// Returns whether triggering the operation is disabled.
    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns a reference to the default value.
    #[inline]
    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Triggers the operation with the given argument and waits for it to
    /// settle.
    ///
    /// If the cell is disabled, this returns immediately without invoking
    /// the operation and without changing the state.
    ///
    /// Otherwise the loading flag is set, the operation is invoked and its
    /// outcome is awaited. A successful outcome is committed as the new
    /// value, with a missing value replaced by the default value. A failed
    /// outcome leaves the value unchanged and is passed to the error
    /// handler. In both cases the loading flag is cleared.
    ///
    /// When loads overlap, only the most recently triggered load commits its
    /// outcome and clears the loading flag. The outcomes of superseded loads
    /// are discarded, but their failures are still passed to the error
    /// handler. Cancelling the returned future clears the loading flag if no
    /// newer load has been triggered since.
    pub async fn load(&self, arg: A) {
        if self.disabled {
            tracing::trace!("load ignored because cell is disabled");
            return;
        }

        // Token issuance must happen inside the send closure so that it is
        // ordered consistently with commits of other loads.
        let mut token = 0;
        self.tx.send_if_modified(|state| {
            token = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
            if state.loading {
                false
            } else {
                state.loading = true;
                true
            }
        });

        let mut guard = SettleGuard { tx: &self.tx, issued: &self.issued, token, armed: true };
        let settled = (self.op)(arg).await;
        guard.armed = false;

        match settled {
            Ok(produced) => {
                let committed = self.tx.send_if_modified(|state| {
                    if self.issued.load(Ordering::SeqCst) != token {
                        return false;
                    }
                    state.value = produced.unwrap_or_else(|| self.default.clone());
                    state.loaded = true;
                    state.loading = false;
                    true
                });
                if !committed {
                    tracing::debug!("discarding result of superseded load {}", token);
                }
            }
            Err(err) => {
                self.tx.send_if_modified(|state| {
                    if self.issued.load(Ordering::SeqCst) == token && state.loading {
                        state.loading = false;
                        true
                    } else {
                        false
                    }
                });
                (self.on_err)(err);
            }
        }
    }

    /// Sets the current value.
    ///
    /// This marks the cell as loaded and notifies all watchers. It does not
    /// affect a pending load, whose outcome will overwrite the value when it
    /// settles.
    pub fn set(&self, value: T) {
        self.tx.send_modify(|state| {
            state.value = value;
            state.loaded = true;
        });
    }

    /// Resets the cell to its construction-time state.
    ///
    /// The value reverts to the default value and the loading and loaded
    /// flags are cleared. Pending loads are superseded, so their outcomes
    /// will be discarded when they settle.
    pub fn reset(&self) {
        self.tx.send_modify(|state| {
            self.issued.fetch_add(1, Ordering::SeqCst);
            state.value = self.default.clone();
            state.loading = false;
            state.loaded = false;
        });
    }

    /// Subscribes to the state of this cell.
    ///
    /// The watcher sees the current state and all subsequent changes.
    pub fn subscribe(&self) -> Watcher<T> {
        Watcher::new(self.tx.subscribe())
    }

    /// Returns the current number of watchers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Sets the error handler that is invoked when the operation fails.
    ///
    /// The default handler logs the error as a warning.
    pub fn set_error_handler<H>(&mut self, on_err: H)
    where
        H: Fn(E) + Send + Sync + 'static,
    {
        self.on_err = Arc::new(on_err);
    }
}

impl<T, E> RequestCell<T, (), E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    /// Triggers the operation of a cell that takes no argument.
    ///
    /// This is equivalent to calling [load](Self::load) with the unit
    /// argument.
    pub async fn refresh(&self) {
        self.load(()).await
    }
}

/// Clears the loading flag when a load is dropped before settling.
struct SettleGuard<'a, T> {
    tx: &'a watch::Sender<RequestState<T>>,
    issued: &'a AtomicU64,
    token: u64,
    armed: bool,
}

impl<T> Drop for SettleGuard<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let cleared = self.tx.send_if_modified(|state| {
            if self.issued.load(Ordering::SeqCst) == self.token && state.loading {
                state.loading = false;
                true
            } else {
                false
            }
        });
        if cleared {
            tracing::debug!("load {} was dropped before settling", self.token);
        }
    }
}
