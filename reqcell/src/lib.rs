//! An observable cell for a single on-demand asynchronous request.
//!
//! A [RequestCell] wraps one asynchronous operation together with the state
//! of its most recent run. Triggering the cell with [load](RequestCell::load)
//! invokes the operation, flags the cell as loading while the outcome is
//! pending and commits the produced value when it settles. Until a first
//! value is committed the cell exposes a default value fixed at construction.
//!
//! The state of a cell can be observed. [subscribe](RequestCell::subscribe)
//! returns a [Watcher] that is notified of every state change and can be
//! turned into a [Stream](futures::Stream) of states by wrapping it into a
//! [WatcherStream]. This builds on [tokio::sync::watch], so watchers always
//! see the most recent state but may miss intermediate states.
//!
//! Overlapping loads are permitted. Every load is numbered and only the most
//! recently triggered load commits its outcome, so responses arriving out of
//! order cannot overwrite newer data. Failures of the operation are
//! contained: they are passed to the cell's error handler instead of
//! propagating to the caller of [load](RequestCell::load).
//!
//! # Crate features
//!
//! - `serde`: enables serialization of [RequestState] snapshots.
//!
//! # Example
//!
//! ```
//! use reqcell::RequestCell;
//!
//! # tokio_test::block_on(async {
//! // A cell fetching the orders of a user.
//! let cell: RequestCell<Vec<String>, u32> = RequestCell::with_default(
//!     |user| async move {
//!         if user % 2 == 0 {
//!             None
//!         } else {
//!             Some(vec![format!("order of user {}", user)])
//!         }
//!     },
//!     vec!["no orders".to_string()],
//! );
//!
//! let mut watcher = cell.subscribe();
//! assert!(!cell.is_loading());
//! assert!(!cell.is_loaded());
//!
//! cell.load(3).await;
//! assert!(cell.is_loaded());
//! assert_eq!(cell.get(), vec!["order of user 3".to_string()]);
//!
//! // A load that produces no value falls back to the default.
//! cell.load(2).await;
//! assert_eq!(cell.get(), vec!["no orders".to_string()]);
//!
//! // Watchers are notified of every change.
//! cell.set(vec!["seeded".to_string()]);
//! watcher.changed().await.unwrap();
//! assert_eq!(watcher.borrow().value()[0], "seeded");
//! # });
//! ```

#![warn(missing_docs)]

mod cell;
mod settle;
mod state;
mod watcher;

pub use cell::{default_on_err, Cfg, RequestCell};
pub use settle::Settle;
pub use state::{Ref, RequestState};
pub use watcher::{ChangedError, Watcher, WatcherStream};
