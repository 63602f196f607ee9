use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use reqcell::{Cfg, RequestCell};

#[tokio::test]
async fn load() {
    crate::init();

    let cell: RequestCell<Vec<u32>, u32> =
        RequestCell::new(|arg| async move { Some(vec![arg, arg + 1]) });

    assert!(!cell.is_loading());
    assert!(!cell.is_loaded());
    assert!(cell.borrow().value().is_empty());

    println!("Loading");
    cell.load(5).await;

    assert!(!cell.is_loading());
    assert!(cell.is_loaded());
    assert_eq!(*cell.borrow().value(), vec![5, 6]);

    println!("Loading again");
    cell.load(7).await;
    assert_eq!(*cell.borrow().value(), vec![7, 8]);
}

#[tokio::test]
async fn load_without_value() {
    crate::init();

    let cell: RequestCell<Vec<u32>, u32> = RequestCell::with_default(
        |arg| async move {
            if arg == 0 {
                None
            } else {
                Some(vec![arg])
            }
        },
        vec![99],
    );

    cell.load(1).await;
    assert_eq!(*cell.borrow().value(), vec![1]);

    println!("Loading without result");
    cell.load(0).await;
    assert_eq!(*cell.borrow().value(), vec![99]);
    assert!(cell.is_loaded());
}

#[tokio::test]
async fn set_and_refresh() {
    crate::init();

    let cell: RequestCell<String> =
        RequestCell::with_default(|()| async move { "loaded".to_string() }, "default".to_string());

    assert!(!cell.is_loaded());
    assert_eq!(cell.borrow().value(), "default");

    println!("Setting value");
    cell.set("manual".to_string());
    assert!(cell.is_loaded());
    assert!(!cell.is_loading());
    assert_eq!(cell.borrow().value(), "manual");

    println!("Refreshing");
    cell.refresh().await;
    assert_eq!(cell.borrow().value(), "loaded");
}

#[tokio::test]
async fn reset() {
    crate::init();

    let cell: RequestCell<Vec<u32>, u32> =
        RequestCell::with_default(|arg| async move { Some(vec![arg]) }, vec![0]);

    cell.load(1).await;
    assert!(cell.is_loaded());
    assert_eq!(*cell.borrow().value(), vec![1]);

    println!("Resetting");
    cell.reset();
    assert!(!cell.is_loaded());
    assert!(!cell.is_loading());
    assert_eq!(*cell.borrow().value(), vec![0]);
}

#[tokio::test]
async fn disabled() {
    crate::init();

    let calls = Arc::new(AtomicUsize::new(0));
    let mut cfg = Cfg::new(vec![0u32]);
    cfg.disabled = true;

    let cell = RequestCell::with_cfg(
        {
            let calls = calls.clone();
            move |arg: u32| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Some(vec![arg]) }
            }
        },
        cfg,
    );

    assert!(cell.is_disabled());

    println!("Loading disabled cell");
    cell.load(1).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!cell.is_loading());
    assert!(!cell.is_loaded());
    assert_eq!(*cell.borrow().value(), vec![0]);

    println!("Setting value of disabled cell");
    cell.set(vec![5]);
    assert_eq!(*cell.borrow().value(), vec![5]);
    assert!(cell.is_loaded());
}

#[tokio::test]
async fn loaded_flag() {
    crate::init();

    let cell: RequestCell<Vec<u32>, u32> = RequestCell::new(|_| async move { None });

    // A fresh cell and a cell whose operation produced nothing both expose
    // the default value, but only the latter counts as loaded.
    assert!(!cell.is_loaded());
    assert!(cell.borrow().value().is_empty());

    cell.load(1).await;
    assert!(cell.is_loaded());
    assert!(cell.borrow().value().is_empty());

    cell.reset();
    assert!(!cell.is_loaded());
}

#[tokio::test]
async fn snapshots() {
    crate::init();

    let cell: RequestCell<Vec<u32>, u32> =
        RequestCell::with_default(|arg| async move { Some(vec![arg]) }, vec![1, 2]);

    assert_eq!(cell.default_value(), &vec![1, 2]);
    assert!(!cell.is_disabled());

    let snapshot = cell.borrow().clone();
    assert!(!snapshot.is_loading());
    assert_eq!(*snapshot.value(), vec![1, 2]);

    cell.load(7).await;

    // Snapshots are detached from the cell.
    assert_eq!(*snapshot.value(), vec![1, 2]);
    assert_eq!(cell.get(), vec![7]);
    assert_eq!(snapshot.into_value(), vec![1, 2]);

    println!("{cell:?}");
}
