use std::sync::{Arc, Mutex};

use reqcell::RequestCell;

#[tokio::test]
async fn plain_value() {
    let cell: RequestCell<u32, u32> = RequestCell::new(|arg| async move { arg * 2 });

    cell.load(21).await;
    assert_eq!(*cell.borrow().value(), 42);
    assert!(cell.is_loaded());
}

#[tokio::test]
async fn optional_value() {
    let cell: RequestCell<u32, u32> =
        RequestCell::with_default(|arg: u32| async move { arg.checked_sub(10) }, 7);

    cell.load(25).await;
    assert_eq!(*cell.borrow().value(), 15);

    // A missing value falls back to the default.
    cell.load(3).await;
    assert_eq!(*cell.borrow().value(), 7);
    assert!(cell.is_loaded());
}

#[tokio::test]
async fn fallible_value() {
    let mut cell: RequestCell<u32, u32, String> = RequestCell::new(|arg| async move {
        if arg == 0 {
            Err("zero".to_string())
        } else {
            Ok(arg)
        }
    });

    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    cell.set_error_handler({
        let seen = seen.clone();
        move |err| seen.lock().unwrap().push(err)
    });

    cell.load(3).await;
    assert_eq!(*cell.borrow().value(), 3);

    cell.load(0).await;
    assert_eq!(*cell.borrow().value(), 3);
    assert_eq!(*seen.lock().unwrap(), vec!["zero".to_string()]);
}

#[tokio::test]
async fn fallible_optional_value() {
    let cell: RequestCell<u32, u32, String> = RequestCell::with_default(
        |arg| async move {
            match arg {
                0 => Err("zero".to_string()),
                1 => Ok(None),
                n => Ok(Some(n)),
            }
        },
        7,
    );

    cell.load(5).await;
    assert_eq!(*cell.borrow().value(), 5);

    cell.load(1).await;
    assert_eq!(*cell.borrow().value(), 7);
    assert!(cell.is_loaded());

    cell.load(0).await;
    assert_eq!(*cell.borrow().value(), 7);
}
