//! Claiming, stopping and re-claiming the main loop.
//!
//! Lives in its own test binary because the claimed main thread is
//! process-wide state.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::mpsc,
    thread,
};

use mainbound::{call_on_main, is_main_thread, run_on_main, MainLoop};

#[test]
fn claim_serve_and_stop() {
    let (tx, rx) = mpsc::channel();
    let main = thread::spawn(move || {
        let main_loop = MainLoop::claim();
        assert!(is_main_thread());
        tx.send(()).unwrap();
        main_loop.run();
    });
    rx.recv().unwrap();
    assert!(!is_main_thread());

    // Only one thread may ever hold the claim.
    let second_claim = panic::catch_unwind(AssertUnwindSafe(MainLoop::claim));
    assert!(second_claim.is_err());

    assert_eq!(call_on_main(|| 1 + 1), 2);

    // Stop requested from within a job takes effect after that job.
    run_on_main(MainLoop::stop);
    main.join().unwrap();

    // Dispatching to the stopped loop is fatal.
    let after_stop = panic::catch_unwind(AssertUnwindSafe(|| call_on_main(|| 3)));
    let payload = after_stop.unwrap_err();
    let message = payload.downcast_ref::<String>().unwrap();
    assert!(message.contains("the main loop is gone"), "unexpected panic: {message}");
}
