//! Run work on the designated main thread.

use std::{
    any::type_name,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, Sender},
        Arc, Mutex, OnceLock,
    },
    thread,
    thread::ThreadId,
};

use crate::wait::block_on;

type Job = Box<dyn FnOnce() + Send>;

/// Handle shared by all dispatching threads, fixed once at claim time.
struct MainHandle {
    thread_id: ThreadId,
    jobs: Sender<Job>,
    stopped: Arc<AtomicBool>,
}

static MAIN: OnceLock<MainHandle> = OnceLock::new();

#[track_caller]
fn main_handle() -> &'static MainHandle {
    match MAIN.get() {
        Some(main) => main,
        None => panic!(
            "cannot dispatch from thread {:?} since no thread has claimed the main loop",
            thread::current().id()
        ),
    }
}

/// Job loop of the designated main thread.
///
/// The thread that calls [`MainLoop::claim`] becomes the main thread for the
/// rest of the process and must call [`MainLoop::run`] to serve jobs submitted
/// by [`run_on_main`] and [`call_on_main`].
pub struct MainLoop {
    jobs: Receiver<Job>,
    stopped: Arc<AtomicBool>,
}

impl MainLoop {
    /// Registers the calling thread as the main thread.
    ///
    /// ### Panics
    /// Panics if a main loop was already claimed, by any thread.
    #[track_caller]
    pub fn claim() -> Self {
        let (tx, rx) = mpsc::channel();
        let stopped = Arc::new(AtomicBool::new(false));
        let handle = MainHandle {
            thread_id: thread::current().id(),
            jobs: tx,
            stopped: stopped.clone(),
        };
        if MAIN.set(handle).is_err() {
            panic!(
                "thread {:?} cannot claim the main loop since it belongs to thread {:?}",
                thread::current().id(),
                main_handle().thread_id
            );
        }
        Self { jobs: rx, stopped }
    }

    /// Serves submitted jobs until [`MainLoop::stop`] is requested.
    ///
    /// A panicking job does not take the loop down; its panic is carried back
    /// to the thread that submitted it.
    pub fn run(self) {
        loop {
            let Ok(job) = self.jobs.recv() else { return };
            job();
            if self.stopped.load(Ordering::Acquire) {
                return;
            }
        }
    }

    /// Requests the running loop to return after its current job.
    ///
    /// May be called from any thread, including from within a job.
    ///
    /// ### Panics
    /// Panics if no main loop has been claimed.
    #[track_caller]
    pub fn stop() {
        let main = main_handle();
        main.stopped.store(true, Ordering::Release);
        // Nudge the loop in case it is parked in recv.
        let _ = main.jobs.send(Box::new(|| ()));
    }
}

/// Whether the calling thread is the designated main thread.
///
/// Returns `false` if no main loop has been claimed yet.
#[inline]
pub fn is_main_thread() -> bool {
    MAIN.get().is_some_and(|main| main.thread_id == thread::current().id())
}

/// Runs `work` on the main thread and returns once it has completed there.
///
/// When called on the main thread itself, `work` is invoked in place on the
/// current call stack, so dispatching from within dispatched work cannot
/// deadlock. From any other thread, `work` is submitted to the main loop and
/// the caller blocks until it has finished executing. In both cases `work`
/// runs exactly once and all of its effects are visible to the caller when
/// this returns.
///
/// ### Panics
/// Panics if no main loop has been claimed or if the loop shuts down before
/// `work` completes. A panic raised by `work` itself is resumed unchanged on
/// the calling thread.
#[track_caller]
pub fn run_on_main(work: impl FnOnce() + Send + 'static) {
    let main = main_handle();
    if main.thread_id == thread::current().id() {
        work();
        return;
    }

    let (done_tx, done_rx) = futures_channel::oneshot::channel();
    let job = Box::new(move || {
        let outcome = panic::catch_unwind(AssertUnwindSafe(work));
        let _ = done_tx.send(outcome);
    });
    if main.jobs.send(job).is_err() {
        panic!("the main loop is gone, cannot dispatch from thread {:?}", thread::current().id());
    }
    match block_on(done_rx) {
        Ok(Ok(())) => (),
        Ok(Err(payload)) => panic::resume_unwind(payload),
        Err(_canceled) => {
            panic!("the main loop dropped dispatched work before completing it")
        }
    }
}

/// Runs `work` on the main thread and returns the value it produces.
///
/// Same dispatch policy as [`run_on_main`]; the result of `work`'s single
/// execution is handed back to the caller through a single-assignment slot.
///
/// ### Panics
/// Panics under the same conditions as [`run_on_main`].
#[track_caller]
pub fn call_on_main<T, F>(work: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let slot = Arc::new(Mutex::new(None));
    let out = Arc::clone(&slot);
    run_on_main(move || {
        let value = work();
        *out.lock().unwrap() = Some(value);
    });
    let value = slot.lock().unwrap().take();
    match value {
        Some(value) => value,
        // run_on_main only returns after the job ran to completion.
        None => panic!("main-thread work completed without producing a {}", type_name::<T>()),
    }
}
