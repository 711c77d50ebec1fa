use std::cell::RefCell;
use std::fmt;
use std::panic;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{Builder, JoinHandle};

use parking_lot::Mutex;

use crate::error::SpawnError;
use crate::factory::{Priority, set_current_thread_priority};
use crate::monitor::Monitor;
use crate::runnable::Runnable;

/// Process-wide counter backing [`Thread::id`].
static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    /// Weak back-reference to the bookkeeping of the thread running on this OS thread, if it
    /// was started through a [`Thread`].
    static CURRENT_THREAD: RefCell<Option<Weak<ThreadInner>>> = const { RefCell::new(None) };
}

/// Lifecycle state of a [`Thread`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// The thread has been constructed but [`Thread::start`] has not yet run its task.
    NotStarted,
    /// The task is executing on its OS thread.
    Running,
    /// The task has returned and its teardown has completed.
    Terminated,
}

/// Bookkeeping shared between a [`Thread`] handle and the OS thread running its task.
#[derive(Debug)]
struct ThreadInner {
    id: u64,
    name: Option<String>,
    detached: bool,
    state: Monitor<ThreadState>,
}

/// One OS thread bound to one [`Runnable`].
///
/// Threads are constructed in the [`ThreadState::NotStarted`] state by a
/// [`ThreadFactory`](crate::ThreadFactory) and begin executing their task on a new OS thread
/// when [`start`](Thread::start) is called. A joinable thread is reclaimed by
/// [`join`](Thread::join); a detached thread reclaims itself when its task returns, and its
/// completion is observable only through whatever synchronization the task itself performs
/// (or through [`wait_terminated`](Thread::wait_terminated) on this handle).
pub struct Thread {
    inner: Arc<ThreadInner>,
    runnable: Option<Arc<dyn Runnable>>,
    stack_size: Option<usize>,
    priority: Priority,
    handle: Option<JoinHandle<()>>,
}

/// Announces the terminal state when the worker exits, on the normal path and during unwinds.
struct CompletionGuard {
    inner: Arc<ThreadInner>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        *state = ThreadState::Terminated;
        state.notify_all();
    }
}

impl Thread {
    pub(crate) fn new(
        runnable: Arc<dyn Runnable>,
        name: Option<String>,
        detached: bool,
        stack_size: Option<usize>,
        priority: Priority,
    ) -> Self {
        Self {
            inner: Arc::new(ThreadInner {
                id: NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed),
                name,
                detached,
                state: Monitor::new(ThreadState::NotStarted),
            }),
            runnable: Some(runnable),
            stack_size,
            priority,
            handle: None,
        }
    }

    /// Begins executing the bound task on a new OS thread.
    ///
    /// The worker applies the factory's priority hint to itself, publishes the handle returned
    /// by [`Thread::current`], transitions to [`ThreadState::Running`], runs the task, releases
    /// it (running its teardown), and finally transitions to [`ThreadState::Terminated`] with a
    /// broadcast notification.
    ///
    /// # Errors
    ///
    /// Returns a [`SpawnError`](crate::SpawnError) if the operating system refuses to create
    /// the thread. The thread then remains in [`ThreadState::NotStarted`], the task is
    /// retained, and no partial execution occurs; a later retry may succeed.
    ///
    /// # Panics
    ///
    /// Panics if the thread was already started.
    pub fn start(&mut self) -> Result<(), SpawnError> {
        let Some(runnable) = self.runnable.take() else {
            panic!("thread started twice");
        };

        let mut builder = Builder::new();
        if let Some(name) = self.inner.name.clone() {
            builder = builder.name(name);
        }
        if let Some(stack_size) = self.stack_size {
            builder = builder.stack_size(stack_size);
        }

        // The task travels in a shared slot so it survives a failed spawn: the worker takes
        // sole ownership out of the slot, while on failure the starter reclaims it.
        let slot = Arc::new(Mutex::new(Some(runnable)));
        let worker_slot = Arc::clone(&slot);
        let inner = Arc::clone(&self.inner);
        let priority = self.priority;

        let spawned = builder.spawn(move || {
            set_current_thread_priority(priority);
            CURRENT_THREAD.with(|current| {
                *current.borrow_mut() = Some(Arc::downgrade(&inner));
            });

            let runnable = worker_slot
                .lock()
                .take()
                .expect("the task is placed in the slot before the worker starts");
            drop(worker_slot);

            let completion = CompletionGuard {
                inner: Arc::clone(&inner),
            };
            {
                let mut state = inner.state.lock();
                *state = ThreadState::Running;
                state.notify_all();
            }

            runnable.run();

            // Teardown runs on this thread, before the terminal state becomes observable.
            drop(runnable);
            drop(completion);
        });

        match spawned {
            Ok(handle) => {
                if self.inner.detached {
                    drop(handle);
                } else {
                    self.handle = Some(handle);
                }
                Ok(())
            }
            Err(source) => {
                self.runnable = slot.lock().take();
                Err(SpawnError::new(self.inner.name.clone(), source))
            }
        }
    }

    /// Blocks until the task has returned, then reclaims the OS thread.
    ///
    /// If the task panicked, the panic is resumed on the calling thread.
    ///
    /// # Panics
    ///
    /// Panics if the thread is detached, was never started, or was already joined.
    pub fn join(&mut self) {
        assert!(!self.inner.detached, "cannot join a detached thread");

        let Some(handle) = self.handle.take() else {
            panic!("thread joined twice or before it was started");
        };

        if let Err(payload) = handle.join() {
            panic::resume_unwind(payload);
        }
    }

    /// Blocks until the thread reaches [`ThreadState::Terminated`].
    ///
    /// Unlike [`join`](Thread::join) this works for detached threads as well and does not
    /// reclaim any OS resources.
    pub fn wait_terminated(&self) {
        let mut state = self.inner.state.lock();
        state.wait_while(|state| *state != ThreadState::Terminated);
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> ThreadState {
        *self.inner.state.lock()
    }

    /// Returns the process-unique identifier assigned to this thread.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Returns the name configured by the factory, if any.
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Returns whether this thread reclaims itself on completion instead of being joined.
    pub fn is_detached(&self) -> bool {
        self.inner.detached
    }

    /// Returns a non-owning handle to this thread's bookkeeping.
    pub fn handle(&self) -> ThreadHandle {
        ThreadHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Returns a handle to the [`Thread`] running the current task, if the calling code was
    /// started through one.
    ///
    /// Inside [`Runnable::run`] this is the task's own thread. The handle is weak: it never
    /// extends the thread's lifetime, and its accessors return `None` once the bookkeeping is
    /// gone.
    pub fn current() -> Option<ThreadHandle> {
        CURRENT_THREAD
            .with(|current| current.borrow().clone())
            .map(|inner| ThreadHandle { inner })
    }
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("detached", &self.inner.detached)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// A non-owning handle to a [`Thread`]'s shared bookkeeping.
///
/// Obtained from [`Thread::handle`] or [`Thread::current`]. Holding a handle never keeps the
/// thread or its resources alive; every accessor returns `None` once the thread's bookkeeping
/// has been released.
#[derive(Debug, Clone)]
pub struct ThreadHandle {
    inner: Weak<ThreadInner>,
}

impl ThreadHandle {
    /// Returns the thread's process-unique identifier, if the thread still exists.
    pub fn id(&self) -> Option<u64> {
        self.inner.upgrade().map(|inner| inner.id)
    }

    /// Returns the thread's configured name, if the thread still exists and one was set.
    pub fn name(&self) -> Option<String> {
        self.inner.upgrade().and_then(|inner| inner.name.clone())
    }

    /// Returns the thread's lifecycle state, if the thread still exists.
    pub fn state(&self) -> Option<ThreadState> {
        self.inner.upgrade().map(|inner| *inner.state.lock())
    }
}
