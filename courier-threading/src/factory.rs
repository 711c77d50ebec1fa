use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::runnable::Runnable;
use crate::thread::Thread;

/// A scheduling priority hint for threads created by a [`ThreadFactory`].
///
/// The hint affects how favorably the OS schedules a thread relative to others in the process.
/// It is applied on a best-effort basis and never affects correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    /// Less favorable scheduling, for background work.
    Low,
    /// The default scheduling priority, left untouched.
    #[default]
    Normal,
    /// More favorable scheduling; on Unix this requires elevated privileges and silently
    /// degrades to [`Priority::Normal`] without them.
    High,
}

/// Constructs [`Thread`] instances under a uniform configuration policy.
///
/// A factory holds the detached flag, stack size, priority hint, and naming convention that
/// every thread it creates receives. Configuration uses consuming builder methods; creation
/// itself is [`new_thread`](ThreadFactory::new_thread), which may be called any number of
/// times. The policy is copied into each thread at creation time, so threads constructed from
/// one factory behave identically.
///
/// ```rust
/// use std::sync::Arc;
///
/// use courier_threading::{Priority, ThreadFactory};
///
/// let factory = ThreadFactory::new()
///     .detached(false)
///     .stack_size(512 * 1024)
///     .priority(Priority::Low)
///     .thread_name(|index| format!("courier-worker-{index}"));
///
/// let mut thread = factory.new_thread(Arc::new(|| {}));
/// assert_eq!(thread.name(), Some("courier-worker-0"));
///
/// thread.start().expect("failed to spawn thread");
/// thread.join();
/// ```
pub struct ThreadFactory {
    detached: bool,
    stack_size: Option<usize>,
    priority: Priority,
    #[allow(clippy::type_complexity)]
    thread_name: Option<Arc<dyn Fn(u64) -> String + Send + Sync>>,
    next_index: AtomicU64,
}

impl ThreadFactory {
    /// Creates a factory with the default policy: detached threads, OS-default stack size,
    /// [`Priority::Normal`], unnamed threads.
    pub fn new() -> Self {
        Self {
            detached: true,
            stack_size: None,
            priority: Priority::Normal,
            thread_name: None,
            next_index: AtomicU64::new(0),
        }
    }

    /// Sets whether created threads are detached.
    ///
    /// Detached threads reclaim themselves when their task returns and cannot be joined;
    /// joinable threads must be reclaimed with [`Thread::join`].
    pub fn detached(mut self, detached: bool) -> Self {
        self.detached = detached;
        self
    }

    /// Sets the stack size in bytes for created threads.
    ///
    /// Without this, threads use the platform's default stack size.
    pub fn stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }

    /// Sets the scheduling priority hint for created threads.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Specifies a naming convention for created threads.
    ///
    /// The closure receives the per-factory creation index and returns the thread's name,
    /// which appears in the OS thread as well as on [`Thread::name`].
    pub fn thread_name<F>(mut self, thread_name: F) -> Self
    where
        F: Fn(u64) -> String + Send + Sync + 'static,
    {
        self.thread_name = Some(Arc::new(thread_name));
        self
    }

    /// Constructs a new, not yet started [`Thread`] bound to `runnable`.
    ///
    /// This is pure construction: no OS resources are reserved until [`Thread::start`], which
    /// is also where resource exhaustion surfaces.
    pub fn new_thread(&self, runnable: Arc<dyn Runnable>) -> Thread {
        let name = self
            .thread_name
            .as_deref()
            .map(|thread_name| thread_name(self.next_index.fetch_add(1, Ordering::Relaxed)));

        Thread::new(runnable, name, self.detached, self.stack_size, self.priority)
    }
}

impl Default for ThreadFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
pub(crate) fn set_current_thread_priority(priority: Priority) {
    // Lower values cause more favorable scheduling, higher values less favorable.
    // For details see `man setpriority(2)`; on Linux this applies to the calling
    // thread only.
    let nice = match priority {
        Priority::Normal => return,
        Priority::Low => 10,
        Priority::High => -5,
    };
    if unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, nice) } != 0 {
        // The hint is best effort; clear `errno` and keep the default priority.
        let _ = std::io::Error::last_os_error();
    }
}

#[cfg(not(unix))]
pub(crate) fn set_current_thread_priority(_priority: Priority) {
    // Ignored for non-Unix platforms.
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::monitor::Monitor;
    use crate::runnable::Runnable;
    use crate::thread::ThreadState;

    use super::*;

    /// Decrements a shared counter and wakes the reaper once it hits zero.
    struct ReapTask {
        active: Arc<Monitor<i32>>,
    }

    impl Runnable for ReapTask {
        fn run(&self) {
            let mut active = self.active.lock();
            *active -= 1;
            if *active == 0 {
                active.notify_one();
            }
        }
    }

    #[test]
    fn test_reap_n_threads() {
        const LOOPS: i32 = 3;
        const COUNT: i32 = 10;

        let factory = ThreadFactory::new();
        let active = Arc::new(Monitor::new(0));

        for _ in 0..LOOPS {
            *active.lock() = COUNT;

            let mut threads = Vec::new();
            for _ in 0..COUNT {
                threads.push(factory.new_thread(Arc::new(ReapTask {
                    active: Arc::clone(&active),
                })));
            }
            for (index, thread) in threads.iter_mut().enumerate() {
                if let Err(error) = thread.start() {
                    panic!("failed to start thread {index}: {error}");
                }
            }

            let mut remaining = active.lock();
            while *remaining > 0 {
                let _ = remaining.wait_for(Duration::from_secs(1));
            }
            assert_eq!(*remaining, 0);
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Lifecycle {
        Uninitialized,
        Starting,
        Started,
        Stopping,
        Stopped,
    }

    /// Announces its own startup, then waits to be asked to stop.
    struct SynchStartTask {
        state: Arc<Monitor<Lifecycle>>,
    }

    impl Runnable for SynchStartTask {
        fn run(&self) {
            {
                let mut state = self.state.lock();
                if *state == Lifecycle::Starting {
                    *state = Lifecycle::Started;
                    state.notify_one();
                }
            }

            {
                let mut state = self.state.lock();
                while *state == Lifecycle::Started {
                    state.wait();
                }
                if *state == Lifecycle::Stopping {
                    *state = Lifecycle::Stopped;
                    state.notify_all();
                }
            }
        }
    }

    #[test]
    fn test_synchronized_start_stop() {
        let factory = ThreadFactory::new().detached(false);
        let state = Arc::new(Monitor::new(Lifecycle::Uninitialized));
        let mut thread = factory.new_thread(Arc::new(SynchStartTask {
            state: Arc::clone(&state),
        }));

        {
            let mut lifecycle = state.lock();
            assert_eq!(*lifecycle, Lifecycle::Uninitialized);
            *lifecycle = Lifecycle::Starting;
        }
        thread.start().expect("failed to spawn thread");

        {
            let mut lifecycle = state.lock();
            while *lifecycle == Lifecycle::Starting {
                lifecycle.wait();
            }
            assert_ne!(*lifecycle, Lifecycle::Starting);
        }

        {
            let mut lifecycle = state.lock();

            // A bounded wait that nobody answers: the worker is parked waiting for the stop
            // request, so this must report a timeout.
            let outcome = lifecycle.wait_for(Duration::from_millis(100));
            assert!(outcome.timed_out());

            if *lifecycle == Lifecycle::Started {
                *lifecycle = Lifecycle::Stopping;
                lifecycle.notify_one();
            }
            while *lifecycle == Lifecycle::Stopping {
                lifecycle.wait();
            }
            assert_eq!(*lifecycle, Lifecycle::Stopped);
        }

        thread.join();
    }

    #[derive(Default)]
    struct FloodProgress {
        started: usize,
        finished: usize,
    }

    /// A no-op task whose completion is observed purely through monitor-guarded counters.
    struct FloodTask {
        progress: Arc<Monitor<FloodProgress>>,
    }

    impl Runnable for FloodTask {
        fn run(&self) {
            self.progress.lock().started += 1;
        }
    }

    impl Drop for FloodTask {
        fn drop(&mut self) {
            let mut progress = self.progress.lock();
            progress.finished += 1;
            progress.notify_all();
        }
    }

    #[test]
    fn test_flood_of_detached_threads() {
        const COUNT: usize = 2000;

        let factory = ThreadFactory::new().detached(true);
        let progress = Arc::new(Monitor::new(FloodProgress::default()));

        for index in 0..COUNT {
            let mut thread = factory.new_thread(Arc::new(FloodTask {
                progress: Arc::clone(&progress),
            }));
            if let Err(error) = thread.start() {
                panic!("failed to start thread {index}: {error}");
            }
        }

        let mut progress = progress.lock();
        while progress.finished < COUNT {
            let _ = progress.wait_for(Duration::from_secs(1));
        }
        assert_eq!(progress.started, COUNT);
        assert_eq!(progress.finished, COUNT);
    }

    #[test]
    fn test_factory_applies_its_policy_uniformly() {
        let factory = ThreadFactory::new()
            .detached(false)
            .thread_name(|index| format!("uniform-{index}"));

        let mut first = factory.new_thread(Arc::new(|| {}));
        let mut second = factory.new_thread(Arc::new(|| {}));

        assert!(!first.is_detached());
        assert!(!second.is_detached());
        assert_eq!(first.name(), Some("uniform-0"));
        assert_eq!(second.name(), Some("uniform-1"));
        assert_ne!(first.id(), second.id());

        first.start().expect("failed to spawn thread");
        second.start().expect("failed to spawn thread");
        first.join();
        second.join();

        assert_eq!(first.state(), ThreadState::Terminated);
        assert_eq!(second.state(), ThreadState::Terminated);
    }

    #[test]
    fn test_stack_size_and_priority_hints_are_applied() {
        let factory = ThreadFactory::new()
            .detached(false)
            .stack_size(128 * 1024)
            .priority(Priority::Low);
        let ran = Arc::new(Monitor::new(false));

        let task = {
            let ran = Arc::clone(&ran);
            move || {
                let mut ran = ran.lock();
                *ran = true;
                ran.notify_all();
            }
        };

        let mut thread = factory.new_thread(Arc::new(task));
        thread.start().expect("failed to spawn thread with an explicit stack size");
        thread.join();

        assert!(*ran.lock());
    }
}
