use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

/// A combined mutual exclusion lock and condition variable guarding a value.
///
/// [`Monitor`] is the coordination primitive for all synchronized state transitions in this
/// crate. It owns a lock around a value of type `T` together with a wait queue, so that threads
/// can block until another thread changes the value and announces the change.
///
/// Acquiring the lock yields a [`MonitorGuard`], and waiting and notifying are only possible
/// through that guard. This makes the classic monitor discipline - wait and notify only while
/// holding the lock - impossible to violate.
///
/// A monitor is typically shared between threads through an [`Arc`]:
///
/// ```rust
/// use std::sync::Arc;
/// use std::thread;
///
/// use courier_threading::Monitor;
///
/// let ready = Arc::new(Monitor::new(false));
///
/// let worker = {
///     let ready = Arc::clone(&ready);
///     thread::spawn(move || {
///         let mut flag = ready.lock();
///         *flag = true;
///         flag.notify_one();
///     })
/// };
///
/// let mut flag = ready.lock();
/// flag.wait_while(|ready| !*ready);
/// drop(flag);
///
/// worker.join().unwrap();
/// ```
///
/// Notifications are not stored: notifying while no thread is waiting is a no-op. Protocols
/// built on a monitor therefore communicate through the guarded value and treat the wait queue
/// purely as a wake-up channel, re-checking the value in a loop after every wake.
#[derive(Debug)]
pub struct Monitor<T = ()> {
    lock: Arc<Mutex<T>>,
    cond: Condvar,
}

impl<T> Monitor<T> {
    /// Creates a monitor guarding `value` with a fresh lock.
    pub fn new(value: T) -> Self {
        Self {
            lock: Arc::new(Mutex::new(value)),
            cond: Condvar::new(),
        }
    }

    /// Creates a monitor on top of an externally supplied lock.
    ///
    /// Multiple monitors may share one lock while keeping separate wait queues, which allows
    /// distinct conditions over the same guarded state.
    pub fn with_lock(lock: Arc<Mutex<T>>) -> Self {
        Self {
            lock,
            cond: Condvar::new(),
        }
    }

    /// Acquires the lock, blocking until it is available.
    ///
    /// The returned guard releases the lock when dropped, on every exit path.
    pub fn lock(&self) -> MonitorGuard<'_, T> {
        MonitorGuard {
            cond: &self.cond,
            inner: self.lock.lock(),
        }
    }
}

impl<T: Default> Default for Monitor<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// The outcome of a timed wait on a [`Monitor`].
///
/// A timeout is an expected branch of control flow, not an error: callers decide in their wait
/// loop whether to keep waiting, give up, or act on the state they can now observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use = "a timed wait may have timed out; check the outcome"]
pub enum WaitOutcome {
    /// The wait ended because the monitor was notified.
    Notified,
    /// The requested duration fully elapsed without a notification.
    TimedOut,
}

impl WaitOutcome {
    /// Returns `true` if the wait ended by timeout rather than notification.
    pub fn timed_out(self) -> bool {
        matches!(self, WaitOutcome::TimedOut)
    }
}

/// Scoped ownership of a [`Monitor`]'s lock.
///
/// Dereferences to the guarded value. All waiting and notification goes through this guard,
/// which guarantees the lock is held for the duration of the call; `wait` atomically releases
/// the lock while blocked and reacquires it before returning.
pub struct MonitorGuard<'a, T> {
    cond: &'a Condvar,
    inner: MutexGuard<'a, T>,
}

impl<T> MonitorGuard<'_, T> {
    /// Blocks the current thread until the monitor is notified.
    ///
    /// The lock is released while blocked and reacquired before this returns. Callers must
    /// re-check their condition afterwards; [`wait_while`](Self::wait_while) encodes that loop.
    pub fn wait(&mut self) {
        self.cond.wait(&mut self.inner);
    }

    /// Blocks until the monitor is notified or `timeout` has elapsed, whichever comes first.
    ///
    /// A [`WaitOutcome::TimedOut`] return never occurs before the full `timeout` has elapsed.
    /// The converse bound does not hold: on a busy host the wait may overshoot the requested
    /// duration arbitrarily. A zero `timeout` degenerates to an immediate timed-out check.
    pub fn wait_for(&mut self, timeout: Duration) -> WaitOutcome {
        let deadline = Instant::now() + timeout;
        if self.cond.wait_until(&mut self.inner, deadline).timed_out() {
            WaitOutcome::TimedOut
        } else {
            WaitOutcome::Notified
        }
    }

    /// Waits until `condition` returns `false` for the guarded value.
    ///
    /// The condition is checked before the first wait and after every wake.
    pub fn wait_while<F>(&mut self, mut condition: F)
    where
        F: FnMut(&T) -> bool,
    {
        while condition(&self.inner) {
            self.cond.wait(&mut self.inner);
        }
    }

    /// Waits until `condition` returns `false` or `timeout` has elapsed.
    ///
    /// Returns [`WaitOutcome::TimedOut`] only if the deadline passed while the condition still
    /// held; a condition that clears exactly at the deadline counts as notified.
    pub fn wait_while_for<F>(&mut self, mut condition: F, timeout: Duration) -> WaitOutcome
    where
        F: FnMut(&T) -> bool,
    {
        let deadline = Instant::now() + timeout;
        while condition(&self.inner) {
            if self.cond.wait_until(&mut self.inner, deadline).timed_out() {
                return if condition(&self.inner) {
                    WaitOutcome::TimedOut
                } else {
                    WaitOutcome::Notified
                };
            }
        }
        WaitOutcome::Notified
    }

    /// Wakes at most one thread currently waiting on this monitor.
    ///
    /// Returns whether a thread was woken. Which waiter wakes is unspecified. Notifying with
    /// no waiter present is a no-op; the notification is not stored for future waits.
    pub fn notify_one(&self) -> bool {
        self.cond.notify_one()
    }

    /// Wakes every thread currently waiting on this monitor, returning how many were woken.
    pub fn notify_all(&self) -> usize {
        self.cond.notify_all()
    }
}

impl<T> Deref for MonitorGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> DerefMut for MonitorGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}
