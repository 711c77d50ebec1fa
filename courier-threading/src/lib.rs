//! # Courier Threading
//!
//! Blocking concurrency primitives used to build Courier's worker pools and
//! thread-per-task execution engines. The crate provides three collaborating
//! abstractions:
//!
//! - **[`Monitor`]**: a combined mutual-exclusion lock and condition variable with timed and
//!   untimed waits, single-wake and broadcast-wake notification.
//! - **[`Runnable`]** and **[`Thread`]**: a polymorphic unit of work bound to one OS thread,
//!   with a start/join lifecycle and detached or joinable disposal.
//! - **[`ThreadFactory`]**: uniform construction of threads under a configured policy
//!   (detached flag, stack size, priority, naming), surfacing OS resource exhaustion as a
//!   typed [`SpawnError`].
//!
//! ## Concurrency Model
//!
//! Threads are true OS-level threads and the monitor is the sole coordination primitive; there
//! are no lock-free structures and suspension happens only inside a wait. Timed waits observe
//! an "at least" contract: a timeout return never occurs before the requested duration has
//! fully elapsed, while overshoot on a busy host is expected and legal. Notifications wake
//! only threads that are already waiting; they are never stored for the future, so protocols
//! communicate through the monitor's guarded value and re-check it in a loop after every wake.
//!
//! There is no preemptive cancellation. A worker is asked to stop cooperatively, through
//! shared state plus a notification, and an uncooperative task cannot be terminated.
//!
//! ## Usage Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use courier_threading::{Monitor, ThreadFactory};
//!
//! let factory = ThreadFactory::new().detached(false);
//! let done = Arc::new(Monitor::new(false));
//!
//! let task = {
//!     let done = Arc::clone(&done);
//!     move || {
//!         let mut flag = done.lock();
//!         *flag = true;
//!         flag.notify_all();
//!     }
//! };
//!
//! let mut thread = factory.new_thread(Arc::new(task));
//! thread.start().expect("failed to spawn thread");
//!
//! let mut flag = done.lock();
//! flag.wait_while(|done| !*done);
//! drop(flag);
//!
//! thread.join();
//! ```
//!
//! ## Error Handling
//!
//! Failures come in three flavors with three different shapes. Resource exhaustion on spawn is
//! the recoverable [`SpawnError`]. A timed wait running out is not an error at all but the
//! [`WaitOutcome::TimedOut`] branch of a tagged result. Precondition violations - joining a
//! detached thread, joining or starting twice - are programmer errors and panic at the point
//! of misuse. The primitives themselves never log; reporting is left to the caller.

#![warn(missing_docs)]

mod error;
mod factory;
mod monitor;
mod runnable;
mod thread;

pub use self::error::*;
pub use self::factory::*;
pub use self::monitor::*;
pub use self::runnable::*;
pub use self::thread::*;
