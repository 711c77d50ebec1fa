/// A unit of work executed by exactly one [`Thread`](crate::Thread).
///
/// Implementors supply the [`run`](Runnable::run) entry point; any teardown logic belongs in
/// the implementor's [`Drop`], which runs when the last owner releases the task. For a detached
/// thread that owner is the worker itself, so teardown runs on the worker immediately after
/// `run` returns.
///
/// Tasks are shared with their thread through an `Arc`, so `run` takes `&self`; state that the
/// task mutates lives behind a [`Monitor`](crate::Monitor) or another synchronized container.
///
/// Closures can be used directly wherever a `Runnable` is expected:
///
/// ```rust
/// use std::sync::Arc;
///
/// use courier_threading::ThreadFactory;
///
/// let factory = ThreadFactory::new().detached(false);
/// let mut thread = factory.new_thread(Arc::new(|| {
///     // work
/// }));
/// thread.start().expect("failed to spawn thread");
/// thread.join();
/// ```
pub trait Runnable: Send + Sync {
    /// Executes the task to completion.
    fn run(&self);
}

impl<F> Runnable for F
where
    F: Fn() + Send + Sync,
{
    fn run(&self) {
        self()
    }
}
