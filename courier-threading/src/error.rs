use std::io;

use thiserror::Error;

/// The operating system refused to create a new thread.
///
/// Raised by [`Thread::start`](crate::Thread::start) when the OS is out of thread resources.
/// This is a recoverable, reportable condition: the thread remains not started, its task is
/// retained, and already-running threads are unaffected. Callers are expected to report the
/// failure and decide whether to retry, back off, or abort the batch - never to swallow it
/// silently, since it indicates the process is at its thread capacity.
#[derive(Debug, Error)]
#[error("failed to spawn thread{}: {source}", display_name(.thread_name))]
pub struct SpawnError {
    thread_name: Option<String>,
    #[source]
    source: io::Error,
}

impl SpawnError {
    pub(crate) fn new(thread_name: Option<String>, source: io::Error) -> Self {
        Self {
            thread_name,
            source,
        }
    }

    /// Returns the name the thread would have carried, if one was configured.
    pub fn thread_name(&self) -> Option<&str> {
        self.thread_name.as_deref()
    }

    /// Returns the OS error kind behind the failure.
    pub fn kind(&self) -> io::ErrorKind {
        self.source.kind()
    }
}

fn display_name(thread_name: &Option<String>) -> String {
    match thread_name {
        Some(name) => format!(" `{name}`"),
        None => String::new(),
    }
}
