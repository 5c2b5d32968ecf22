//! Cooperative handoff to the host runtime.
//!
//! A host with its own scheduler (a runtime lock, green threads, fibers) lets
//! other work run while this crate is parked on the platform connection. The
//! handoff is a bracket: release before suspending, reacquire after. No thread
//! is created and only one side issues platform/GPU calls at a time.

/// Host-side scheduling hooks.
pub trait HostScheduler {
    /// Gives up host scheduling control before a suspending call.
    fn release(&self);

    /// Takes host scheduling control back after the call returns.
    fn acquire(&self);
}

/// Host without a scheduler of its own; both hooks do nothing.
#[derive(Debug, Default, Copy, Clone)]
pub struct Unmanaged;

impl HostScheduler for Unmanaged {
    fn release(&self) {}
    fn acquire(&self) {}
}

/// Reacquires on drop so an unwinding `f` still hands control back.
struct Released<'h> {
    host: &'h dyn HostScheduler,
}

impl Drop for Released<'_> {
    fn drop(&mut self) {
        self.host.acquire();
    }
}

/// Runs `f` with host scheduling control released.
pub fn blocking_section<R>(host: &dyn HostScheduler, f: impl FnOnce() -> R) -> R {
    host.release();
    let _released = Released { host };
    f()
}
