//! Task-synchronization primitive

/// Opaque handle for an execution context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextId(usize);

impl ContextId {
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> usize {
        self.0
    }
}

/// Scheduler primitives consumed by the driver
///
/// The model is cooperative multi-tasking with interrupt preemption: the
/// calling task blocks in [`block_current`](Self::block_current) while the
/// completion handler signals it from interrupt context via
/// [`signal`](Self::signal).
pub trait TaskSync: Sync {
    /// Handle of the currently executing context
    fn current_context(&self) -> ContextId;

    /// Block the current context until signaled or `timeout_ms` elapses;
    /// returns `false` on timeout
    fn block_current(&self, timeout_ms: u32) -> bool;

    /// Wake a blocked context; must be safe to call from interrupt context
    fn signal(&self, ctx: ContextId);

    /// Busy-wait or sleep for `ms` milliseconds in task context
    fn delay_ms(&self, ms: u32);
}
