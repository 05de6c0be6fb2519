//! Scheduler
//!
//! The pool core never suspends a thread itself: the Scheduler trait abstracts the surrounding kernel's critical
//! section, blocking, wake-up and timeout primitives, so the guarded pool's logic is testable without a real
//! preemptive kernel.

use core::{ptr::NonNull, time::Duration};

/// How long a guarded allocation is willing to wait for a block.
///
/// `Immediate` and `Infinite` are distinguished sentinel values, not measured durations.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Timeout {
    /// Probes the pool without ever suspending; exhaustion is reported immediately.
    Immediate,
    /// Suspends up to the given duration, measured against the scheduler's monotonic time source.
    Bounded(Duration),
    /// Suspends until a block is handed over, however long that takes.
    Infinite,
}

/// The outcome of a suspension.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WaitOutcome {
    /// A `free` handed this block directly to the waiter.
    Woken(NonNull<u8>),
    /// The wait interval elapsed; the waiter was removed from the queue.
    TimedOut,
}

/// Abstraction of the surrounding kernel's scheduling primitives.
pub trait Scheduler {
    /// The queue of suspended threads, ordered by the scheduler's policy: highest priority first, FIFO among equal
    /// priorities.
    ///
    /// The pool treats the queue as opaque; only the scheduler inspects it, and only within the critical section.
    type WaitQueue: Default;

    /// Enters the critical section.
    ///
    /// The critical section is brief and non-reentrant; pool operations hold it for the duration of a list or queue
    /// mutation only, never across a suspension point.
    fn enter_critical(&self);

    /// Leaves the critical section.
    fn exit_critical(&self);

    /// Suspends the calling thread on `queue` until a block is handed over or `timeout` elapses, whichever happens
    /// first.
    ///
    /// At most one of the two wake paths wins: a thread already removed from the queue by one path is never removed
    /// or woken again by the other.
    ///
    /// #   Contract
    ///
    /// -   Called with the critical section held; the scheduler releases it for the duration of the wait and
    ///     reacquires it before returning.
    /// -   Never called with `Timeout::Immediate`; the pool reports exhaustion without suspending instead.
    fn suspend(&self, queue: &Self::WaitQueue, timeout: Timeout) -> WaitOutcome;

    /// Hands `block` to the first waiter on `queue`, by the scheduler's ordering policy, and marks it runnable.
    ///
    /// Returns the block back if the queue had no waiter to consume it.
    ///
    /// #   Contract
    ///
    /// -   Called with the critical section held.
    fn wake_one(&self, queue: &Self::WaitQueue, block: NonNull<u8>) -> Option<NonNull<u8>>;
}

/// RAII guard over a scheduler's critical section: entered on construction, left on drop.
#[must_use = "if unused the critical section is left immediately"]
pub struct Critical<'a, S: Scheduler + ?Sized>(&'a S);

impl<'a, S: Scheduler + ?Sized> Critical<'a, S> {
    /// Enters the critical section for the lifetime of the guard.
    pub fn new(scheduler: &'a S) -> Self {
        scheduler.enter_critical();
        Self(scheduler)
    }
}

impl<'a, S: Scheduler + ?Sized> Drop for Critical<'a, S> {
    fn drop(&mut self) { self.0.exit_critical(); }
}
