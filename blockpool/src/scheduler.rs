//! Hosted Scheduler
//!
//! Binds the pool core to std threads. The critical section is a spin lock, the hosted stand-in for disabling
//! preemption; suspension is a per-waiter mutex and condvar pair; the wait queue is ordered by priority, FIFO among
//! equal priorities.

use std::{
    cell::{Cell, UnsafeCell},
    ptr::NonNull,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Condvar, Mutex,
    },
    thread,
    time::Instant,
};

use blockpool_core::{Scheduler, Timeout, WaitOutcome};

thread_local! {
    static PRIORITY: Cell<u8> = Cell::new(0);
}

/// Scheduler implementation for std threads.
///
/// Priorities are per-thread, default 0, and settable through `set_current_priority`; a `free` on a contended pool
/// wakes the highest-priority waiter, FIFO among equals.
pub struct HostedScheduler {
    lock: AtomicBool,
    sequence: AtomicU64,
}

impl HostedScheduler {
    /// Creates an instance.
    pub const fn new() -> Self {
        Self { lock: AtomicBool::new(false), sequence: AtomicU64::new(0), }
    }

    /// Sets the scheduling priority of the calling thread; higher priorities are woken first.
    pub fn set_current_priority(priority: u8) {
        PRIORITY.with(|p| p.set(priority));
    }
}

impl Default for HostedScheduler {
    fn default() -> Self { Self::new() }
}

impl Scheduler for HostedScheduler {
    type WaitQueue = WaitQueue;

    fn enter_critical(&self) {
        while self.lock.compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed).is_err() {
            thread::yield_now();
        }
    }

    fn exit_critical(&self) {
        self.lock.store(false, Ordering::Release);
    }

    fn suspend(&self, queue: &WaitQueue, timeout: Timeout) -> WaitOutcome {
        let deadline = match timeout {
            //  The pool reports exhaustion on immediate probes without calling in.
            Timeout::Immediate => {
                debug_assert!(false, "immediate probes must not suspend");
                return WaitOutcome::TimedOut;
            }
            Timeout::Bounded(duration) => Some(Instant::now() + duration),
            Timeout::Infinite => None,
        };

        let waiter = Arc::new(Waiter {
            priority: PRIORITY.with(|p| p.get()),
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
            state: Mutex::new(WaitState::Pending),
            condvar: Condvar::new(),
        });

        //  Safety:
        //  -   The critical section is held.
        unsafe { queue.entries() }.push(waiter.clone());

        //  The wait itself happens outside the critical section.
        self.exit_critical();

        let handed = waiter.wait(deadline);

        self.enter_critical();

        if let Some(address) = handed {
            return WaitOutcome::Woken(block_from(address));
        }

        //  Safety:
        //  -   The critical section is held.
        let entries = unsafe { queue.entries() };

        if let Some(index) = entries.iter().position(|entry| Arc::ptr_eq(entry, &waiter)) {
            entries.swap_remove(index);
            return WaitOutcome::TimedOut;
        }

        //  The timeout lost the race: a hand-off landed between the condvar expiring and the critical section being
        //  reacquired. The hand-off wins, and the block must be honored.
        let state = waiter.state.lock().unwrap();

        match *state {
            WaitState::Handed(address) => WaitOutcome::Woken(block_from(address)),
            WaitState::Pending => unreachable!("waiter removed from the queue without a hand-off"),
        }
    }

    fn wake_one(&self, queue: &WaitQueue, block: NonNull<u8>) -> Option<NonNull<u8>> {
        //  Safety:
        //  -   The critical section is held.
        let entries = unsafe { queue.entries() };

        //  Highest priority first, FIFO among equals.
        let index = entries.iter()
            .enumerate()
            .max_by_key(|(_, entry)| (entry.priority, std::cmp::Reverse(entry.sequence)))
            .map(|(index, _)| index);

        let index = match index {
            Some(index) => index,
            None => return Some(block),
        };

        let waiter = entries.swap_remove(index);

        *waiter.state.lock().unwrap() = WaitState::Handed(block.as_ptr() as usize);
        waiter.condvar.notify_one();

        None
    }
}

/// Wait queue of suspended threads.
///
/// The inner vector is only accessed while the scheduler's critical section is held; selection order is computed on
/// wake-up, so the storage order is irrelevant.
#[derive(Default)]
pub struct WaitQueue(UnsafeCell<Vec<Arc<Waiter>>>);

impl WaitQueue {
    //  #   Safety
    //
    //  -   Assumes the critical section is held for the duration of the borrow.
    #[allow(clippy::mut_from_ref)]
    unsafe fn entries(&self) -> &mut Vec<Arc<Waiter>> { &mut *self.0.get() }
}

//  Safety:
//  -   The inner vector is only accessed while the critical section is held, which is exclusive across threads.
unsafe impl Send for WaitQueue {}
unsafe impl Sync for WaitQueue {}

/// A suspended thread: its place in the wake-up order, and the channel the block is handed through.
pub struct Waiter {
    priority: u8,
    sequence: u64,
    state: Mutex<WaitState>,
    condvar: Condvar,
}

enum WaitState {
    Pending,
    Handed(usize),
}

impl Waiter {
    //  Blocks until a block is handed over, or the deadline passes; `None` waits forever.
    //
    //  Returns the address of the handed block, or `None` on expiry.
    fn wait(&self, deadline: Option<Instant>) -> Option<usize> {
        let mut state = self.state.lock().unwrap();

        loop {
            if let WaitState::Handed(address) = *state {
                return Some(address);
            }

            match deadline {
                None => state = self.condvar.wait(state).unwrap(),
                Some(deadline) => {
                    let now = Instant::now();

                    if now >= deadline {
                        return None;
                    }

                    let (guard, _) = self.condvar.wait_timeout(state, deadline - now).unwrap();
                    state = guard;
                }
            }
        }
    }
}

fn block_from(address: usize) -> NonNull<u8> {
    //  Safety:
    //  -   The address was produced from a `NonNull` by `wake_one`.
    unsafe { NonNull::new_unchecked(address as *mut u8) }
}

// mod tests
