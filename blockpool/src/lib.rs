#![deny(missing_docs)]

//! A deterministic fixed-block memory pool, bound to hosted (std) threads.
//!
//! The core pool logic lives in blockpool-core and is scheduler-agnostic; this crate supplies `HostedScheduler`, an
//! implementation of the core's Scheduler trait over std synchronization primitives, suitable for tests, tooling, and
//! hosted targets.

mod scheduler;

pub use blockpool_core::{Critical, GuardedPool, MemoryPool, Provider, Scheduler, Timeout, WaitOutcome};
pub use scheduler::HostedScheduler;

/// A guarded pool driven by the hosted scheduler.
pub type HostedPool<'a> = GuardedPool<'a, HostedScheduler>;
