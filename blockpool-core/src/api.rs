//! The API of blockpool-core.

mod guarded;
mod pool;
mod provider;
mod scheduler;

pub use guarded::GuardedPool;
pub use pool::MemoryPool;
pub use provider::Provider;
pub use scheduler::{Critical, Scheduler, Timeout, WaitOutcome};
