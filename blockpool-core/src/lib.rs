#![no_std]

#![deny(missing_docs)]

//! Building blocks for a deterministic fixed-block memory pool.
//!
//! blockpool-core provides allocation-free, O(1) management of caller-supplied fixed-size memory blocks. It contains:
//! -   A growth provider trait, used to request one more block when the pool runs dry.
//! -   A basic pool, whose operations never suspend the caller.
//! -   A guarded pool, which layers priority-respecting, timeout-bounded waits on top of the basic pool, delegating
//!     all thread suspension to a scheduler trait supplied by the surrounding kernel.

mod api;
mod internals;
mod utils;

pub use api::*;
