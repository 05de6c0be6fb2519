//! The internals of blockpool-core.

pub mod free_list;
