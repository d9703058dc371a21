//! # Collect
//!
//! Snapshot reporter: drives the query/decode pipeline at a fixed cadence
//! and writes the resulting batches to the output sink.

#[allow(clippy::module_inception)]
mod collect;
pub(crate) use collect::*;
mod display;
pub(crate) use display::*;
