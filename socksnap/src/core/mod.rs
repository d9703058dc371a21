//! # Core
//!
//! Decoding pipeline turning a kernel socket table query into socket
//! events: the sysctl query client and the record chain parser.

pub(crate) mod parse;
pub(crate) mod sysctl;
