//! # Helpers
//!
//! Helper utilities not strictly part of the snapshot pipeline: process
//! lifecycle, logging and signal handling.

pub(crate) mod daemon;
pub(crate) mod logger;
pub(crate) mod signals;
