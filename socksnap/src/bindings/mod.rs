//! # Bindings
//!
//! Hand-maintained layouts and constants mirroring the kernel's socket
//! table export headers.
#![allow(non_camel_case_types, non_upper_case_globals)]

pub(crate) mod pcb_uapi;
