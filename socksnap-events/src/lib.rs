//! # Socksnap events
//!
//! This crate contains the definitions of the types making up a socket
//! snapshot as well as the helpers formatting them for the wire and for
//! human consumption.

pub mod socket;
pub use socket::*;
