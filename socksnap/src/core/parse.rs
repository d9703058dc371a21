//! Handles the walk over a raw PCB table buffer and the unmarshaling of
//! its records into socket events.
//!
//! The buffer is a chain of self-describing records: each starts with its
//! own 32-bit byte length and record sizes vary, as kernel socket
//! structures carry variable trailing data. The length prefix is the only
//! reliable boundary signal, so the walk is driven by it exclusively,
//! never by a fixed stride.

use std::{
    mem,
    net::{IpAddr, Ipv4Addr},
};

use byteorder::{ByteOrder, NativeEndian};
use log::warn;

use crate::{
    bindings::pcb_uapi::*,
    events::{Endpoint, Protocol, SocketEvent, TcpState},
};

/// Read a record length prefix at `offset`, if the buffer still holds one.
fn read_len(buf: &[u8], offset: usize) -> Option<usize> {
    let end = offset.checked_add(mem::size_of::<u32>())?;
    if end > buf.len() {
        return None;
    }
    Some(NativeEndian::read_u32(&buf[offset..end]) as usize)
}

/// Single-pass iterator over the record spans of one PCB table buffer.
///
/// The first record is a generation header, not a socket record; it is
/// skipped by its own declared length. The chain ends on the kernel's
/// normal termination marker (a record no longer than the generation
/// header) or on a span that would cross the buffer end. The latter never
/// happens with well-formed input but is indistinguishable from an
/// intentionally short trailing record, so it terminates the walk rather
/// than erroring.
pub(crate) struct RecordChain<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> RecordChain<'a> {
    const MIN_RECORD: usize = mem::size_of::<xinpgen>();

    pub(crate) fn new(buf: &'a [u8]) -> Self {
        let offset = read_len(buf, 0).unwrap_or(buf.len());
        Self { buf, offset }
    }
}

impl<'a> Iterator for RecordChain<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let len = read_len(self.buf, self.offset)?;
        if len <= Self::MIN_RECORD {
            return None;
        }

        let end = self.offset.checked_add(len)?;
        if end > self.buf.len() {
            return None;
        }

        let span = &self.buf[self.offset..end];
        self.offset = end;
        Some(span)
    }
}

/// Decode one record span into a socket event. Spans shorter than the
/// fixed export prefix are skipped.
pub(crate) fn decode_pcb(span: &[u8], protocol: Protocol) -> Option<SocketEvent> {
    let (inp, state) = match protocol {
        Protocol::Tcp => {
            let mut xt = xtcpcb::default();
            if plain::copy_from_bytes(&mut xt, span).is_err() {
                warn!("Skipping short TCP record ({} bytes)", span.len());
                return None;
            }
            (xt.xt_inp, Some(TcpState(xt.xt_tp.t_state)))
        }
        Protocol::Udp => {
            let mut xi = xinpcb::default();
            if plain::copy_from_bytes(&mut xi, span).is_err() {
                warn!("Skipping short UDP record ({} bytes)", span.len());
                return None;
            }
            (xi.xi_inp, None)
        }
    };

    Some(SocketEvent {
        protocol,
        local: endpoint(&inp, &inp.inp_dependladdr, inp.inp_lport),
        remote: endpoint(&inp, &inp.inp_dependfaddr, inp.inp_fport),
        state,
    })
}

/// Build an endpoint from a dependent address union and a network-order
/// port. A record flagging neither IPv4 nor IPv6 keeps an unset address;
/// this matches the kernel leaving the fields untouched and is not an
/// error.
fn endpoint(inp: &inpcb, raw: &[u8; 16], port: u16) -> Endpoint {
    let addr = if inp.inp_vflag & INP_IPV4 != 0 {
        // v4-in-v6 mapping: the address sits in the trailing 4 bytes.
        Some(IpAddr::from(Ipv4Addr::new(raw[12], raw[13], raw[14], raw[15])))
    } else if inp.inp_vflag & INP_IPV6 != 0 {
        Some(IpAddr::from(*raw))
    } else {
        None
    };

    Endpoint::new(addr, u16::from_be(port))
}

/// Decode a full PCB table buffer, preserving the kernel's record order.
pub(crate) fn decode_table(buf: &[u8], protocol: Protocol) -> Vec<SocketEvent> {
    RecordChain::new(buf)
        .filter_map(|span| decode_pcb(span, protocol))
        .collect()
}
