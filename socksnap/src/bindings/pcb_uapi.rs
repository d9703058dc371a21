//! Layouts and constants of the BSD pcblist sysctl export, as described by
//! sys/sysctl.h, netinet/in_pcb.h, netinet/tcp_var.h and netinet/udp_var.h
//! (64-bit userspace view). Records come back as a chain of variable-length
//! entries, each prefixed by its own 32-bit byte length; only the fixed
//! prefix decoded below is layout-stable, the trailing part carries
//! per-socket data we don't consume.

use libc::c_int;

// Key path components selecting the "all TCP/UDP PCBs" tables in the
// kernel's network-control namespace.
pub(crate) const CTL_NET: c_int = 4;
pub(crate) const PF_INET: c_int = 2;
pub(crate) const IPPROTO_TCP: c_int = 6;
pub(crate) const IPPROTO_UDP: c_int = 17;
pub(crate) const TCPCTL_PCBLIST: c_int = 11;
pub(crate) const UDPCTL_PCBLIST: c_int = 5;

// inp_vflag bits.
pub(crate) const INP_IPV4: u8 = 0x1;
pub(crate) const INP_IPV6: u8 = 0x2;

/// Generation record opening a pcblist buffer. Also the minimum valid
/// record length: a chain entry declaring itself no longer than this
/// terminates the chain.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct xinpgen {
    /// Length of this structure.
    pub(crate) xig_len: u32,
    /// Number of PCBs at this generation.
    pub(crate) xig_count: u32,
    /// Generation count at this time.
    pub(crate) xig_gen: u64,
    /// Current socket generation count.
    pub(crate) xig_sogen: u64,
}

unsafe impl plain::Plain for xinpgen {}

/// Fixed prefix of an internet protocol control block as exported to
/// userspace. The address fields are 16-byte dependent unions; an IPv4
/// address sits in the trailing 4 bytes (v4-in-v6 mapping), an IPv6
/// address uses all 16. Ports are network byte order.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct inpcb {
    /// Hash chain linkage, opaque kernel pointers.
    pub(crate) inp_next: u64,
    pub(crate) inp_prev: u64,
    /// Generation count of this instance.
    pub(crate) inp_gencnt: u64,
    /// Generic IP/datagram flags.
    pub(crate) inp_flags: i32,
    /// IPv6 flow information.
    pub(crate) inp_flow: u32,
    /// INP_IPV4 / INP_IPV6.
    pub(crate) inp_vflag: u8,
    pub(crate) inp_ip_ttl: u8,
    pub(crate) inp_ip_p: u8,
    pub(crate) _inp_pad: u8,
    /// Foreign port, network byte order.
    pub(crate) inp_fport: u16,
    /// Local port, network byte order.
    pub(crate) inp_lport: u16,
    /// Foreign address, dependent union.
    pub(crate) inp_dependfaddr: [u8; 16],
    /// Local address, dependent union.
    pub(crate) inp_dependladdr: [u8; 16],
}

unsafe impl plain::Plain for inpcb {}

/// Fixed prefix of the TCP control block export; only read up to the
/// connection state.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct tcpcb {
    /// Segment reassembly queue head, opaque.
    pub(crate) t_segq: u64,
    /// Consecutive dup acks received.
    pub(crate) t_dupacks: i32,
    /// TCP timers.
    pub(crate) t_timer: [i32; 4],
    /// State of this connection (netinet/tcp_fsm.h).
    pub(crate) t_state: i32,
}

unsafe impl plain::Plain for tcpcb {}

/// One UDP entry in the pcblist chain.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct xinpcb {
    /// Declared length of this record, including trailing data.
    pub(crate) xi_len: u32,
    pub(crate) _xi_pad: u32,
    pub(crate) xi_inp: inpcb,
}

unsafe impl plain::Plain for xinpcb {}

/// One TCP entry in the pcblist chain.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct xtcpcb {
    /// Declared length of this record, including trailing data.
    pub(crate) xt_len: u32,
    pub(crate) _xt_pad: u32,
    pub(crate) xt_inp: inpcb,
    pub(crate) xt_tp: tcpcb,
}

unsafe impl plain::Plain for xtcpcb {}

#[cfg(test)]
mod tests {
    use std::mem;

    use super::*;

    // The decoder and the synthetic test buffers both rely on these; a
    // change in any of them is an ABI break.
    #[test]
    fn export_layout_sizes() {
        assert_eq!(mem::size_of::<xinpgen>(), 24);
        assert_eq!(mem::size_of::<inpcb>(), 72);
        assert_eq!(mem::size_of::<tcpcb>(), 32);
        assert_eq!(mem::size_of::<xinpcb>(), 80);
        assert_eq!(mem::size_of::<xtcpcb>(), 112);
    }
}
