use std::{fmt, net::IpAddr};

use serde::{Serialize, Serializer};

/// Transport protocol a socket entry belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "TCP"),
            Protocol::Udp => write!(f, "UDP"),
        }
    }
}

/// One side of a socket, as decoded from a kernel protocol control block.
///
/// `addr` is `None` when the kernel record did not flag a known address
/// family; such endpoints display with an empty address part, keeping the
/// kernel behavior of leaving both fields unset.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Endpoint {
    pub addr: Option<IpAddr>,
    /// Host byte order.
    pub port: u16,
}

impl Endpoint {
    pub fn new(addr: Option<IpAddr>, port: u16) -> Self {
        Self { addr, port }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.addr {
            Some(addr) => write!(f, "{}:{}", addr, self.port),
            None => write!(f, ":{}", self.port),
        }
    }
}

impl Serialize for Endpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Labels for the TCP connection states, indexed by the kernel state code
/// (netinet/tcp_fsm.h).
static TCP_STATES: [&str; 11] = [
    "CLOSED",
    "LISTEN",
    "SYN_SENT",
    "SYN_RECEIVED",
    "ESTABLISHED",
    "CLOSE_WAIT",
    "FIN_WAIT_1",
    "CLOSING",
    "LAST_ACK",
    "FIN_WAIT_2",
    "TIME_WAIT",
];

/// A raw TCP connection-state code. Codes outside the known range are kept
/// as-is and label as `UNKNOWN`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TcpState(pub i32);

impl TcpState {
    pub fn label(&self) -> &'static str {
        usize::try_from(self.0)
            .ok()
            .and_then(|code| TCP_STATES.get(code))
            .copied()
            .unwrap_or("UNKNOWN")
    }
}

impl fmt::Display for TcpState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for TcpState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One decoded entry from a kernel socket table. Built once per raw record
/// and discarded after formatting; snapshots do not persist across ticks.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SocketEvent {
    pub protocol: Protocol,
    pub local: Endpoint,
    pub remote: Endpoint,
    /// Connection state, TCP only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<TcpState>,
}

impl fmt::Display for SocketEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{},{}", self.protocol, self.local, self.remote)?;

        if let Some(state) = &self.state {
            write!(f, ",{state}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use test_case::test_case;

    use super::*;

    #[test_case(0, "CLOSED")]
    #[test_case(1, "LISTEN")]
    #[test_case(2, "SYN_SENT")]
    #[test_case(3, "SYN_RECEIVED")]
    #[test_case(4, "ESTABLISHED")]
    #[test_case(5, "CLOSE_WAIT")]
    #[test_case(6, "FIN_WAIT_1")]
    #[test_case(7, "CLOSING")]
    #[test_case(8, "LAST_ACK")]
    #[test_case(9, "FIN_WAIT_2")]
    #[test_case(10, "TIME_WAIT")]
    #[test_case(11, "UNKNOWN")]
    #[test_case(255, "UNKNOWN")]
    #[test_case(-1, "UNKNOWN")]
    fn tcp_state_labels(code: i32, label: &str) {
        assert_eq!(TcpState(code).label(), label);
    }

    #[test]
    fn endpoint_to_string() {
        let v4 = Endpoint::new(Some(Ipv4Addr::new(192, 168, 0, 1).into()), 80);
        assert_eq!(v4.to_string(), "192.168.0.1:80");

        let v6 = Endpoint::new(Some(Ipv6Addr::LOCALHOST.into()), 443);
        assert_eq!(v6.to_string(), "::1:443");

        // Unknown address family: empty address part.
        assert_eq!(Endpoint::new(None, 53).to_string(), ":53");
    }

    #[test]
    fn event_to_string() {
        let event = SocketEvent {
            protocol: Protocol::Tcp,
            local: Endpoint::new(Some(Ipv4Addr::new(10, 0, 0, 1).into()), 22),
            remote: Endpoint::new(Some(Ipv4Addr::new(10, 0, 0, 2).into()), 51234),
            state: Some(TcpState(4)),
        };
        assert_eq!(event.to_string(), "TCP,10.0.0.1:22,10.0.0.2:51234,ESTABLISHED");

        let event = SocketEvent {
            protocol: Protocol::Udp,
            local: Endpoint::new(Some(Ipv4Addr::UNSPECIFIED.into()), 5353),
            remote: Endpoint::new(Some(Ipv4Addr::UNSPECIFIED.into()), 0),
            state: None,
        };
        assert_eq!(event.to_string(), "UDP,0.0.0.0:5353,0.0.0.0:0");
    }
}
