use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// A listen or peer address.
///
/// Mirrors the original's two address shapes (`ServerAddress`, bind-only;
/// `FullAddress`, ip+port) rather than collapsing straight to
/// `std::net::SocketAddr`, so a listener bound to `0.0.0.0` can be printed
/// the way the original's `dump_self` did: as a bare port, not `0.0.0.0:N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    /// Bound on all interfaces; only the port is meaningful.
    Port(u16),
    /// A concrete ip:port, as seen on an accepted peer or an explicit bind.
    Full(SocketAddr),
}

impl Address {
    pub fn port(port: u16) -> Address {
        Address::Port(port)
    }

    pub fn new(ip: IpAddr, port: u16) -> Address {
        Address::Full(SocketAddr::new(ip, port))
    }

    /// The concrete socket address to bind/connect to.
    pub fn to_socket_addr(self) -> SocketAddr {
        match self {
            Address::Port(port) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
            Address::Full(addr) => addr,
        }
    }
}

impl From<SocketAddr> for Address {
    fn from(addr: SocketAddr) -> Address {
        Address::Full(addr)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Port(port) => write!(f, ":{port}"),
            Address::Full(addr) => write!(f, "{addr}"),
        }
    }
}
