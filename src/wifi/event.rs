//! Notifications delivered by the network stack.

use std::fmt;
use std::net::Ipv4Addr;

/// Hardware address of a peer, printed as `aa:bb:cc:dd:ee:ff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MacAddr(pub [u8; 6]);

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a, b, c, d, e, g
        )
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

/// Events the connection manager reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiEvent {
    /// Station interface is up and ready to associate.
    StationStarted,
    /// Station lost (or never got) its association.
    StationDisconnected,
    /// DHCP assigned an address to the station interface.
    GotIp(Ipv4Addr),
    /// A client associated with our soft AP.
    ClientJoined { mac: MacAddr, aid: u16 },
    /// A client left our soft AP.
    ClientLeft { mac: MacAddr, aid: u16 },
}

impl WifiEvent {
    /// True for events that only concern the soft AP role.
    pub fn is_access_point_event(&self) -> bool {
        matches!(self, Self::ClientJoined { .. } | Self::ClientLeft { .. })
    }
}

impl fmt::Display for WifiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StationStarted => write!(f, "station started"),
            Self::StationDisconnected => write!(f, "station disconnected"),
            Self::GotIp(ip) => write!(f, "got ip {}", ip),
            Self::ClientJoined { mac, aid } => write!(f, "station {} join, AID={}", mac, aid),
            Self::ClientLeft { mac, aid } => write!(f, "station {} leave, AID={}", mac, aid),
        }
    }
}
