//! Wake-on-LAN magic packets

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::str::FromStr;

use tokio::net::UdpSocket;
use tracing::debug;

use crate::error::DeviceError;

/// UDP port conventionally used for magic packets
pub const WOL_PORT: u16 = 9;

/// Size of a magic packet: 6 sync bytes plus 16 copies of the address
pub const MAGIC_PACKET_LEN: usize = 6 + 16 * 6;

/// A 6-byte link-layer address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Build the magic packet that wakes this address
    pub fn magic_packet(&self) -> [u8; MAGIC_PACKET_LEN] {
        let mut packet = [0xFF; MAGIC_PACKET_LEN];
        for chunk in packet[6..].chunks_exact_mut(6) {
            chunk.copy_from_slice(&self.0);
        }
        packet
    }
}

impl FromStr for MacAddress {
    type Err = DeviceError;

    /// Accepts `aa:bb:cc:dd:ee:ff` and `aa-bb-cc-dd-ee-ff`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DeviceError::InvalidMac(s.to_string());
        let parts: Vec<&str> = s.trim().split([':', '-']).collect();
        if parts.len() != 6 {
            return Err(invalid());
        }

        let mut bytes = [0u8; 6];
        for (byte, part) in bytes.iter_mut().zip(parts) {
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// Send a magic packet for `mac`, normally to `<broadcast>:9`
pub async fn send_magic_packet(mac: MacAddress, target: SocketAddrV4) -> Result<(), DeviceError> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
    socket.set_broadcast(true)?;
    let sent = socket.send_to(&mac.magic_packet(), target).await?;
    debug!(%mac, %target, sent, "magic packet sent");
    Ok(())
}
