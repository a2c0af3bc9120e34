//! Transport trait definitions

use async_trait::async_trait;
use oscine_core::OscPacket;
use std::net::SocketAddr;

use crate::error::Result;

/// Something packets can be sent through.
#[async_trait]
pub trait PacketSink: Send + Sync {
    /// Serialize and send one packet. Fails closed if the encoded packet
    /// would exceed [`max_packet_size`](Self::max_packet_size).
    async fn send_packet(&self, packet: &OscPacket) -> Result<()>;

    /// The payload ceiling this sink enforces, in bytes.
    fn max_packet_size(&self) -> usize;
}

/// A stream of decoded packets with their source addresses.
#[async_trait]
pub trait PacketSource: Send {
    /// Receive the next packet, or `None` once the source is closed.
    async fn recv_packet(&mut self) -> Option<(OscPacket, SocketAddr)>;
}
