//! Oscine Transport
//!
//! The UDP boundary of the codec and dispatcher: a bound socket that
//! serializes outbound packets under the datagram payload ceiling, and a
//! cancellable receive loop that decodes each incoming datagram and hands
//! it to a [`PacketDispatcher`](oscine_dispatch::PacketDispatcher).
//!
//! A malformed datagram is a per-packet error: it is logged and dropped,
//! and the loop keeps receiving. Stopping the loop flips a watch signal
//! the loop selects on alongside the socket, so a pending receive is
//! unblocked instead of waiting for one more packet.

pub mod error;
pub mod traits;
pub mod udp;

pub use error::{Result, TransportError};
pub use traits::{PacketSink, PacketSource};
pub use udp::{OscSender, PacketReceiver, ReceiverHandle, UdpConfig, UdpEndpoint};
