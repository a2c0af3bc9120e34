//! Oscine Core
//!
//! Core types, binary codec, and address matching for Open Sound Control
//! (OSC 1.0).
//!
//! This crate provides:
//! - The packet object model ([`OscPacket`], [`OscMessage`], [`OscBundle`],
//!   [`OscArg`])
//! - Binary packet encoding/decoding ([`codec`], [`wire`])
//! - Address patterns and wildcard matching ([`Pattern`])
//! - NTP-style timetag handling ([`TimeTag`])
//!
//! Everything here is pure and synchronous: decoding, encoding, and pattern
//! matching can run concurrently from any number of threads as long as each
//! call works on its own buffer.

pub mod address;
pub mod codec;
pub mod error;
pub mod time;
pub mod types;
pub mod wire;

pub use address::Pattern;
pub use codec::{decode, encode};
pub use error::{Error, Result};
pub use time::{NtpTime, TimeTag};
pub use types::{OscArg, OscBundle, OscMessage, OscPacket};

/// Maximum outbound payload in bytes (the maximum UDP datagram payload).
pub const MAX_DATAGRAM_SIZE: usize = 65507;

/// Port on which a SuperCollider synthesis server listens by default.
pub const DEFAULT_SC_OSC_PORT: u16 = 57110;

/// Port on which the SuperCollider language interpreter listens by default.
pub const DEFAULT_SC_LANG_OSC_PORT: u16 = 57120;

/// The eight-byte literal that opens every bundle on the wire.
pub const BUNDLE_TAG: &[u8; 8] = b"#bundle\0";
