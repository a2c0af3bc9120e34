//! Packet object model
//!
//! OSC data is a tree: a packet is either a message (an address plus an
//! ordered argument list) or a bundle (a timetag plus nested packets).
//! Packets are plain data; all behavior beyond construction validation
//! lives in [`crate::codec`] and the dispatch layer.

use crate::time::TimeTag;
use crate::{Error, Result};

/// Characters reserved for pattern syntax. A literal message address must
/// not contain any of them; patterns belong in listener selectors.
const RESERVED_ADDRESS_CHARS: &[char] = &[' ', '#', '*', ',', '?', '[', ']', '{', '}'];

/// A single typed OSC argument.
///
/// Each variant maps to one type-tag character on the wire. `Bool` covers
/// both the `T` and `F` tags; `Nil` and `Impulse` carry no payload bytes
/// at all.
#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    /// 32-bit two's-complement integer (`i`)
    Int32(i32),
    /// IEEE-754 single-precision float (`f`)
    Float32(f32),
    /// IEEE-754 double-precision float (`d`)
    Float64(f64),
    /// 64-bit two's-complement integer (`h`)
    Int64(i64),
    /// NUL-terminated, 4-byte-padded string (`s`)
    Str(String),
    /// Length-prefixed, zero-padded byte blob (`b`)
    Blob(Vec<u8>),
    /// Boolean, encoded entirely in the tag (`T` / `F`)
    Bool(bool),
    /// Nil, encoded entirely in the tag (`N`)
    Nil,
    /// Impulse ("bang"), encoded entirely in the tag (`I`)
    Impulse,
}

impl OscArg {
    /// The type-tag character this argument contributes to the wire format.
    pub fn tag(&self) -> char {
        match self {
            OscArg::Int32(_) => 'i',
            OscArg::Float32(_) => 'f',
            OscArg::Float64(_) => 'd',
            OscArg::Int64(_) => 'h',
            OscArg::Str(_) => 's',
            OscArg::Blob(_) => 'b',
            OscArg::Bool(true) => 'T',
            OscArg::Bool(false) => 'F',
            OscArg::Nil => 'N',
            OscArg::Impulse => 'I',
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            OscArg::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            OscArg::Float32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OscArg::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            OscArg::Blob(b) => Some(b),
            _ => None,
        }
    }
}

impl From<i32> for OscArg {
    fn from(v: i32) -> Self {
        OscArg::Int32(v)
    }
}

impl From<f32> for OscArg {
    fn from(v: f32) -> Self {
        OscArg::Float32(v)
    }
}

impl From<f64> for OscArg {
    fn from(v: f64) -> Self {
        OscArg::Float64(v)
    }
}

impl From<i64> for OscArg {
    fn from(v: i64) -> Self {
        OscArg::Int64(v)
    }
}

impl From<&str> for OscArg {
    fn from(v: &str) -> Self {
        OscArg::Str(v.to_string())
    }
}

impl From<String> for OscArg {
    fn from(v: String) -> Self {
        OscArg::Str(v)
    }
}

impl From<bool> for OscArg {
    fn from(v: bool) -> Self {
        OscArg::Bool(v)
    }
}

impl From<Vec<u8>> for OscArg {
    fn from(v: Vec<u8>) -> Self {
        OscArg::Blob(v)
    }
}

/// An OSC message: a literal address plus an ordered argument list.
#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    address: String,
    args: Vec<OscArg>,
}

impl OscMessage {
    /// Create a message, validating the address.
    ///
    /// The address must be non-empty, start with `/`, and contain none of
    /// the pattern-reserved characters.
    pub fn new(address: impl Into<String>, args: Vec<OscArg>) -> Result<Self> {
        let address = address.into();
        validate_address(&address)?;
        Ok(Self { address, args })
    }

    /// Create a message with no arguments.
    pub fn bare(address: impl Into<String>) -> Result<Self> {
        Self::new(address, Vec::new())
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Arguments in send order. Order is significant and preserved.
    pub fn args(&self) -> &[OscArg] {
        &self.args
    }
}

/// An OSC bundle: a timetag plus nested packets in insertion order.
///
/// Bundles may nest to arbitrary depth; the only size bound is the
/// enclosing datagram. An empty bundle is valid.
#[derive(Debug, Clone, PartialEq)]
pub struct OscBundle {
    timetag: TimeTag,
    packets: Vec<OscPacket>,
}

impl OscBundle {
    pub fn new(timetag: TimeTag, packets: Vec<OscPacket>) -> Self {
        Self { timetag, packets }
    }

    /// An empty bundle dispatched as soon as possible.
    pub fn immediate() -> Self {
        Self::new(TimeTag::Immediate, Vec::new())
    }

    pub fn timetag(&self) -> TimeTag {
        self.timetag
    }

    /// Sub-packets in insertion order. Order affects immediate-mode
    /// dispatch order.
    pub fn packets(&self) -> &[OscPacket] {
        &self.packets
    }

    pub fn push(&mut self, packet: impl Into<OscPacket>) {
        self.packets.push(packet.into());
    }
}

/// A complete OSC packet: either a message or a bundle.
#[derive(Debug, Clone, PartialEq)]
pub enum OscPacket {
    Message(OscMessage),
    Bundle(OscBundle),
}

impl From<OscMessage> for OscPacket {
    fn from(msg: OscMessage) -> Self {
        OscPacket::Message(msg)
    }
}

impl From<OscBundle> for OscPacket {
    fn from(bundle: OscBundle) -> Self {
        OscPacket::Bundle(bundle)
    }
}

fn validate_address(address: &str) -> Result<()> {
    if address.is_empty() {
        return Err(Error::InvalidAddress("empty address".to_string()));
    }
    if !address.starts_with('/') {
        return Err(Error::InvalidAddress(format!(
            "address must start with '/': {address}"
        )));
    }
    if let Some(c) = address.chars().find(|c| RESERVED_ADDRESS_CHARS.contains(c)) {
        return Err(Error::InvalidAddress(format!(
            "address contains reserved character '{c}': {address}"
        )));
    }
    Ok(())
}
