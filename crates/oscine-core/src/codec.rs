//! OSC binary codec
//!
//! Converts between raw datagram bytes and the packet object model. The
//! first byte discriminates: `/` opens a message, `#` (the `#bundle`
//! literal) opens a bundle. Bundles nest recursively via 4-byte
//! size-prefixed elements.
//!
//! Decoding is non-streaming: it operates on the full datagram already
//! buffered by the transport, never reads past the declared length, and
//! tolerates trailing padding after the last consumed field.

use bytes::Bytes;

use crate::types::{OscArg, OscBundle, OscMessage, OscPacket};
use crate::wire::{blob_padded_len, str_padded_len, WireReader, WireWriter};
use crate::{Error, Result, BUNDLE_TAG};

/// Decode one packet from a datagram.
pub fn decode(bytes: &[u8]) -> Result<OscPacket> {
    let mut reader = WireReader::new(bytes);
    match reader.peek() {
        None => Err(Error::BufferUnderrun {
            offset: 0,
            needed: 1,
            have: 0,
        }),
        Some(b'/') => Ok(OscPacket::Message(decode_message(&mut reader)?)),
        Some(b'#') => Ok(OscPacket::Bundle(decode_bundle(&mut reader)?)),
        Some(other) => Err(Error::UnrecognizedPacketStart(other)),
    }
}

/// Encode a packet, failing closed if the result would exceed `max_size`.
///
/// The exact encoded size is computed up front, so an oversized packet is
/// rejected before any output is produced — it is never truncated or
/// split.
pub fn encode(packet: &OscPacket, max_size: usize) -> Result<Bytes> {
    let size = encoded_size(packet);
    if size > max_size {
        return Err(Error::PayloadTooLarge {
            size,
            max: max_size,
        });
    }
    let mut writer = WireWriter::with_capacity(size);
    encode_packet(&mut writer, packet)?;
    debug_assert_eq!(writer.len(), size);
    Ok(writer.into_bytes())
}

/// Exact number of bytes `packet` occupies on the wire.
pub fn encoded_size(packet: &OscPacket) -> usize {
    match packet {
        OscPacket::Message(msg) => {
            let tags = str_padded_len(1 + msg.args().len());
            let args: usize = msg.args().iter().map(arg_size).sum();
            str_padded_len(msg.address().len()) + tags + args
        }
        OscPacket::Bundle(bundle) => {
            let elements: usize = bundle
                .packets()
                .iter()
                .map(|p| 4 + encoded_size(p))
                .sum();
            BUNDLE_TAG.len() + 8 + elements
        }
    }
}

fn arg_size(arg: &OscArg) -> usize {
    match arg {
        OscArg::Int32(_) | OscArg::Float32(_) => 4,
        OscArg::Int64(_) | OscArg::Float64(_) => 8,
        OscArg::Str(s) => str_padded_len(s.len()),
        OscArg::Blob(b) => blob_padded_len(b.len()),
        OscArg::Bool(_) | OscArg::Nil | OscArg::Impulse => 0,
    }
}

fn decode_message(reader: &mut WireReader) -> Result<OscMessage> {
    let address = reader.read_str()?;
    // Old SuperCollider-style senders omit the type-tag string entirely.
    if reader.is_empty() {
        return OscMessage::new(address, Vec::new());
    }
    let tags = reader.read_str()?;
    let mut args = Vec::new();
    if let Some(tags) = tags.strip_prefix(',') {
        args.reserve(tags.len());
        for tag in tags.chars() {
            args.push(decode_arg(reader, tag)?);
        }
    }
    OscMessage::new(address, args)
}

fn decode_arg(reader: &mut WireReader, tag: char) -> Result<OscArg> {
    match tag {
        'i' => Ok(OscArg::Int32(reader.read_i32()?)),
        'f' => Ok(OscArg::Float32(reader.read_f32()?)),
        'd' => Ok(OscArg::Float64(reader.read_f64()?)),
        'h' => Ok(OscArg::Int64(reader.read_i64()?)),
        's' => Ok(OscArg::Str(reader.read_str()?)),
        'b' => Ok(OscArg::Blob(reader.read_blob()?)),
        'T' => Ok(OscArg::Bool(true)),
        'F' => Ok(OscArg::Bool(false)),
        'N' => Ok(OscArg::Nil),
        'I' => Ok(OscArg::Impulse),
        other => Err(Error::UnsupportedArgumentType(other)),
    }
}

fn decode_bundle(reader: &mut WireReader) -> Result<OscBundle> {
    let header = reader.take(BUNDLE_TAG.len())?;
    if header != BUNDLE_TAG {
        return Err(Error::UnrecognizedPacketStart(header[0]));
    }
    let timetag = reader.read_timetag()?;

    let mut packets = Vec::new();
    while reader.remaining() >= 4 {
        let size = reader.read_u32()? as usize;
        if size == 0 {
            // Zero-padded tail of the datagram, not an element.
            break;
        }
        let element = reader.take(size)?;
        packets.push(decode(element)?);
    }
    Ok(OscBundle::new(timetag, packets))
}

fn encode_packet(writer: &mut WireWriter, packet: &OscPacket) -> Result<()> {
    match packet {
        OscPacket::Message(msg) => encode_message(writer, msg),
        OscPacket::Bundle(bundle) => encode_bundle(writer, bundle),
    }
}

fn encode_message(writer: &mut WireWriter, msg: &OscMessage) -> Result<()> {
    writer.write_str(msg.address())?;

    let mut tags = String::with_capacity(1 + msg.args().len());
    tags.push(',');
    for arg in msg.args() {
        tags.push(arg.tag());
    }
    writer.write_str(&tags)?;

    for arg in msg.args() {
        encode_arg(writer, arg)?;
    }
    Ok(())
}

fn encode_arg(writer: &mut WireWriter, arg: &OscArg) -> Result<()> {
    match arg {
        OscArg::Int32(v) => writer.write_i32(*v),
        OscArg::Float32(v) => writer.write_f32(*v),
        OscArg::Float64(v) => writer.write_f64(*v),
        OscArg::Int64(v) => writer.write_i64(*v),
        OscArg::Str(s) => writer.write_str(s)?,
        OscArg::Blob(b) => writer.write_blob(b),
        OscArg::Bool(_) | OscArg::Nil | OscArg::Impulse => {}
    }
    Ok(())
}

fn encode_bundle(writer: &mut WireWriter, bundle: &OscBundle) -> Result<()> {
    writer.write_raw(BUNDLE_TAG);
    writer.write_timetag(bundle.timetag());
    for packet in bundle.packets() {
        writer.write_u32(encoded_size(packet) as u32);
        encode_packet(writer, packet)?;
    }
    Ok(())
}
