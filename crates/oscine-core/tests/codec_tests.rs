//! Codec round-trip and failure-mode tests

use oscine_core::{codec, Error, NtpTime, OscArg, OscBundle, OscMessage, OscPacket, TimeTag};

fn roundtrip(packet: OscPacket) -> OscPacket {
    let bytes = codec::encode(&packet, oscine_core::MAX_DATAGRAM_SIZE).expect("encode failed");
    codec::decode(&bytes).expect("decode failed")
}

#[test]
fn test_roundtrip_empty_message() {
    let packet = OscPacket::Message(OscMessage::bare("/status").unwrap());
    assert_eq!(roundtrip(packet.clone()), packet);
}

#[test]
fn test_roundtrip_all_argument_types() {
    let msg = OscMessage::new(
        "/synth/voice/3",
        vec![
            OscArg::Int32(-42),
            OscArg::Float32(0.5),
            OscArg::Float64(std::f64::consts::PI),
            OscArg::Int64(1 << 40),
            OscArg::from("attack"),
            OscArg::Blob(vec![0xDE, 0xAD, 0xBE, 0xEF, 0x99]),
            OscArg::Bool(true),
            OscArg::Bool(false),
            OscArg::Nil,
            OscArg::Impulse,
        ],
    )
    .unwrap();
    let packet = OscPacket::Message(msg);
    assert_eq!(roundtrip(packet.clone()), packet);
}

#[test]
fn test_roundtrip_zero_length_blob() {
    let msg = OscMessage::new("/data", vec![OscArg::Blob(vec![])]).unwrap();
    let packet = OscPacket::Message(msg);
    assert_eq!(roundtrip(packet.clone()), packet);
}

#[test]
fn test_roundtrip_empty_bundle() {
    let packet = OscPacket::Bundle(OscBundle::immediate());
    assert_eq!(roundtrip(packet.clone()), packet);
}

#[test]
fn test_roundtrip_deeply_nested_bundles() {
    let mut packet = OscPacket::Message(
        OscMessage::new("/leaf", vec![OscArg::Int32(7)]).unwrap(),
    );
    for depth in 0..8 {
        let tag = TimeTag::At(NtpTime::new(3_000_000_000 + depth, depth));
        packet = OscPacket::Bundle(OscBundle::new(tag, vec![packet]));
    }
    assert_eq!(roundtrip(packet.clone()), packet);
}

#[test]
fn test_roundtrip_mixed_bundle() {
    let bundle = OscBundle::new(
        TimeTag::Immediate,
        vec![
            OscPacket::Message(OscMessage::bare("/a").unwrap()),
            OscPacket::Bundle(OscBundle::new(
                TimeTag::At(NtpTime::new(4_000_000_000, 1)),
                vec![OscPacket::Message(
                    OscMessage::new("/b", vec![OscArg::from("x")]).unwrap(),
                )],
            )),
            OscPacket::Message(OscMessage::new("/c", vec![OscArg::Float32(1.0)]).unwrap()),
        ],
    );
    let packet = OscPacket::Bundle(bundle);
    assert_eq!(roundtrip(packet.clone()), packet);
}

#[test]
fn test_string_field_alignment() {
    // For a payload of n bytes the encoded field is the smallest multiple
    // of 4 strictly greater than n.
    for len in 0..12usize {
        let address = format!("/{}", "a".repeat(len.max(1)));
        let packet = OscPacket::Message(OscMessage::bare(address.clone()).unwrap());
        let bytes = codec::encode(&packet, oscine_core::MAX_DATAGRAM_SIZE).unwrap();
        let addr_field = (address.len() + 4) & !3;
        assert!(addr_field > address.len());
        assert_eq!(addr_field % 4, 0);
        // address field + ",\0\0\0" type-tag field
        assert_eq!(bytes.len(), addr_field + 4);
    }
}

#[test]
fn test_blob_field_alignment() {
    for len in 0..9usize {
        let packet = OscPacket::Message(
            OscMessage::new("/b", vec![OscArg::Blob(vec![0xAB; len])]).unwrap(),
        );
        let bytes = codec::encode(&packet, oscine_core::MAX_DATAGRAM_SIZE).unwrap();
        let expected_blob_field = 4 + ((len + 3) & !3);
        // "/b\0\0" + ",b\0\0" + blob field
        assert_eq!(bytes.len(), 4 + 4 + expected_blob_field);
    }
}

#[test]
fn test_payload_too_large_fails_closed() {
    let msg = OscMessage::new("/big", vec![OscArg::Blob(vec![0; 512])]).unwrap();
    let packet = OscPacket::Message(msg);
    match codec::encode(&packet, 64) {
        Err(Error::PayloadTooLarge { size, max }) => {
            assert!(size > 64);
            assert_eq!(max, 64);
        }
        other => panic!("expected PayloadTooLarge, got {other:?}"),
    }
    // A generous ceiling accepts the same packet.
    assert!(codec::encode(&packet, oscine_core::MAX_DATAGRAM_SIZE).is_ok());
}

#[test]
fn test_trailing_padding_tolerated() {
    let packet = OscPacket::Message(OscMessage::bare("/pad").unwrap());
    let bytes = codec::encode(&packet, oscine_core::MAX_DATAGRAM_SIZE).unwrap();

    // Message followed by transport zero-padding.
    let mut padded = bytes.to_vec();
    padded.extend_from_slice(&[0, 0, 0, 0]);
    assert_eq!(codec::decode(&padded).unwrap(), packet);

    // Same for a bundle wrapping it.
    let bundle = OscPacket::Bundle(OscBundle::new(TimeTag::Immediate, vec![packet]));
    let mut padded = codec::encode(&bundle, oscine_core::MAX_DATAGRAM_SIZE)
        .unwrap()
        .to_vec();
    padded.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
    assert_eq!(codec::decode(&padded).unwrap(), bundle);
}

#[test]
fn test_truncated_message_fails() {
    let msg = OscMessage::new("/x", vec![OscArg::Int64(9)]).unwrap();
    let bytes = codec::encode(&OscPacket::Message(msg), oscine_core::MAX_DATAGRAM_SIZE).unwrap();
    let truncated = &bytes[..bytes.len() - 4];
    assert!(matches!(
        codec::decode(truncated),
        Err(Error::BufferUnderrun { .. })
    ));
}

#[test]
fn test_bundle_element_size_beyond_buffer() {
    let mut bytes = b"#bundle\0".to_vec();
    bytes.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 1]); // immediate
    bytes.extend_from_slice(&[0, 0, 1, 0]); // claims a 256-byte element
    bytes.extend_from_slice(&[0x2F, 0x61, 0, 0]); // only 4 bytes present
    assert!(matches!(
        codec::decode(&bytes),
        Err(Error::BufferUnderrun { .. })
    ));
}

#[test]
fn test_decoded_address_is_validated() {
    // "/a*b" smuggles a pattern character into a literal address.
    let bytes = [0x2F, 0x61, 0x2A, 0x62, 0, 0, 0, 0, 0x2C, 0, 0, 0];
    assert!(matches!(
        codec::decode(&bytes),
        Err(Error::InvalidAddress(_))
    ));
}
