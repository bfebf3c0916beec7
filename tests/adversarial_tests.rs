//! Adversarial tests for pgpcore
//!
//! Hostile or damaged input must fail with the right typed error, at the
//! right offset, without partial results.

use digest::DynDigest;
use pgpcore::{
    armor::{self, ArmorType, DecodeOptions},
    crypto::{BlockCipher, Cipher, HashAlgorithm, SymmetricAlgorithm},
    packet::{PublicKey, Signature},
    CryptoEngine, EncryptOptions, Limits, Message, Packet, PgpError, Result, RustCryptoEngine,
    S2k,
};

const ALICE_PUBKEY: &str = include_str!("data/alice_pubkey.asc");

fn alice_block() -> Vec<u8> {
    armor::dearmor(ALICE_PUBKEY).unwrap()
}

/// Offsets of the packet headers in the fixture
const PACKET_OFFSETS: [usize; 9] = [0, 272, 308, 645, 690, 1027, 1034, 1371, 1643];

/// An engine whose random source is broken
struct NoRandomEngine;

impl CryptoEngine for NoRandomEngine {
    fn random_bytes(&self, _count: usize) -> Result<Vec<u8>> {
        Err(PgpError::engine_unavailable("entropy source offline"))
    }

    fn hasher(&self, algorithm: HashAlgorithm) -> Result<Box<dyn DynDigest>> {
        RustCryptoEngine.hasher(algorithm)
    }

    fn block_cipher(
        &self,
        algorithm: SymmetricAlgorithm,
        key: &[u8],
    ) -> Result<Box<dyn BlockCipher>> {
        RustCryptoEngine.block_cipher(algorithm, key)
    }
}

/// An engine that hands back fewer random bytes than requested
struct ShortRandomEngine;

impl CryptoEngine for ShortRandomEngine {
    fn random_bytes(&self, count: usize) -> Result<Vec<u8>> {
        Ok(vec![0x42; count.saturating_sub(1)])
    }

    fn hasher(&self, algorithm: HashAlgorithm) -> Result<Box<dyn DynDigest>> {
        RustCryptoEngine.hasher(algorithm)
    }

    fn block_cipher(
        &self,
        algorithm: SymmetricAlgorithm,
        key: &[u8],
    ) -> Result<Box<dyn BlockCipher>> {
        RustCryptoEngine.block_cipher(algorithm, key)
    }
}

#[test]
fn test_fixture_packet_offsets() {
    let block = alice_block();
    for (index, &offset) in PACKET_OFFSETS.iter().enumerate() {
        let packet = Message::parse(&block[offset..]).unwrap();
        assert_eq!(packet.len(), 9 - index);
    }
}

/// Truncation anywhere fails with the offset of the cut packet
#[test]
fn test_truncated_stream_reports_offset() {
    let block = alice_block();
    for cut in [1, 100, 271, 273, 1000, 1642, block.len() - 1] {
        let err = Message::parse(&block[..cut]).unwrap_err();
        let expected = PACKET_OFFSETS
            .iter()
            .rev()
            .find(|&&offset| offset < cut)
            .copied()
            .unwrap();
        assert_eq!(err.offset(), Some(expected), "cut at {}", cut);
        assert!(
            matches!(err.root(), PgpError::UnexpectedEof { .. }),
            "cut at {}: {:?}",
            cut,
            err
        );
    }
}

/// A body with bytes left over after its fields is rejected
#[test]
fn test_trailing_body_bytes_rejected() {
    let message = Message::parse(&alice_block()).unwrap();

    let mut key_body = message.packets()[0].body_bytes().unwrap();
    key_body.push(0);
    assert!(matches!(
        PublicKey::from_bytes(&key_body),
        Err(PgpError::MalformedPacket { tag: 6, .. })
    ));

    let mut sig_body = message.packets()[2].body_bytes().unwrap();
    sig_body.push(0);
    assert!(matches!(
        Signature::from_bytes(&sig_body),
        Err(PgpError::MalformedPacket { tag: 2, .. })
    ));
}

#[test]
fn test_bad_versions_rejected() {
    let message = Message::parse(&alice_block()).unwrap();

    let mut sig_body = message.packets()[2].body_bytes().unwrap();
    sig_body[0] = 5;
    assert!(matches!(
        Signature::from_bytes(&sig_body),
        Err(PgpError::MalformedHeader(_))
    ));

    let mut key_body = message.packets()[0].body_bytes().unwrap();
    key_body[0] = 5;
    assert!(matches!(
        PublicKey::from_bytes(&key_body),
        Err(PgpError::MalformedPacket { .. })
    ));

    // Inside a stream the failure is located at the second packet
    let mut stream = Packet::Marker(Default::default()).to_bytes().unwrap();
    let marker_len = stream.len();
    let mut bad = message.packets()[2].to_bytes().unwrap();
    bad[3] = 5;
    stream.extend_from_slice(&bad);
    let err = Message::parse(&stream).unwrap_err();
    assert_eq!(err.offset(), Some(marker_len));
    assert!(matches!(err.root(), PgpError::MalformedHeader(_)));
}

#[test]
fn test_unknown_public_key_algorithm() {
    let message = Message::parse(&alice_block()).unwrap();
    let mut key_body = message.packets()[0].body_bytes().unwrap();
    key_body[5] = 99;
    assert!(matches!(
        PublicKey::from_bytes(&key_body),
        Err(PgpError::UnsupportedAlgorithm { id: 99, .. })
    ));
}

#[test]
fn test_tag_octet_without_high_bit() {
    let err = Message::parse(&[0x3f, 0x00]).unwrap_err();
    assert_eq!(err.offset(), Some(0));
    assert!(matches!(err.root(), PgpError::MalformedHeader(_)));
}

#[test]
fn test_invalid_s2k_mode() {
    // SKESK v4, AES-128, S2K mode 2
    let body = [4, 7, 2, 2];
    let err = Packet::from_body(3, &body).unwrap_err();
    assert!(matches!(err, PgpError::MalformedHeader(_)));

    let mut private = vec![4, 7, 101];
    private.extend_from_slice(b"opaque");
    let Packet::SymmetricSessionKey(skesk) = Packet::from_body(3, &private).unwrap() else {
        panic!("expected a session key packet");
    };
    assert_eq!(skesk.s2k.private_data(), Some(&b"opaque"[..]));
    assert!(matches!(
        skesk.s2k.derive_key(&RustCryptoEngine, &"pw".into(), 16),
        Err(PgpError::UnsupportedOperation(_))
    ));
}

/// A tampered armor body fails the CRC with both values reported
#[test]
fn test_crc_tampering_detected() {
    let armored = armor::enarmor(b"Hello, PGP World!", &ArmorType::Message).unwrap();
    let tampered = armored.replace("SGVsbG8sIFBHUCBXb3JsZCE=", "SGVsbG8sIFBHUCBXb3JsZCQ=");
    assert_ne!(armored, tampered);

    match armor::decode(&tampered, &DecodeOptions::default()) {
        Err(PgpError::ChecksumMismatch { expected, actual }) => {
            assert_eq!(expected, 0xFA466F);
            assert_ne!(actual, expected);
        }
        other => panic!("expected checksum mismatch, got {:?}", other),
    }

    let unchecked = DecodeOptions {
        verify_crc: false,
        ..DecodeOptions::default()
    };
    assert_eq!(
        armor::decode(&tampered, &unchecked).unwrap().data,
        b"Hello, PGP World$"
    );
}

#[test]
fn test_limits_enforced() {
    let block = alice_block();

    let few_packets = Limits {
        max_packets: 3,
        ..Limits::default()
    };
    let err = Message::parse_with_limits(&block, &few_packets).unwrap_err();
    assert_eq!(err.offset(), Some(PACKET_OFFSETS[3]));
    assert!(matches!(err.root(), PgpError::Validation(_)));

    let small_packets = Limits {
        max_packet_size: 300,
        ..Limits::default()
    };
    let err = Message::parse_with_limits(&block, &small_packets).unwrap_err();
    assert_eq!(err.offset(), Some(PACKET_OFFSETS[2]));
    assert!(matches!(err.root(), PgpError::Validation(_)));

    assert_eq!(
        Message::parse_with_limits(&block, &Limits::unlimited()).unwrap(),
        Message::parse(&block).unwrap()
    );
}

/// A partial body chain cannot grow past the size limit
#[test]
fn test_partial_body_chain_limit() {
    let mut data = vec![0xCB];
    for _ in 0..8 {
        data.push(0xE9); // 512-byte chunk
        data.extend_from_slice(&[0u8; 512]);
    }
    data.push(0);
    let limits = Limits {
        max_packet_size: 2048,
        ..Limits::default()
    };
    let err = Message::parse_with_limits(&data, &limits).unwrap_err();
    assert!(matches!(err.root(), PgpError::Validation(_)));
}

#[test]
fn test_failing_engine() {
    let options = EncryptOptions::with_passphrase("secret");

    let err = Message::encrypt("data", &options, &NoRandomEngine).unwrap_err();
    assert!(matches!(err, PgpError::EngineUnavailable(_)));

    // Deterministic S2K needs no randomness; the IV prefix still does
    let explicit = EncryptOptions {
        s2k: Some(S2k::simple(HashAlgorithm::Sha256)),
        ..EncryptOptions::with_passphrase("secret")
    };
    let err = Message::encrypt("data", &explicit, &NoRandomEngine).unwrap_err();
    assert!(matches!(err, PgpError::EngineUnavailable(_)));

    let err = Message::encrypt("data", &explicit, &ShortRandomEngine).unwrap_err();
    assert!(matches!(err, PgpError::EngineUnavailable(_)));
}

#[test]
fn test_unsupported_operations() {
    let engine = RustCryptoEngine::new();

    let options = EncryptOptions {
        recipients: vec!["alice@example.org".to_string()],
        ..EncryptOptions::with_passphrase("secret")
    };
    assert!(matches!(
        Message::encrypt("data", &options, &engine),
        Err(PgpError::UnsupportedOperation(_))
    ));

    let message = Message::parse(&alice_block()).unwrap();
    let key = message.packets()[0].public_key().unwrap();
    assert!(matches!(
        message.decrypt(&"secret".into()),
        Err(PgpError::UnsupportedOperation(_))
    ));
    assert!(matches!(
        message.verify(key),
        Err(PgpError::UnsupportedOperation(_))
    ));

    assert!(matches!(
        Cipher::new(&engine, SymmetricAlgorithm::Idea, &[0; 16]),
        Err(PgpError::UnsupportedAlgorithm { .. })
    ));
}

#[test]
fn test_missing_passphrase() {
    let engine = RustCryptoEngine::new();
    assert!(matches!(
        Message::encrypt("data", &EncryptOptions::default(), &engine),
        Err(PgpError::InvalidInput(_))
    ));
}
