//! Property tests over randomized inputs
//!
//! Each test draws a few hundred random cases and checks an invariant that
//! must hold for all of them.

use pgpcore::{
    armor::{self, crc24, ArmorOptions, ArmorType, DecodeOptions},
    buffer::{Buffer, BufferWrite},
    crypto::{Cipher, HashAlgorithm, PublicKeyAlgorithm, SymmetricAlgorithm},
    packet::{
        LiteralData, LiteralFormat, OnePassSignature, Opaque, PublicKey, SymmetricSessionKey,
        Trust, UserId,
    },
    s2k::{decode_count, encode_count, MAX_COUNT, MIN_COUNT},
    KeyId, Message, Mpi, Packet, Passphrase, RustCryptoEngine, S2k,
};
use rand::{rngs::OsRng, Rng};

const HASHES: [HashAlgorithm; 7] = [
    HashAlgorithm::Md5,
    HashAlgorithm::Sha1,
    HashAlgorithm::Ripemd160,
    HashAlgorithm::Sha224,
    HashAlgorithm::Sha256,
    HashAlgorithm::Sha384,
    HashAlgorithm::Sha512,
];

fn random_bytes(rng: &mut OsRng, max: usize) -> Vec<u8> {
    let mut data = vec![0u8; rng.gen_range(0..max)];
    rng.fill(&mut data[..]);
    data
}

/// Property: decode(encode(data)) == data, with the CRC verified
#[test]
fn property_armor_roundtrip() {
    let mut rng = OsRng;
    for _ in 0..200 {
        let data = random_bytes(&mut rng, 2000);
        let options = ArmorOptions {
            line_length: rng.gen_range(1..=19) * 4,
            ..ArmorOptions::default()
        }
        .with_header("Comment", "property test");

        let text = armor::encode(&data, &ArmorType::Message, &options).unwrap();
        let decoded = armor::decode(
            &text,
            &DecodeOptions {
                verify_crc: true,
                armor_type: Some(ArmorType::Message),
            },
        )
        .unwrap();

        assert_eq!(decoded.data, data);
        assert_eq!(decoded.checksum, Some(crc24(&data)));
        assert_eq!(decoded.get_header("Comment"), Some("property test"));
    }
}

/// Property: the CRC changes when two distinct adjacent bytes swap places
#[test]
fn property_crc24_order_sensitive() {
    let mut rng = OsRng;
    for _ in 0..200 {
        let mut data = random_bytes(&mut rng, 64);
        data.extend_from_slice(&[rng.gen(), rng.gen()]);
        let n = data.len();
        if data[n - 1] == data[n - 2] {
            continue;
        }
        let crc = crc24(&data);
        assert!(crc <= 0xFF_FFFF);
        data.swap(n - 1, n - 2);
        assert_ne!(crc24(&data), crc);
    }
}

/// Property: decode_count(encode_count(c)) >= c, and the code is the
/// smallest one that reaches c
#[test]
fn property_count_rounds_upward() {
    let mut rng = OsRng;
    let samples = (0..2000)
        .map(|_| rng.gen_range(MIN_COUNT..=MAX_COUNT))
        .chain((0..=255u8).map(decode_count))
        .chain([MIN_COUNT, MAX_COUNT]);

    for count in samples {
        let code = encode_count(count);
        assert!(decode_count(code) >= count, "count {} code {}", count, code);
        if code > 0 {
            assert!(decode_count(code - 1) < count, "count {} code {}", count, code);
        }
    }
}

#[test]
fn property_decoded_counts_increase() {
    for code in 1..=255u8 {
        assert!(decode_count(code) > decode_count(code - 1));
    }
}

/// Property: every S2K variant yields exactly the requested key length,
/// including lengths past the digest size
#[test]
fn property_s2k_key_length() {
    let engine = RustCryptoEngine::new();
    let mut rng = OsRng;
    for hash in HASHES {
        for _ in 0..5 {
            let passphrase = Passphrase::new(random_bytes(&mut rng, 40));
            let salt: [u8; 8] = rng.gen();
            for s2k in [
                S2k::simple(hash),
                S2k::salted_with(hash, salt),
                S2k::iterated_with(hash, salt, MIN_COUNT),
            ] {
                for len in [1, 16, 24, 32, 65] {
                    let key = s2k.derive_key(&engine, &passphrase, len).unwrap();
                    assert_eq!(key.len(), len);
                }
            }
        }
    }
}

/// Property: a derived key is a prefix of any longer key from the same S2K
#[test]
fn property_s2k_key_prefix_stable() {
    let engine = RustCryptoEngine::new();
    let mut rng = OsRng;
    for _ in 0..20 {
        let passphrase = Passphrase::new(random_bytes(&mut rng, 40));
        let count = rng.gen_range(MIN_COUNT..8192);
        let s2k = S2k::iterated_with(HashAlgorithm::Sha1, rng.gen(), count);
        let short = s2k.derive_key(&engine, &passphrase, 16).unwrap();
        let long = s2k.derive_key(&engine, &passphrase, 48).unwrap();
        assert_eq!(&long[..16], &short[..]);
    }
}

/// Property: OpenPGP-CFB decrypt inverts encrypt for any input length
#[test]
fn property_cfb_roundtrip() {
    let engine = RustCryptoEngine::new();
    let mut rng = OsRng;
    for algorithm in [
        SymmetricAlgorithm::Aes128,
        SymmetricAlgorithm::Aes256,
        SymmetricAlgorithm::Cast5,
        SymmetricAlgorithm::Blowfish,
        SymmetricAlgorithm::Twofish,
    ] {
        let mut key = vec![0u8; algorithm.key_size()];
        rng.fill(&mut key[..]);
        let cipher = Cipher::new(&engine, algorithm, &key).unwrap();
        for _ in 0..20 {
            let plaintext = random_bytes(&mut rng, 300);
            let ciphertext = cipher.encrypt(&plaintext).unwrap();
            assert_eq!(ciphertext.len(), plaintext.len() + cipher.block_size() + 2);
            assert_eq!(cipher.decrypt(&ciphertext).unwrap(), plaintext);
        }
    }
}

/// Property: MPI and string fields survive a write/read pair
#[test]
fn property_buffer_fields_roundtrip() {
    let mut rng = OsRng;
    for _ in 0..300 {
        let mut magnitude = random_bytes(&mut rng, 64);
        if let Some(first) = magnitude.first_mut() {
            *first |= 1;
        }
        let mpi = Mpi::new(magnitude);
        let text = random_bytes(&mut rng, 256);
        let number: u32 = rng.gen();

        let mut out = Vec::new();
        out.write_mpi(&mpi).unwrap();
        out.write_string(&text).unwrap();
        out.write_timestamp(number);

        let mut input = Buffer::new(&out);
        assert_eq!(input.read_mpi().unwrap(), mpi);
        assert_eq!(input.read_string().unwrap(), &text[..]);
        assert_eq!(input.read_timestamp().unwrap(), number);
        assert!(input.is_empty());
    }
}

/// Magnitude bytes with up to two leading zero octets
fn padded_magnitude(rng: &mut OsRng, max: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; rng.gen_range(0..3)];
    bytes.extend(random_bytes(rng, max));
    bytes
}

fn random_packet(rng: &mut OsRng) -> Packet {
    match rng.gen_range(0..8) {
        0 => LiteralData {
            format: LiteralFormat::Other(rng.gen()),
            ..LiteralData::new(random_bytes(rng, 30), rng.gen(), random_bytes(rng, 500))
        }
        .into(),
        1 => {
            let email = format!("r{}@example.org", rng.gen::<u16>());
            UserId::from_parts("Random", "", &email).into()
        }
        2 => Trust::new(random_bytes(rng, 10)).into(),
        3 => OnePassSignature {
            signature_type: rng.gen(),
            hash_algorithm: rng.gen(),
            public_key_algorithm: rng.gen(),
            key_id: KeyId::new(rng.gen()),
            last: rng.gen(),
        }
        .into(),
        4 => {
            let mut skesk = SymmetricSessionKey::new(
                SymmetricAlgorithm::Aes256,
                S2k::simple(HashAlgorithm::Sha256),
            );
            skesk.encrypted_key = random_bytes(rng, 40);
            skesk.into()
        }
        5 => Packet::PublicKey(
            PublicKey::new(
                rng.gen(),
                PublicKeyAlgorithm::Rsa,
                vec![
                    Mpi::new(padded_magnitude(rng, 300)),
                    Mpi::new(padded_magnitude(rng, 4)),
                ],
            )
            .unwrap(),
        ),
        _ => Packet::Experimental(Opaque::new(rng.gen_range(60..64), random_bytes(rng, 300))),
    }
}

/// Property: parse(serialize(message)) == message, and headers of either
/// format decode to the same packet
#[test]
fn property_packet_roundtrip() {
    let mut rng = OsRng;
    for _ in 0..100 {
        let message: Message = (0..rng.gen_range(0..8))
            .map(|_| random_packet(&mut rng))
            .collect();
        let bytes = message.to_bytes().unwrap();
        assert_eq!(Message::parse(&bytes).unwrap(), message);

        for packet in &message {
            if packet.tag() < 16 {
                let old = packet.to_bytes_old_format().unwrap();
                assert_eq!(Packet::from_bytes(&old).unwrap(), *packet);
            }
        }
    }
}
