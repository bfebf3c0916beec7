//! Fuzzing tests for pgpcore
//!
//! Random and mutated inputs must only ever produce errors, never panics.

use pgpcore::{
    armor::{self, ArmorType, DecodeOptions},
    buffer::Buffer,
    packet::{PacketHeader, PublicKey, Signature, SymmetricSessionKey, UserId},
    Limits, Message, Packet, S2k,
};
use rand::{rngs::OsRng, Rng};

const ALICE_PUBKEY: &str = include_str!("data/alice_pubkey.asc");

fn random_bytes(rng: &mut OsRng, max: usize) -> Vec<u8> {
    let mut data = vec![0u8; rng.gen_range(0..max)];
    rng.fill(&mut data[..]);
    data
}

/// Message and packet parsing over random byte sequences
#[test]
fn fuzz_packet_parsing() {
    let mut rng = OsRng;

    for _ in 0..1000 {
        let random_data = random_bytes(&mut rng, 4096);

        let result = std::panic::catch_unwind(|| {
            let _ = PacketHeader::parse(&mut Buffer::new(&random_data));
            let _ = Packet::from_bytes(&random_data);
            let _ = Message::parse(&random_data);
        });
        assert!(result.is_ok(), "Packet parsing panicked on random input");
    }
}

/// Random bodies handed straight to every tag's body parser
#[test]
fn fuzz_packet_bodies() {
    let mut rng = OsRng;

    for _ in 0..300 {
        let body = random_bytes(&mut rng, 512);
        let result = std::panic::catch_unwind(|| {
            for tag in 0..64u8 {
                let _ = Packet::from_body(tag, &body);
            }
            let _ = PublicKey::from_bytes(&body);
            let _ = Signature::from_bytes(&body);
            let _ = SymmetricSessionKey::from_bytes(&body);
            let _ = UserId::from_bytes(&body);
            let _ = S2k::parse(&mut Buffer::new(&body));
        });
        assert!(result.is_ok(), "Body parser panicked on {:02x?}", body);
    }
}

/// Body parsers with a plausible leading version byte get past the first
/// check more often than uniformly random input
#[test]
fn fuzz_versioned_bodies() {
    let mut rng = OsRng;

    for _ in 0..500 {
        let mut body = random_bytes(&mut rng, 300);
        body.insert(0, rng.gen_range(2..=5));
        let result = std::panic::catch_unwind(|| {
            for tag in [1u8, 2, 3, 4, 5, 6, 7, 14] {
                let _ = Packet::from_body(tag, &body);
            }
        });
        assert!(result.is_ok(), "Versioned body panicked on {:02x?}", body);
    }
}

/// Random headers with partial lengths and tight limits
#[test]
fn fuzz_partial_lengths() {
    let mut rng = OsRng;
    let limits = Limits {
        max_packet_size: 4096,
        max_packets: 16,
    };

    for _ in 0..500 {
        let mut data = vec![0xC0 | rng.gen_range(1..64u8)];
        for _ in 0..rng.gen_range(1..6) {
            data.push(rng.gen_range(192..=255));
            let chunk = random_bytes(&mut rng, 600);
            data.extend_from_slice(&chunk);
        }
        let result = std::panic::catch_unwind(|| {
            let _ = Message::parse_with_limits(&data, &limits);
        });
        assert!(result.is_ok(), "Partial length parsing panicked");
    }
}

/// Single-byte mutations of a real key block
#[test]
fn fuzz_mutated_key_block() {
    let mut rng = OsRng;
    let block = armor::dearmor(ALICE_PUBKEY).unwrap();

    for _ in 0..500 {
        let mut mutated = block.clone();
        let index = rng.gen_range(0..mutated.len());
        mutated[index] = rng.gen();
        if rng.gen_bool(0.2) {
            mutated.truncate(rng.gen_range(0..mutated.len()));
        }

        let result = std::panic::catch_unwind(|| {
            if let Ok(message) = Message::parse(&mutated) {
                let _ = message.to_bytes();
            }
        });
        assert!(result.is_ok(), "Mutated key block panicked at byte {}", index);
    }
}

/// Armor decoding over random text and damaged armor
#[test]
fn fuzz_armor_decoding() {
    let mut rng = OsRng;
    let alphabet = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=-: \n";

    for _ in 0..500 {
        let noise: String = (0..rng.gen_range(0..400))
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
            .collect();
        let text = format!("-----BEGIN PGP MESSAGE-----\n{}\n-----END PGP MESSAGE-----\n", noise);

        let result = std::panic::catch_unwind(|| {
            let _ = armor::decode(&noise, &DecodeOptions::default());
            let _ = armor::decode(&text, &DecodeOptions::default());
            let _ = Message::parse_armored(&text);
        });
        assert!(result.is_ok(), "Armor decoding panicked on {:?}", text);
    }

    let valid = armor::enarmor(b"fuzz target", &ArmorType::Message).unwrap();
    for _ in 0..300 {
        let mut damaged: Vec<char> = valid.chars().collect();
        let index = rng.gen_range(0..damaged.len());
        damaged[index] = alphabet[rng.gen_range(0..alphabet.len())] as char;
        let damaged: String = damaged.into_iter().collect();

        let result = std::panic::catch_unwind(|| {
            let _ = armor::decode(&damaged, &DecodeOptions::default());
        });
        assert!(result.is_ok(), "Armor decoding panicked on {:?}", damaged);
    }
}
