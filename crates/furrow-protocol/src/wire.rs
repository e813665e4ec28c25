use rmp_serde::{decode, encode};
use thiserror::Error;

use crate::{GameState, Round, RoundDecision, RoundRecord};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("encode error: {0}")]
    Encode(#[from] encode::Error),
    #[error("decode error: {0}")]
    Decode(#[from] decode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn serialize_round(round: &Round) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(round)?)
}

pub fn deserialize_round(bytes: &[u8]) -> Result<Round, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_round_record(record: &RoundRecord) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(record)?)
}

pub fn deserialize_round_record(bytes: &[u8]) -> Result<RoundRecord, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_game(game: &GameState) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(game)?)
}

pub fn deserialize_game(bytes: &[u8]) -> Result<GameState, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn decision_to_json(decision: &RoundDecision) -> Result<String, WireError> {
    Ok(serde_json::to_string(decision)?)
}

pub fn decision_from_json(json: &str) -> Result<RoundDecision, WireError> {
    Ok(serde_json::from_str(json)?)
}

pub fn round_to_json(round: &Round) -> Result<String, WireError> {
    Ok(serde_json::to_string(round)?)
}

pub fn round_from_json(json: &str) -> Result<Round, WireError> {
    Ok(serde_json::from_str(json)?)
}

/// Deterministic round hash for idempotency checks and replay verification.
///
/// Hashes the MessagePack-serialized round using FNV-1a 64-bit.
pub fn round_hash(round: &Round) -> Result<u64, WireError> {
    let bytes = serialize_round(round)?;
    Ok(hash_bytes_fnv1a64(&bytes))
}

/// Deterministic, stable 64-bit hash for raw bytes (FNV-1a).
pub fn hash_bytes_fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    let mut hash = OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
