//! Pluggable message encoding (§6 "Encoder / Decoder interfaces").
//!
//! The engine is generic over these two traits; it never inspects `T`
//! itself, only the bytes they produce and consume.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

use crate::error::{CacheError, Result};

/// Turns a message into the bytes the engine frames and writes.
pub trait MessageEncoder<T> {
	fn encode(&self, value: &T) -> Result<Vec<u8>>;
}

/// Turns framed bytes back into a message.
pub trait MessageDecoder<T> {
	fn decode(&self, bytes: &[u8]) -> Result<T>;
}

/// The default codec: JSON via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec<T> {
	_marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
	pub fn new() -> Self {
		Self {
			_marker: PhantomData,
		}
	}
}

impl<T: Serialize> MessageEncoder<T> for JsonCodec<T> {
	fn encode(&self, value: &T) -> Result<Vec<u8>> {
		serde_json::to_vec(value).map_err(|err| CacheError::Codec(err.to_string()))
	}
}

impl<T: DeserializeOwned> MessageDecoder<T> for JsonCodec<T> {
	fn decode(&self, bytes: &[u8]) -> Result<T> {
		serde_json::from_slice(bytes).map_err(|err| CacheError::Codec(err.to_string()))
	}
}

/// The encoder/decoder pair the byte-payload adapter (§4.7) uses: the
/// message type already is a byte sequence, so there's nothing to do.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec;

impl MessageEncoder<Vec<u8>> for IdentityCodec {
	fn encode(&self, value: &Vec<u8>) -> Result<Vec<u8>> {
		Ok(value.clone())
	}
}

impl MessageDecoder<Vec<u8>> for IdentityCodec {
	fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>> {
		Ok(bytes.to_vec())
	}
}
