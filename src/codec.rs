//! Fixed-width big-endian encodings for the primitive widths the on-disk
//! format uses. Decoding requires the exact expected length; anything else
//! is a corrupted file, never a panic.

use crate::error::{CacheError, Result};

pub(crate) fn encode_u8(value: u8) -> [u8; 1] {
	[value]
}

pub(crate) fn decode_u8(bytes: &[u8]) -> Result<u8> {
	match bytes {
		[byte] => Ok(*byte),
		_ => Err(corrupted("expected 1 byte for u8 field")),
	}
}

pub(crate) fn encode_u32_be(value: u32) -> [u8; 4] {
	value.to_be_bytes()
}

pub(crate) fn decode_u32_be(bytes: &[u8]) -> Result<u32> {
	bytes
		.try_into()
		.map(u32::from_be_bytes)
		.map_err(|_| corrupted("expected 4 bytes for u32 field"))
}

pub(crate) fn encode_u64_be(value: u64) -> [u8; 8] {
	value.to_be_bytes()
}

pub(crate) fn decode_u64_be(bytes: &[u8]) -> Result<u64> {
	bytes
		.try_into()
		.map(u64::from_be_bytes)
		.map_err(|_| corrupted("expected 8 bytes for u64 field"))
}

pub(crate) fn encode_bool(value: bool) -> [u8; 1] {
	[value as u8]
}

pub(crate) fn decode_bool(bytes: &[u8]) -> Result<bool> {
	match bytes {
		[0] => Ok(false),
		[1] => Ok(true),
		[_] => Err(corrupted("boolean field was neither 0 nor 1")),
		_ => Err(corrupted("expected 1 byte for boolean field")),
	}
}

fn corrupted(message: &str) -> CacheError {
	CacheError::FileCorrupted(message.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn u32_roundtrip() {
		let encoded = encode_u32_be(0xdead_beef);
		assert_eq!(decode_u32_be(&encoded).unwrap(), 0xdead_beef);
	}

	#[test]
	fn u64_roundtrip() {
		let encoded = encode_u64_be(0x0102_0304_0506_0708);
		assert_eq!(decode_u64_be(&encoded).unwrap(), 0x0102_0304_0506_0708);
	}

	#[test]
	fn bool_roundtrip() {
		assert!(!decode_bool(&encode_bool(false)).unwrap());
		assert!(decode_bool(&encode_bool(true)).unwrap());
	}

	#[test]
	fn wrong_length_is_corrupted() {
		assert!(matches!(
			decode_u32_be(&[0, 0, 0]),
			Err(CacheError::FileCorrupted(_))
		));
		assert!(matches!(
			decode_u64_be(&[0; 7]),
			Err(CacheError::FileCorrupted(_))
		));
		assert!(matches!(
			decode_bool(&[2]),
			Err(CacheError::FileCorrupted(_))
		));
	}
}
