//! Message framing: `[length: u32 big-endian][payload]`.
//!
//! A length of zero is never a real frame; it is the end-of-newest-message
//! sentinel (§3) that tells a reader it has caught up to the writer.

use std::io::Read;

use crate::codec::{decode_u32_be, encode_u32_be};
use crate::error::{CacheError, Result};

pub(crate) const LENGTH_PREFIX_SIZE: u64 = 4;

/// Frame a payload for writing. Fails if the payload is empty (it would be
/// indistinguishable from the sentinel), too large to represent in a u32
/// length prefix, or larger than the cache's body capacity could ever hold.
pub(crate) fn frame(payload: &[u8], capacity_for_body: u64) -> Result<Vec<u8>> {
	let message_len = payload.len();
	if message_len == 0 || message_len as u64 > u64::from(u32::MAX) - 1 {
		return Err(CacheError::MessageLargerThanCacheCapacity {
			message_len,
			capacity: capacity_for_body,
		});
	}

	let frame_len = LENGTH_PREFIX_SIZE + message_len as u64;
	if frame_len > capacity_for_body {
		return Err(CacheError::MessageLargerThanCacheCapacity {
			message_len,
			capacity: capacity_for_body,
		});
	}

	let mut bytes = Vec::with_capacity(frame_len as usize);
	bytes.extend_from_slice(&encode_u32_be(message_len as u32));
	bytes.extend_from_slice(payload);
	Ok(bytes)
}

/// The result of reading the 4-byte length prefix at the current offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Span {
	/// A real frame of `n` payload bytes follows.
	Frame(u32),
	/// Nothing was read: the cursor is at or past the end of the file.
	EmptyRead,
	/// A zero length prefix: the end-of-newest-message sentinel.
	EndOfNewestMarker,
	/// Fewer than 4 bytes were available: a truncated/corrupt prefix.
	Invalid,
}

/// Read the 4-byte length prefix at the reader's current position.
#[tracing::instrument(level = "trace", skip(io))]
pub(crate) fn next_span<R: Read>(io: &mut R) -> std::io::Result<Span> {
	let mut buf = [0u8; LENGTH_PREFIX_SIZE as usize];
	let mut read = 0usize;
	while read < buf.len() {
		let n = io.read(&mut buf[read..])?;
		if n == 0 {
			break;
		}
		read += n;
	}

	let span = match read {
		0 => Span::EmptyRead,
		4 => match decode_u32_be(&buf) {
			Ok(0) => Span::EndOfNewestMarker,
			Ok(n) => Span::Frame(n),
			Err(_) => unreachable!("decode_u32_be cannot fail on an exact 4-byte slice"),
		},
		_ => Span::Invalid,
	};
	tracing::trace!(?span, "read length prefix");
	Ok(span)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	#[test]
	fn frames_nonempty_payload() {
		let framed = frame(b"AB", 100).unwrap();
		assert_eq!(framed, vec![0, 0, 0, 2, b'A', b'B']);
	}

	#[test]
	fn rejects_empty_payload() {
		assert!(matches!(
			frame(b"", 100),
			Err(CacheError::MessageLargerThanCacheCapacity { .. })
		));
	}

	#[test]
	fn rejects_payload_too_large_for_capacity() {
		assert!(matches!(
			frame(b"hello", 5),
			Err(CacheError::MessageLargerThanCacheCapacity { .. })
		));
	}

	#[test]
	fn next_span_variants() {
		assert_eq!(
			next_span(&mut Cursor::new(Vec::<u8>::new())).unwrap(),
			Span::EmptyRead
		);
		assert_eq!(
			next_span(&mut Cursor::new(vec![0, 0, 0, 0])).unwrap(),
			Span::EndOfNewestMarker
		);
		assert_eq!(
			next_span(&mut Cursor::new(vec![0, 0, 0, 5])).unwrap(),
			Span::Frame(5)
		);
		assert_eq!(
			next_span(&mut Cursor::new(vec![0, 0])).unwrap(),
			Span::Invalid
		);
	}
}
