//! Sequentially walks framed messages from a given offset, handling
//! wraparound and the end-of-newest-message sentinel (§4.5).

use std::io::{Read, Seek, SeekFrom};

use crate::error::{CacheError, Result};
use crate::file_header::HEADER_SIZE;
use crate::framing::{next_span, Span};
use crate::io::CacheFile;

pub(crate) struct ReaderHandle<IO> {
	io: IO,
	offset: u64,
	offset_of_oldest_message: u64,
	offset_at_end_of_newest_message: u64,
	maximum_bytes: u64,
	/// True only for the very first span read after `seek_to_oldest`.
	///
	/// A fully-packed circular cache can legitimately end up with
	/// `offset_of_oldest_message == offset_at_end_of_newest_message` at a
	/// value other than `H` (every live byte accounted for, no slack left).
	/// That numeric coincidence is indistinguishable from "caught up to the
	/// writer" unless we know we haven't read anything yet; `at_start`
	/// carries that knowledge so the first read isn't mistaken for an
	/// empty cache. Invariant 2 reserves the ambiguity for `H == H` only.
	at_start: bool,
}

impl<IO: CacheFile> ReaderHandle<IO> {
	pub fn new(io: IO, maximum_bytes: u64) -> Self {
		Self {
			io,
			offset: HEADER_SIZE,
			offset_of_oldest_message: HEADER_SIZE,
			offset_at_end_of_newest_message: HEADER_SIZE,
			maximum_bytes,
			at_start: true,
		}
	}

	/// Refresh the cached offsets from the header handle.
	pub fn sync_offsets(&mut self, offset_of_oldest_message: u64, offset_at_end_of_newest_message: u64) {
		self.offset_of_oldest_message = offset_of_oldest_message;
		self.offset_at_end_of_newest_message = offset_at_end_of_newest_message;
	}

	pub fn offset(&self) -> u64 {
		self.offset
	}

	pub fn seek_to_oldest(&mut self) -> Result<()> {
		self.seek_to(self.offset_of_oldest_message)?;
		self.at_start = true;
		Ok(())
	}

	fn seek_to(&mut self, offset: u64) -> Result<()> {
		self.io.seek(SeekFrom::Start(offset))?;
		self.offset = offset;
		Ok(())
	}

	/// Read and return the next message's payload, or `None` once the
	/// reader has caught up to the writer.
	#[tracing::instrument(level = "trace", skip(self))]
	pub fn next_encoded_message(&mut self) -> Result<Option<Vec<u8>>> {
		let bypass_stop = self.at_start && self.offset != HEADER_SIZE;
		self.at_start = false;
		self.next_encoded_message_inner(true, bypass_stop)
	}

	/// Like `next_encoded_message` but discards the payload; used by the
	/// eviction loop to advance past a live message without materializing
	/// it.
	#[tracing::instrument(level = "trace", skip(self))]
	pub fn seek_to_next_message(&mut self) -> Result<()> {
		let bypass_stop = self.at_start && self.offset != HEADER_SIZE;
		self.at_start = false;
		self.next_encoded_message_inner(true, bypass_stop).map(|_| ())
	}

	fn next_encoded_message_inner(&mut self, allow_wrap: bool, bypass_stop: bool) -> Result<Option<Vec<u8>>> {
		if self.offset == self.offset_at_end_of_newest_message && !bypass_stop {
			return Ok(None);
		}

		match next_span(&mut self.io)? {
			Span::Frame(len) => {
				let cursor = self.offset;
				let len = u64::from(len);
				let end_of_newest = self.offset_at_end_of_newest_message;

				let fits_before_end = cursor < end_of_newest && cursor + 4 + len <= end_of_newest;
				let fits_in_tail_segment =
					cursor >= end_of_newest && cursor + 4 + len <= self.maximum_bytes;

				if !fits_before_end && !fits_in_tail_segment {
					return Err(CacheError::FileCorrupted(format!(
						"frame at offset {cursor} claims length {len}, which overruns the live message window"
					)));
				}

				let mut payload = vec![0u8; len as usize];
				self.io.read_exact(&mut payload).map_err(|_| {
					CacheError::FileCorrupted(format!(
						"frame at offset {cursor} claims length {len} but payload is truncated"
					))
				})?;
				self.offset = cursor + 4 + len;
				tracing::trace!(cursor, len, "read frame");
				Ok(Some(payload))
			}
			Span::EndOfNewestMarker => {
				if !allow_wrap {
					return Err(CacheError::FileCorrupted(
						"encountered a second end-of-newest marker while wrapping".into(),
					));
				}
				tracing::trace!(offset = self.offset, "wrapping at end-of-newest marker");
				self.seek_to(HEADER_SIZE)?;
				self.next_encoded_message_inner(false, false)
			}
			Span::EmptyRead => {
				if self.offset < self.offset_at_end_of_newest_message {
					return Err(CacheError::FileCorrupted(format!(
						"file ended at offset {} before reaching the end-of-newest offset {}",
						self.offset, self.offset_at_end_of_newest_message
					)));
				}
				if !allow_wrap {
					return Err(CacheError::FileCorrupted(
						"reached end of file a second time while wrapping".into(),
					));
				}
				tracing::trace!(offset = self.offset, "wrapping at end of file");
				self.seek_to(HEADER_SIZE)?;
				self.next_encoded_message_inner(false, false)
			}
			Span::Invalid => Err(CacheError::FileCorrupted(format!(
				"truncated length prefix at offset {}",
				self.offset
			))),
		}
	}
}
