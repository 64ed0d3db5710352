//! The cache engine: orchestrates `append` and `messages`, owning the
//! writer handle, the reader, and the header handle (§4.6).

use std::fs::OpenOptions;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::file_header::HEADER_SIZE;
use crate::framing::frame;
use crate::header_handle::HeaderHandle;
use crate::io::CacheFile;
use crate::message::{MessageDecoder, MessageEncoder};
use crate::options::CacheOptions;
use crate::reader_handle::ReaderHandle;
use crate::writer_handle::WriterHandle;

/// A single-file, append-only, bounded-capacity message log.
///
/// Generic over the message type `T`, the underlying file abstraction
/// `IO`, and the encoder/decoder pair that turns `T` into bytes and back.
/// Initialization is lazy: the header is not read from disk until the
/// first call to `append`, `messages`, or `is_empty`.
pub struct CacheAdvance<T, IO, E, D> {
	options: CacheOptions,
	header: HeaderHandle<IO>,
	writer: WriterHandle<IO>,
	reader: ReaderHandle<IO>,
	encoder: E,
	decoder: D,
	initialized: bool,
	file_path: Option<PathBuf>,
	_message: PhantomData<fn() -> T>,
}

impl<T, IO, E, D> CacheAdvance<T, IO, E, D>
where
	IO: CacheFile,
	E: MessageEncoder<T>,
	D: MessageDecoder<T>,
{
	/// Construct an engine directly from three independent file handles,
	/// one per collaborator (§3 "Ownership"). Crate-internal: external
	/// callers go through `open`, which concretely binds `IO` to
	/// `std::fs::File`.
	pub(crate) fn new(writer_io: IO, header_io: IO, reader_io: IO, options: CacheOptions, encoder: E, decoder: D) -> Self {
		Self {
			header: HeaderHandle::new(header_io, options.maximum_bytes(), options.overwrites_old_messages()),
			writer: WriterHandle::new(writer_io, HEADER_SIZE),
			reader: ReaderHandle::new(reader_io, options.maximum_bytes()),
			options,
			encoder,
			decoder,
			initialized: false,
			file_path: None,
			_message: PhantomData,
		}
	}

	#[tracing::instrument(level = "trace", skip(self))]
	fn ensure_initialized(&mut self) -> Result<()> {
		if self.initialized {
			return Ok(());
		}
		self.header.synchronize()?;
		self.writer.seek_to(self.header.offset_at_end_of_newest_message)?;
		self.reader.sync_offsets(
			self.header.offset_of_oldest_message,
			self.header.offset_at_end_of_newest_message,
		);
		self.reader.seek_to_oldest()?;
		self.initialized = true;
		Ok(())
	}

	/// Append one message, encoding and framing it, enforcing capacity,
	/// and (in circular mode) evicting the oldest live messages as needed
	/// (§4.6.1).
	#[tracing::instrument(level = "trace", skip(self, value))]
	pub fn append(&mut self, value: &T) -> Result<()> {
		self.ensure_initialized()?;

		let payload = self.encoder.encode(value)?;
		let maximum_bytes = self.options.maximum_bytes();
		let capacity_for_body = maximum_bytes - HEADER_SIZE;
		let framed = frame(&payload, capacity_for_body)?;
		let frame_len = framed.len() as u64;

		let mut w = self.writer.offset();
		let fits_linearly = w + frame_len <= maximum_bytes;

		if !self.options.overwrites_old_messages() {
			if !fits_linearly {
				return Err(crate::error::CacheError::MessageLargerThanRemainingCacheSize {
					message_len: payload.len(),
					remaining: maximum_bytes - w,
				});
			}
			self.writer.write_frame(&framed)?;
			self.header.update_end_of_newest(w + frame_len)?;
			tracing::debug!(offset_at_end_of_newest_message = w + frame_len, "appended (strict)");
			return Ok(());
		}

		if !fits_linearly {
			self.writer.truncate_at(w)?;
			self.writer.seek_to(HEADER_SIZE)?;
			w = HEADER_SIZE;

			self.reader
				.sync_offsets(HEADER_SIZE, self.header.offset_at_end_of_newest_message);
			self.reader.seek_to_oldest()?;
			// The wrapped write is about to land at H, which is exactly
			// where the current oldest message starts; it cannot survive.
			self.reader.seek_to_next_message()?;
			tracing::trace!("wrapped writer to header boundary, evicted leading message");
		}

		self.prepare_reader_for_writing(w, frame_len)?;

		self.header.update_offset_of_oldest(self.reader.offset())?;
		self.writer.write_frame(&framed)?;
		self.header.update_end_of_newest(w + frame_len)?;
		tracing::debug!(
			offset_of_oldest_message = self.reader.offset(),
			offset_at_end_of_newest_message = w + frame_len,
			"appended (circular)"
		);
		Ok(())
	}

	/// Advance the reader past live messages the upcoming write at
	/// `[w, w + frame_len)` would otherwise overwrite (§4.6.2).
	fn prepare_reader_for_writing(&mut self, w: u64, frame_len: u64) -> Result<()> {
		loop {
			let reader_offset = self.reader.offset();
			if reader_offset == self.header.offset_at_end_of_newest_message {
				break;
			}
			let collides = w < reader_offset && reader_offset < w + frame_len;
			if !collides {
				break;
			}
			self.reader.seek_to_next_message()?;
		}
		Ok(())
	}

	/// All live messages, oldest to newest (§4.6.3).
	#[tracing::instrument(level = "trace", skip(self))]
	pub fn messages(&mut self) -> Result<Vec<T>> {
		self.ensure_initialized()?;
		self.reader.sync_offsets(
			self.header.offset_of_oldest_message,
			self.header.offset_at_end_of_newest_message,
		);
		self.reader.seek_to_oldest()?;

		let mut result = Vec::new();
		while let Some(bytes) = self.reader.next_encoded_message()? {
			result.push(self.decoder.decode(&bytes)?);
		}

		self.reader.seek_to_oldest()?;
		Ok(result)
	}

	/// Whether the cache currently holds no live messages (§4.6.4).
	pub fn is_empty(&mut self) -> Result<bool> {
		self.ensure_initialized()?;
		Ok(self.header.offset_at_end_of_newest_message == HEADER_SIZE)
	}

	/// Whether the on-disk header's persisted configuration matches this
	/// engine's, without surfacing corruption as an error (§4.6.5).
	pub fn is_writable(&mut self) -> bool {
		self.header.can_write_to_file()
	}

	/// The path this engine was opened against, if any.
	pub fn file_url(&self) -> Option<&Path> {
		self.file_path.as_deref()
	}
}

impl<T, E, D> CacheAdvance<T, std::fs::File, E, D>
where
	E: MessageEncoder<T>,
	D: MessageDecoder<T>,
{
	/// Open a cache backed by a file on disk. The file must already
	/// exist (it may be zero-length); three independent handles are
	/// opened on the same path, one per collaborator (§3 "Ownership").
	pub fn open(
		file_path: impl AsRef<Path>,
		maximum_bytes: u64,
		should_overwrite_old_messages: bool,
		encoder: E,
		decoder: D,
	) -> Result<Self> {
		let path = file_path.as_ref().to_path_buf();
		let writer_io = OpenOptions::new().read(true).write(true).open(&path)?;
		let header_io = OpenOptions::new().read(true).write(true).open(&path)?;
		let reader_io = OpenOptions::new().read(true).open(&path)?;

		let options = CacheOptions::new(maximum_bytes, should_overwrite_old_messages);
		let mut engine = Self::new(writer_io, header_io, reader_io, options, encoder, decoder);
		engine.file_path = Some(path);
		Ok(engine)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::CacheError;
	use crate::io::memory::MemoryFile;
	use crate::message::IdentityCodec;

	fn open_memory(
		maximum_bytes: u64,
		overwrites_old_messages: bool,
	) -> CacheAdvance<Vec<u8>, MemoryFile, IdentityCodec, IdentityCodec> {
		let backing = MemoryFile::new();
		let options = CacheOptions::new(maximum_bytes, overwrites_old_messages);
		CacheAdvance::new(
			backing.reopen(),
			backing.reopen(),
			backing.reopen(),
			options,
			IdentityCodec,
			IdentityCodec,
		)
	}

	#[test]
	fn empty_cache_reports_empty_and_no_messages() {
		let mut engine = open_memory(HEADER_SIZE + 30, false);
		assert!(engine.is_empty().unwrap());
		assert_eq!(engine.messages().unwrap(), Vec::<Vec<u8>>::new());
	}

	#[test]
	fn strict_mode_rejects_once_full_but_keeps_prior_messages() {
		let mut engine = open_memory(HEADER_SIZE + 10, false);
		engine.append(&b"AB".to_vec()).unwrap();
		let err = engine.append(&b"CDE".to_vec()).unwrap_err();
		assert!(matches!(err, CacheError::MessageLargerThanRemainingCacheSize { .. }));
		assert_eq!(engine.messages().unwrap(), vec![b"AB".to_vec()]);
	}

	#[test]
	fn circular_mode_evicts_oldest_when_full() {
		// Header + exactly three 10-byte frames (4-byte prefix + 6-byte payload).
		let mut engine = open_memory(HEADER_SIZE + 30, true);
		for payload in [b"aaaaaa", b"bbbbbb", b"cccccc", b"dddddd"] {
			engine.append(&payload.to_vec()).unwrap();
		}
		assert_eq!(
			engine.messages().unwrap(),
			vec![b"bbbbbb".to_vec(), b"cccccc".to_vec(), b"dddddd".to_vec()]
		);
	}

	#[test]
	fn circular_mode_wraps_and_evicts_as_many_as_needed() {
		let mut engine = open_memory(HEADER_SIZE + 30, true);
		for payload in [b"aaaaaa".to_vec(), b"bbbbbb".to_vec(), b"cccccc".to_vec()] {
			engine.append(&payload).unwrap();
		}
		// A bigger frame forces a wrap; capacity for body is 30, this frame
		// is 4 + 11 = 15 bytes, so only one of the three 10-byte frames
		// needs to survive alongside it.
		engine.append(&b"zzzzzzzzzzz".to_vec()).unwrap();
		let messages = engine.messages().unwrap();
		assert_eq!(messages.last().unwrap(), b"zzzzzzzzzzz");
		assert!(messages.len() <= 3);
	}

	#[test]
	fn reopen_with_mismatched_capacity_is_rejected() {
		let backing = MemoryFile::new();
		let options = CacheOptions::new(HEADER_SIZE + 30, false);
		let mut first = CacheAdvance::new(
			backing.reopen(),
			backing.reopen(),
			backing.reopen(),
			options,
			IdentityCodec,
			IdentityCodec,
		);
		first.append(&b"hello".to_vec()).unwrap();

		let mismatched = CacheOptions::new(HEADER_SIZE + 60, false);
		let mut second = CacheAdvance::new(
			backing.reopen(),
			backing.reopen(),
			backing.reopen(),
			mismatched,
			IdentityCodec,
			IdentityCodec,
		);
		assert!(!second.is_writable());
		assert!(matches!(
			second.append(&b"x".to_vec()),
			Err(CacheError::FileNotWritable)
		));
	}

	#[test]
	fn rejects_zero_length_payload() {
		let mut engine = open_memory(HEADER_SIZE + 30, false);
		let err = engine.append(&Vec::<u8>::new()).unwrap_err();
		assert!(matches!(err, CacheError::MessageLargerThanCacheCapacity { .. }));
	}
}
