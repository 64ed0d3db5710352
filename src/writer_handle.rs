//! Owns the writer's file handle and its current write offset (`W` in
//! §4.6.1).

use std::io::{Seek, SeekFrom, Write};

use crate::error::Result;
use crate::io::CacheFile;

pub(crate) struct WriterHandle<IO> {
	io: IO,
	offset: u64,
}

impl<IO: CacheFile> WriterHandle<IO> {
	pub fn new(io: IO, offset: u64) -> Self {
		Self { io, offset }
	}

	pub fn offset(&self) -> u64 {
		self.offset
	}

	pub fn seek_to(&mut self, offset: u64) -> Result<()> {
		self.io.seek(SeekFrom::Start(offset))?;
		self.offset = offset;
		Ok(())
	}

	/// Write a pre-framed message at the current offset, advancing it.
	#[tracing::instrument(level = "trace", skip(self, frame))]
	pub fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
		self.io.seek(SeekFrom::Start(self.offset))?;
		self.io.write_all(frame)?;
		self.offset += frame.len() as u64;
		Ok(())
	}

	/// Discard everything at or past `offset`, used when wrapping in
	/// circular mode (§4.6.1).
	pub fn truncate_at(&mut self, offset: u64) -> Result<()> {
		self.io.set_len(offset)?;
		Ok(())
	}
}
