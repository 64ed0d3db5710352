//! Owns the header's file handle: reads/writes the whole header or a
//! single field in place, and validates persisted static metadata against
//! the caller's configuration (§4.4).

use std::io::{Read, Seek, SeekFrom, Write};

use crate::codec::encode_u64_be;
use crate::error::{CacheError, Result};
use crate::file_header::{
	FileHeader, FORMAT_VERSION, HEADER_SIZE, OFFSET_END_OF_NEWEST_MESSAGE,
	OFFSET_OFFSET_OF_OLDEST_MESSAGE,
};
use crate::io::CacheFile;

pub(crate) struct HeaderHandle<IO> {
	io: IO,
	maximum_bytes: u64,
	overwrites_old_messages: bool,
	pub offset_of_oldest_message: u64,
	pub offset_at_end_of_newest_message: u64,
}

impl<IO: CacheFile> HeaderHandle<IO> {
	pub fn new(io: IO, maximum_bytes: u64, overwrites_old_messages: bool) -> Self {
		Self {
			io,
			maximum_bytes,
			overwrites_old_messages,
			offset_of_oldest_message: HEADER_SIZE,
			offset_at_end_of_newest_message: HEADER_SIZE,
		}
	}

	/// Load the header, initializing a fresh one if the file is empty.
	#[tracing::instrument(level = "trace", skip(self))]
	pub fn synchronize(&mut self) -> Result<()> {
		self.io.seek(SeekFrom::Start(0))?;

		let mut bytes = [0u8; HEADER_SIZE as usize];
		let read = read_fully(&mut self.io, &mut bytes)?;

		if read == 0 {
			tracing::debug!("empty cache file, writing fresh header");
			return self.write_fresh_header();
		}
		if read < bytes.len() {
			return Err(CacheError::FileCorrupted(format!(
				"header is truncated: read {read} of {HEADER_SIZE} bytes"
			)));
		}

		let header = FileHeader::from_bytes(&bytes)?;
		if header.version != FORMAT_VERSION {
			return Err(CacheError::IncompatibleHeader(header.version));
		}
		if header.maximum_bytes != self.maximum_bytes
			|| header.overwrites_old_messages != self.overwrites_old_messages
		{
			return Err(CacheError::FileNotWritable);
		}

		self.offset_of_oldest_message = header.offset_of_oldest_message;
		self.offset_at_end_of_newest_message = header.offset_at_end_of_newest_message;
		tracing::debug!(
			offset_of_oldest_message = self.offset_of_oldest_message,
			offset_at_end_of_newest_message = self.offset_at_end_of_newest_message,
			"loaded header"
		);
		Ok(())
	}

	fn write_fresh_header(&mut self) -> Result<()> {
		let header = FileHeader::fresh(self.maximum_bytes, self.overwrites_old_messages);
		self.io.seek(SeekFrom::Start(0))?;
		self.io.write_all(&header.to_bytes())?;
		self.offset_of_oldest_message = header.offset_of_oldest_message;
		self.offset_at_end_of_newest_message = header.offset_at_end_of_newest_message;
		Ok(())
	}

	#[tracing::instrument(level = "trace", skip(self))]
	pub fn update_offset_of_oldest(&mut self, value: u64) -> Result<()> {
		self.offset_of_oldest_message = value;
		self.io.seek(SeekFrom::Start(OFFSET_OFFSET_OF_OLDEST_MESSAGE))?;
		self.io.write_all(&encode_u64_be(value))?;
		Ok(())
	}

	#[tracing::instrument(level = "trace", skip(self))]
	pub fn update_end_of_newest(&mut self, value: u64) -> Result<()> {
		self.offset_at_end_of_newest_message = value;
		self.io.seek(SeekFrom::Start(OFFSET_END_OF_NEWEST_MESSAGE))?;
		self.io.write_all(&encode_u64_be(value))?;
		Ok(())
	}

	/// Whether `synchronize` would succeed against the on-disk header,
	/// without surfacing the corruption/incompatibility categories.
	pub fn can_write_to_file(&mut self) -> bool {
		self.io.seek(SeekFrom::Start(0)).is_ok() && {
			let mut bytes = [0u8; HEADER_SIZE as usize];
			match read_fully(&mut self.io, &mut bytes) {
				Ok(0) => true,
				Ok(n) if n == bytes.len() => FileHeader::from_bytes(&bytes)
					.map(|header| {
						header.version == FORMAT_VERSION
							&& header.maximum_bytes == self.maximum_bytes
							&& header.overwrites_old_messages == self.overwrites_old_messages
					})
					.unwrap_or(false),
				_ => false,
			}
		}
	}
}

fn read_fully<R: Read>(io: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
	let mut read = 0;
	while read < buf.len() {
		let n = io.read(&mut buf[read..])?;
		if n == 0 {
			break;
		}
		read += n;
	}
	Ok(read)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::io::memory::MemoryFile;

	#[test]
	fn synchronize_initializes_empty_file() {
		let mut handle = HeaderHandle::new(MemoryFile::new(), 4096, false);
		handle.synchronize().unwrap();
		assert_eq!(handle.offset_of_oldest_message, HEADER_SIZE);
		assert_eq!(handle.offset_at_end_of_newest_message, HEADER_SIZE);
	}

	#[test]
	fn synchronize_rejects_mismatched_capacity() {
		let backing = MemoryFile::new();
		let mut first = HeaderHandle::new(backing.reopen(), 4096, false);
		first.synchronize().unwrap();

		let mut second = HeaderHandle::new(backing.reopen(), 8192, false);
		assert!(matches!(
			second.synchronize(),
			Err(CacheError::FileNotWritable)
		));
	}

	#[test]
	fn synchronize_rejects_mismatched_mode() {
		let backing = MemoryFile::new();
		let mut first = HeaderHandle::new(backing.reopen(), 4096, false);
		first.synchronize().unwrap();

		let mut second = HeaderHandle::new(backing.reopen(), 4096, true);
		assert!(matches!(
			second.synchronize(),
			Err(CacheError::FileNotWritable)
		));
	}

	#[test]
	fn synchronize_rejects_truncated_header() {
		let mut backing = MemoryFile::new();
		backing.write_all(&[0u8; 32]).unwrap();

		let mut handle = HeaderHandle::new(backing, 4096, false);
		assert!(matches!(
			handle.synchronize(),
			Err(CacheError::FileCorrupted(_))
		));
	}

	#[test]
	fn update_offset_persists_in_place() {
		let backing = MemoryFile::new();
		let mut handle = HeaderHandle::new(backing.reopen(), 4096, false);
		handle.synchronize().unwrap();
		handle.update_end_of_newest(100).unwrap();

		let mut reopened = HeaderHandle::new(backing.reopen(), 4096, false);
		reopened.synchronize().unwrap();
		assert_eq!(reopened.offset_at_end_of_newest_message, 100);
		assert_eq!(reopened.offset_of_oldest_message, HEADER_SIZE);
	}
}
