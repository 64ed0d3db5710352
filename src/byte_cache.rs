//! The byte-payload adapter (§4.7): the engine's contract, specialized to
//! raw byte blobs for callers that already own their serialization.

use std::path::Path;

use crate::engine::CacheAdvance;
use crate::error::Result;
use crate::message::IdentityCodec;
use crate::options::CacheOptions;

/// A `CacheAdvance` parameterized with the identity codec, so `append`
/// and `messages` deal directly in byte blobs.
pub struct BytePayloadCache<IO>(CacheAdvance<Vec<u8>, IO, IdentityCodec, IdentityCodec>);

impl<IO> BytePayloadCache<IO>
where
	IO: crate::io::CacheFile,
{
	pub(crate) fn new(writer_io: IO, header_io: IO, reader_io: IO, options: CacheOptions) -> Self {
		Self(CacheAdvance::new(
			writer_io,
			header_io,
			reader_io,
			options,
			IdentityCodec,
			IdentityCodec,
		))
	}

	pub fn append(&mut self, payload: &[u8]) -> Result<()> {
		self.0.append(&payload.to_vec())
	}

	pub fn messages(&mut self) -> Result<Vec<Vec<u8>>> {
		self.0.messages()
	}

	pub fn is_empty(&mut self) -> Result<bool> {
		self.0.is_empty()
	}

	pub fn is_writable(&mut self) -> bool {
		self.0.is_writable()
	}
}

impl BytePayloadCache<std::fs::File> {
	pub fn open(file_path: impl AsRef<Path>, maximum_bytes: u64, should_overwrite_old_messages: bool) -> Result<Self> {
		CacheAdvance::open(
			file_path,
			maximum_bytes,
			should_overwrite_old_messages,
			IdentityCodec,
			IdentityCodec,
		)
		.map(Self)
	}

	pub fn file_url(&self) -> Option<&Path> {
		self.0.file_url()
	}
}
