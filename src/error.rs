use thiserror::Error;

/// Errors surfaced by the cache engine.
///
/// Every anomaly the engine can observe is a named variant; there is no
/// catch-all. See the module docs for which operations can return which
/// variants.
#[derive(Debug, Error)]
pub enum CacheError {
	/// The message could not fit even in an empty cache.
	#[error("message of {message_len} bytes cannot fit in a cache with {capacity} bytes of body capacity")]
	MessageLargerThanCacheCapacity { message_len: usize, capacity: u64 },

	/// Strict mode only: the cache is full but the message would otherwise fit.
	#[error("message of {message_len} bytes does not fit in the {remaining} bytes remaining before the end of the file")]
	MessageLargerThanRemainingCacheSize { message_len: usize, remaining: u64 },

	/// The on-disk format version is not the one this engine expects.
	#[error("cache file has format version {0}, which this engine does not support")]
	IncompatibleHeader(u8),

	/// The on-disk `maximumBytes` or mode flag does not match the caller's configuration.
	#[error("cache file was configured differently than requested; open it with its original settings")]
	FileNotWritable,

	/// The header or framed region is internally inconsistent.
	#[error("cache file is corrupted: {0}")]
	FileCorrupted(String),

	/// A lower-level I/O operation failed.
	#[error("I/O error: {0}")]
	IoError(#[from] std::io::Error),

	/// The configured encoder or decoder failed.
	#[error("message codec error: {0}")]
	Codec(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;
