pub mod byte_cache;
pub mod error;
pub mod message;
pub mod options;

mod codec;
mod engine;
mod file_header;
mod framing;
mod header_handle;
mod io;
mod reader_handle;
mod writer_handle;

pub use byte_cache::BytePayloadCache;
pub use engine::CacheAdvance;
pub use error::{CacheError, Result};
pub use file_header::{FORMAT_VERSION, HEADER_SIZE};
pub use message::{IdentityCodec, JsonCodec, MessageDecoder, MessageEncoder};
pub use options::CacheOptions;
