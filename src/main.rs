use cache_advance::{BytePayloadCache, CacheAdvance, JsonCodec};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

#[derive(Debug, Serialize, Deserialize)]
struct LogLine {
	level: String,
	message: String,
}

fn main() -> cache_advance::Result<()> {
	tracing_subscriber::registry()
		.with(
			EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("cache_advance=trace")).unwrap(),
		)
		.with(tracing_subscriber::fmt::layer().with_span_events(FmtSpan::NEW | FmtSpan::CLOSE))
		.init();

	let dir = std::env::temp_dir();
	let path = dir.join("cache-advance-demo.bin");
	std::fs::File::create(&path)?;

	let mut cache: CacheAdvance<LogLine, _, _, _> = CacheAdvance::open(
		&path,
		4096,
		true,
		JsonCodec::<LogLine>::new(),
		JsonCodec::<LogLine>::new(),
	)?;

	for message in ["booting", "listening on :8080", "request served"] {
		cache.append(&LogLine {
			level: "info".into(),
			message: message.into(),
		})?;
	}

	for entry in cache.messages()? {
		println!("[{}] {}", entry.level, entry.message);
	}

	let byte_path = dir.join("cache-advance-demo-raw.bin");
	std::fs::File::create(&byte_path)?;
	let mut raw = BytePayloadCache::open(&byte_path, 4096, true)?;
	raw.append(b"raw bytes need no encoder")?;
	for payload in raw.messages()? {
		println!("{}", String::from_utf8_lossy(&payload));
	}

	Ok(())
}
