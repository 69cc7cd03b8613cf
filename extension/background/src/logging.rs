use std::cell::RefCell;
use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Registry, fmt, reload};
use wasm_bindgen::JsValue;

thread_local! {
	static FILTER: RefCell<Option<reload::Handle<LevelFilter, Registry>>> = const { RefCell::new(None) };
}

/// Installs the console subscriber at `info`. Call once, before anything logs.
pub fn init_logging() {
	let (filter, handle) = reload::Layer::new(LevelFilter::INFO);
	let console = fmt::layer()
		.without_time()
		.with_ansi(false)
		.with_target(true)
		.with_level(true)
		.compact()
		.with_writer(MakeConsoleWriter);

	if tracing_subscriber::registry().with(filter).with(console).try_init().is_ok() {
		FILTER.with(|f| *f.borrow_mut() = Some(handle));
	}
}

/// Changes the active level, e.g. after the stored config has been read.
///
/// Unknown level names leave the current level in place.
pub fn set_level(level: &str) {
	let Ok(level) = level.parse::<LevelFilter>() else {
		tracing::warn!(level, "unknown log level");
		return;
	};
	FILTER.with(|f| {
		if let Some(handle) = f.borrow().as_ref() {
			let _ = handle.modify(|current| *current = level);
		}
	});
}

/// Routes formatted events to `console.*` by level.
struct MakeConsoleWriter;

impl<'a> MakeWriter<'a> for MakeConsoleWriter {
	type Writer = ConsoleWriter;

	fn make_writer(&'a self) -> Self::Writer {
		ConsoleWriter::new(Level::INFO)
	}

	fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
		ConsoleWriter::new(*meta.level())
	}
}

/// Buffers one formatted event and emits it on drop.
struct ConsoleWriter {
	level: Level,
	buf: Vec<u8>,
}

impl ConsoleWriter {
	fn new(level: Level) -> Self {
		Self { level, buf: Vec::new() }
	}
}

impl io::Write for ConsoleWriter {
	fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
		self.buf.extend_from_slice(bytes);
		Ok(bytes.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl Drop for ConsoleWriter {
	fn drop(&mut self) {
		let text = String::from_utf8_lossy(&self.buf);
		let line = JsValue::from_str(text.trim_end());
		match self.level {
			Level::ERROR => web_sys::console::error_1(&line),
			Level::WARN => web_sys::console::warn_1(&line),
			Level::INFO => web_sys::console::info_1(&line),
			_ => web_sys::console::debug_1(&line),
		}
	}
}
