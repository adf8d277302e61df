//! Logging.
//!
//! Logging is done with [`tracing`]. In the browser, [`init`] installs a
//! [`tracing_subscriber`] registry with a formatting layer that writes each
//! event to the JavaScript console, using `console.error()`, `console.warn()`
//! or `console.log()` depending on the level of the event.

use crate::error::ConfigError;
use std::io::{self, Write};
use tracing::{Level, Metadata};
use tracing_subscriber::{fmt, fmt::MakeWriter, prelude::*, EnvFilter};

/// Installs the global logging subscriber.
///
/// The `filter` uses the syntax of [`EnvFilter`] directives (for instance
/// `"info"` or `"cave_water=debug"`). If a global subscriber has already been
/// installed, this function leaves it in place.
pub fn init(filter: &str) -> Result<(), ConfigError> {
    let filter = parse_filter(filter)?;
    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .without_time()
                .with_ansi(false)
                .with_writer(ConsoleMakeWriter),
        )
        .with(filter)
        .try_init();
    if result.is_err() {
        tracing::debug!("logging subscriber already installed");
    }
    Ok(())
}

fn parse_filter(filter: &str) -> Result<EnvFilter, ConfigError> {
    EnvFilter::try_new(filter)
        .map_err(|err| ConfigError::Parse(format!("invalid log filter {filter:?}: {err}")))
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum ConsoleMethod {
    Error,
    Warn,
    Log,
}

impl ConsoleMethod {
    fn for_level(level: &Level) -> ConsoleMethod {
        if *level == Level::ERROR {
            ConsoleMethod::Error
        } else if *level == Level::WARN {
            ConsoleMethod::Warn
        } else {
            ConsoleMethod::Log
        }
    }
}

#[derive(Debug, Copy, Clone)]
struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> ConsoleWriter {
        ConsoleWriter::new(ConsoleMethod::Log)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> ConsoleWriter {
        ConsoleWriter::new(ConsoleMethod::for_level(meta.level()))
    }
}

// Buffers one formatted event and sends it to the console when dropped.
struct ConsoleWriter {
    method: ConsoleMethod,
    buffer: Vec<u8>,
}

impl ConsoleWriter {
    fn new(method: ConsoleMethod) -> ConsoleWriter {
        ConsoleWriter {
            method,
            buffer: Vec::new(),
        }
    }

    fn message(&self) -> String {
        String::from_utf8_lossy(&self.buffer)
            .trim_end()
            .to_string()
    }
}

impl Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let message = wasm_bindgen::JsValue::from_str(&self.message());
        match self.method {
            ConsoleMethod::Error => web_sys::console::error_1(&message),
            ConsoleMethod::Warn => web_sys::console::warn_1(&message),
            ConsoleMethod::Log => web_sys::console::log_1(&message),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn filter_directives() {
        assert!(parse_filter("info").is_ok());
        assert!(parse_filter("cave_water=debug,warn").is_ok());
        assert!(matches!(
            parse_filter("cave_water=notalevel"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn console_method_per_level() {
        assert_eq!(ConsoleMethod::for_level(&Level::ERROR), ConsoleMethod::Error);
        assert_eq!(ConsoleMethod::for_level(&Level::WARN), ConsoleMethod::Warn);
        assert_eq!(ConsoleMethod::for_level(&Level::INFO), ConsoleMethod::Log);
        assert_eq!(ConsoleMethod::for_level(&Level::TRACE), ConsoleMethod::Log);
    }

    #[test]
    fn buffers_message() {
        let mut writer = ConsoleWriter::new(ConsoleMethod::Log);
        writeln!(writer, " INFO cave_water: hello").unwrap();
        assert_eq!(writer.message(), " INFO cave_water: hello");
        // avoid calling into the JS console on the host
        writer.buffer.clear();
    }
}
