//! Logging setup.
//!
//! Two `tracing-subscriber` layers:
//!
//! - **file**: every INFO+ event (or whatever `RUST_LOG` selects) appended to
//!   the operation log as `<timestamp> [<LEVEL>] <message>`;
//! - **terminal**: colorized stderr, INFO+ with `--verbose`, otherwise only
//!   WARN and ERROR so failures are always surfaced.
//!
//! The file rotates once it passes the configured size: the next write renames
//! it to `<file>.1` and starts an empty log before appending.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Local;
use tracing::{Event, Subscriber, warn};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::Settings;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// Line format
// ============================================================================

/// Formats events as `2026-10-19 14:03:11 [INFO] message`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLineFormat;

impl<S, N> FormatEvent<S, N> for LogLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} [{}] ",
            Local::now().format(TIMESTAMP_FORMAT),
            event.metadata().level()
        )?;
        let mut message = String::new();
        ctx.field_format()
            .format_fields(Writer::new(&mut message), event)?;
        writeln!(writer, "{}", single_line(&message))
    }
}

/// Fold multi-line text (e.g. captured stderr) into one log record line.
pub fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Rotating file
// ============================================================================

struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    file: File,
    len: u64,
}

impl RotatingFile {
    fn open(path: &Path, max_bytes: u64) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            max_bytes,
            file,
            len,
        })
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        fs::rename(&self.path, rotated_path(&self.path))?;
        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.len = 0;
        Ok(())
    }

    fn write_record(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.len > self.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(buf)?;
        self.len += buf.len() as u64;
        Ok(())
    }
}

/// Where a rotated log is kept: `srvstack.log` -> `srvstack.log.1`.
pub fn rotated_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".1");
    PathBuf::from(name)
}

/// Append-only log file that rotates past a size threshold.
///
/// Cloning shares the same underlying file. Implements [`MakeWriter`] so it
/// plugs straight into a `fmt` layer; each formatted event arrives as a single
/// write, so rotation always happens on a line boundary.
#[derive(Clone)]
pub struct RotatingLog {
    inner: Arc<Mutex<RotatingFile>>,
}

impl RotatingLog {
    pub fn open(path: &Path, max_bytes: u64) -> io::Result<Self> {
        Ok(Self {
            inner: Arc::new(Mutex::new(RotatingFile::open(path, max_bytes)?)),
        })
    }
}

impl Write for RotatingLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("log file mutex poisoned"))?;
        file.write_record(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut file = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("log file mutex poisoned"))?;
        file.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingLog {
    type Writer = RotatingLog;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

// ============================================================================
// Subscriber setup
// ============================================================================

/// Subscriber that writes INFO+ events to `log` only. Used by tests to
/// capture exactly what the operation log would contain.
pub fn file_subscriber(log: RotatingLog) -> impl Subscriber + Send + Sync {
    tracing_subscriber::registry().with(
        tracing_subscriber::fmt::layer()
            .event_format(LogLineFormat)
            .with_ansi(false)
            .with_writer(log)
            .with_filter(LevelFilter::INFO),
    )
}

/// Install the global subscriber.
///
/// If the log file cannot be opened (e.g. not yet root), logging continues
/// on the terminal only and a warning says so.
pub fn init(settings: &Settings, verbose: bool) {
    let terminal_level = if verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };
    let terminal = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .with_filter(terminal_level);

    let log = RotatingLog::open(&settings.log_path, settings.log_max_bytes);
    let file = log.as_ref().ok().map(|log| {
        tracing_subscriber::fmt::layer()
            .event_format(LogLineFormat)
            .with_ansi(false)
            .with_writer(log.clone())
            .with_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
    });

    let installed = tracing_subscriber::registry()
        .with(terminal)
        .with(file)
        .try_init();

    if installed.is_err() {
        // A subscriber is already set (tests); keep it.
        return;
    }

    if let Err(e) = log {
        warn!(
            "Cannot open log file {}: {}; logging to terminal only",
            settings.log_path.display(),
            e
        );
    }
}
