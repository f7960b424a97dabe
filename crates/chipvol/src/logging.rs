use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log file size that triggers trimming (5 MB)
const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;
/// Tail kept after trimming (1 MB)
const KEEP_SIZE: u64 = 1024 * 1024;

/// Trim the log file to its last `KEEP_SIZE` bytes once it grows past
/// `MAX_LOG_SIZE`. The kept tail starts at a line boundary.
fn rotate_log_if_needed(log_path: &Path) -> io::Result<()> {
    let file_size = match fs::metadata(log_path) {
        Ok(metadata) => metadata.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if file_size <= MAX_LOG_SIZE {
        return Ok(());
    }

    let mut file = File::open(log_path)?;
    file.seek(SeekFrom::Start(file_size.saturating_sub(KEEP_SIZE)))?;
    let mut tail = Vec::new();
    file.read_to_end(&mut tail)?;
    drop(file);

    let skip = tail
        .iter()
        .position(|&b| b == b'\n')
        .map_or(0, |i| i + 1);

    let mut file = File::create(log_path)?;
    file.write_all(b"--- log trimmed, older entries removed ---\n")?;
    file.write_all(&tail[skip..])?;
    Ok(())
}

/// Hands out writers to one shared, append-mode log file
#[derive(Clone)]
struct LogWriterFactory {
    file: Arc<Mutex<File>>,
}

struct LogWriter {
    file: Arc<Mutex<File>>,
}

impl LogWriter {
    fn lock(&self) -> io::Result<MutexGuard<'_, File>> {
        self.file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock()?.flush()
    }
}

impl<'a> MakeWriter<'a> for LogWriterFactory {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            file: Arc::clone(&self.file),
        }
    }
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chipvol={level},chipvol_core=warn")))
}

/// Install the global tracing subscriber.
///
/// Events go to stderr, or to `log_file` (appended, trimmed to the last 1MB
/// once it exceeds 5MB) when one is given. `RUST_LOG` takes precedence over
/// `level`.
pub fn init_logging(level: &str, log_file: Option<&Path>) -> color_eyre::Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(level));

    match log_file {
        Some(log_path) => {
            if let Some(parent) = log_path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            if let Err(e) = rotate_log_if_needed(log_path) {
                eprintln!("Warning: failed to trim log file: {e}");
            }

            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)?;
            let writer = LogWriterFactory {
                file: Arc::new(Mutex::new(file)),
            };

            registry
                .with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true),
                )
                .init();
            tracing::info!("logging to {}", log_path.display());
        }
        None => {
            registry
                .with(fmt::layer().with_writer(io::stderr).with_target(false))
                .init();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_log_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chipvol.log");
        fs::write(&path, "line one\nline two\n").unwrap();

        rotate_log_if_needed(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "line one\nline two\n");

        rotate_log_if_needed(&dir.path().join("missing.log")).unwrap();
    }

    #[test]
    fn test_large_log_trimmed_to_line_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chipvol.log");
        let line = "0123456789abcdefghijklmnopqrstuvwxyz\n";
        let content = line.repeat((MAX_LOG_SIZE as usize / line.len()) + 10);
        fs::write(&path, &content).unwrap();

        rotate_log_if_needed(&path).unwrap();
        let trimmed = fs::read_to_string(&path).unwrap();
        let mut lines = trimmed.lines();
        assert!(lines.next().unwrap().starts_with("--- log trimmed"));
        assert!(lines.all(|l| l == line.trim_end()));
        assert!(trimmed.len() as u64 <= KEEP_SIZE + 64);
    }
}
