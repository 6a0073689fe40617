use anyhow::{Context, Result};
use std::{
	path::{Path, PathBuf},
	sync::atomic::{AtomicU64, Ordering},
};
use tokio::{
	fs::{File, OpenOptions},
	io::AsyncWriteExt,
	sync::Mutex,
};

/// Flat log of URLs that could not be downloaded, one per line.
///
/// The file is truncated when the sink is created, so it only ever holds
/// failures from the current run. Appends are serialized by a mutex and a
/// line is written with a single `write_all`, so lines from concurrent tasks
/// never interleave.
pub struct ErrorSink {
	path: PathBuf,
	file: Mutex<File>,
	recorded: AtomicU64,
}

impl ErrorSink {
	pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref().to_path_buf();
		let file = OpenOptions::new()
			.write(true)
			.create(true)
			.truncate(true)
			.open(&path)
			.await
			.with_context(|| format!("Unable to create error log {}", path.display()))?;

		Ok(ErrorSink {
			path,
			file: Mutex::new(file),
			recorded: AtomicU64::new(0),
		})
	}

	pub async fn record(&self, line: &str) {
		let entry = format!("{}\n", line);
		let mut file = self.file.lock().await;

		let written = match file.write_all(entry.as_bytes()).await {
			Ok(()) => file.flush().await,
			Err(e) => Err(e),
		};

		match written {
			Ok(()) => {
				self.recorded.fetch_add(1, Ordering::Relaxed);
			}
			Err(e) => log::error!(
				"Unable to write {} to {}: {}",
				line,
				self.path.display(),
				e
			),
		}
	}

	pub fn recorded(&self) -> u64 {
		self.recorded.load(Ordering::Relaxed)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}
