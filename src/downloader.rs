use crate::error_sink::ErrorSink;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::{
	io,
	path::{Path, PathBuf},
	sync::Arc,
};
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};

pub const DEFAULT_UPLOADER: &str = "Various";
const EXTENSION: &str = "jpg";

// Characters that cannot live in a single path component on common filesystems
static UNSAFE_NAME_RE: Lazy<Regex> =
	Lazy::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f]"#).unwrap());

#[derive(Debug, Error)]
pub enum DownloadError {
	#[error("request failed: {0}")]
	Request(#[from] reqwest::Error),

	#[error("unable to create {}: {source}", .path.display())]
	Create { path: PathBuf, source: io::Error },

	#[error("unable to write {}: {source}", .path.display())]
	Write { path: PathBuf, source: io::Error },

	#[error("unable to move {} into place: {source}", .path.display())]
	Rename { path: PathBuf, source: io::Error },
}

#[derive(Debug)]
pub enum Outcome {
	Skipped,
	Downloaded,
	Failed(DownloadError),
}

/// Where one photo lands on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
	pub directory: PathBuf,
	pub filename: String,
}

impl DownloadTarget {
	pub fn new(output_root: &Path, uploader_name: &str, id: u64) -> Self {
		DownloadTarget {
			directory: output_root.join(sanitize_uploader(uploader_name)),
			filename: format!("{}.{}", id, EXTENSION),
		}
	}

	pub fn path(&self) -> PathBuf {
		self.directory.join(&self.filename)
	}

	fn partial_path(&self) -> PathBuf {
		self.directory.join(format!("{}.part", self.filename))
	}
}

// Uploader names come straight from the page and become a directory name
pub fn sanitize_uploader(name: &str) -> String {
	let cleaned = UNSAFE_NAME_RE.replace_all(name.trim(), "_");
	match cleaned.as_ref() {
		"" | "." | ".." => DEFAULT_UPLOADER.to_string(),
		_ => cleaned.into_owned(),
	}
}

pub struct Downloader {
	client: Client,
	output_root: PathBuf,
	error_sink: Arc<ErrorSink>,
}

impl Downloader {
	pub fn new(client: Client, output_root: impl Into<PathBuf>, error_sink: Arc<ErrorSink>) -> Self {
		Downloader {
			client,
			output_root: output_root.into(),
			error_sink,
		}
	}

	pub fn target(&self, uploader_name: &str, id: u64) -> DownloadTarget {
		DownloadTarget::new(&self.output_root, uploader_name, id)
	}

	pub async fn download(&self, image_url: &str, uploader_name: &str, id: u64) -> Outcome {
		let target = self.target(uploader_name, id);
		let path = target.path();

		match fs::try_exists(&path).await {
			Ok(true) => {
				log::info!("[{}] Already downloaded: {} - {}", id, uploader_name, id);
				return Outcome::Skipped;
			}
			Ok(false) => {}
			// Anything but "not found" counts as already there
			Err(e) => {
				log::warn!("[{}] Unable to check {}, skipping: {}", id, path.display(), e);
				return Outcome::Skipped;
			}
		}

		if let Err(e) = fs::create_dir_all(&target.directory).await {
			log::warn!(
				"Unable to create output directory {}: {}",
				target.directory.display(),
				e
			);
		}

		match self.fetch_to_disk(image_url, &target).await {
			Ok(()) => {
				log::info!("[{}] Downloaded: {} - {}", id, uploader_name, id);
				Outcome::Downloaded
			}
			Err(e) => {
				log::warn!("[{}] Unable to download {}: {}", id, image_url, e);
				self.error_sink.record(image_url).await;
				Outcome::Failed(e)
			}
		}
	}

	// Body goes to `<id>.jpg.part` first; `<id>.jpg` only ever exists complete
	async fn fetch_to_disk(&self, image_url: &str, target: &DownloadTarget) -> Result<(), DownloadError> {
		let mut response = self.client.get(image_url).send().await?.error_for_status()?;

		let partial = target.partial_path();
		let mut file = fs::File::create(&partial)
			.await
			.map_err(|source| DownloadError::Create {
				path: partial.clone(),
				source,
			})?;

		let written = async {
			while let Some(chunk) = response.chunk().await? {
				file.write_all(&chunk)
					.await
					.map_err(|source| DownloadError::Write {
						path: partial.clone(),
						source,
					})?;
			}
			file.flush().await.map_err(|source| DownloadError::Write {
				path: partial.clone(),
				source,
			})
		}
		.await;
		drop(file);

		let finished = match written {
			Ok(()) => fs::rename(&partial, target.path())
				.await
				.map_err(|source| DownloadError::Rename {
					path: partial.clone(),
					source,
				}),
			Err(e) => Err(e),
		};

		if finished.is_err() {
			let _ = fs::remove_file(&partial).await;
		}
		finished
	}
}
