use std::{path::PathBuf, time::Duration};

pub const DEFAULT_PAGE_BASE_URL: &str = "https://www.pexels.com/photo";
pub const DEFAULT_ERROR_LOG: &str = "./error.txt";

/// Everything the scraper needs for one run. Built once by `main` and handed
/// to the scheduler; nothing reads arguments from global state.
#[derive(Debug, Clone)]
pub struct RunConfig {
	pub output_root: PathBuf,
	pub concurrency: usize,
	pub random_user_agent: bool,
	pub verbose: bool,
	pub start_id: u64,
	pub stop_id: u64,
	pub error_log: PathBuf,
	pub page_base_url: String,
	pub timeout: Option<Duration>,
}

impl RunConfig {
	pub fn new(output_root: impl Into<PathBuf>, start_id: u64, stop_id: u64) -> Self {
		RunConfig {
			output_root: output_root.into(),
			concurrency: 10,
			random_user_agent: false,
			verbose: false,
			start_id,
			stop_id,
			error_log: PathBuf::from(DEFAULT_ERROR_LOG),
			page_base_url: DEFAULT_PAGE_BASE_URL.to_string(),
			timeout: None,
		}
	}

	// Page URL for one photo id
	pub fn page_url(&self, id: u64) -> String {
		format!("{}/{}", self.page_base_url.trim_end_matches('/'), id)
	}

	// A limit of zero would never fill a batch, treat it as one
	pub fn batch_size(&self) -> usize {
		self.concurrency.max(1)
	}

	pub fn total_ids(&self) -> u64 {
		if self.start_id > self.stop_id {
			0
		} else {
			(self.stop_id - self.start_id).saturating_add(1)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_page_url() {
		let mut config = RunConfig::new("output", 1, 3);
		assert_eq!(config.page_url(42), "https://www.pexels.com/photo/42");

		config.page_base_url = "http://127.0.0.1:8080/photo/".to_string();
		assert_eq!(config.page_url(7), "http://127.0.0.1:8080/photo/7");
	}

	#[test]
	fn test_batch_size_and_total() {
		let mut config = RunConfig::new("output", 5, 9);
		config.concurrency = 0;
		assert_eq!(config.batch_size(), 1);
		assert_eq!(config.total_ids(), 5);

		config.start_id = 10;
		assert_eq!(config.total_ids(), 0);

		// Full u64 range saturates instead of overflowing
		let config = RunConfig::new("output", 0, u64::MAX);
		assert_eq!(config.total_ids(), u64::MAX);

		let config = RunConfig::new("output", u64::MAX, u64::MAX);
		assert_eq!(config.total_ids(), 1);
	}
}
