mod client;
mod config;
mod downloader;
mod error_sink;
mod extractor;
mod scheduler;

use crate::{
	config::{RunConfig, DEFAULT_ERROR_LOG, DEFAULT_PAGE_BASE_URL},
	downloader::Downloader,
	error_sink::ErrorSink,
	extractor::HtmlExtractor,
	scheduler::Scheduler,
};
use anyhow::{bail, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use std::{path::PathBuf, sync::Arc, time::Duration};

#[derive(Parser, Debug)]
#[clap(about, version, author)]
struct Args {
	/// Directory photos are saved under, one folder per uploader
	#[arg(short, long, default_value = "output")]
	output: PathBuf,

	/// Photos fetched at the same time
	#[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..))]
	concurrency: u16,

	/// Send a random User-Agent with every page visit
	#[clap(short, long)]
	random_ua: bool,

	#[clap(short, long)]
	verbose: bool,

	#[arg(long)]
	start: u64,

	#[arg(long)]
	stop: u64,

	#[arg(long, default_value = DEFAULT_ERROR_LOG)]
	error_log: PathBuf,

	#[arg(long, default_value = DEFAULT_PAGE_BASE_URL)]
	base_url: String,

	/// Per request timeout in seconds, none by default
	#[arg(long)]
	timeout: Option<u64>,
}

impl Args {
	fn into_config(self) -> Result<RunConfig> {
		if self.start > self.stop {
			bail!("--start ({}) must not be greater than --stop ({})", self.start, self.stop);
		}

		let mut config = RunConfig::new(self.output, self.start, self.stop);
		config.concurrency = self.concurrency.into();
		config.random_user_agent = self.random_ua;
		config.verbose = self.verbose;
		config.error_log = self.error_log;
		config.page_base_url = self.base_url;
		config.timeout = self.timeout.map(Duration::from_secs);

		Ok(config)
	}
}

fn init_logger(verbose: bool) {
	let level = if verbose {
		LevelFilter::Debug
	} else {
		LevelFilter::Info
	};

	if pretty_env_logger::formatted_builder()
		.filter_level(level)
		.parse_default_env()
		.try_init()
		.is_err()
	{
		log::warn!("Logger is already initialized.");
	}
}

// Main Function
#[tokio::main]
async fn main() -> Result<()> {
	let config = Args::parse().into_config()?;
	init_logger(config.verbose);

	let client = client::build_client(&config)?;
	let error_sink = Arc::new(ErrorSink::create(&config.error_log).await?);

	let extractor = Arc::new(HtmlExtractor::new(client.clone(), config.random_user_agent));
	let downloader = Arc::new(Downloader::new(
		client,
		config.output_root.clone(),
		Arc::clone(&error_sink),
	));

	let progress_bar = ProgressBar::new(config.total_ids());
	progress_bar.set_style(
		ProgressStyle::default_bar()
			.template("{msg} {spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} ({eta_precise})")
			.expect("Failed to set progress bar style.")
			.progress_chars("##-"),
	);
	progress_bar.set_message("Fetching photos");

	log::info!(
		"Scraping ids {}..={} into {} with {} workers",
		config.start_id,
		config.stop_id,
		config.output_root.display(),
		config.batch_size()
	);

	let summary = Scheduler::new(config, extractor, downloader)
		.with_progress(progress_bar)
		.run()
		.await;

	if summary.failed > 0 {
		log::warn!(
			"{} failed downloads written to {}",
			error_sink.recorded(),
			error_sink.path().display()
		);
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_args_into_config() {
		let args = Args::try_parse_from([
			"pexels_dl", "--start", "5", "--stop", "9", "-c", "3", "-r", "--timeout", "30",
		])
		.expect("arguments should parse");
		let config = args.into_config().expect("range is valid");

		assert_eq!(config.start_id, 5);
		assert_eq!(config.stop_id, 9);
		assert_eq!(config.concurrency, 3);
		assert!(config.random_user_agent);
		assert_eq!(config.timeout, Some(Duration::from_secs(30)));
		assert_eq!(config.output_root, PathBuf::from("output"));
		assert_eq!(config.error_log, PathBuf::from(DEFAULT_ERROR_LOG));
	}

	#[test]
	fn test_zero_concurrency_is_rejected() {
		let result = Args::try_parse_from(["pexels_dl", "--start", "1", "--stop", "2", "-c", "0"]);
		assert!(result.is_err());
	}

	#[test]
	fn test_full_id_range_is_accepted() {
		let args = Args::try_parse_from(["pexels_dl", "--start", "0", "--stop", "18446744073709551615"])
			.expect("arguments should parse");
		let config = args.into_config().expect("range is valid");
		assert_eq!(config.total_ids(), u64::MAX);
	}

	#[test]
	fn test_reversed_range_is_rejected() {
		let args = Args::try_parse_from(["pexels_dl", "--start", "9", "--stop", "2"])
			.expect("arguments should parse");
		assert!(args.into_config().is_err());
	}
}
