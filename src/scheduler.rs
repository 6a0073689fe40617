use crate::{
	config::RunConfig,
	downloader::{Downloader, Outcome, DEFAULT_UPLOADER},
	extractor::PageExtractor,
};
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::ProgressBar;
use std::{future::Future, sync::Arc};
use tokio::task::JoinError;

/// One photo id and the page it lives on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
	pub id: u64,
	pub source_url: String,
}

#[derive(Debug)]
enum TaskReport {
	NoPhoto,
	Finished(Outcome),
}

/// Tally of a finished run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
	pub downloaded: u64,
	pub skipped: u64,
	pub failed: u64,
	pub missing: u64,
	pub crashed: u64,
	pub failed_ids: Vec<u64>,
}

impl RunSummary {
	fn tally(&mut self, id: u64, joined: Result<TaskReport, JoinError>) {
		match joined {
			Ok(TaskReport::NoPhoto) => self.missing += 1,
			Ok(TaskReport::Finished(Outcome::Downloaded)) => self.downloaded += 1,
			Ok(TaskReport::Finished(Outcome::Skipped)) => self.skipped += 1,
			Ok(TaskReport::Finished(Outcome::Failed(reason))) => {
				log::debug!("[{}] Counted as failed: {}", id, reason);
				self.failed += 1;
				self.failed_ids.push(id);
			}
			Err(e) => {
				log::error!("[{}] Task aborted: {}", id, e);
				self.crashed += 1;
			}
		}
	}

	pub fn total(&self) -> u64 {
		self.downloaded + self.skipped + self.failed + self.missing + self.crashed
	}
}

// Batches of up to `concurrency` tasks. A batch is fully joined before the
// first task of the next one is spawned, so batches never overlap.
pub struct Scheduler {
	config: RunConfig,
	extractor: Arc<dyn PageExtractor>,
	downloader: Arc<Downloader>,
	progress: ProgressBar,
}

impl Scheduler {
	pub fn new(
		config: RunConfig,
		extractor: Arc<dyn PageExtractor>,
		downloader: Arc<Downloader>,
	) -> Self {
		Scheduler {
			config,
			extractor,
			downloader,
			progress: ProgressBar::hidden(),
		}
	}

	pub fn with_progress(mut self, progress: ProgressBar) -> Self {
		self.progress = progress;
		self
	}

	pub async fn run(&self) -> RunSummary {
		let batch_size = self.config.batch_size();
		let mut summary = RunSummary::default();
		let mut batch = FuturesUnordered::new();

		self.progress.set_length(self.config.total_ids());

		for id in self.config.start_id..=self.config.stop_id {
			let item = WorkItem {
				id,
				source_url: self.config.page_url(id),
			};
			let handle = tokio::spawn(process_item(
				item,
				Arc::clone(&self.extractor),
				Arc::clone(&self.downloader),
			));
			batch.push(async move { (id, handle.await) });

			if batch.len() == batch_size {
				self.drain(&mut batch, &mut summary).await;
			}
		}

		self.drain(&mut batch, &mut summary).await;

		self.progress.finish_with_message(format!(
			"Done! - Downloaded: {} Skipped: {} Failed: {}",
			summary.downloaded, summary.skipped, summary.failed
		));
		log::info!(
			"Finished ids {}..={}: {} downloaded, {} skipped, {} failed, {} without photo, {} aborted",
			self.config.start_id,
			self.config.stop_id,
			summary.downloaded,
			summary.skipped,
			summary.failed,
			summary.missing,
			summary.crashed
		);
		log::debug!("Accounted for {} of {} ids", summary.total(), self.config.total_ids());
		if !summary.failed_ids.is_empty() {
			log::debug!("Failed ids: {:?}", summary.failed_ids);
		}

		summary
	}

	// Barrier: waits for every task in the batch, in completion order
	async fn drain<F>(&self, batch: &mut FuturesUnordered<F>, summary: &mut RunSummary)
	where
		F: Future<Output = (u64, Result<TaskReport, JoinError>)>,
	{
		while let Some((id, joined)) = batch.next().await {
			summary.tally(id, joined);
			self.progress.inc(1);
		}
	}
}

async fn process_item(
	item: WorkItem,
	extractor: Arc<dyn PageExtractor>,
	downloader: Arc<Downloader>,
) -> TaskReport {
	log::debug!("Visiting {}", item.source_url);
	let extraction = extractor.extract(&item.source_url).await;

	let image_url = match extraction.image_url.filter(|url| !url.trim().is_empty()) {
		Some(url) => url,
		None => {
			log::info!("[{}] No photo found at {}", item.id, item.source_url);
			return TaskReport::NoPhoto;
		}
	};

	let uploader_name = extraction
		.uploader_name
		.filter(|name| !name.trim().is_empty())
		.unwrap_or_else(|| DEFAULT_UPLOADER.to_string());

	TaskReport::Finished(downloader.download(&image_url, &uploader_name, item.id).await)
}
