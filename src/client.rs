use crate::config::RunConfig;
use anyhow::Result;
use rand::seq::SliceRandom;
use reqwest::Client;

const DEFAULT_USER_AGENT: &str = "pexels_dl/0.1 (rust)";

const USER_AGENTS: [&str; 8] = [
	"Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
	"Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
	"Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
	"Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
	"Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
	"Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0",
	"Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
	"Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
];

// Shared client for page visits and image downloads.
// HTTP/2 is never negotiated and idle connections per host are capped at the
// concurrency limit.
pub fn build_client(config: &RunConfig) -> Result<Client> {
	let mut builder = Client::builder()
		.http1_only()
		.pool_max_idle_per_host(config.batch_size())
		.user_agent(DEFAULT_USER_AGENT);

	if let Some(timeout) = config.timeout {
		builder = builder.timeout(timeout);
	}

	Ok(builder.build()?)
}

// Picks a fresh User-Agent for every call, nothing is remembered between calls
pub fn random_user_agent() -> &'static str {
	USER_AGENTS
		.choose(&mut rand::thread_rng())
		.copied()
		.unwrap_or(DEFAULT_USER_AGENT)
}
