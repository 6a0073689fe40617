use crate::client::random_user_agent;
use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};

// Photo Page Selectors
static UPLOADER_SELECTOR: Lazy<Selector> =
	Lazy::new(|| Selector::parse("h3.mini-profile__name a").unwrap());
static DOWNLOAD_INPUT_SELECTOR: Lazy<Selector> =
	Lazy::new(|| Selector::parse("ul.select-list input").unwrap());

const DOWNLOAD_URL_ATTR: &str = "data-alt-url";

/// What a photo page yielded. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
	pub uploader_name: Option<String>,
	pub image_url: Option<String>,
}

/// Turns a page URL into an [`ExtractionResult`].
///
/// Implementations never fail: anything that goes wrong while fetching or
/// parsing the page comes back as an empty result.
#[async_trait]
pub trait PageExtractor: Send + Sync {
	async fn extract(&self, url: &str) -> ExtractionResult;
}

pub struct HtmlExtractor {
	client: Client,
	random_user_agent: bool,
}

impl HtmlExtractor {
	pub fn new(client: Client, random_user_agent: bool) -> Self {
		HtmlExtractor {
			client,
			random_user_agent,
		}
	}

	async fn request_page(&self, url: &str) -> Result<String> {
		let mut request = self.client.get(url);
		if self.random_user_agent {
			request = request.header(reqwest::header::USER_AGENT, random_user_agent());
		}

		let response = request.send().await?.error_for_status()?;
		log::debug!("Received status {} from {}", response.status(), url);

		Ok(response.text().await?)
	}
}

#[async_trait]
impl PageExtractor for HtmlExtractor {
	async fn extract(&self, url: &str) -> ExtractionResult {
		match self.request_page(url).await {
			Ok(body) => parse_page(&Html::parse_document(&body)),
			Err(e) => {
				log::warn!("Unable to visit {}: {}", url, e);
				ExtractionResult::default()
			}
		}
	}
}

fn non_empty(text: &str) -> Option<String> {
	let text = text.trim();
	if text.is_empty() {
		None
	} else {
		Some(text.to_string())
	}
}

pub fn parse_page(document: &Html) -> ExtractionResult {
	let uploader_name = document
		.select(&UPLOADER_SELECTOR)
		.next()
		.and_then(|link| non_empty(&link.text().collect::<String>()));

	let image_url = document
		.select(&DOWNLOAD_INPUT_SELECTOR)
		.next()
		.and_then(|input| input.value().attr(DOWNLOAD_URL_ATTR))
		.and_then(non_empty);

	ExtractionResult {
		uploader_name,
		image_url,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use wiremock::matchers::{header_exists, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	const PHOTO_PAGE: &str = r#"
		<html><body>
			<div class="mini-profile">
				<h3 class="mini-profile__name"><a href="/@alice">  Alice Smith </a></h3>
			</div>
			<ul class="select-list">
				<li><input type="radio" name="size" value="original" data-alt-url="https://images.example.com/photos/1/original.jpg"></li>
				<li><input type="radio" name="size" value="large" data-alt-url="https://images.example.com/photos/1/large.jpg"></li>
			</ul>
		</body></html>
	"#;

	#[test]
	fn test_parse_page() {
		let result = parse_page(&Html::parse_document(PHOTO_PAGE));
		assert_eq!(result.uploader_name.as_deref(), Some("Alice Smith"));
		assert_eq!(
			result.image_url.as_deref(),
			Some("https://images.example.com/photos/1/original.jpg")
		);
	}

	#[test]
	fn test_parse_page_without_uploader() {
		let html = r#"<ul class="select-list"><li><input data-alt-url="http://x/3.jpg"></li></ul>"#;
		let result = parse_page(&Html::parse_document(html));
		assert_eq!(result.uploader_name, None);
		assert_eq!(result.image_url.as_deref(), Some("http://x/3.jpg"));
	}

	#[test]
	fn test_parse_page_blank_values_are_absent() {
		let html = r#"
			<h3 class="mini-profile__name"><a>   </a></h3>
			<ul class="select-list"><li><input data-alt-url=""></li></ul>
		"#;
		let result = parse_page(&Html::parse_document(html));
		assert_eq!(result, ExtractionResult::default());
	}

	#[test]
	fn test_parse_page_reads_only_first_input() {
		let html = r#"
			<ul class="select-list">
				<li><input type="checkbox" name="license"></li>
				<li><input data-alt-url="http://x/4.jpg"></li>
			</ul>
		"#;
		let result = parse_page(&Html::parse_document(html));
		assert_eq!(result.image_url, None);
	}

	#[test]
	fn test_parse_page_unrelated_document() {
		let result = parse_page(&Html::parse_document("<p>not a photo</p>"));
		assert_eq!(result, ExtractionResult::default());
	}

	#[tokio::test]
	async fn test_extract_from_server() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/photo/1"))
			.and(header_exists("user-agent"))
			.respond_with(ResponseTemplate::new(200).set_body_string(PHOTO_PAGE))
			.expect(1)
			.mount(&server)
			.await;

		let extractor = HtmlExtractor::new(Client::new(), true);
		let result = extractor
			.extract(&format!("{}/photo/1", server.uri()))
			.await;

		assert_eq!(result.uploader_name.as_deref(), Some("Alice Smith"));
		assert!(result.image_url.is_some());
	}

	#[tokio::test]
	async fn test_extract_degrades_on_error_status() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/photo/2"))
			.respond_with(ResponseTemplate::new(404).set_body_string(PHOTO_PAGE))
			.mount(&server)
			.await;

		let extractor = HtmlExtractor::new(Client::new(), false);
		let result = extractor
			.extract(&format!("{}/photo/2", server.uri()))
			.await;

		assert_eq!(result, ExtractionResult::default());
	}

	#[tokio::test]
	async fn test_extract_degrades_on_unreachable_host() {
		let extractor = HtmlExtractor::new(Client::new(), false);
		let result = extractor.extract("http://127.0.0.1:9/photo/3").await;
		assert_eq!(result, ExtractionResult::default());
	}
}
