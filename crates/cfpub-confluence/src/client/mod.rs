//! Confluence REST API client.
//!
//! Provides sync HTTP client for the Confluence Server/Data Center REST API
//! with bearer token or basic authentication. Rate-limited requests (HTTP 429)
//! are retried with exponential backoff.

mod attachments;
mod labels;
mod pages;
mod spaces;

use std::thread;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::warn;
use ureq::http::Response;
use ureq::tls::TlsConfig;
use ureq::{Agent, Body};

use crate::api::{AttachmentUpload, ConfluenceApi, NewPage, PageLookup, PageUpdate};
use crate::error::ConfluenceError;
use crate::types::{Attachment, Page, Space};

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Retries for rate-limited requests.
const MAX_RETRIES: u32 = 4;

/// Path of the REST API below the site URL.
const API_PATH: &str = "/rest/api";

/// How requests authenticate.
#[derive(Clone)]
pub enum Credentials {
    /// Personal access token, sent as a bearer token.
    Token(String),
    /// HTTP basic authentication.
    Basic {
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
}

impl Credentials {
    fn header(&self) -> String {
        match self {
            Self::Token(token) => format!("Bearer {token}"),
            Self::Basic { username, password } => {
                format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
            }
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(..)"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// Confluence REST API client.
pub struct ConfluenceClient {
    agent: Agent,
    /// Site URL without the REST API path.
    site_url: String,
    auth_header: String,
}

impl ConfluenceClient {
    /// Create a client.
    ///
    /// `host` is the REST API root (`https://wiki.example.com/rest/api/`);
    /// the API path is appended when missing. `insecure` disables TLS
    /// certificate verification.
    pub fn new(host: &str, credentials: &Credentials, insecure: bool) -> Self {
        let mut config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false);
        if insecure {
            config = config.tls_config(TlsConfig::builder().disable_verification(true).build());
        }

        let host = host.trim_end_matches('/');
        let site_url = host.strip_suffix(API_PATH).unwrap_or(host);

        Self {
            agent: config.build().into(),
            site_url: site_url.to_owned(),
            auth_header: credentials.header(),
        }
    }

    /// Get the API base URL.
    fn api_url(&self) -> String {
        format!("{}{API_PATH}", self.site_url)
    }

    /// Get the site URL.
    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// Send a request, retrying while the server rate-limits.
    ///
    /// `send` is called once per attempt. Returns the body of the first
    /// response that is not a 429.
    fn execute<F>(&self, send: F) -> Result<Body, ConfluenceError>
    where
        F: Fn() -> Result<Response<Body>, ureq::Error>,
    {
        let mut attempt = 0;
        loop {
            let response = send()?;
            let status = response.status().as_u16();

            if status == 429 && attempt < MAX_RETRIES {
                let delay = retry_after(&response).unwrap_or_else(|| backoff(attempt));
                warn!(attempt = attempt + 1, delay_secs = delay.as_secs(), "Rate limited, retrying");
                thread::sleep(delay);
                attempt += 1;
                continue;
            }

            let mut body_reader = response.into_body();
            if status >= 400 {
                let error_body = body_reader
                    .read_to_string()
                    .unwrap_or_else(|_| "(unable to read error body)".to_owned());
                return Err(ConfluenceError::HttpResponse {
                    status,
                    body: error_body,
                });
            }
            return Ok(body_reader);
        }
    }
}

impl ConfluenceApi for ConfluenceClient {
    fn get_page(&self, lookup: PageLookup<'_>, expand: &[&str]) -> Result<Option<Page>, ConfluenceError> {
        self.find_page(lookup, expand)
    }

    fn create_page(&self, page: &NewPage<'_>) -> Result<Page, ConfluenceError> {
        Self::create_page(self, page)
    }

    fn update_page(&self, page: &Page, update: &PageUpdate<'_>) -> Result<Page, ConfluenceError> {
        Self::update_page(self, page, update)
    }

    fn get_attachment(&self, page: &Page, filename: &str) -> Result<Option<Attachment>, ConfluenceError> {
        Self::get_attachment(self, page, filename)
    }

    fn create_attachment(
        &self,
        page: &Page,
        upload: &AttachmentUpload<'_>,
    ) -> Result<Attachment, ConfluenceError> {
        Self::create_attachment(self, page, upload)
    }

    fn update_attachment(
        &self,
        page: &Page,
        existing: &Attachment,
        upload: &AttachmentUpload<'_>,
    ) -> Result<Attachment, ConfluenceError> {
        Self::update_attachment(self, page, existing, upload)
    }

    fn add_labels(&self, page: &Page, labels: &[String]) -> Result<(), ConfluenceError> {
        Self::add_labels(self, page, labels)
    }

    fn get_space(&self, key: &str, expand: &[&str]) -> Result<Space, ConfluenceError> {
        Self::get_space(self, key, expand)
    }

    fn page_url(&self, page: &Page) -> String {
        self.get_page_url(page)
    }
}

/// Delay requested by a `Retry-After` header in seconds.
fn retry_after(response: &Response<Body>) -> Option<Duration> {
    let value = response.headers().get("Retry-After")?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Exponential backoff: 1s, 2s, 4s, 8s.
fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1 << attempt.min(6))
}
