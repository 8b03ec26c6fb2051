//! Concurrent fetching of resolved files.
//!
//! Key features:
//! - HTTP Range requests resume partial files left by an earlier run
//! - Exponential backoff retry per URL
//! - Failures are collected per URL; one bad file never aborts the batch
//! - Completed URLs recorded in [`FetchState`] are skipped

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use helio_common::{QueryResponseRow, Value};
use reqwest::{header, Client, Response, StatusCode};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, instrument, warn};

use crate::config::DownloadSettings;
use crate::path::PathTemplate;
use crate::state::{FetchState, FetchStatus};

/// Shared HTTP session and download settings, passed to whatever fetches.
#[derive(Debug, Clone)]
pub struct FetchContext {
    client: Client,
    settings: DownloadSettings,
}

impl FetchContext {
    pub fn new(settings: DownloadSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, settings })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn settings(&self) -> &DownloadSettings {
        &self.settings
    }
}

/// Transfers one remote file to a local path.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Fetch `url` into `dest`, returning the file size in bytes.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// HTTP(S) fetcher with Range resumption.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(context: &FetchContext) -> Self {
        Self {
            client: context.client().clone(),
        }
    }

    async fn send(&self, url: &str, resume_from: u64) -> Result<Response> {
        let mut request = self.client.get(url);
        if resume_from > 0 {
            request = request.header(header::RANGE, format!("bytes={}-", resume_from));
        }
        request.send().await.context("HTTP request failed")
    }

    async fn stream_to_file(&self, response: Response, path: &Path, append: bool) -> Result<u64> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .await
            .context("Failed to open output file")?;

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Error reading response chunk")?;
            file.write_all(&chunk)
                .await
                .context("Error writing to file")?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        file.sync_all().await?;
        Ok(written)
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

fn content_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        let temp_path = partial_path(dest);

        // At most one restart after an unsatisfiable range.
        for _ in 0..2 {
            let resume_from = match fs::metadata(&temp_path).await {
                Ok(meta) => meta.len(),
                Err(_) => 0,
            };

            let response = self.send(url, resume_from).await?;
            let (append, expected) = match response.status() {
                StatusCode::OK => (false, content_length(&response)),
                StatusCode::PARTIAL_CONTENT => {
                    debug!(resume_from, "Resuming partial file");
                    (true, content_length(&response).map(|n| n + resume_from))
                }
                StatusCode::RANGE_NOT_SATISFIABLE => {
                    fs::remove_file(&temp_path).await.ok();
                    continue;
                }
                status => return Err(anyhow!("HTTP error: {}", status)),
            };

            self.stream_to_file(response, &temp_path, append).await?;

            let actual = fs::metadata(&temp_path).await?.len();
            if let Some(expected) = expected {
                if actual != expected {
                    return Err(anyhow!(
                        "Download size mismatch: expected {} bytes, got {}",
                        expected,
                        actual
                    ));
                }
            }

            // Cross-filesystem renames fall back to copy and delete.
            if fs::rename(&temp_path, dest).await.is_err() {
                fs::copy(&temp_path, dest).await?;
                fs::remove_file(&temp_path).await?;
            }
            return Ok(actual);
        }

        Err(anyhow!("Server rejected resume range twice"))
    }
}

/// One file to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub path: PathBuf,
}

/// A URL that could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub url: String,
    pub error: String,
}

/// Outcome of a fetch batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResults {
    pub completed: Vec<PathBuf>,
    /// Files already on disk from an earlier run.
    pub skipped: Vec<PathBuf>,
    pub errors: Vec<FetchFailure>,
}

impl FetchResults {
    /// Local paths of every file now present, fetched or skipped.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.completed.iter().chain(self.skipped.iter())
    }
}

enum Outcome {
    Completed(PathBuf),
    Skipped(PathBuf),
    Failed(FetchFailure),
}

/// Runs fetch batches with bounded concurrency.
pub struct FetchManager {
    fetcher: Arc<dyn RemoteFetcher>,
    state: Arc<FetchState>,
    settings: DownloadSettings,
}

impl FetchManager {
    pub fn new(
        fetcher: Arc<dyn RemoteFetcher>,
        state: Arc<FetchState>,
        settings: DownloadSettings,
    ) -> Self {
        Self {
            fetcher,
            state,
            settings,
        }
    }

    /// Map response rows onto local paths.
    pub fn plan<'a, I>(&self, rows: I, template: &PathTemplate) -> Result<Vec<FetchRequest>>
    where
        I: IntoIterator<Item = &'a QueryResponseRow>,
    {
        rows.into_iter()
            .map(|row| {
                let url = row
                    .get("url")
                    .and_then(Value::as_str)
                    .ok_or_else(|| anyhow!("Row has no url column"))?;
                Ok(FetchRequest {
                    url: url.to_string(),
                    path: template.expand(&self.settings.output_dir, row)?,
                })
            })
            .collect()
    }

    /// Fetch every request, at most `max_concurrent` at a time.
    #[instrument(skip_all, fields(files = requests.len()))]
    pub async fn fetch_all(&self, requests: Vec<FetchRequest>) -> FetchResults {
        let concurrency = self.settings.max_concurrent.max(1);

        let outcomes: Vec<Outcome> = futures::stream::iter(requests)
            .map(|request| self.fetch_one(request))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut results = FetchResults::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Completed(path) => results.completed.push(path),
                Outcome::Skipped(path) => results.skipped.push(path),
                Outcome::Failed(failure) => results.errors.push(failure),
            }
        }

        info!(
            completed = results.completed.len(),
            skipped = results.skipped.len(),
            failed = results.errors.len(),
            "Fetch batch complete"
        );
        results
    }

    async fn fetch_one(&self, request: FetchRequest) -> Outcome {
        match self.fetch_with_retry(&request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(url = %request.url, error = %e, "Fetch failed");
                if let Err(state_err) = self.state.mark_failed(&request.url, &e.to_string()).await {
                    warn!(url = %request.url, error = %state_err, "Failed to record fetch failure");
                }
                Outcome::Failed(FetchFailure {
                    url: request.url,
                    error: e.to_string(),
                })
            }
        }
    }

    async fn fetch_with_retry(&self, request: &FetchRequest) -> Result<Outcome> {
        let url = request.url.as_str();

        if self.state.is_completed(url).await? && request.path.exists() {
            debug!(url = %url, "Already fetched, skipping");
            return Ok(Outcome::Skipped(request.path.clone()));
        }

        self.state.queue(url, &request.path).await?;

        if request.path.exists() {
            info!(path = %request.path.display(), "File already exists, skipping download");
            let size = fs::metadata(&request.path).await?.len();
            self.state.mark_completed(url, size).await?;
            return Ok(Outcome::Skipped(request.path.clone()));
        }

        self.state.update_status(url, FetchStatus::InProgress).await?;

        let mut retry_count = 0;
        let mut delay = self.settings.initial_retry_delay();

        loop {
            match self.fetcher.fetch(url, &request.path).await {
                Ok(bytes) => {
                    self.state.mark_completed(url, bytes).await?;
                    info!(path = %request.path.display(), bytes, "Download completed");
                    return Ok(Outcome::Completed(request.path.clone()));
                }
                Err(e) => {
                    retry_count += 1;
                    if retry_count > self.settings.max_retries {
                        return Err(anyhow!(
                            "Download failed after {} retries: {}",
                            retry_count - 1,
                            e
                        ));
                    }

                    warn!(
                        url = %url,
                        error = %e,
                        retry = retry_count,
                        max_retries = self.settings.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Download failed, retrying"
                    );
                    self.state.record_retry(url, &e.to_string()).await?;

                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, self.settings.max_retry_delay());
                }
            }
        }
    }
}
