use std::time::Duration;

use crate::error::FetchError;

/// Fetches with slow or stalled servers would otherwise hang forever; each
/// body read must produce data within this window.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// GETs a URL and buffers the whole body in memory, reporting progress when
/// the server advertises a content length.
pub struct Fetcher {
    client: reqwest::Client,
    idle_timeout: Duration,
}

impl Fetcher {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new(), idle_timeout: DEFAULT_IDLE_TIMEOUT }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Download `url` into memory. `on_progress(read, total)` fires after
    /// every received chunk when the total size is known.
    ///
    /// Any non-success status is an error; redirects follow the client
    /// defaults.
    pub async fn fetch<F>(&self, url: &str, mut on_progress: F) -> Result<Vec<u8>, FetchError>
    where
        F: FnMut(u64, u64),
    {
        let mut response = self.client.get(url).send().await?.error_for_status()?;
        let total = response.content_length().filter(|length| *length > 0);
        let mut body = Vec::with_capacity(total.unwrap_or(0) as usize);

        loop {
            let chunk = tokio::time::timeout(self.idle_timeout, response.chunk())
                .await
                .map_err(|_| FetchError::IdleTimeout(self.idle_timeout))??;
            let Some(chunk) = chunk else { break };
            body.extend_from_slice(&chunk);
            if let Some(total) = total {
                on_progress(body.len() as u64, total);
            }
        }
        Ok(body)
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}
