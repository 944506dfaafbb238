//! Polling loop for the requests table.
//!
//! DESIGN
//! ======
//! `refresh` issues one `GET /requests_ajax/?viewed=…` and, on success,
//! publishes a new `TableSnapshot` on a watch channel. Failures are logged
//! and the last good snapshot stays published (stale over broken).
//!
//! `start` runs `refresh` immediately and then on a fixed interval until
//! the returned `PollHandle` is stopped or dropped. Each tick awaits its
//! refresh before the next one fires, so results are published in request
//! order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::Url;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::render::{DisplayMode, TableSnapshot};
use super::types::{PollError, RequestList, parse_poll_body};
use crate::config::{ClientConfig, ConfigError};
use crate::error::ErrorCode;

pub const REQUESTS_PATH: &str = "/requests_ajax/";
pub const DEFAULT_TITLE: &str = "Requests";

pub struct RequestPoller {
    http: reqwest::Client,
    url: Url,
    mode: DisplayMode,
    focused: AtomicBool,
    snapshot: watch::Sender<TableSnapshot>,
}

impl RequestPoller {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the endpoint URL does not parse.
    pub fn new(http: reqwest::Client, config: &ClientConfig, mode: DisplayMode, title: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(&config.url(REQUESTS_PATH)).map_err(|_| ConfigError::InvalidBaseUrl(config.base_url.clone()))?;
        let (snapshot, _) = watch::channel(TableSnapshot::new(title));
        Ok(Self { http, url, mode, focused: AtomicBool::new(false), snapshot })
    }

    /// Receiver for every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TableSnapshot> {
        self.snapshot.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> TableSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Whether the viewer currently has focus; sent as the `viewed` hint.
    pub fn set_focused(&self, focused: bool) {
        self.focused.store(focused, Ordering::Relaxed);
    }

    /// Fetch the current request list without publishing it.
    ///
    /// # Errors
    ///
    /// Returns a [`PollError`] on transport failure, non-2xx status or an
    /// unparsable body.
    pub async fn fetch(&self) -> Result<RequestList, PollError> {
        let viewed = if self.focused.load(Ordering::Relaxed) { "yes" } else { "" };
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("viewed", viewed);

        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| PollError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| PollError::Transport(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(PollError::Status { status, body: text });
        }

        parse_poll_body(&text)
    }

    /// Fetch and publish. Failures keep the previous snapshot.
    pub async fn refresh(&self) {
        match self.fetch().await {
            Ok(list) => {
                debug!(rows = list.records.len(), context = ?list.context_id, "request list refreshed");
                self.snapshot.send_modify(|snapshot| snapshot.apply(&list, self.mode));
            }
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "request poll failed; keeping last render");
            }
        }
    }

    /// Refresh now and then every `every` until the handle is stopped.
    #[must_use]
    pub fn start(self: Arc<Self>, every: Duration) -> PollHandle {
        info!(url = %self.url, interval = ?every, "request polling started");
        let task = tokio::spawn(async move {
            // interval() panics on a zero period.
            let mut ticker = tokio::time::interval(every.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.refresh().await;
            }
        });
        PollHandle { task }
    }
}

/// Owns the polling task; stopping or dropping it cancels polling.
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn stop(&self) {
        self.task.abort();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[path = "poller_test.rs"]
mod tests;
