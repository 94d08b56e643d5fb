//! Location providers
//!
//! [`ScriptedLocationProvider`] replays a fixed list of samples and backs
//! the simulator and tests. [`ChannelLocationProvider`] receives samples
//! pushed by an external GPS adapter.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stepand_core::{LocationProvider, Result, StepandError, UserLocation};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Replays a prepared route at a fixed interval
#[derive(Debug)]
pub struct ScriptedLocationProvider {
    name: String,
    start: Option<UserLocation>,
    samples: VecDeque<UserLocation>,
    interval: Duration,
    failure: Option<String>,
    stopped: Arc<AtomicBool>,
}

impl ScriptedLocationProvider {
    /// `start` is the initial fix, `samples` follow one per `interval`
    pub fn new(start: UserLocation, samples: Vec<UserLocation>, interval: Duration) -> Self {
        Self {
            name: "scripted".to_string(),
            start: Some(start),
            samples: samples.into(),
            interval,
            failure: None,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A provider that never obtains a fix, e.g. permission denied
    pub fn unavailable() -> Self {
        Self {
            name: "unavailable".to_string(),
            start: None,
            samples: VecDeque::new(),
            interval: Duration::ZERO,
            failure: None,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Fail with `message` instead of ending cleanly once the script runs out
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Shared flag set when [`LocationProvider::stop`] is called
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stopped)
    }

    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

#[async_trait]
impl LocationProvider for ScriptedLocationProvider {
    async fn current(&mut self) -> Result<UserLocation> {
        self.start
            .ok_or_else(|| StepandError::LocationUnavailable(format!("{}: no fix available", self.name)))
    }

    async fn next_sample(&mut self) -> Result<Option<UserLocation>> {
        if self.stopped.load(Ordering::SeqCst) {
            return Ok(None);
        }
        if self.samples.is_empty() {
            return match &self.failure {
                Some(message) => Err(StepandError::LocationUnavailable(message.clone())),
                None => Ok(None),
            };
        }
        tokio::time::sleep(self.interval).await;
        Ok(self.samples.pop_front())
    }

    async fn stop(&mut self) -> Result<()> {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            debug!(provider = %self.name, remaining = self.samples.len(), "location updates stopped");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Sending half paired with a [`ChannelLocationProvider`]
pub type LocationSender = mpsc::Sender<UserLocation>;

/// Receives samples from an external producer
///
/// The first sample received is used as the initial fix.
#[derive(Debug)]
pub struct ChannelLocationProvider {
    rx: mpsc::Receiver<UserLocation>,
    first_fix_timeout: Option<Duration>,
}

impl ChannelLocationProvider {
    pub fn new(rx: mpsc::Receiver<UserLocation>) -> Self {
        Self {
            rx,
            first_fix_timeout: None,
        }
    }

    /// Create a provider together with its sender
    pub fn channel(buffer: usize) -> (LocationSender, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self::new(rx))
    }

    /// Give up on the initial fix after `timeout`
    pub fn with_first_fix_timeout(mut self, timeout: Duration) -> Self {
        self.first_fix_timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl LocationProvider for ChannelLocationProvider {
    async fn current(&mut self) -> Result<UserLocation> {
        let first = match self.first_fix_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.rx.recv()).await.map_err(|_| {
                warn!(?timeout, "no location fix received");
                StepandError::LocationUnavailable(format!(
                    "no fix within {}ms",
                    timeout.as_millis()
                ))
            })?,
            None => self.rx.recv().await,
        };
        first.ok_or_else(|| StepandError::LocationUnavailable("location channel closed".into()))
    }

    async fn next_sample(&mut self) -> Result<Option<UserLocation>> {
        Ok(self.rx.recv().await)
    }

    async fn stop(&mut self) -> Result<()> {
        self.rx.close();
        Ok(())
    }

    fn name(&self) -> &str {
        "channel"
    }
}
