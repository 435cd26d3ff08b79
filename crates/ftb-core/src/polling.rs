//! Long-polling update loop with offset acknowledgment.
//!
//! One spawned task owns the offset. Each iteration fetches a batch starting
//! at the current offset, hands the whole batch to the handler and only then
//! moves the offset past the highest id seen. The service treats the next
//! request's offset as the acknowledgment, so a crash between the handler and
//! the next fetch redelivers the batch (at-least-once).

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use tokio::{sync::watch, task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;

use crate::{
    api::{BotClient, GetUpdates},
    errors::Error,
    types::{Update, UpdateKind},
    Result,
};

pub const MAX_LIMIT: u8 = 100;

/// What the loop does when an iteration fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// End the loop; [`PollingHandle::join`] returns the error.
    #[default]
    Stop,
    /// Log, wait `delay`, and fetch again from the same offset.
    Retry { delay: Duration },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollingOptions {
    /// First offset to request; updates below it are considered acknowledged.
    pub offset: i64,
    /// Maximum batch size, 1..=100.
    pub limit: u8,
    /// Long-poll timeout in seconds; 0 is a short poll.
    pub timeout_secs: u32,
    /// `None` keeps whatever filter the service last saw.
    pub allowed_updates: Option<Vec<UpdateKind>>,
    pub error_policy: ErrorPolicy,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: MAX_LIMIT,
            timeout_secs: 0,
            allowed_updates: None,
            error_policy: ErrorPolicy::Stop,
        }
    }
}

impl PollingOptions {
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(Error::InvalidArgument(format!(
                "poll limit must be within 1..={MAX_LIMIT}, got {}",
                self.limit
            )));
        }
        if let Some(kinds) = &self.allowed_updates {
            if kinds.contains(&UpdateKind::Unknown) {
                return Err(Error::InvalidArgument(
                    "allowed_updates cannot name an unknown kind".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Receives every non-empty batch, in service order.
///
/// The poller awaits the handler before fetching again. An error aborts the
/// iteration without acknowledging the batch.
#[async_trait]
pub trait UpdateHandler: Send + Sync + 'static {
    async fn handle(&self, updates: Vec<Update>) -> Result<()>;
}

#[async_trait]
impl<F, Fut> UpdateHandler for F
where
    F: Fn(Vec<Update>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn handle(&self, updates: Vec<Update>) -> Result<()> {
        (self)(updates).await
    }
}

/// Handle to a running poller.
#[derive(Debug)]
pub struct PollingHandle {
    offset: watch::Receiver<i64>,
    cancel: CancellationToken,
    task: JoinHandle<Result<()>>,
}

impl PollingHandle {
    /// Offset the next fetch will carry.
    pub fn offset(&self) -> i64 {
        *self.offset.borrow()
    }

    /// Watch offset changes (one per acknowledged batch).
    pub fn subscribe(&self) -> watch::Receiver<i64> {
        self.offset.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to end. `Ok(())` after cancellation.
    pub async fn join(self) -> Result<()> {
        match self.task.await {
            Ok(result) => result,
            Err(err) => Err(Error::Handler(format!("polling task failed: {err}"))),
        }
    }
}

enum Step {
    Fetched,
    Cancelled,
}

struct UpdatePoller<H> {
    client: BotClient,
    handler: H,
    options: PollingOptions,
    offset: watch::Sender<i64>,
    cancel: CancellationToken,
}

impl<H: UpdateHandler> UpdatePoller<H> {
    async fn run(self) -> Result<()> {
        tracing::info!(
            offset = *self.offset.borrow(),
            limit = self.options.limit,
            timeout_secs = self.options.timeout_secs,
            "update poller started"
        );

        let result = loop {
            if self.cancel.is_cancelled() {
                break Ok(());
            }
            match self.iterate().await {
                Ok(Step::Fetched) => {}
                Ok(Step::Cancelled) => break Ok(()),
                Err(err) => match self.options.error_policy {
                    ErrorPolicy::Stop => break Err(err),
                    ErrorPolicy::Retry { delay } => {
                        tracing::warn!(
                            error = %err,
                            offset = *self.offset.borrow(),
                            delay_ms = delay.as_millis() as u64,
                            "polling iteration failed; retrying"
                        );
                        tokio::select! {
                            _ = self.cancel.cancelled() => break Ok(()),
                            _ = sleep(delay) => {}
                        }
                    }
                },
            }
        };

        match &result {
            Ok(()) => tracing::info!(offset = *self.offset.borrow(), "update poller stopped"),
            Err(err) => tracing::error!(error = %err, "update poller failed"),
        }
        result
    }

    async fn iterate(&self) -> Result<Step> {
        let offset = *self.offset.borrow();
        let params = GetUpdates {
            offset,
            limit: self.options.limit,
            timeout: self.options.timeout_secs,
            allowed_updates: self.options.allowed_updates.clone(),
        };

        let batch = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(Step::Cancelled),
            batch = self.client.get_updates(&params) => batch?,
        };

        let Some(highest) = batch.iter().map(|u| u.id).max() else {
            return Ok(Step::Fetched);
        };
        let next = highest.saturating_add(1);
        tracing::debug!(count = batch.len(), offset, next, "dispatching update batch");

        self.handler.handle(batch).await?;

        if next < offset {
            tracing::warn!(offset, next, "update ids went backwards; following the service");
        }
        self.offset.send_replace(next);
        Ok(Step::Fetched)
    }
}

impl BotClient {
    /// Validate `options`, spawn the polling loop and return right away.
    ///
    /// Must be called from within a tokio runtime. The loop ends when
    /// `cancel` (or [`PollingHandle::cancel`]) fires, or on the first failure
    /// under [`ErrorPolicy::Stop`].
    pub fn start_polling<H: UpdateHandler>(
        &self,
        handler: H,
        options: PollingOptions,
        cancel: CancellationToken,
    ) -> Result<PollingHandle> {
        options.validate()?;

        let (tx, rx) = watch::channel(options.offset);
        let poller = UpdatePoller {
            client: self.clone(),
            handler,
            options,
            offset: tx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(poller.run());

        Ok(PollingHandle {
            offset: rx,
            cancel,
            task,
        })
    }
}
