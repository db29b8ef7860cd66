//! Batch processing for JSON-RPC requests
//!
//! JSON-RPC 2.0 allows several calls to be sent in a single message as an
//! array. Items are executed one after the other, in input order, and the
//! responses keep that order. Notifications are executed but leave no
//! element in the response.
//!
//! # Size Limiting
//!
//! A batch larger than the configured limit is refused before any item
//! runs, with a single `InvalidRequest` error carrying
//! `data: {"batch_limit": N}`. An empty batch is refused the same way.
//!
//! # Failure Policy
//!
//! - **Continue**: every item is attempted, failures are reported in place
//! - **Stop**: after the first failed item (notifications included) the
//!   remaining items are not executed; each id-bearing one receives a
//!   "Cancelled due to previous error" internal error

use crate::controller::{Dispatcher, ItemOutcome, ReplyTo};
use jrpc_core::{Error, Outcome, RpcError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

/// What happens to the rest of a batch once an item fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchFailure {
    /// Keep executing the remaining items
    #[default]
    Continue,

    /// Cancel the remaining items
    Stop,
}

impl FromStr for BatchFailure {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(Self::Continue),
            "stop" => Ok(Self::Stop),
            other => Err(Error::Config(format!("unknown batch failure policy: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchState {
    Accepted,
    Cancelling,
}

impl<C> Dispatcher<C>
where
    C: Send + Sync + 'static,
{
    #[tracing::instrument(skip_all, fields(batch_size = items.len(), policy = ?self.config().batch_failure))]
    pub(crate) async fn process_batch(
        &self,
        ctx: Arc<C>,
        items: &[Value],
    ) -> Result<Outcome, RpcError> {
        if items.is_empty() {
            tracing::warn!("empty batch");
            if let Some(metrics) = self.metrics() {
                metrics.record_batch_rejected("empty");
            }
            return Err(RpcError::invalid_request()
                .with_message("Invalid request: batch must contain at least one element"));
        }

        let limit = self.config().batch_limit;
        if items.len() > limit {
            tracing::warn!(batch_size = items.len(), batch_limit = limit, "Batch size exceeded");
            if let Some(metrics) = self.metrics() {
                metrics.record_batch_rejected("limit");
            }
            return Err(RpcError::batch_limit_exceeded(limit));
        }

        if let Some(metrics) = self.metrics() {
            metrics.record_batch(items.len());
        }

        let stop_on_failure = self.config().batch_failure == BatchFailure::Stop;
        let mut state = BatchState::Accepted;
        let mut responses = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let outcome = match state {
                BatchState::Accepted => self.run_item(Arc::clone(&ctx), item).await,
                BatchState::Cancelling => ItemOutcome {
                    reply_to: ReplyTo::of(item),
                    result: Err(RpcError::cancelled()),
                },
            };

            if state == BatchState::Accepted && stop_on_failure && outcome.failed() {
                tracing::debug!(index, "cancelling remaining batch items");
                state = BatchState::Cancelling;
            }

            if let Some(response) = outcome.into_response() {
                responses.push(response);
            }
        }

        tracing::debug!(response_count = responses.len(), "Batch processing completed");

        if responses.is_empty() {
            Ok(Outcome::NoContent)
        } else {
            Ok(Outcome::Batch(responses))
        }
    }
}
