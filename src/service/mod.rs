//! Coordinators: the units of work exposed to transport layers.
//!
//! Every public operation on [`Service`] runs inside exactly one
//! transaction, commits on success and rolls back on any error. The
//! transaction never outlives the call, including when the optional
//! deadline fires.

mod admin;
pub mod grouping;
mod resolve;
mod submit;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::repo::Repository;
use crate::types::{Answer, Message, MessageGroup, Topic};

/// Outcome of [`Service::submit`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    /// The newly stored message.
    pub message: Message,
    /// The group the message was filed under.
    pub group: MessageGroup,
    /// The topic named by the caller's hint, if any.
    pub topic: Option<Topic>,
    /// Whether this call created `group`.
    pub group_created: bool,
}

/// Outcome of [`Service::resolve`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    /// The stored answer.
    pub answer: Answer,
    /// The topic after the transition to resolved.
    pub topic: Topic,
    /// Messages attached to the topic at commit time.
    pub messages: Vec<Message>,
}

/// Fact-check service over a [`Repository`].
#[derive(Debug, Clone)]
pub struct Service {
    repo: Repository,
    clock: Arc<dyn Clock>,
    timeout: Option<Duration>,
}

impl Service {
    /// Service using the wall clock and no deadline.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            clock: Arc::new(SystemClock),
            timeout: None,
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Bound every unit of work by `timeout`; `None` disables the bound.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The repository the service runs against.
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Run `work` under the configured deadline. On expiry the future is
    /// dropped, which rolls back its open transaction.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        work: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let Some(limit) = self.timeout else {
            return work.await;
        };
        match tokio::time::timeout(limit, work).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, ?limit, "unit of work timed out, rolled back");
                Err(Error::TimedOut(limit))
            }
        }
    }
}
