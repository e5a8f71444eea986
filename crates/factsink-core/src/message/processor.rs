//! NotificationProcessor trait and its type-erased wrapper.
//!
//! The entry points (Lambda loop, HTTP endpoint, CLI replay) only need
//! "process this notification". They hold a [`BoxNotificationProcessor`] so
//! the concrete handler and its backends can be picked at runtime, and so
//! tests can substitute a fake.
//!
//! Same blanket-impl pattern as the other boxed ports:
//! 1. Object-safe `NotificationProcessorDyn` with boxed futures
//! 2. Blanket impl for every `T: NotificationProcessor`
//! 3. `BoxNotificationProcessor` wraps `Box<dyn NotificationProcessorDyn>`

use std::future::Future;
use std::pin::Pin;

use factsink_types::error::PipelineError;
use factsink_types::memory::ProcessOutcome;
use factsink_types::notification::DeliveryNotification;

use crate::llm::provider::LlmProvider;
use crate::memory::store::MemoryStore;
use crate::pipeline::handler::TranscriptExtractionHandler;
use crate::storage::object_store::ObjectStore;

/// Anything that can run one delivery notification to completion.
pub trait NotificationProcessor: Send + Sync {
    fn process(
        &self,
        notification: &DeliveryNotification,
    ) -> impl Future<Output = Result<ProcessOutcome, PipelineError>> + Send;
}

impl<S, L, M> NotificationProcessor for TranscriptExtractionHandler<S, L, M>
where
    S: ObjectStore,
    L: LlmProvider,
    M: MemoryStore,
{
    async fn process(
        &self,
        notification: &DeliveryNotification,
    ) -> Result<ProcessOutcome, PipelineError> {
        self.handle(notification).await
    }
}

/// Object-safe version of [`NotificationProcessor`].
pub trait NotificationProcessorDyn: Send + Sync {
    fn process_boxed<'a>(
        &'a self,
        notification: &'a DeliveryNotification,
    ) -> Pin<Box<dyn Future<Output = Result<ProcessOutcome, PipelineError>> + Send + 'a>>;
}

impl<T: NotificationProcessor> NotificationProcessorDyn for T {
    fn process_boxed<'a>(
        &'a self,
        notification: &'a DeliveryNotification,
    ) -> Pin<Box<dyn Future<Output = Result<ProcessOutcome, PipelineError>> + Send + 'a>> {
        Box::pin(self.process(notification))
    }
}

/// Type-erased notification processor.
pub struct BoxNotificationProcessor {
    inner: Box<dyn NotificationProcessorDyn + Send + Sync>,
}

impl BoxNotificationProcessor {
    pub fn new<T: NotificationProcessor + 'static>(processor: T) -> Self {
        Self {
            inner: Box::new(processor),
        }
    }

    pub async fn process(
        &self,
        notification: &DeliveryNotification,
    ) -> Result<ProcessOutcome, PipelineError> {
        self.inner.process_boxed(notification).await
    }

    /// Process notifications in order, stopping at the first failure.
    ///
    /// The outcomes of the successful ones are merged into one.
    pub async fn process_all(
        &self,
        notifications: &[DeliveryNotification],
    ) -> Result<ProcessOutcome, PipelineError> {
        let mut total = ProcessOutcome::stored(0);
        for notification in notifications {
            let outcome = self.process(notification).await?;
            total = total.merge(outcome);
        }
        Ok(total)
    }
}
