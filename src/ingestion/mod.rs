//! Asynchronous log ingestion
//!
//! Producers publish [`CreateLogMessage`]s onto a bounded in-process queue;
//! one background worker feeds them to the [`CreateLogConsumer`] and applies
//! the redelivery policy to failures the consumer reports.

pub mod consumer;
pub mod queue;

pub use consumer::{CreateLogConsumer, CreateLogMessage};
pub use queue::{IngestionQueue, MessageHandler, QueueError, RedeliveryPolicy};

/// Queue carrying log creation messages
pub type LogQueue = IngestionQueue<CreateLogMessage>;
