//! Durable ingestion path for `CollectorAPI`: bounded queues plus a batch flusher writing to an
//! out-of-scope long-term sink (spec §4.F, §4.G).

pub mod flusher;
pub mod queues;

pub use flusher::{BatchConfig, LoggingSink, Sink};
pub use queues::IngestQueues;
