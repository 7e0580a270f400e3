//! Audora Queue Library
//!
//! Bridge to the Python worker fleet over Redis, speaking the Celery
//! protocol the workers already consume:
//!
//! - `envelope` encodes jobs into Celery task envelopes (pure, no I/O)
//! - `gateway` submits envelopes and reads result keys through a `Broker`
//!   seam, with a Redis implementation for production
//! - `status` translates broker task states into client-facing progress
//!
//! The wire format is an external contract owned by the worker fleet; field
//! names, queue names and the result key prefix must not change here.

pub mod envelope;
pub mod gateway;
pub mod status;

pub use gateway::{Broker, QueueGateway, RedisBroker, TaskResult};
pub use status::TaskState;
