//! Facilities to publish typed messages to the broker. Check out [`Publisher`]
//! and [`ConfirmingPublisher`] as starting points.
mod confirming;
mod properties;
mod publisher;
mod receipt;

pub use confirming::{ConfirmHandle, ConfirmingPublisher, ConfirmingPublisherBuilder};
pub use publisher::{PublishError, Publisher, PublisherBuilder};
pub use receipt::{PublishReceipt, PublishStatus};
