//! Publishing: the per-variant cache and the pipeline that fills it.

mod cache;
mod publisher;
mod variant;

pub use cache::{CacheError, FeedCache};
pub use publisher::{PublishError, Publisher};
pub use variant::FeedVariant;
