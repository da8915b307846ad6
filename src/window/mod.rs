// Window aggregation
// Time-bucketed counters, rotation, and on-demand rollup views

mod bucket;
mod rollup;
mod store;

pub use bucket::WindowBucket;
pub use rollup::{MetricKind, MetricValue, RollupWindow};
pub use store::BucketStore;
