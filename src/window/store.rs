// Concurrent bucket store
//
// Shared between many ingestion callers and the single rotation task.
// Per-bucket mutation happens under the map's shard guard and never spans
// an await point; rotation only advances the open watermark and prunes,
// so ingestion throughput is bounded by counter contention alone.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::errors::RejectionReason;
use crate::event::PredictionEvent;

use super::bucket::WindowBucket;

pub struct BucketStore {
    span_secs: i64,
    retention_secs: i64,
    buckets: DashMap<i64, WindowBucket>,
    /// Aligned start of the currently open bucket; buckets with an earlier
    /// start are closed and immutable
    open_start: AtomicI64,
}

impl BucketStore {
    pub fn new(span_secs: i64, retention_secs: i64, now: DateTime<Utc>) -> Self {
        let store = Self {
            span_secs,
            retention_secs,
            buckets: DashMap::new(),
            open_start: AtomicI64::new(0),
        };
        store.open_start.store(store.align(now.timestamp()), Ordering::Release);
        store
    }

    pub fn span_secs(&self) -> i64 {
        self.span_secs
    }

    /// Align an epoch-second timestamp down to its bucket start
    fn align(&self, ts: i64) -> i64 {
        ts.div_euclid(self.span_secs) * self.span_secs
    }

    pub fn open_start(&self) -> i64 {
        self.open_start.load(Ordering::Acquire)
    }

    /// Route an accepted event into the bucket containing its timestamp,
    /// creating the bucket lazily. Returns the bucket start on success.
    pub fn apply_event(&self, event: &PredictionEvent) -> Result<i64, RejectionReason> {
        let bucket_start = self.align(event.timestamp.timestamp());
        if bucket_start < self.open_start() {
            return Err(RejectionReason::LateEvent { bucket_start });
        }

        self.buckets
            .entry(bucket_start)
            .or_insert_with(|| WindowBucket::new(bucket_start))
            .apply(event);
        Ok(bucket_start)
    }

    /// Count a rejection against the currently open bucket
    pub fn note_rejection(&self, reason: &RejectionReason) {
        let open = self.open_start();
        self.buckets
            .entry(open)
            .or_insert_with(|| WindowBucket::new(open))
            .note_rejection(reason);
    }

    /// Advance the open-bucket watermark to the span containing `now` and
    /// drop buckets beyond the retention horizon. The watermark is
    /// monotonic: rotation never reopens a closed span. Returns the number
    /// of buckets released.
    pub fn rotate(&self, now: DateTime<Utc>) -> usize {
        let target = self.align(now.timestamp());
        // fetch_max keeps the watermark monotonic even if the clock steps back
        self.open_start.fetch_max(target, Ordering::AcqRel);

        let horizon = self.open_start() - self.retention_secs;
        let before = self.buckets.len();
        self.buckets.retain(|start, _| *start >= horizon);
        before - self.buckets.len()
    }

    /// Read-consistent copies of the last `n_closed` closed buckets plus
    /// the open bucket, oldest first. Missing (empty) spans are simply
    /// absent from the result.
    pub fn window(&self, n_closed: i64) -> Vec<WindowBucket> {
        let open = self.open_start();
        let oldest = open - n_closed * self.span_secs;
        let mut out: Vec<WindowBucket> = Vec::new();
        let mut start = oldest;
        while start <= open {
            if let Some(bucket) = self.buckets.get(&start) {
                out.push(bucket.clone());
            }
            start += self.span_secs;
        }
        out
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Whether a bucket for the given aligned start is currently held
    pub fn contains_bucket(&self, start: i64) -> bool {
        self.buckets.contains_key(&start)
    }
}
