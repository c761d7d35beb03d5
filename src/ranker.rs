//! Reusable-space ranking.
//!
//! Walks every database and collection visible to the connection, reads the
//! WiredTiger block-manager statistics of each collection and ranks the
//! collections by the number of bytes the storage engine could reuse.
//!
//! A collection whose statistics cannot be read is skipped with a warning; it
//! never aborts the ranking. Only failing to enumerate databases is fatal.

use std::cmp::Ordering;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use serde::Serialize;

use crate::error::Result;

/// Default number of collections returned.
pub const DEFAULT_TOP_N: usize = 10;

/// Path of the reclaimable-space metric inside a `collStats` reply.
pub const REUSABLE_BYTES_PATH: [&str; 3] =
    ["wiredTiger", "block-manager", "file bytes available for reuse"];

/// Read-only view of a server's catalog and collection statistics.
#[async_trait]
pub trait StatsSource {
    /// Names of all databases visible to the credential.
    async fn database_names(&self) -> Result<Vec<String>>;

    /// Names of all collections in `database`.
    async fn collection_names(&self, database: &str) -> Result<Vec<String>>;

    /// The `collStats` document for one collection.
    async fn collection_stats(&self, database: &str, collection: &str) -> Result<Document>;
}

/// Reclaimable space of one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionStatEntry {
    /// Database name
    pub database: String,
    /// Collection name
    pub collection: String,
    /// Bytes the storage engine could reuse, truncated toward zero
    pub reusable_bytes: i64,
}

/// The reuse metric exactly as the server reported it.
///
/// Ranking compares these values, so two doubles that truncate to the same
/// integer still keep their numeric order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReusableBytes {
    /// Int32 or Int64 reply
    Int(i64),
    /// Finite double reply
    Double(f64),
}

impl ReusableBytes {
    /// Integer byte count reported to callers.
    pub fn truncated(self) -> i64 {
        match self {
            ReusableBytes::Int(v) => v,
            ReusableBytes::Double(v) => v as i64,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            ReusableBytes::Int(v) => v as f64,
            ReusableBytes::Double(v) => v,
        }
    }

    /// Numeric comparison across both representations.
    pub fn compare(self, other: Self) -> Ordering {
        match (self, other) {
            (ReusableBytes::Int(a), ReusableBytes::Int(b)) => a.cmp(&b),
            (a, b) => a.as_f64().total_cmp(&b.as_f64()),
        }
    }
}

/// A collection that made it into the candidate set.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// What gets returned
    pub entry: CollectionStatEntry,
    /// What gets sorted on
    pub metric: ReusableBytes,
}

/// Why a collection was left out of the ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The statistics command itself failed.
    StatsUnavailable(String),
    /// The statistics reply lacks the metric or it is not numeric.
    MissingMetric(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::StatsUnavailable(msg) => write!(f, "failed to fetch stats: {}", msg),
            SkipReason::MissingMetric(msg) => write!(f, "missing reuse field: {}", msg),
        }
    }
}

/// A collection excluded from the candidate set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCollection {
    /// Database name
    pub database: String,
    /// Collection name
    pub collection: String,
    /// Why it was skipped
    pub reason: SkipReason,
}

/// Outcome of inspecting a single collection.
pub type Inspection = std::result::Result<Candidate, SkippedCollection>;

/// Extract `file bytes available for reuse` from a `collStats` reply.
///
/// Integer and finite double values are accepted; negative values are not
/// clamped.
pub fn extract_reusable_bytes(stats: &Document) -> std::result::Result<ReusableBytes, String> {
    let [engine, section, field] = REUSABLE_BYTES_PATH;
    let block_manager = stats
        .get_document(engine)
        .and_then(|wt| wt.get_document(section))
        .map_err(|_| format!("'{}.{}' not present", engine, section))?;

    match block_manager.get(field) {
        Some(Bson::Int32(v)) => Ok(ReusableBytes::Int(i64::from(*v))),
        Some(Bson::Int64(v)) => Ok(ReusableBytes::Int(*v)),
        Some(Bson::Double(v)) if v.is_finite() => Ok(ReusableBytes::Double(*v)),
        Some(other) => Err(format!(
            "'{}' has unexpected type {:?}",
            field,
            other.element_type()
        )),
        None => Err(format!("'{}' not present", field)),
    }
}

/// Inspect every collection of every database, in enumeration order.
///
/// Fails only when the database list itself cannot be read.
pub async fn collect_candidates<S>(source: &S) -> Result<Vec<Inspection>>
where
    S: StatsSource + Sync + ?Sized,
{
    let mut inspections = Vec::new();

    for database in source.database_names().await? {
        let collections = match source.collection_names(&database).await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(database = %database, error = %e, "Failed to list collections, skipping database");
                continue;
            }
        };

        for collection in collections {
            let inspection = match source.collection_stats(&database, &collection).await {
                Ok(stats) => match extract_reusable_bytes(&stats) {
                    Ok(metric) => Ok(Candidate {
                        entry: CollectionStatEntry {
                            database: database.clone(),
                            collection,
                            reusable_bytes: metric.truncated(),
                        },
                        metric,
                    }),
                    Err(msg) => Err(SkippedCollection {
                        database: database.clone(),
                        collection,
                        reason: SkipReason::MissingMetric(msg),
                    }),
                },
                Err(e) => Err(SkippedCollection {
                    database: database.clone(),
                    collection,
                    reason: SkipReason::StatsUnavailable(e.to_string()),
                }),
            };

            if let Err(skipped) = &inspection {
                tracing::warn!(
                    database = %skipped.database,
                    collection = %skipped.collection,
                    reason = %skipped.reason,
                    "Skipping collection"
                );
            }
            inspections.push(inspection);
        }
    }

    Ok(inspections)
}

/// Keep the successful inspections, sort them by reusable bytes descending
/// and return at most `top_n`. Ties keep their input order.
pub fn rank_candidates(inspections: Vec<Inspection>, top_n: usize) -> Vec<CollectionStatEntry> {
    let mut candidates: Vec<Candidate> = inspections.into_iter().filter_map(|i| i.ok()).collect();
    // sort_by is stable
    candidates.sort_by(|a, b| b.metric.compare(a.metric));
    candidates.truncate(top_n);
    candidates.into_iter().map(|c| c.entry).collect()
}

/// Rank the collections of `source` by reclaimable space.
pub async fn rank_reusable_space<S>(source: &S, top_n: usize) -> Result<Vec<CollectionStatEntry>>
where
    S: StatsSource + Sync + ?Sized,
{
    let inspections = collect_candidates(source).await?;
    let inspected = inspections.len();
    let ranked = rank_candidates(inspections, top_n);
    tracing::debug!(inspected, returned = ranked.len(), top_n, "Ranked collections by reusable space");
    Ok(ranked)
}
