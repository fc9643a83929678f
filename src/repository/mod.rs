//! Read-only collaborator seams. The simulation core only ever consumes
//! these; persistence itself lives elsewhere.

pub mod dataset;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::growth::TankSnapshot;
use crate::selector::{FeedAssignmentEntry, FeedDefinition};

#[async_trait]
pub trait FeedCatalogRepository: Send + Sync {
    async fn get_feed_by_id(&self, feed_id: &str) -> Result<Option<FeedDefinition>>;
    /// Current on-hand stock in kg, keyed by feed code.
    async fn inventory_by_feed_code(&self) -> Result<HashMap<String, f64>>;
}

#[async_trait]
pub trait BatchAssignmentRepository: Send + Sync {
    async fn active_assignments(&self, batch_id: &str) -> Result<Vec<FeedAssignmentEntry>>;
}

#[async_trait]
pub trait TankStateRepository: Send + Sync {
    /// Tanks with a live population (`count > 0`).
    async fn live_tanks(&self) -> Result<Vec<TankSnapshot>>;
    /// Known per-batch SGR values, resolved in one pass for all batches.
    async fn sgr_by_batch(&self, batch_ids: &[String]) -> Result<HashMap<String, f64>>;
}
