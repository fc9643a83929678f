//! File-backed dataset implementing every repository seam.
//!
//! Feed matrices arrive from upstream systems in two shapes: a proper JSON
//! object, or that same object embedded as a JSON string. The typed path
//! deserializes directly; the degraded path re-parses the string and logs
//! what it had to repair. Unusable payloads are dropped, never fatal.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::growth::TankSnapshot;
use crate::rates::{FeedingCurvePoint, FeedingMatrix2D};
use crate::repository::{BatchAssignmentRepository, FeedCatalogRepository, TankStateRepository};
use crate::selector::{FeedAssignmentEntry, FeedDefinition};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed reading dataset {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed parsing dataset {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct FeedRecord {
    feed_id: String,
    code: String,
    name: String,
    #[serde(default)]
    feeding_curve: Option<Vec<FeedingCurvePoint>>,
    #[serde(default)]
    feeding_matrix: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct AssignmentRecord {
    batch_id: String,
    #[serde(flatten)]
    entry: FeedAssignmentEntry,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct FarmFile {
    #[serde(default)]
    feeds: Vec<FeedRecord>,
    #[serde(default)]
    tanks: Vec<TankSnapshot>,
    #[serde(default)]
    assignments: Vec<AssignmentRecord>,
    #[serde(default)]
    inventory: HashMap<String, f64>,
    #[serde(default)]
    batch_sgr: HashMap<String, f64>,
}

/// In-memory dataset loaded once per run; the forecast reads it as an
/// immutable snapshot.
pub struct JsonDataset {
    feeds: HashMap<String, FeedDefinition>,
    tanks: Vec<TankSnapshot>,
    assignments: HashMap<String, Vec<FeedAssignmentEntry>>,
    inventory: HashMap<String, f64>,
    batch_sgr: HashMap<String, f64>,
}

impl JsonDataset {
    pub fn open(path: &Path) -> Result<Self, DatasetError> {
        let data = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file: FarmFile =
            serde_json::from_str(&data).map_err(|source| DatasetError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self::from_file(file))
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        let file: FarmFile = serde_json::from_str(data)?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: FarmFile) -> Self {
        let mut feeds = HashMap::new();
        for record in file.feeds {
            let matrix = record
                .feeding_matrix
                .as_ref()
                .and_then(|value| parse_matrix_payload(&record.feed_id, value));
            feeds.insert(
                record.feed_id.clone(),
                FeedDefinition {
                    feed_id: record.feed_id,
                    code: record.code,
                    name: record.name,
                    feeding_curve: record.feeding_curve,
                    feeding_matrix: matrix,
                },
            );
        }

        let mut assignments: HashMap<String, Vec<FeedAssignmentEntry>> = HashMap::new();
        for record in file.assignments {
            assignments
                .entry(record.batch_id)
                .or_default()
                .push(record.entry);
        }

        Self {
            feeds,
            tanks: file.tanks,
            assignments,
            inventory: file.inventory,
            batch_sgr: file.batch_sgr,
        }
    }

}

/// Typed path: the matrix is a JSON object. Degraded path: the matrix is a
/// string holding JSON. Anything else is dropped with a warning.
fn parse_matrix_payload(feed_id: &str, value: &Value) -> Option<FeedingMatrix2D> {
    match value {
        Value::Object(_) => match serde_json::from_value(value.clone()) {
            Ok(matrix) => Some(matrix),
            Err(err) => {
                warn!(feed_id, %err, "dropping malformed feeding matrix object");
                None
            }
        },
        Value::String(raw) => match serde_json::from_str(raw) {
            Ok(matrix) => {
                warn!(feed_id, "feeding matrix arrived string-encoded; re-parsed");
                Some(matrix)
            }
            Err(err) => {
                warn!(feed_id, %err, "dropping string-encoded feeding matrix");
                None
            }
        },
        Value::Null => None,
        other => {
            warn!(feed_id, kind = ?other, "unsupported feeding matrix payload");
            None
        }
    }
}

#[async_trait]
impl FeedCatalogRepository for JsonDataset {
    async fn get_feed_by_id(&self, feed_id: &str) -> Result<Option<FeedDefinition>> {
        Ok(self.feeds.get(feed_id).cloned())
    }

    async fn inventory_by_feed_code(&self) -> Result<HashMap<String, f64>> {
        Ok(self.inventory.clone())
    }
}

#[async_trait]
impl BatchAssignmentRepository for JsonDataset {
    async fn active_assignments(&self, batch_id: &str) -> Result<Vec<FeedAssignmentEntry>> {
        Ok(self.assignments.get(batch_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl TankStateRepository for JsonDataset {
    async fn live_tanks(&self) -> Result<Vec<TankSnapshot>> {
        Ok(self
            .tanks
            .iter()
            .filter(|t| t.current_count > 0)
            .cloned()
            .collect())
    }

    async fn sgr_by_batch(&self, batch_ids: &[String]) -> Result<HashMap<String, f64>> {
        Ok(self
            .batch_sgr
            .iter()
            .filter(|(batch_id, _)| batch_ids.contains(batch_id))
            .map(|(batch_id, sgr)| (batch_id.clone(), *sgr))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::JsonDataset;
    use crate::repository::{BatchAssignmentRepository, FeedCatalogRepository, TankStateRepository};

    const SAMPLE: &str = r#"{
        "feeds": [
            {
                "feed_id": "f-grower",
                "code": "GROWER1",
                "name": "Grower 1",
                "feeding_curve": [
                    {"fish_weight_g": 50.0, "feeding_rate_percent": 4.0, "fcr": 1.0}
                ],
                "feeding_matrix": {
                    "temperatures": [12.0, 16.0],
                    "weights": [5.0, 50.0],
                    "rates": [[3.0, 1.5], [4.0, 2.0]]
                }
            },
            {
                "feed_id": "f-legacy",
                "code": "LEGACY",
                "name": "Legacy feed",
                "feeding_matrix": "{\"temperatures\": [10.0, 20.0], \"weights\": [1.0, 100.0], \"rates\": [[5.0, 2.0], [6.0, 2.5]]}"
            },
            {
                "feed_id": "f-broken",
                "code": "BROKEN",
                "name": "Broken feed",
                "feeding_matrix": "not json at all"
            }
        ],
        "tanks": [
            {"tank_id": "T1", "batch_id": "B1", "current_weight_g": 120.0, "current_count": 5000},
            {"tank_id": "T2", "batch_id": "B1", "current_weight_g": 80.0, "current_count": 0}
        ],
        "assignments": [
            {"batch_id": "B1", "feed_id": "f-grower", "min_weight_g": 50.0, "max_weight_g": 500.0, "priority": 1}
        ],
        "inventory": {"GROWER1": 400.0},
        "batch_sgr": {"B1": 1.8, "B2": 1.2}
    }"#;

    #[tokio::test]
    async fn loads_typed_and_string_encoded_matrices() {
        let dataset = JsonDataset::from_json(SAMPLE).expect("sample parses");
        let grower = dataset
            .get_feed_by_id("f-grower")
            .await
            .unwrap()
            .expect("grower exists");
        assert!(grower.feeding_matrix.is_some());
        assert!(grower.feeding_curve.is_some());

        let legacy = dataset.get_feed_by_id("f-legacy").await.unwrap().unwrap();
        let matrix = legacy.feeding_matrix.expect("string payload re-parsed");
        assert_eq!(matrix.temperatures, vec![10.0, 20.0]);

        let broken = dataset.get_feed_by_id("f-broken").await.unwrap().unwrap();
        assert!(broken.feeding_matrix.is_none());
    }

    #[tokio::test]
    async fn live_tanks_excludes_empty_populations() {
        let dataset = JsonDataset::from_json(SAMPLE).unwrap();
        let tanks = dataset.live_tanks().await.unwrap();
        assert_eq!(tanks.len(), 1);
        assert_eq!(tanks[0].tank_id, "T1");
    }

    #[tokio::test]
    async fn batch_lookups_scope_to_requested_ids() {
        let dataset = JsonDataset::from_json(SAMPLE).unwrap();
        let assignments = dataset.active_assignments("B1").await.unwrap();
        assert_eq!(assignments.len(), 1);
        assert!(dataset.active_assignments("B9").await.unwrap().is_empty());

        let sgr = dataset.sgr_by_batch(&["B1".to_string()]).await.unwrap();
        assert_eq!(sgr.get("B1"), Some(&1.8));
        assert!(!sgr.contains_key("B2"));
    }

    #[tokio::test]
    async fn opens_dataset_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write sample");
        let dataset = JsonDataset::open(file.path()).expect("opens");
        let inventory = dataset.inventory_by_feed_code().await.unwrap();
        assert_eq!(inventory.get("GROWER1"), Some(&400.0));
    }
}
