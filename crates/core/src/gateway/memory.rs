use super::{Collection, Gateway, Row, Select, Update};
use crate::constants::NO_ROWS_ERROR_CODE;
use crate::error::{GatewayError, GatewayResult};
use crate::{PortalError, PortalResult};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// The kind of gateway call, used for failure injection and the request log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
}

/// A process-local gateway.
///
/// Behaves like the hosted store for the subset of features the portal uses: equality
/// filters, ordering with unset values last, limits, generated ids and timestamps, and the
/// `updated_at` stale-write guard.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    tables: RwLock<HashMap<Collection, Vec<Row>>>,
    failures: Mutex<HashMap<(Operation, Collection), VecDeque<String>>>,
    requests: Mutex<Vec<(Operation, Collection)>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway pre-populated with rows for one collection.
    pub fn with_rows(collection: Collection, rows: Vec<Row>) -> Self {
        Self::new().and_rows(collection, rows)
    }

    /// Adds rows to a collection of a gateway under construction.
    pub fn and_rows(mut self, collection: Collection, rows: Vec<Row>) -> Self {
        self.tables.get_mut().entry(collection).or_default().extend(
            rows.into_iter()
                .map(|row| with_generated_columns(collection, row)),
        );
        self
    }

    /// Creates a gateway whose `clinics` collection is read from a YAML seed file.
    ///
    /// The file holds a sequence of clinic mappings; `id`, `created_at` and `updated_at` are
    /// generated when absent.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::SeedRead` if the file cannot be read and
    /// `PortalError::SeedParse` if it is not a YAML sequence of mappings.
    pub fn from_clinic_seed(path: &Path) -> PortalResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(PortalError::SeedRead)?;
        let rows: Vec<Row> = serde_yaml::from_str(&raw).map_err(PortalError::SeedParse)?;
        tracing::info!(
            "seeded {} clinics from {}",
            rows.len(),
            path.display()
        );
        Ok(Self::with_rows(Collection::Clinics, rows))
    }

    /// Makes the next `operation` on `collection` fail with an upstream error carrying
    /// `message`. Queued failures are consumed in order.
    pub async fn fail_next(&self, operation: Operation, collection: Collection, message: &str) {
        self.failures
            .lock()
            .await
            .entry((operation, collection))
            .or_default()
            .push_back(message.to_string());
    }

    /// Every call made so far, in order.
    pub async fn requests(&self) -> Vec<(Operation, Collection)> {
        self.requests.lock().await.clone()
    }

    /// A copy of the stored rows of one collection.
    pub async fn rows(&self, collection: Collection) -> Vec<Row> {
        self.tables
            .read()
            .await
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    async fn enter(&self, operation: Operation, collection: Collection) -> GatewayResult<()> {
        self.requests.lock().await.push((operation, collection));
        let injected = self
            .failures
            .lock()
            .await
            .get_mut(&(operation, collection))
            .and_then(VecDeque::pop_front);
        match injected {
            Some(message) => Err(GatewayError::upstream(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn select(&self, query: &Select) -> GatewayResult<Vec<Row>> {
        self.enter(Operation::Select, query.collection).await?;

        let tables = self.tables.read().await;
        let mut rows: Vec<Row> = tables
            .get(&query.collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| {
                        query
                            .filters
                            .iter()
                            .all(|f| row.get(f.column) == Some(&f.value))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = query.order {
            rows.sort_by(|a, b| {
                compare_for_order(a.get(order.column), b.get(order.column), order.descending)
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, collection: Collection, row: Row) -> GatewayResult<Row> {
        self.enter(Operation::Insert, collection).await?;

        let row = with_generated_columns(collection, row);
        self.tables
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(&self, update: &Update) -> GatewayResult<Row> {
        self.enter(Operation::Update, update.collection).await?;

        let id = Value::String(update.id.to_string());
        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(&update.collection)
            .and_then(|rows| rows.iter_mut().find(|row| row.get("id") == Some(&id)))
            .ok_or_else(|| GatewayError::Upstream {
                status: None,
                code: Some(NO_ROWS_ERROR_CODE.into()),
                message: format!("no {} row with id {}", update.collection, update.id),
            })?;

        if let Some(expected) = update.unmodified_since {
            let stored = row
                .get("updated_at")
                .and_then(Value::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|d| d.with_timezone(&Utc));
            if stored != Some(expected) {
                return Err(GatewayError::Conflict {
                    collection: update.collection.as_str(),
                    id: update.id,
                });
            }
        }

        for (column, value) in &update.patch {
            row.insert(column.clone(), value.clone());
        }
        if row.contains_key("updated_at") || update.collection == Collection::Profiles {
            row.insert("updated_at".into(), Value::String(timestamp()));
        }
        Ok(row.clone())
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn with_generated_columns(collection: Collection, mut row: Row) -> Row {
    if row.get("id").map_or(true, Value::is_null) {
        row.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    }
    if row.get("created_at").map_or(true, Value::is_null) {
        row.insert("created_at".into(), Value::String(timestamp()));
    }
    if collection != Collection::HealthRecords && row.get("updated_at").map_or(true, Value::is_null)
    {
        row.insert("updated_at".into(), Value::String(timestamp()));
    }
    row
}

/// Orders values the way the hosted store does for the types the portal stores: numbers
/// numerically, strings (ISO dates included) lexically, unset values last.
fn compare_for_order(a: Option<&Value>, b: Option<&Value>, descending: bool) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = match (a, b) {
                (Value::Number(x), Value::Number(y)) => x
                    .as_f64()
                    .partial_cmp(&y.as_f64())
                    .unwrap_or(Ordering::Equal),
                (Value::String(x), Value::String(y)) => x.cmp(y),
                (x, y) => x.to_string().cmp(&y.to_string()),
            };
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(row) => row,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_select_orders_descending_with_unset_last() {
        let gateway = MemoryGateway::with_rows(
            Collection::Clinics,
            vec![
                row(json!({"name": "B", "rating": 3.5})),
                row(json!({"name": "C", "rating": null})),
                row(json!({"name": "A", "rating": 4.8})),
            ],
        );

        let rows = gateway
            .select(&Select::from(Collection::Clinics).order_by("rating", true))
            .await
            .expect("select should succeed");
        let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_select_filters_by_equality() {
        let owner = Uuid::new_v4();
        let gateway = MemoryGateway::with_rows(
            Collection::HealthRecords,
            vec![
                row(json!({"user_id": owner.to_string(), "title": "mine"})),
                row(json!({"user_id": Uuid::new_v4().to_string(), "title": "theirs"})),
            ],
        );

        let rows = gateway
            .select(&Select::from(Collection::HealthRecords).eq("user_id", owner.to_string()))
            .await
            .expect("select should succeed");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "mine");
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed_once() {
        let gateway = MemoryGateway::new();
        gateway
            .fail_next(Operation::Select, Collection::Clinics, "permission denied")
            .await;

        let err = gateway
            .select(&Select::from(Collection::Clinics))
            .await
            .expect_err("first select should fail");
        assert_eq!(err.to_string(), "permission denied");

        gateway
            .select(&Select::from(Collection::Clinics))
            .await
            .expect("second select should succeed");
        assert_eq!(gateway.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_insert_generates_id_and_timestamps() {
        let gateway = MemoryGateway::new();
        let stored = gateway
            .insert(Collection::HealthRecords, row(json!({"title": "Flu shot"})))
            .await
            .expect("insert should succeed");

        assert!(stored["id"].as_str().and_then(|s| Uuid::parse_str(s).ok()).is_some());
        assert!(stored.contains_key("created_at"));
        assert!(!stored.contains_key("updated_at"));
        assert_eq!(gateway.rows(Collection::HealthRecords).await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_rejects_stale_writes() {
        let id = Uuid::new_v4();
        let seen = "2024-05-01T08:00:00.000000Z";
        let gateway = MemoryGateway::with_rows(
            Collection::Profiles,
            vec![row(json!({"id": id.to_string(), "phone": null, "updated_at": seen}))],
        );
        let seen_at: DateTime<Utc> = seen.parse().unwrap();

        let mut patch = Row::new();
        patch.insert("phone".into(), json!("+254 700 111 222"));
        let first = Update {
            collection: Collection::Profiles,
            id,
            patch: patch.clone(),
            unmodified_since: Some(seen_at),
        };
        let stored = gateway.update(&first).await.expect("first write should apply");
        assert_eq!(stored["phone"], "+254 700 111 222");
        assert_ne!(stored["updated_at"], seen);

        let err = gateway
            .update(&first)
            .await
            .expect_err("write based on an old version should conflict");
        assert!(matches!(err, GatewayError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_update_of_missing_row_reports_no_rows() {
        let gateway = MemoryGateway::new();
        let err = gateway
            .update(&Update {
                collection: Collection::Profiles,
                id: Uuid::new_v4(),
                patch: Row::new(),
                unmodified_since: None,
            })
            .await
            .expect_err("missing row should fail");
        assert!(err.is_no_rows());
    }

    #[test]
    fn test_seed_file_loads_clinics() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        writeln!(
            file,
            "- name: Mater Hospital\n  address: Dunga Rd, Nairobi\n  latitude: -1.3094\n  longitude: 36.8400\n  services: [Maternity, Pharmacy]\n  rating: 4.3"
        )
        .expect("should write seed");

        let gateway = MemoryGateway::from_clinic_seed(file.path()).expect("seed should load");
        let rows = gateway.tables.try_read().expect("no contention").clone();
        let clinics = &rows[&Collection::Clinics];
        assert_eq!(clinics.len(), 1);
        assert!(clinics[0].contains_key("id"));
        assert_eq!(clinics[0]["services"][1], "Pharmacy");
    }

    #[test]
    fn test_seed_file_rejects_non_sequence() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "name: not a list").expect("should write seed");
        assert!(matches!(
            MemoryGateway::from_clinic_seed(file.path()),
            Err(PortalError::SeedParse(_))
        ));
    }
}
