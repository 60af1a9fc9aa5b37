//! Remote Data Gateway.
//!
//! Every read and write of remote state goes through the [`Gateway`] trait. Rows cross the
//! boundary as JSON objects; [`decode_rows`] and [`decode_row`] turn them into typed
//! [`RemoteRow`]s and validate them before anything reaches view state.
//!
//! Two implementations ship with the crate:
//! - [`MemoryGateway`]: process-local store used by tests, demos and the REST server when no
//!   hosted backend is configured.
//! - [`PostgrestGateway`]: the hosted backend's REST interface over HTTP.
//!
//! Each call is an independent statement: no transactions, no retries, no timeouts beyond
//! what the transport imposes.

mod memory;
mod postgrest;

pub use memory::{MemoryGateway, Operation};
pub use postgrest::{PostgrestConfig, PostgrestGateway};

use crate::constants::{CLINICS_COLLECTION, HEALTH_RECORDS_COLLECTION, PROFILES_COLLECTION};
use crate::error::{GatewayError, GatewayResult};
use crate::models::RemoteRow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// A row as it crosses the gateway boundary.
pub type Row = serde_json::Map<String, Value>;

/// The remote collections the portal talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Clinics,
    Profiles,
    HealthRecords,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Clinics => CLINICS_COLLECTION,
            Collection::Profiles => PROFILES_COLLECTION,
            Collection::HealthRecords => HEALTH_RECORDS_COLLECTION,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equality filter on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub descending: bool,
}

/// A read request: collection, equality filters, optional order and limit.
///
/// Unset values sort last in both directions.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub collection: Collection,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Select {
    pub fn from(collection: Collection) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column,
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, column: &'static str, descending: bool) -> Self {
        self.order = Some(Order { column, descending });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A partial update of the row with the given `id`.
///
/// When `unmodified_since` is set the write only applies if the stored `updated_at` still
/// equals it; otherwise the gateway answers [`GatewayError::Conflict`].
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub collection: Collection,
    pub id: Uuid,
    pub patch: Row,
    pub unmodified_since: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait Gateway: Send + Sync {
    async fn select(&self, query: &Select) -> GatewayResult<Vec<Row>>;

    /// Inserts one row and returns it as stored.
    async fn insert(&self, collection: Collection, row: Row) -> GatewayResult<Row>;

    /// Applies a partial update and returns the row as stored.
    async fn update(&self, update: &Update) -> GatewayResult<Row>;
}

/// Decodes a result set, dropping rows that fail to decode or validate.
///
/// Dropped rows are logged; a single malformed row never hides the rest of the collection.
pub fn decode_rows<T: RemoteRow>(rows: Vec<Row>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match decode_row::<T>(row) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(collection = %T::COLLECTION, "skipping row: {e}");
                None
            }
        })
        .collect()
}

/// Decodes and validates a single row.
///
/// # Errors
///
/// Returns `GatewayError::Decode` if the row does not match `T`, or
/// `GatewayError::InvalidRow` if it decodes but fails validation.
pub fn decode_row<T: RemoteRow>(row: Row) -> GatewayResult<T> {
    let value: T =
        serde_json::from_value(Value::Object(row)).map_err(|source| GatewayError::Decode {
            collection: T::COLLECTION.as_str(),
            source,
        })?;
    value
        .validate()
        .map_err(|reason| GatewayError::InvalidRow {
            collection: T::COLLECTION.as_str(),
            reason,
        })?;
    Ok(value)
}

/// Encodes a serialisable value as a row.
///
/// # Errors
///
/// Returns `GatewayError::Encode` if the value does not serialise to a JSON object.
pub fn encode_row<T: serde::Serialize>(collection: Collection, value: &T) -> GatewayResult<Row> {
    match serde_json::to_value(value) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(GatewayError::Encode {
            collection: collection.as_str(),
            source: serde::ser::Error::custom(format!("expected an object, got {other}")),
        }),
        Err(source) => Err(GatewayError::Encode {
            collection: collection.as_str(),
            source,
        }),
    }
}
