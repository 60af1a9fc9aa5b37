use super::{Collection, Gateway, Row, Select, Update};
use crate::constants::NO_ROWS_ERROR_CODE;
use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;

/// Connection settings for the hosted backend.
#[derive(Clone, Debug)]
pub struct PostgrestConfig {
    /// Project URL, e.g. `https://abc.supabase.co`.
    pub base_url: String,
    /// Public API key sent as `apikey`. Embedded in clients; not a secret.
    pub api_key: String,
    /// User access token. Falls back to the API key when absent.
    pub access_token: Option<String>,
}

/// Gateway speaking the hosted backend's PostgREST dialect over HTTPS.
#[derive(Clone, Debug)]
pub struct PostgrestGateway {
    cfg: PostgrestConfig,
    http: reqwest::Client,
}

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl PostgrestGateway {
    pub fn new(cfg: PostgrestConfig) -> Self {
        Self {
            cfg,
            http: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, collection: Collection) -> String {
        format!(
            "{}/rest/v1/{}",
            self.cfg.base_url.trim_end_matches('/'),
            collection.as_str()
        )
    }

    fn request(&self, method: Method, collection: Collection) -> RequestBuilder {
        let bearer = self
            .cfg
            .access_token
            .as_deref()
            .unwrap_or(&self.cfg.api_key);
        self.http
            .request(method, self.endpoint(collection))
            .header("apikey", &self.cfg.api_key)
            .bearer_auth(bearer)
    }

    async fn rows(response: Response) -> GatewayResult<Vec<Row>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(status.as_u16(), &body));
        }
        Ok(response.json::<Vec<Row>>().await?)
    }
}

#[async_trait]
impl Gateway for PostgrestGateway {
    async fn select(&self, query: &Select) -> GatewayResult<Vec<Row>> {
        tracing::debug!(collection = %query.collection, "select");
        let response = self
            .request(Method::GET, query.collection)
            .query(&select_params(query))
            .send()
            .await?;
        Self::rows(response).await
    }

    async fn insert(&self, collection: Collection, row: Row) -> GatewayResult<Row> {
        tracing::debug!(collection = %collection, "insert");
        let response = self
            .request(Method::POST, collection)
            .header("Prefer", "return=representation")
            .json(&[Value::Object(row)])
            .send()
            .await?;
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| no_rows(collection, "insert returned no rows"))
    }

    async fn update(&self, update: &Update) -> GatewayResult<Row> {
        tracing::debug!(collection = %update.collection, id = %update.id, "update");
        let response = self
            .request(Method::PATCH, update.collection)
            .header("Prefer", "return=representation")
            .query(&update_params(update))
            .json(&update.patch)
            .send()
            .await?;
        let mut rows = Self::rows(response).await?;
        if rows.is_empty() {
            // Zero rows matched: either the row is gone or the guard filtered it out.
            return Err(match update.unmodified_since {
                Some(_) => GatewayError::Conflict {
                    collection: update.collection.as_str(),
                    id: update.id,
                },
                None => no_rows(update.collection, "update matched no rows"),
            });
        }
        Ok(rows.swap_remove(0))
    }
}

fn no_rows(collection: Collection, message: &str) -> GatewayError {
    GatewayError::Upstream {
        status: None,
        code: Some(NO_ROWS_ERROR_CODE.into()),
        message: format!("{collection}: {message}"),
    }
}

fn filter_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Query-string parameters for a read.
fn select_params(query: &Select) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    for filter in &query.filters {
        params.push((
            filter.column.to_string(),
            format!("eq.{}", filter_value(&filter.value)),
        ));
    }
    if let Some(order) = query.order {
        let direction = if order.descending { "desc" } else { "asc" };
        params.push((
            "order".into(),
            format!("{}.{direction}.nullslast", order.column),
        ));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".into(), limit.to_string()));
    }
    params
}

/// Query-string parameters targeting the row of a partial update.
fn update_params(update: &Update) -> Vec<(String, String)> {
    let mut params = vec![("id".to_string(), format!("eq.{}", update.id))];
    if let Some(seen) = update.unmodified_since {
        params.push((
            "updated_at".into(),
            format!("eq.{}", seen.to_rfc3339_opts(SecondsFormat::Micros, true)),
        ));
    }
    params
}

/// Builds an upstream error from a non-success response, keeping the message verbatim.
fn upstream_error(status: u16, body: &str) -> GatewayError {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();
    let code = parsed.as_ref().and_then(|b| b.code.clone());
    let message = parsed
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("request failed with status {status}")
            } else {
                body.trim().to_string()
            }
        });
    GatewayError::Upstream {
        status: Some(status),
        code,
        message,
    }
}
