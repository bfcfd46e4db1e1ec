//! InfluxDB v2 HTTP transport
//!
//! Endpoints used:
//! - `GET /health` and `GET /api/v2/buckets?orgID=..&limit=1` for ping
//! - `POST /api/v2/write` with line protocol
//! - `POST /api/v2/query` with pipeline text, answered with annotated CSV
//! - `GET/POST /api/v2/buckets`, `DELETE /api/v2/buckets/{id}`
//!
//! The derived bucket schema travels as JSON in the bucket description.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::Engine;
use crate::schema::BucketSchema;

use super::{flux_csv, line_protocol, DataPoint, QueryOutput, RemoteBucket, Transport, TransportError};

/// Page size when listing buckets
const BUCKET_PAGE_SIZE: usize = 100;

/// HTTP client for one store and organization
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: String,
    org_id: String,
}

impl HttpTransport {
    /// Build a transport for the engine's host, token and organization
    pub fn new(engine: &Engine) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(engine.request_timeout_ms))
            .user_agent(concat!("aluminum/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: engine.host.trim_end_matches('/').to_string(),
            token: engine.token.clone(),
            org_id: engine.org_id.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn org_param(&self) -> String {
        format!("orgID={}", urlencoding::encode(&self.org_id))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("Token {}", self.token))
    }

    /// Send a request, classifying network failures
    async fn send(&self, request: RequestBuilder, op: &str) -> Result<Response, TransportError> {
        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, op, "Sending store request");

        request.send().await.map_err(|e| {
            let err = classify(e);
            tracing::warn!(%request_id, op, error = %err, "Store request failed");
            err
        })
    }

    /// Look up a bucket by name
    async fn find_bucket(&self, name: &str) -> Result<Option<BucketEntry>, TransportError> {
        let url = self.url(&format!(
            "/api/v2/buckets?{}&name={}",
            self.org_param(),
            urlencoding::encode(name)
        ));
        let response = self
            .send(self.authorized(self.client.get(&url)), "find_bucket")
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let page: BucketPage = decode_json(check(response).await?).await?;
        Ok(page.buckets.into_iter().find(|b| b.name == name))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn ping(&self) -> Result<bool, TransportError> {
        let response = self
            .send(self.client.get(self.url("/health")), "health")
            .await?;
        let response = check(response).await.map_err(|e| match e {
            TransportError::Api { status, message } if status >= 500 => {
                TransportError::Unavailable(message)
            }
            other => other,
        })?;
        let health: HealthResponse = decode_json(response).await?;
        if health.status != "pass" {
            tracing::warn!(status = %health.status, "Store reports unhealthy");
            return Ok(false);
        }

        // Health is unauthenticated; listing one bucket checks token and org.
        let url = self.url(&format!("/api/v2/buckets?{}&limit=1", self.org_param()));
        let response = self
            .send(self.authorized(self.client.get(&url)), "check_org")
            .await?;

        match check(response).await {
            Ok(_) => Ok(true),
            Err(TransportError::Api { status, message }) if status == 400 || status == 404 => Err(
                TransportError::Unauthorized(format!("organization {}: {}", self.org_id, message)),
            ),
            Err(e) => Err(e),
        }
    }

    async fn write(&self, bucket: &str, points: &[DataPoint]) -> Result<bool, TransportError> {
        if points.is_empty() {
            return Ok(true);
        }

        let url = self.url(&format!(
            "/api/v2/write?{}&bucket={}&precision=ns",
            self.org_param(),
            urlencoding::encode(bucket)
        ));
        let body = line_protocol::to_lines(points);
        let request = self
            .authorized(self.client.post(&url))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body);

        check(self.send(request, "write").await?).await?;
        tracing::debug!(bucket, points = points.len(), "Wrote points");
        Ok(true)
    }

    async fn query_raw(&self, bucket: &str, query: &str) -> Result<QueryOutput, TransportError> {
        let url = self.url(&format!("/api/v2/query?{}", self.org_param()));
        let body = QueryRequest {
            query,
            kind: "flux",
            dialect: Dialect {
                header: true,
                annotations: Vec::new(),
                delimiter: ",",
            },
        };
        let request = self
            .authorized(self.client.post(&url))
            .header("Accept", "application/csv")
            .json(&body);

        tracing::debug!(bucket, query, "Running query");
        let response = check(self.send(request, "query").await?).await?;
        let text = response.text().await?;
        let rows = flux_csv::decode(&text)?;

        Ok(QueryOutput {
            name: bucket.to_string(),
            rows,
        })
    }

    async fn create_bucket(&self, name: &str, schema: &BucketSchema) -> Result<(), TransportError> {
        let description =
            serde_json::to_string(schema).map_err(|e| TransportError::Decode(e.to_string()))?;
        let body = CreateBucketRequest {
            org_id: &self.org_id,
            name,
            description,
            retention_rules: Vec::new(),
        };
        let request = self
            .authorized(self.client.post(self.url("/api/v2/buckets")))
            .json(&body);

        let response = self.send(request, "create_bucket").await?;
        let status = response.status();
        if status == StatusCode::UNPROCESSABLE_ENTITY || status == StatusCode::CONFLICT {
            tracing::debug!(bucket = name, "Bucket already exists");
            return Ok(());
        }

        check(response).await?;
        tracing::info!(bucket = name, "Created bucket");
        Ok(())
    }

    async fn delete_bucket(&self, name: &str) -> Result<bool, TransportError> {
        let Some(entry) = self.find_bucket(name).await? else {
            return Ok(false);
        };

        let url = self.url(&format!("/api/v2/buckets/{}", urlencoding::encode(&entry.id)));
        let response = self
            .send(self.authorized(self.client.delete(&url)), "delete_bucket")
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }

        check(response).await?;
        tracing::info!(bucket = name, "Deleted bucket");
        Ok(true)
    }

    async fn list_buckets(&self) -> Result<Vec<RemoteBucket>, TransportError> {
        let mut buckets = Vec::new();
        let mut offset = 0;

        loop {
            let url = self.url(&format!(
                "/api/v2/buckets?{}&limit={}&offset={}",
                self.org_param(),
                BUCKET_PAGE_SIZE,
                offset
            ));
            let response = self
                .send(self.authorized(self.client.get(&url)), "list_buckets")
                .await?;
            let page: BucketPage = decode_json(check(response).await?).await?;

            let count = page.buckets.len();
            buckets.extend(page.buckets.into_iter().map(BucketEntry::into_remote));

            if count < BUCKET_PAGE_SIZE {
                break;
            }
            offset += count;
        }

        Ok(buckets)
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Unavailable(e.to_string())
    } else {
        TransportError::Request(e)
    }
}

/// Turn non-success statuses into errors
async fn check(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .map(|body| body.message)
        .unwrap_or(text);

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Err(TransportError::Unauthorized(message))
    } else {
        Err(TransportError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

async fn decode_json<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, TransportError> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))
}

// ============================================
// Request/Response DTOs
// ============================================

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    dialect: Dialect,
}

#[derive(Debug, Serialize)]
struct Dialect {
    header: bool,
    annotations: Vec<String>,
    delimiter: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBucketRequest<'a> {
    #[serde(rename = "orgID")]
    org_id: &'a str,
    name: &'a str,
    description: String,
    retention_rules: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct BucketPage {
    #[serde(default)]
    buckets: Vec<BucketEntry>,
}

#[derive(Debug, Deserialize)]
struct BucketEntry {
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
}

impl BucketEntry {
    fn into_remote(self) -> RemoteBucket {
        let schema = self
            .description
            .as_deref()
            .and_then(|d| serde_json::from_str::<BucketSchema>(d).ok());
        RemoteBucket {
            name: self.name,
            schema,
        }
    }
}
