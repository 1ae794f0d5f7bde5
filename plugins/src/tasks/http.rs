use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use krawler_core::api::{EngineError, HookContext, TaskKind};
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::io::AsyncWriteExt;

const BODY_PREVIEW_LIMIT: usize = 512;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HttpOptions {
    url: String,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    query: Map<String, Value>,
    #[serde(default)]
    body: Option<Value>,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

fn query_pairs(query: &Map<String, Value>) -> Vec<(String, String)> {
    query
        .iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), v)
        })
        .collect()
}

/// Fetches `options.url` and streams the response body into the task store
/// under the task id.
pub struct HttpTask {
    client: Client,
}

impl HttpTask {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("krawler/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TaskKind for HttpTask {
    fn name(&self) -> &str {
        "http"
    }

    async fn run(&self, ctx: &mut HookContext) -> Result<(), EngineError> {
        let options: HttpOptions = serde_json::from_value(ctx.data.get("options").cloned().unwrap_or(Value::Null))
            .map_err(|e| EngineError::validation(format!("invalid http task options: {e}")))?;
        let key = ctx
            .data_id()
            .ok_or_else(|| EngineError::validation("http task has no id"))?
            .to_string();
        let store = ctx.store("http", None)?;

        let method = match options.method.as_deref() {
            Some(m) => Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                .map_err(|_| EngineError::validation(format!("invalid http method '{m}'")))?,
            None => Method::GET,
        };
        let mut req = self.client.request(method.clone(), &options.url);
        for (name, value) in &options.headers {
            req = req.header(name, value);
        }
        if !options.query.is_empty() {
            req = req.query(&query_pairs(&options.query));
        }
        if let Some(body) = &options.body {
            req = req.json(body);
        }
        if let Some(ms) = options.timeout_ms {
            req = req.timeout(Duration::from_millis(ms));
        }

        tracing::debug!(target: "krawler.tasks", task_id = %key, %method, url = %options.url, "http request");
        let resp = req.send().await.map_err(anyhow::Error::from)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let preview: String = body.chars().take(BODY_PREVIEW_LIMIT).collect();
            return Err(EngineError::domain(format!(
                "request to {} failed with status {}: {}",
                options.url,
                status.as_u16(),
                preview
            )));
        }

        // Recorded before streaming so error-chain cleanup also sees partial blobs.
        if !ctx.result.is_object() {
            ctx.result = json!({ "id": key });
        }
        ctx.add_output(&key, None);

        let mut writer = store.create_write_stream(&key).await?;
        let mut stream = resp.bytes_stream();
        let mut size: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(anyhow::Error::from)?;
            writer.write_all(&chunk).await?;
            size += chunk.len() as u64;
        }
        writer.shutdown().await?;

        tracing::debug!(target: "krawler.tasks", task_id = %key, status = status.as_u16(), size, "http response stored");
        ctx.result["status"] = json!(status.as_u16());
        ctx.result["size"] = json!(size);
        Ok(())
    }
}
