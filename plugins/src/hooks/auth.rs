use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use krawler_core::api::{get_path_mut, EngineError, Hook, HookContext, Phase};
use serde::Deserialize;
use serde_json::{json, Value};

use super::parse_options;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BasicAuthOptions {
    /// Location of the request options inside `data`.
    #[serde(default = "default_options_path")]
    options_path: String,
    /// Header receiving the credentials.
    #[serde(rename = "type", default = "default_header")]
    header: String,
}

fn default_options_path() -> String {
    "options".to_string()
}

fn default_header() -> String {
    "Authorization".to_string()
}

/// Turns `auth: { user, password }` in the request options into a basic
/// authentication header. The clear text credentials are removed.
pub struct BasicAuth {
    options: BasicAuthOptions,
}

impl BasicAuth {
    pub fn from_options(options: &Value) -> Result<Self, EngineError> {
        Ok(Self {
            options: parse_options("basicAuth", options)?,
        })
    }
}

#[async_trait]
impl Hook for BasicAuth {
    async fn execute(&self, ctx: &mut HookContext) -> Result<(), EngineError> {
        ctx.expect_phase("basicAuth", &[Phase::Before])?;

        let Some(Value::Object(request)) = get_path_mut(&mut ctx.data, &self.options.options_path) else {
            return Ok(());
        };
        let Some(auth) = request.remove("auth") else {
            return Ok(());
        };
        let user = auth.get("user").and_then(Value::as_str).unwrap_or_default();
        let password = auth.get("password").and_then(Value::as_str).unwrap_or_default();
        let credentials = format!("Basic {}", STANDARD.encode(format!("{user}:{password}")));

        let headers = request.entry("headers").or_insert_with(|| json!({}));
        if !headers.is_object() {
            *headers = json!({});
        }
        headers[self.options.header.as_str()] = Value::String(credentials);
        tracing::debug!(target: "krawler.hooks", hook = "basicAuth", header = %self.options.header, "credentials set");
        Ok(())
    }
}
