use async_trait::async_trait;
use krawler_core::api::{
    copy_between_stores, gunzip_from_store, gzip_to_store, render, EngineError, Hook, HookContext,
};
use serde::Deserialize;
use serde_json::Value;

use super::parse_options;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOp {
    Copy,
    Gzip,
    Gunzip,
}

impl TransferOp {
    fn hook_name(self) -> &'static str {
        match self {
            Self::Copy => "copyToStore",
            Self::Gzip => "gzipToStore",
            Self::Gunzip => "gunzipFromStore",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Endpoint {
    /// Store id; the chain store when unset.
    #[serde(default)]
    store: Option<String>,
    /// Key template rendered against `data`.
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferOptions {
    input: Endpoint,
    output: Endpoint,
    #[serde(default)]
    output_type: Option<String>,
}

/// Moves a blob between stores, optionally through gzip. Usable in any phase.
pub struct StoreTransfer {
    op: TransferOp,
    options: TransferOptions,
}

impl StoreTransfer {
    pub fn from_options(op: TransferOp, options: &Value) -> Result<Self, EngineError> {
        Ok(Self {
            op,
            options: parse_options(op.hook_name(), options)?,
        })
    }
}

#[async_trait]
impl Hook for StoreTransfer {
    async fn execute(&self, ctx: &mut HookContext) -> Result<(), EngineError> {
        let name = self.op.hook_name();
        let src = ctx.store(name, self.options.input.store.as_deref())?;
        let dst = ctx.store(name, self.options.output.store.as_deref())?;
        let src_key = render(&self.options.input.key, &ctx.data)?;
        let dst_key = render(&self.options.output.key, &ctx.data)?;

        let bytes = match self.op {
            TransferOp::Copy => copy_between_stores(src.as_ref(), &src_key, dst.as_ref(), &dst_key).await?,
            TransferOp::Gzip => gzip_to_store(src.as_ref(), &src_key, dst.as_ref(), &dst_key).await?,
            TransferOp::Gunzip => gunzip_from_store(src.as_ref(), &src_key, dst.as_ref(), &dst_key).await?,
        };
        tracing::debug!(
            target: "krawler.hooks",
            hook = name, from = %src.id(), from_key = %src_key, to = %dst.id(), to_key = %dst_key, bytes,
            "blob transferred"
        );
        if self.options.output_type.is_some() {
            ctx.add_output(&dst_key, self.options.output_type.as_deref());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::testing::task_ctx_with_store;
    use crate::stores::MemoryStore;
    use krawler_core::api::{read_to_bytes, write_bytes, Phase};
    use serde_json::json;

    #[tokio::test]
    async fn gzip_then_gunzip_through_hooks() {
        let store = MemoryStore::new("mem");
        write_bytes(&store, "t.csv", b"x,y\n1,2\n").await.unwrap();
        let mut ctx = task_ctx_with_store(json!({ "id": "t" }), &store);
        ctx.phase = Phase::After;

        let gzip = StoreTransfer::from_options(
            TransferOp::Gzip,
            &json!({ "input": { "key": "<%= id %>.csv" }, "output": { "key": "<%= id %>.csv.gz" }, "outputType": "archive" }),
        )
        .unwrap();
        gzip.execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.result["outputs"][0]["id"], json!("t.csv.gz"));

        let gunzip = StoreTransfer::from_options(
            TransferOp::Gunzip,
            &json!({ "input": { "key": "t.csv.gz" }, "output": { "key": "copy.csv" } }),
        )
        .unwrap();
        gunzip.execute(&mut ctx).await.unwrap();
        assert_eq!(read_to_bytes(&store, "copy.csv").await.unwrap(), b"x,y\n1,2\n");
    }

    #[test]
    fn endpoints_are_required() {
        let err = StoreTransfer::from_options(TransferOp::Copy, &json!({ "input": { "key": "a" } }))
            .err()
            .unwrap();
        assert!(err.to_string().contains("copyToStore"));
    }

    #[tokio::test]
    async fn unknown_store_id_fails() {
        let store = MemoryStore::new("mem");
        let mut ctx = task_ctx_with_store(json!({ "id": "t" }), &store);
        let copy = StoreTransfer::from_options(
            TransferOp::Copy,
            &json!({ "input": { "key": "a" }, "output": { "store": "s3", "key": "a" } }),
        )
        .unwrap();
        let err = copy.execute(&mut ctx).await.unwrap_err();
        assert_eq!(err.error_code(), krawler_core::api::ErrorCode::StoreNotFound);
    }
}
