//! Store operations built only on the [`Store`] contract, hence identical for
//! every backend pairing.

use async_compression::tokio::bufread::GzipDecoder;
use async_compression::tokio::write::GzipEncoder;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use crate::error::StorageError;

use super::contract::Store;

/// Pipe `src_key` of `src` into `dst_key` of `dst`. Returns the number of
/// bytes copied. `src` and `dst` may be the same store.
pub async fn copy_between_stores(
    src: &dyn Store,
    src_key: &str,
    dst: &dyn Store,
    dst_key: &str,
) -> Result<u64, StorageError> {
    tracing::debug!(
        target: "krawler.stores",
        from = %src.id(), from_key = %src_key, to = %dst.id(), to_key = %dst_key,
        "copy"
    );
    let mut reader = src.create_read_stream(src_key).await?;
    let mut writer = dst.create_write_stream(dst_key).await?;
    let copied = tokio::io::copy(&mut reader, &mut writer).await?;
    writer.shutdown().await?;
    Ok(copied)
}

/// Gzip `src_key` of `src` into `dst_key` of `dst`. Returns the number of
/// uncompressed bytes read.
pub async fn gzip_to_store(
    src: &dyn Store,
    src_key: &str,
    dst: &dyn Store,
    dst_key: &str,
) -> Result<u64, StorageError> {
    tracing::debug!(target: "krawler.stores", from_key = %src_key, to_key = %dst_key, "gzip");
    let mut reader = src.create_read_stream(src_key).await?;
    let mut encoder = GzipEncoder::new(dst.create_write_stream(dst_key).await?);
    let copied = tokio::io::copy(&mut reader, &mut encoder).await?;
    // Finishes the gzip trailer and shuts the inner writer down.
    encoder.shutdown().await?;
    Ok(copied)
}

/// Gunzip `src_key` of `src` into `dst_key` of `dst`. Returns the number of
/// decompressed bytes written.
pub async fn gunzip_from_store(
    src: &dyn Store,
    src_key: &str,
    dst: &dyn Store,
    dst_key: &str,
) -> Result<u64, StorageError> {
    tracing::debug!(target: "krawler.stores", from_key = %src_key, to_key = %dst_key, "gunzip");
    let reader = src.create_read_stream(src_key).await?;
    let mut decoder = GzipDecoder::new(BufReader::new(reader));
    let mut writer = dst.create_write_stream(dst_key).await?;
    let copied = tokio::io::copy(&mut decoder, &mut writer).await?;
    writer.shutdown().await?;
    Ok(copied)
}

pub async fn read_to_bytes(store: &dyn Store, key: &str) -> Result<Vec<u8>, StorageError> {
    let mut reader = store.create_read_stream(key).await?;
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(buf)
}

pub async fn write_bytes(store: &dyn Store, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
    let mut writer = store.create_write_stream(key).await?;
    writer.write_all(bytes).await?;
    writer.shutdown().await?;
    Ok(())
}
