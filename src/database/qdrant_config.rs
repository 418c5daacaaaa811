use qdrant_client::{config::QdrantConfig, Qdrant};
use std::time::Duration;

use crate::database::vector_db::VectorDBError;

/// Normalises a Qdrant URL to the gRPC endpoint the client speaks.
pub fn grpc_url(url: &str) -> String {
    let clean_url = match url.split_once("://") {
        Some((_, rest)) => rest,
        None => url,
    }
    .trim_end_matches('/');

    // Replace port 6333 with 6334 for gRPC if needed
    let grpc = match clean_url.strip_suffix(":6333") {
        Some(host) => format!("{}:6334", host),
        None => clean_url.to_string(),
    };

    format!("http://{}", grpc)
}

pub async fn create_qdrant_client(url: &str) -> Result<Qdrant, VectorDBError> {
    let url_with_scheme = grpc_url(url);
    log::info!("Attempting to connect to Qdrant with URL: {}", url_with_scheme);

    let mut config = QdrantConfig::from_url(&url_with_scheme);
    config.check_compatibility = false;
    config.timeout = Duration::from_secs(30);
    config.connect_timeout = Duration::from_secs(10);

    let client = Qdrant::new(config).map_err(|e| VectorDBError::Connection(e.to_string()))?;

    match client.list_collections().await {
        Ok(_) => {
            log::info!("Successfully connected to Qdrant");
            Ok(client)
        }
        Err(e) => {
            log::error!("Connection test failed: {}", e);
            Err(VectorDBError::Connection(format!(
                "Failed to connect to Qdrant: {}",
                e
            )))
        }
    }
}
