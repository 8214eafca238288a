pub mod replay;
pub mod serve;

pub use replay::handle_replay;
pub use serve::handle_serve;

use anyhow::Result;
use skytrail::config::MetadataConfig;
use skytrail::metadata::{JsonFileMetadata, MetadataLookup, NoMetadata};
use std::sync::Arc;
use tracing::info;

/// Open the configured metadata database, or a lookup that never answers
pub(crate) async fn load_metadata(config: &MetadataConfig) -> Result<Arc<dyn MetadataLookup>> {
    match &config.db_path {
        Some(path) => Ok(Arc::new(JsonFileMetadata::load(path).await?)),
        None => {
            info!("No metadata database configured");
            Ok(Arc::new(NoMetadata))
        }
    }
}
