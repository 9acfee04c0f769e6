//! Delete a secret; deleting an absent name succeeds

use anyhow::{Context, Result};
use ssstash_core::{open_store, StoreConfig};

use crate::cli::DeleteArgs;

pub async fn run(args: DeleteArgs, config: &StoreConfig) -> Result<()> {
    let store = open_store(config).await?;
    store
        .delete(&args.name)
        .await
        .with_context(|| format!("Failed to delete secret '{}'", args.name))
}
