//! Encrypt and store a secret

use anyhow::{Context, Result};
use ssstash_core::{open_store, Error, SecretInput, StoreConfig};

use crate::cli::PutArgs;

pub async fn run(args: PutArgs, config: &StoreConfig) -> Result<()> {
    let key = args.key.as_deref().unwrap_or_default();
    if key.is_empty() {
        return Err(Error::MissingKey.into());
    }

    let store = open_store(config).await?;
    store
        .put(&args.name, SecretInput::parse(&args.value), key)
        .await
        .with_context(|| format!("Failed to store secret '{}'", args.name))
}
