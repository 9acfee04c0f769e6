//! Print a secret's value to stdout without a trailing newline

use anyhow::{Context, Result};
use ssstash_core::{open_store, StoreConfig};

use crate::cli::GetArgs;

pub async fn run(args: GetArgs, config: &StoreConfig) -> Result<()> {
    let store = open_store(config).await?;

    let mut stdout = tokio::io::stdout();
    store
        .get_to(&args.name, &mut stdout)
        .await
        .with_context(|| format!("Failed to get secret '{}'", args.name))
}
