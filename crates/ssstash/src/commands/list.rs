//! List secret names, one per line

use anyhow::{Context, Result};
use ssstash_core::{open_store, StoreConfig};
use std::io::Write;
use std::ops::ControlFlow;
use tracing::debug;

pub async fn run(config: &StoreConfig) -> Result<()> {
    let store = open_store(config).await?;
    debug!("Listing secrets under {}", store.namespace());

    let mut stdout = std::io::stdout();
    let mut write_error = None;

    store
        .visit(|name| match writeln!(stdout, "{}", name) {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => {
                // Closed pipe (e.g. `| head`): stop fetching pages
                write_error = Some(e);
                ControlFlow::Break(())
            }
        })
        .await
        .context("Failed to list secrets")?;

    match write_error {
        Some(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Some(e) => Err(e).context("Failed to write to stdout"),
        None => stdout.flush().context("Failed to write to stdout"),
    }
}
