use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use eloqua::storage::state_document;
use eloqua::{
    BookmarkStore, InMemoryBookmarkStore, RecordSink, SingerSink, SqliteBookmarkStore,
    StreamKind, SyncContext, SyncOptions, SystemClock, sync_streams,
};
use log::info;

/// Where bookmarks come from and where the final state goes
pub struct StateArgs<'a> {
    /// Singer state file to seed an in-memory store
    pub state: Option<&'a Path>,
    /// SQLite bookmark database (takes precedence over `state`)
    pub state_db: Option<&'a Path>,
    /// File to receive the final state document
    pub write_state: Option<&'a Path>,
}

/// Execute the `sync` command: stream Singer messages to stdout.
pub fn execute(
    config_path: Option<&Path>,
    streams: &[String],
    state_args: StateArgs<'_>,
    parallel: bool,
) -> Result<()> {
    let config = super::load_config(config_path)?;

    let selected = if streams.is_empty() {
        config.selected_streams()?
    } else {
        streams
            .iter()
            .map(|name| name.parse::<StreamKind>().map_err(anyhow::Error::from))
            .collect::<Result<Vec<_>>>()?
    };

    let store: Box<dyn BookmarkStore> = match (state_args.state, state_args.state_db) {
        (_, Some(db)) => Box::new(SqliteBookmarkStore::new(db)?),
        (Some(path), None) => {
            let value: serde_json::Value = config::load_json_file(path)
                .with_context(|| format!("Failed to load state file {}", path.display()))?;
            Box::new(InMemoryBookmarkStore::from_state(&value)?)
        }
        (None, None) => Box::new(InMemoryBookmarkStore::new()),
    };

    let client = super::connect(&config)?;
    let sink = SingerSink::new(BufWriter::new(std::io::stdout()));
    let clock = SystemClock;

    let ctx = SyncContext {
        api: &client,
        clock: &clock,
        settings: &config.export,
        store: store.as_ref(),
        sink: &sink,
        start_date: config.start_timestamp()?,
    };

    info!(
        "Syncing {} stream(s){}",
        selected.len(),
        if parallel { " in parallel" } else { "" }
    );
    let stats = sync_streams(&ctx, &selected, SyncOptions { parallel })?;

    // Final checkpoint covering every stream
    let final_state = state_document(&store.list_bookmarks()?);
    sink.write_state(&final_state)?;
    if let Some(path) = state_args.write_state {
        config::save_json_file(path, &final_state)?;
        info!("Wrote state to {}", path.display());
    }

    let records: usize = stats.iter().map(|s| s.extract.records).sum();
    info!("Sync complete: {} records across {} stream(s)", records, stats.len());
    Ok(())
}
