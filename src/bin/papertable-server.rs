/// PaperTable Server
///
/// Standalone server publishing table snapshots and stats over HTTP and
/// WebSocket.
///
/// Environment:
/// - `PAPERTABLE_CONFIG`: JSON view configuration file
/// - `PAPERTABLE_ROWS`: rows to load at startup, a JSON array or a `.html`
///   row-collection fragment
/// - `HOST` / `PORT`: override the configured server address

use papertable::server::run_server;
use papertable::{DetailRow, PaperRow, RowEntry, TableSession, ViewConfig};
use std::io;

fn to_io(err: papertable::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err.to_string())
}

fn load_rows(session: &mut TableSession, path: &str) -> papertable::Result<()> {
    let text = std::fs::read_to_string(path)?;
    if path.ends_with(".html") || path.ends_with(".htm") {
        session.load_markup(&text)?;
    } else {
        let rows: Vec<PaperRow> = serde_json::from_str(&text)?;
        let entries = rows
            .into_iter()
            .map(|row| RowEntry::new(row, DetailRow::default()))
            .collect();
        session.load_entries(entries)?;
    }
    Ok(())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = match std::env::var("PAPERTABLE_CONFIG") {
        Ok(path) => ViewConfig::from_file(&path).map_err(to_io)?,
        Err(_) => ViewConfig::default(),
    }
    .apply_env();

    let mut session = TableSession::new(config.clone());
    if let Ok(path) = std::env::var("PAPERTABLE_ROWS") {
        load_rows(&mut session, &path).map_err(to_io)?;
        log::info!("loaded {} rows from {}", session.store().len(), path);
    }

    run_server(config, session).await
}
