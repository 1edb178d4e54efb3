/// WebSocket message types for client-server communication
use serde::{Deserialize, Serialize};

use crate::filter::FilterState;
use crate::record::PaperRow;
use crate::session::{Snapshot, TableSession};
use crate::stats::StatsReport;

/// Messages sent from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Receive every snapshot published from now on
    Subscribe,

    /// Request the current snapshot
    Query,

    /// Request chart and list stats over the visible rows
    Stats,

    /// Replace the filter controls (debounced)
    SetFilter { filter: FilterState },

    /// Replace only the search text (debounced with the search delay)
    Search { text: String },

    /// Header click on a sortable column
    SortBy { column: String },

    /// Replace every row with the given records
    LoadRows { rows: Vec<PaperRow> },

    /// Replace every row from a row-collection markup fragment
    LoadMarkup { html: String },

    /// Set a classification field; without a value the field cycles
    SetField {
        id: String,
        field: String,
        #[serde(default)]
        value: Option<String>,
    },
}

/// Messages sent from server to client
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Subscription confirmed
    Subscribed,

    /// Result of the latest recomputation pass
    Snapshot {
        snapshot: Snapshot,
        /// A row reload is in flight
        busy: bool,
        /// Message of the last failed reload
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    Stats { stats: StatsReport },

    /// Error occurred
    Error { message: String },
}

impl ServerMessage {
    pub fn snapshot(session: &TableSession) -> Self {
        ServerMessage::Snapshot {
            snapshot: session.snapshot().clone(),
            busy: session.is_busy(),
            error: session.last_error().map(str::to_string),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}
