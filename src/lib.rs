/// PaperTable - Filtering, Sorting and Aggregation for Literature-Review Tables
///
/// An in-memory model of a table of research papers. Rows are filtered by a
/// set of toggles and a free-text search, sorted by a single column with a
/// stable id tiebreak, shaded for readability and duplicate detection, and
/// counted into the totals and per-year breakdowns behind the stats charts.
/// Every recomputation is a full, synchronous rescan owned by a
/// `TableSession`.

pub mod error;
pub mod field;
pub mod record;
pub mod store;
pub mod markup;
pub mod filter;
pub mod aggregate;
pub mod sort;
pub mod shading;
pub mod stats;
pub mod schedule;
pub mod config;
pub mod session;

pub use error::{Error, Result};
pub use field::{
    Field, FieldKind, Mark, PdfStatus, Provenance, ALL_FEATURES, COUNT_FIELDS, FEATURE_FIELDS,
    PCBA_FEATURES, PCB_FEATURES, SOLDER_FEATURES, TECHNIQUE_FIELDS,
};
pub use record::{DetailContent, DetailEnvelope, DetailRow, PaperRow};
pub use store::{RowEntry, RowStore};
pub use filter::{visible, CompiledFilter, FilterState, Predicate};
pub use aggregate::{aggregate, aggregate_store, AggregateCounts, SurveySplit, YearBucket, YearlyBreakdown};
pub use sort::{sort, sort_store, SortColumn, SortDirection, SortState, SortValue};
pub use shading::{duplicate_title_count, shade, shade_store, Hsl, RowShading, Shade, ShadingConfig, ShadingPlan};
pub use stats::{chart_stats, list_stats, ChartStats, Distribution, ListStats, NameCount, Series, StatsReport, YearlyChart};
pub use schedule::{RecomputeScheduler, ReloadTicket, Trigger};
pub use config::{DebounceConfig, ServerConfig, ViewConfig};
pub use session::{Snapshot, TableSession};

// WebSocket server modules - only when server feature is enabled
#[cfg(feature = "server")]
pub mod messages;
#[cfg(feature = "server")]
pub mod websocket;
#[cfg(feature = "server")]
pub mod server;
