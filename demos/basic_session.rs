/// Basic Session Example
///
/// This example demonstrates:
/// - Loading paper rows from JSON
/// - Applying filters and a header-click sort
/// - Reading counts, order and shading from the snapshot

use papertable::{DetailRow, Field, FilterState, PaperRow, RowEntry, TableSession, ViewConfig};

const ROWS: &str = r#"[
    {"id": 1, "title": "CNN-based solder joint inspection", "journal": "IEEE Access", "year": 2021,
     "page_count": 12, "fields": {"is_survey": "no", "features_solder_void": "yes", "technique_dl_cnn_detector": "yes"}},
    {"id": 2, "title": "A survey of automated optical inspection", "journal": "IEEE Access", "year": 2019,
     "page_count": 28, "fields": {"is_survey": "yes", "verified_by": "user"}},
    {"id": 3, "title": "Thermal imaging of assemblies", "journal": "Sensors", "year": 2022,
     "page_count": "", "fields": {"is_offtopic": "yes"}},
    {"id": 4, "title": "CNN-based solder joint inspection", "journal": "Electronics", "year": "2020",
     "page_count": 4, "fields": {"features_tracks": "yes", "changed_by": "gpt-4o"}}
]"#;

fn print_snapshot(session: &TableSession) {
    let snapshot = session.snapshot();
    println!(
        "   visible {}/{}  duplicate titles {}",
        snapshot.visible,
        snapshot.total,
        snapshot.duplicate_titles()
    );
    for id in &snapshot.order {
        let entry = match session.store().get(id) {
            Some(entry) => entry,
            None => continue,
        };
        let shading = snapshot.shading.get(id);
        let shade = shading.map(|s| s.shade.class()).unwrap_or("-");
        let journal = shading
            .and_then(|s| s.journal)
            .map(|c| c.to_string())
            .unwrap_or_default();
        println!(
            "   [{}] {:>2} {:<4} {:<45} {:<12} {}",
            shade, id, entry.row.year, entry.row.title, entry.row.journal, journal
        );
    }
    println!();
}

fn main() -> papertable::Result<()> {
    println!("=== PaperTable Basic Session Example ===\n");

    // 1. Load rows
    println!("1. Loading rows...");
    let rows: Vec<PaperRow> = serde_json::from_str(ROWS)?;
    let entries = rows
        .into_iter()
        .map(|row| RowEntry::new(row, DetailRow::default()))
        .collect();
    let config = ViewConfig {
        initial_sort: None,
        ..Default::default()
    };
    let mut session = TableSession::with_entries(config, entries)?;
    print_snapshot(&session);

    // 2. Hide off-topic papers
    println!("2. Hiding off-topic papers...");
    session.set_filter(FilterState {
        hide_offtopic: true,
        ..Default::default()
    });
    print_snapshot(&session);

    // 3. Sort by year: first click descending, second ascending
    for _ in 0..2 {
        let direction = session.click_sort("year")?;
        println!("3. Sorted by year {}", direction.indicator());
        print_snapshot(&session);
    }

    // 4. Edit a field and read the counters back
    println!("4. Marking paper 1 as verified by a user...");
    session.set_field("1", "verified_by", "👤")?;
    let counts = &session.snapshot().counts;
    for field in [Field::IsSurvey, Field::VerifiedBy, Field::ChangedBy, Field::FeaturesSolderVoid] {
        println!("   {:<20} {}", field.label(), counts.get(field));
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
