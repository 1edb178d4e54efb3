/// Stats Report Example
///
/// This example demonstrates:
/// - Building a session from row-collection markup
/// - Attaching fetched detail content
/// - Printing the chart series and frequency lists of the stats panel

use papertable::{DetailEnvelope, TableSession, ViewConfig};

const FRAGMENT: &str = r#"
<tr data-paper-id="1">
    <td data-col="pdf">📗</td>
    <td data-col="title">Deep learning for PCB defect detection</td>
    <td data-col="authors">Li, X.; Chen, Y.</td>
    <td data-col="year">2020</td>
    <td data-col="journal">IEEE Access</td>
    <td data-col="type" title="article">📄</td>
    <td data-col="keywords">AOI; deep learning</td>
    <td data-col="model">YOLOv5</td>
    <td data-field="technique_dl_cnn_detector">✔️</td>
    <td data-field="features_tracks">✔️</td>
</tr>
<tr class="detail-row"><td><div class="detail-content-placeholder"></div></td></tr>
<tr data-paper-id="2">
    <td data-col="pdf">📕</td>
    <td data-col="title">Survey of X-ray inspection</td>
    <td data-col="authors">Chen, Y.</td>
    <td data-col="year">2021</td>
    <td data-col="journal">IEEE Access</td>
    <td data-col="type" title="article">📄</td>
    <td data-col="keywords">AOI; X-ray</td>
    <td data-field="is_survey">✔️</td>
    <td data-field="is_x_ray">✔️</td>
</tr>
<tr class="detail-row"><td></td></tr>
<tr data-paper-id="3">
    <td data-col="title">Solder void segmentation</td>
    <td data-col="authors">Park, J.</td>
    <td data-col="year">2021</td>
    <td data-col="journal">Sensors</td>
    <td data-col="type" title="inproceedings">📘</td>
    <td data-col="features_other">tombstoning; scratches</td>
    <td data-col="model">U-Net; YOLOv5</td>
    <td data-field="technique_dl_other">✔️</td>
    <td data-field="features_solder_void">✔️</td>
</tr>
<tr class="detail-row"><td></td></tr>
"#;

fn main() -> papertable::Result<()> {
    println!("=== PaperTable Stats Report Example ===\n");

    let mut session = TableSession::from_markup(ViewConfig::default(), FRAGMENT)?;

    let envelope: DetailEnvelope = serde_json::from_str(
        r#"{"status": "success", "html": "<p>Abstract: a CNN detector for tracks.</p><div class=\"trace-content\">reasoning</div>"}"#,
    )?;
    session.apply_detail_envelope("1", envelope);

    let missing: DetailEnvelope =
        serde_json::from_str(r#"{"status": "error", "message": "Paper not found"}"#)?;
    session.apply_detail_envelope("3", missing);
    if let Some(entry) = session.store().get("3") {
        println!("Detail of paper 3: {}\n", entry.detail.error.as_deref().unwrap_or(""));
    }

    let report = session.stats();

    println!("Features distribution:");
    for (label, value) in report.charts.features.labels.iter().zip(&report.charts.features.values) {
        println!("   {:<22} {}", label, value);
    }

    println!("\nTechniques (largest first):");
    for (label, value) in report.charts.techniques.labels.iter().zip(&report.charts.techniques.values) {
        println!("   {:<22} {}", label, value);
    }

    for chart in [
        ("Survey vs implementation", &report.charts.survey_vs_implementation),
        ("Features per year", &report.charts.features_per_year),
        ("Publication types per year", &report.charts.pub_types_per_year),
    ] {
        println!("\n{} {:?}:", chart.0, chart.1.years);
        for series in &chart.1.series {
            println!("   {:<22} {:?}", series.label, series.data);
        }
    }

    println!("\nRepeated journals: {:?}", report.lists.journals);
    println!("Repeated keywords: {:?}", report.lists.keywords);
    println!("Other features:    {:?}", report.lists.other_features);
    println!("Model names:       {:?}", report.lists.model_names);

    println!("\nAs JSON:\n{}", serde_json::to_string_pretty(&report)?);

    println!("\n=== Example Complete ===");
    Ok(())
}
