use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

use relog::journal;
use std::path::Path;

pub fn run(log_path: &Path) -> anyhow::Result<()> {
    if !log_path.exists() {
        anyhow::bail!("journal not found: {}", log_path.display());
    }

    let cov = journal::coverage(log_path)?;

    println!("\nRelog Journal Report");
    println!("--------------------");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Metric", "Value"]);

    table.add_row(vec!["Records".to_string(), cov.records.to_string()]);
    table.add_row(vec![
        "Unique sequences".to_string(),
        cov.unique_sequences.to_string(),
    ]);
    table.add_row(vec!["OK".to_string(), cov.ok.to_string()]);
    table.add_row(vec!["LATE".to_string(), cov.late.to_string()]);
    table.add_row(vec!["RETRANSMIT".to_string(), cov.retransmit.to_string()]);
    table.add_row(vec!["Gaps".to_string(), cov.gaps.to_string()]);
    table.add_row(vec![
        "Malformed lines".to_string(),
        cov.malformed_lines.to_string(),
    ]);

    println!("{table}");
    Ok(())
}
