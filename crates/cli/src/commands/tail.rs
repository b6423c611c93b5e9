use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

use relog::journal;
use std::path::Path;

pub fn run(log_path: &Path, count: usize) -> anyhow::Result<()> {
    if !log_path.exists() {
        anyhow::bail!("journal not found: {}", log_path.display());
    }

    let records = journal::read_records(log_path)?;
    let start = records.len().saturating_sub(count);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Sequence", "Timestamp", "Payload bytes", "Status"]);

    for record in &records[start..] {
        table.add_row(vec![
            record.sequence.to_string(),
            record.timestamp.clone(),
            record.payload.len().to_string(),
            record.status.to_string(),
        ]);
    }

    println!("{table}");
    println!("{} of {} records", records.len() - start, records.len());
    Ok(())
}
