//! Batch artifacts: comparison table export.

use std::path::Path;

use anyhow::{Context, Result};

use crate::compare::ComparisonRow;

/// Write the comparison rows to a CSV file.
pub fn write_comparison_csv(path: &Path, rows: &[ComparisonRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create comparison CSV {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .context("failed to serialize comparison row")?;
    }
    writer.flush().context("failed to flush comparison CSV")?;
    Ok(())
}

/// Write the comparison rows as pretty JSON.
pub fn write_comparison_json(path: &Path, rows: &[ComparisonRow]) -> Result<()> {
    let json = serde_json::to_string_pretty(rows).context("failed to serialize comparison")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write comparison JSON {}", path.display()))?;
    Ok(())
}
