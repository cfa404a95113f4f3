use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use crate::schema::ListingSchema;
use crate::table::{Table, Value};

/// Write the table with a header row. Missing cells become empty fields.
pub fn export_table(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create export directory")?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {:?}", path))?;

    writer
        .write_record(table.columns())
        .context("Failed to write header row")?;

    for row in table.rows() {
        writer
            .write_record(row.iter().map(|cell| cell.to_string()))
            .context("Failed to write row")?;
    }

    writer.flush().context("Failed to flush table export")?;
    Ok(())
}

/// Reload an exported table; the header must start with the schema's fixed columns.
pub fn load_table(path: &Path, schema: &ListingSchema) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {:?}", path))?;

    let columns: Vec<String> = reader
        .headers()
        .context("Failed to read header row")?
        .iter()
        .map(str::to_string)
        .collect();

    let fixed = schema.columns.len();
    let expected = schema.column_names();
    if columns.len() < fixed || columns[..fixed] != expected[..] {
        bail!(
            "{:?} does not start with the {} columns {:?}",
            path,
            schema.category,
            expected
        );
    }

    let numeric: Vec<bool> = schema
        .columns
        .iter()
        .map(|c| c.numeric || Some(c.name) == schema.era_column)
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read row {}", line + 1))?;

        let mut row = Vec::with_capacity(columns.len());
        for (idx, field) in record.iter().enumerate() {
            let cell = if idx < fixed {
                fixed_cell(field, numeric[idx])
            } else {
                indicator_cell(field)
                    .with_context(|| format!("Row {}, column {}", line + 1, columns[idx]))?
            };
            row.push(cell);
        }
        rows.push(row);
    }

    Table::from_parts(columns, fixed, rows)
}

fn fixed_cell(field: &str, numeric: bool) -> Value {
    if field.is_empty() {
        return Value::Missing;
    }
    if numeric {
        if let Ok(n) = field.parse::<f64>() {
            return Value::Number(n);
        }
    }
    Value::text(field)
}

fn indicator_cell(field: &str) -> Result<Value> {
    match field {
        "True" | "true" | "1" => Ok(Value::Flag(true)),
        "False" | "false" | "0" => Ok(Value::Flag(false)),
        other => bail!("Not an indicator value: {:?}", other),
    }
}
