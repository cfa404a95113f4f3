use anyhow::Result;
use std::collections::HashMap;

use crate::table::Table;

const COLUMN_SEPARATOR: &str = "    |";
const GAP: usize = 5;
const RULE_WIDTH: usize = 72;

/// Distinct values of a column with their counts
#[derive(Debug, Clone, PartialEq)]
pub struct ValueCounts {
    pub column: String,
    /// Most frequent first; ties ordered by value
    pub counts: Vec<(String, usize)>,
    pub missing: usize,
}

pub fn value_counts(table: &Table, column: &str) -> Result<ValueCounts> {
    let mut tally: HashMap<String, usize> = HashMap::new();
    let mut missing = 0;

    for cell in table.column(column)? {
        if cell.is_missing() {
            missing += 1;
        } else {
            *tally.entry(cell.to_string()).or_default() += 1;
        }
    }

    let mut counts: Vec<(String, usize)> = tally.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Ok(ValueCounts {
        column: column.to_string(),
        counts,
        missing,
    })
}

/// Lay the counts out in `cols` side-by-side columns of `width` characters
pub fn format_counts(counts: &ValueCounts, width: usize, cols: usize) -> String {
    let cols = cols.max(1);
    let cell = width.saturating_sub(GAP).max(1);
    let pair = |a: &str, b: &str| format!("{}{}{}", fit(a, cell), " ".repeat(GAP), fit(b, cell));

    let mut entries: Vec<String> = counts
        .counts
        .iter()
        .map(|(value, n)| pair(value, &format!("counts: {}", n)))
        .collect();
    entries.push(pair("NaN", &format!("counts: {}", counts.missing)));

    let mut out = String::new();
    let header = pair(&counts.column, "counts");
    out.push_str(&vec![header; cols].join(COLUMN_SEPARATOR));
    out.push('\n');
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');

    let rows = entries.len().div_ceil(cols);
    let blank = " ".repeat(cell * 2 + GAP);
    for r in 0..rows {
        let line: Vec<&str> = (0..cols)
            .map(|c| entries.get(c * rows + r).map_or(blank.as_str(), String::as_str))
            .collect();
        out.push_str(line.join(COLUMN_SEPARATOR).trim_end());
        out.push('\n');
    }
    out
}

/// Left-justify and truncate to exactly `width` characters
fn fit(s: &str, width: usize) -> String {
    let truncated: String = s.chars().take(width).collect();
    format!("{:<width$}", truncated, width = width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn table() -> Table {
        Table::from_parts(
            vec!["eye_color".into()],
            1,
            ["blue", "brown", "blue", "red", "brown", "blue"]
                .iter()
                .map(|c| vec![Value::text(*c)])
                .chain(std::iter::once(vec![Value::Missing]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_value_counts_sorted() {
        let counts = value_counts(&table(), "eye_color").unwrap();
        assert_eq!(
            counts.counts,
            vec![("blue".to_string(), 3), ("brown".to_string(), 2), ("red".to_string(), 1)]
        );
        assert_eq!(counts.missing, 1);
    }

    #[test]
    fn test_format_counts_columns() {
        let counts = value_counts(&table(), "eye_color").unwrap();
        let text = format_counts(&counts, 15, 2);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "eye_color      counts        |eye_color      counts    ");
        assert_eq!(lines[1], "-".repeat(72));
        // Four entries (three values + NaN) in two columns -> two rows
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("blue          "));
        assert!(lines[2].contains("|red"));
        assert!(lines[3].contains("|NaN"));
    }

    #[test]
    fn test_fit_truncates() {
        assert_eq!(fit("hazel", 3), "haz");
        assert_eq!(fit("a", 3), "a  ");
    }
}
