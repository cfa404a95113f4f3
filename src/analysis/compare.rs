use anyhow::{Context, Result};

use super::stats::{BinRule, Histogram, NormalFit};
use crate::table::{Table, Value};

/// Measurements of `measure_col` for rows whose `group_col` equals `group`.
///
/// Rows where either column is missing or "unknown" are skipped. A group
/// starting with "any" or "all" matches every row.
pub fn select_measurements(table: &Table, group_col: &str, measure_col: &str, group: &str) -> Result<Vec<f64>> {
    let g = table
        .column_index(group_col)
        .with_context(|| format!("No column named {}", group_col))?;
    let m = table
        .column_index(measure_col)
        .with_context(|| format!("No column named {}", measure_col))?;

    let prefix: String = group.chars().take(3).collect::<String>().to_lowercase();
    let match_all = prefix == "any" || prefix == "all";

    Ok(table
        .rows()
        .iter()
        .filter(|row| row[g].is_known() && row[m].is_known())
        .filter(|row| match_all || cell_matches(&row[g], group))
        .filter_map(|row| row[m].as_f64())
        .collect())
}

fn cell_matches(cell: &Value, group: &str) -> bool {
    match cell {
        Value::Text(s) => s == group,
        other => other.to_string() == group,
    }
}

/// One group's distribution
#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub values: Vec<f64>,
    pub histogram: Option<Histogram>,
    pub fit: Option<NormalFit>,
}

/// Distributions of one measurement across several groups
#[derive(Debug, Clone)]
pub struct Comparison {
    pub group_column: String,
    pub measure_column: String,
    pub series: Vec<Series>,
    /// Range shared by every series, for common axes
    pub min: f64,
    pub max: f64,
}

impl Comparison {
    pub fn build<S: AsRef<str>>(
        table: &Table,
        group_col: &str,
        groups: &[S],
        measure_col: &str,
        bins: BinRule,
    ) -> Result<Self> {
        let mut series = Vec::with_capacity(groups.len());
        let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);

        for group in groups {
            let label = group.as_ref();
            let values = select_measurements(table, group_col, measure_col, label)?;
            for v in &values {
                min = min.min(*v);
                max = max.max(*v);
            }
            series.push(Series {
                label: label.to_string(),
                histogram: Histogram::build(&values, bins),
                fit: NormalFit::fit(&values),
                values,
            });
        }

        if min > max {
            (min, max) = (0.0, 0.0);
        }

        Ok(Self {
            group_column: group_col.to_string(),
            measure_column: measure_col.to_string(),
            series,
            min,
            max,
        })
    }

    /// Largest density of any histogram or fitted curve, for the y axis
    pub fn peak_density(&self, curve_points: usize) -> f64 {
        self.series
            .iter()
            .flat_map(|s| {
                let bars = s.histogram.iter().flat_map(|h| h.density());
                let curve = s
                    .fit
                    .iter()
                    .flat_map(|f| f.curve(self.min, self.max, curve_points))
                    .map(|(_, y)| y);
                bars.chain(curve).collect::<Vec<_>>()
            })
            .fold(0.0, f64::max)
    }
}
