//! Post-ingestion clean-up of a built table.
//!
//! Every step only rewrites cells (or headers) it recognizes, so running a step
//! again over already-normalized data changes nothing.

use anyhow::Result;
use std::collections::{BTreeMap, HashMap};

use crate::fetch::{Fetch, ReferenceMap};
use crate::resolve::ReferenceResolver;
use crate::schema::{is_reference_url, reference_token, token_category, Category, ListingSchema};
use crate::table::{parse_number, Table, Value, UNKNOWN};
use crate::ui::Ui;

/// Which columns each normalization step touches
#[derive(Debug, Clone, Default)]
pub struct NormalizePlan {
    pub era_column: Option<String>,
    /// Columns whose URL cells are replaced by names from the category's map
    pub reference_columns: Vec<(String, Category)>,
    /// Categories whose maps relabel indicator headers
    pub indicator_categories: Vec<Category>,
    pub missing_columns: Vec<String>,
    pub sentinel_remaps: Vec<(String, BTreeMap<String, String>)>,
    pub numeric_columns: Vec<String>,
}

impl NormalizePlan {
    pub fn for_schema(schema: &ListingSchema) -> Self {
        let remap = |pairs: &[(&str, &str)]| -> BTreeMap<String, String> {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };

        let sentinel_remaps = [
            ("gender", remap(&[("n/a", "genderless")])),
            ("hair_color", remap(&[("n/a", "none")])),
        ]
        .into_iter()
        .filter(|(col, _)| schema.column(col).is_some())
        .map(|(col, map)| (col.to_string(), map))
        .collect();

        Self {
            era_column: schema.era_column.map(str::to_string),
            reference_columns: schema
                .columns
                .iter()
                .filter_map(|c| c.reference.map(|cat| (c.name.to_string(), cat)))
                .collect(),
            indicator_categories: schema.indicator_fields.to_vec(),
            missing_columns: schema
                .columns
                .iter()
                .filter(|c| c.name != "name")
                .map(|c| c.name.to_string())
                .collect(),
            sentinel_remaps,
            numeric_columns: schema
                .columns
                .iter()
                .filter(|c| c.numeric)
                .map(|c| c.name.to_string())
                .collect(),
        }
    }
}

/// Cells and headers changed by a normalization run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeReport {
    pub eras_converted: usize,
    pub references_substituted: usize,
    pub headers_renamed: usize,
    pub marked_missing: usize,
    pub sentinels_remapped: usize,
    pub numbers_coerced: usize,
    /// Categories whose reference maps could not be fully fetched
    pub incomplete: Vec<Category>,
}

/// Parse `<number>BBY` (negative) or `<number>ABY` (positive)
pub fn parse_era(value: &str) -> Option<f64> {
    let v = value.trim().to_ascii_uppercase();
    let (number, sign) = if let Some(n) = v.strip_suffix("BBY") {
        (n, -1.0)
    } else if let Some(n) = v.strip_suffix("ABY") {
        (n, 1.0)
    } else {
        return None;
    };
    parse_number(number).map(|n| n * sign)
}

/// Step 1: era strings to signed numbers, "unknown" to missing
pub fn convert_era_column(table: &mut Table, column: &str) -> Result<usize> {
    table.map_column(column, |cell| match cell {
        Value::Text(s) if s == UNKNOWN => Some(Value::Missing),
        Value::Text(s) => parse_era(s).map(Value::Number),
        _ => None,
    })
}

/// Step 2: URL cells of one column to display names
pub fn substitute_reference_values(table: &mut Table, column: &str, map: &ReferenceMap) -> Result<usize> {
    table.map_column(column, |cell| {
        let url = cell.as_str().filter(|s| is_reference_url(s))?;
        map.get(url).map(|name| Value::text(name.as_str()))
    })
}

/// Step 3: indicator headers (tokens or raw URLs) to display names
pub fn substitute_indicator_headers(table: &mut Table, map: &ReferenceMap) -> Result<usize> {
    let by_token: HashMap<String, &str> = map
        .iter()
        .filter_map(|(url, name)| reference_token(url).map(|t| (t, name.as_str())))
        .collect();

    let mut renamed = 0;
    for idx in table.fixed_len()..table.columns().len() {
        let header = table.columns()[idx].clone();
        let token = if is_reference_url(&header) {
            match reference_token(&header) {
                Some(t) => t,
                None => continue,
            }
        } else {
            header.clone()
        };

        let Some(name) = by_token.get(&token) else {
            continue;
        };

        let mut label = name.to_string();
        if table.column_index(&label).is_some() {
            match token_category(&token) {
                Some(category) => label = format!("{} ({})", name, category),
                None => continue,
            }
            if table.column_index(&label).is_some() {
                continue;
            }
        }

        table.rename_column(idx, label)?;
        renamed += 1;
    }
    Ok(renamed)
}

/// Step 4: the "unknown" sentinel to a missing value
pub fn mark_missing<S: AsRef<str>>(table: &mut Table, columns: &[S]) -> Result<usize> {
    let mut changed = 0;
    for column in columns {
        changed += table.map_column(column.as_ref(), |cell| cell.is_unknown().then_some(Value::Missing))?;
    }
    Ok(changed)
}

/// Step 5: exact-match sentinel codes to descriptive labels
pub fn remap_sentinels(table: &mut Table, column: &str, replacements: &BTreeMap<String, String>) -> Result<usize> {
    table.map_column(column, |cell| {
        let replacement = replacements.get(cell.as_str()?)?;
        Some(Value::text(replacement.as_str()))
    })
}

/// Numeric text ("1,358") in measurement columns to numbers
pub fn coerce_numeric<S: AsRef<str>>(table: &mut Table, columns: &[S]) -> Result<usize> {
    let mut changed = 0;
    for column in columns {
        changed += table.map_column(column.as_ref(), |cell| match cell {
            Value::Text(s) => parse_number(s).map(Value::Number),
            _ => None,
        })?;
    }
    Ok(changed)
}

/// Run every step of `plan` in order, resolving reference maps as needed
pub fn normalize<F: Fetch>(
    table: &mut Table,
    plan: &NormalizePlan,
    resolver: &mut ReferenceResolver<F>,
    ui: &mut impl Ui,
) -> Result<NormalizeReport> {
    let mut report = NormalizeReport::default();

    if let Some(column) = &plan.era_column {
        report.eras_converted = convert_era_column(table, column)?;
    }

    for (column, category) in &plan.reference_columns {
        let resolution = resolver.resolve_category(*category, ui)?;
        if !resolution.is_complete() {
            report.incomplete.push(*category);
        }
        report.references_substituted += substitute_reference_values(table, column, &resolution.map)?;
    }

    let mut union = ReferenceMap::new();
    for category in &plan.indicator_categories {
        let resolution = resolver.resolve_category(*category, ui)?;
        if !resolution.is_complete() && !report.incomplete.contains(category) {
            report.incomplete.push(*category);
        }
        union.extend(resolution.map);
    }
    report.headers_renamed = substitute_indicator_headers(table, &union)?;

    report.marked_missing = mark_missing(table, &plan.missing_columns)?;

    for (column, replacements) in &plan.sentinel_remaps {
        report.sentinels_remapped += remap_sentinels(table, column, replacements)?;
    }

    report.numbers_coerced = coerce_numeric(table, &plan.numeric_columns)?;

    ui.log(format!(
        "Normalized: {} eras, {} references, {} headers, {} missing, {} remapped, {} numbers",
        report.eras_converted,
        report.references_substituted,
        report.headers_renamed,
        report.marked_missing,
        report.sentinels_remapped,
        report.numbers_coerced
    ));

    Ok(report)
}
