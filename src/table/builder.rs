use anyhow::{Context, Result};
use serde_json::Value as Json;
use std::collections::HashMap;

use super::frame::Table;
use super::value::{IndicatorCell, Value, UNKNOWN};
use crate::config::Config;
use crate::fetch::{paginate, Fetch, Pagination};
use crate::schema::{reference_token, ColumnKind, ListingSchema};
use crate::ui::Ui;

/// Incrementally builds a table whose indicator columns are discovered per record.
///
/// Indicator cells are held sparsely while records arrive; `finish` materializes
/// the dense table and turns every unset cell into `false`.
pub struct TableBuilder<'s> {
    schema: &'s ListingSchema,
    fixed_rows: Vec<Vec<Value>>,
    indicator_columns: Vec<String>,
    indicator_index: HashMap<String, usize>,
    indicator_cells: Vec<HashMap<usize, bool>>,
}

impl<'s> TableBuilder<'s> {
    pub fn new(schema: &'s ListingSchema) -> Self {
        Self {
            schema,
            fixed_rows: Vec::new(),
            indicator_columns: Vec::new(),
            indicator_index: HashMap::new(),
            indicator_cells: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.fixed_rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixed_rows.is_empty()
    }

    /// Indicator columns in discovery order
    pub fn indicator_columns(&self) -> &[String] {
        &self.indicator_columns
    }

    /// Current state of one indicator cell
    pub fn cell(&self, row: usize, column: &str) -> IndicatorCell {
        let Some(col) = self.indicator_index.get(column) else {
            return IndicatorCell::Unset;
        };
        self.indicator_cells
            .get(row)
            .and_then(|cells| cells.get(col))
            .map_or(IndicatorCell::Unset, |b| IndicatorCell::Set(*b))
    }

    pub fn append_records(&mut self, records: &[Json]) -> Result<usize> {
        for record in records {
            self.append_record(record)?;
        }
        Ok(records.len())
    }

    pub fn append_record(&mut self, record: &Json) -> Result<()> {
        let row_no = self.fixed_rows.len();
        let mut row = Vec::with_capacity(self.schema.columns.len());

        for col in self.schema.columns {
            let field = record
                .get(col.name)
                .with_context(|| format!("Record {} has no field {}", row_no, col.name))?;

            let value = match col.kind {
                ColumnKind::Scalar => Value::from_json(field),
                ColumnKind::Singular => singular_value(field),
            };
            row.push(value);
        }

        let mut cells = HashMap::new();
        for category in self.schema.indicator_fields {
            let field = category.as_str();
            let urls = record
                .get(field)
                .and_then(Json::as_array)
                .with_context(|| format!("Record {} has no list field {}", row_no, field))?;

            for url in urls.iter().filter_map(Json::as_str) {
                let key = reference_token(url).unwrap_or_else(|| url.to_string());
                let col = self.indicator_column(key);
                cells.insert(col, true);
            }
        }

        self.fixed_rows.push(row);
        self.indicator_cells.push(cells);
        Ok(())
    }

    fn indicator_column(&mut self, key: String) -> usize {
        if let Some(idx) = self.indicator_index.get(&key) {
            return *idx;
        }
        let idx = self.indicator_columns.len();
        self.indicator_index.insert(key.clone(), idx);
        self.indicator_columns.push(key);
        idx
    }

    /// Materialize the dense table, back-filling unset indicators with `false`
    pub fn finish(self) -> Result<Table> {
        let mut columns: Vec<String> = self.schema.columns.iter().map(|c| c.name.to_string()).collect();
        let fixed = columns.len();
        columns.extend(self.indicator_columns.iter().cloned());

        let width = self.indicator_columns.len();
        let rows = self
            .fixed_rows
            .into_iter()
            .zip(self.indicator_cells)
            .map(|(mut row, cells)| {
                row.extend((0..width).map(|col| {
                    let cell = cells.get(&col).map_or(IndicatorCell::Unset, |b| IndicatorCell::Set(*b));
                    Value::Flag(cell.finalize())
                }));
                row
            })
            .collect();

        Table::from_parts(columns, fixed, rows)
    }
}

fn singular_value(field: &Json) -> Value {
    match field {
        Json::Array(items) => items
            .first()
            .map(Value::from_json)
            .unwrap_or_else(|| Value::text(UNKNOWN)),
        Json::Null => Value::text(UNKNOWN),
        other => Value::from_json(other),
    }
}

/// A built table and how the listing ended
#[derive(Debug, Clone)]
pub struct Ingest {
    pub table: Table,
    pub pagination: Pagination,
}

impl Ingest {
    pub fn is_complete(&self) -> bool {
        self.pagination.is_complete()
    }
}

/// Paginate the schema's listing and build its table
pub fn build_table<F: Fetch>(
    fetcher: &mut F,
    config: &Config,
    schema: &ListingSchema,
    ui: &mut impl Ui,
) -> Result<Ingest> {
    let mut builder = TableBuilder::new(schema);
    let start = config.listing_url(schema.category);

    ui.set_info(format!("Fetching {}", schema.category));
    let pagination = paginate(fetcher, &start, ui, |records| {
        builder.append_records(&records)?;
        Ok(())
    })?;

    ui.log(format!(
        "Fetched {} {} records, {} indicator columns",
        builder.len(),
        schema.category,
        builder.indicator_columns().len()
    ));

    Ok(Ingest {
        table: builder.finish()?,
        pagination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PEOPLE;
    use serde_json::json;

    fn person(name: &str, species: &[&str], films: &[u32], starships: &[u32]) -> Json {
        json!({
            "name": name,
            "birth_year": "19BBY",
            "eye_color": "blue",
            "gender": "male",
            "hair_color": "blond",
            "height": "172",
            "mass": "77",
            "skin_color": "fair",
            "homeworld": "https://swapi.dev/api/planets/1/",
            "species": species,
            "films": films.iter().map(|f| format!("https://swapi.dev/api/films/{}/", f)).collect::<Vec<_>>(),
            "starships": starships.iter().map(|s| format!("https://swapi.dev/api/starships/{}/", s)).collect::<Vec<_>>(),
            "vehicles": [],
        })
    }

    #[test]
    fn test_overlapping_references() {
        let mut builder = TableBuilder::new(&PEOPLE);
        builder
            .append_records(&[person("A", &[], &[1, 2], &[]), person("B", &[], &[2, 3], &[])])
            .unwrap();

        assert_eq!(builder.cell(0, "films_3"), IndicatorCell::Unset);
        assert_eq!(builder.cell(1, "films_3"), IndicatorCell::Set(true));

        let table = builder.finish().unwrap();
        assert_eq!(table.indicator_columns(), &["films_1", "films_2", "films_3"]);
        assert_eq!(table.get(0, "films_1"), Some(&Value::Flag(true)));
        assert_eq!(table.get(0, "films_2"), Some(&Value::Flag(true)));
        assert_eq!(table.get(0, "films_3"), Some(&Value::Flag(false)));
        assert_eq!(table.get(1, "films_1"), Some(&Value::Flag(false)));
        assert_eq!(table.get(1, "films_2"), Some(&Value::Flag(true)));
        assert_eq!(table.get(1, "films_3"), Some(&Value::Flag(true)));
    }

    #[test]
    fn test_singular_species() {
        let mut builder = TableBuilder::new(&PEOPLE);
        builder
            .append_records(&[
                person("Luke", &[], &[], &[]),
                person("R2-D2", &["https://swapi.dev/api/species/2/"], &[], &[]),
            ])
            .unwrap();
        let table = builder.finish().unwrap();

        assert_eq!(table.get(0, "species"), Some(&Value::text(UNKNOWN)));
        assert_eq!(
            table.get(1, "species"),
            Some(&Value::text("https://swapi.dev/api/species/2/"))
        );
        assert!(table.indicator_columns().is_empty());
    }

    #[test]
    fn test_indicator_columns_span_categories() {
        let mut builder = TableBuilder::new(&PEOPLE);
        builder.append_record(&person("Han", &[], &[1], &[10])).unwrap();
        let table = builder.finish().unwrap();
        assert_eq!(table.indicator_columns(), &["films_1", "starships_10"]);
        assert_eq!(table.fixed_len(), PEOPLE.columns.len());
    }

    #[test]
    fn test_missing_field_propagates() {
        let mut builder = TableBuilder::new(&PEOPLE);
        let err = builder.append_record(&json!({"name": "Nobody"})).unwrap_err();
        assert!(err.to_string().contains("birth_year"));
    }
}
