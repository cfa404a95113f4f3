use anyhow::{bail, Context, Result};

use super::value::Value;

/// Dense table: a fixed prefix of scalar columns followed by boolean indicator columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    fixed: usize,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Empty table with only the fixed prefix
    pub fn new<S: AsRef<str>>(fixed_columns: &[S]) -> Self {
        Self {
            columns: fixed_columns.iter().map(|c| c.as_ref().to_string()).collect(),
            fixed: fixed_columns.len(),
            rows: Vec::new(),
        }
    }

    /// Assemble a table from parts, checking row widths
    pub fn from_parts(columns: Vec<String>, fixed: usize, rows: Vec<Vec<Value>>) -> Result<Self> {
        if fixed > columns.len() {
            bail!("Fixed prefix of {} exceeds {} columns", fixed, columns.len());
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                bail!("Row {} has {} cells, expected {}", i, row.len(), columns.len());
            }
        }
        Ok(Self {
            columns,
            fixed,
            rows,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn fixed_columns(&self) -> &[String] {
        &self.columns[..self.fixed]
    }

    pub fn indicator_columns(&self) -> &[String] {
        &self.columns[self.fixed..]
    }

    pub fn fixed_len(&self) -> usize {
        self.fixed
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// All cells of a column, top to bottom
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value> + '_> {
        let idx = self
            .column_index(name)
            .with_context(|| format!("No column named {}", name))?;
        Ok(self.rows.iter().map(move |r| &r[idx]))
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            bail!(
                "Row has {} cells, table has {} columns",
                row.len(),
                self.columns.len()
            );
        }
        self.rows.push(row);
        Ok(())
    }

    /// Rename the column at `idx`, refusing duplicates
    pub fn rename_column(&mut self, idx: usize, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if let Some(existing) = self.column_index(&name) {
            if existing != idx {
                bail!("Column {} already exists", name);
            }
        }
        let slot = self
            .columns
            .get_mut(idx)
            .with_context(|| format!("No column at index {}", idx))?;
        *slot = name;
        Ok(())
    }

    /// Replace cells of a column; `f` returns `Some` for cells to change.
    /// Returns the number of cells changed.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> Result<usize>
    where
        F: FnMut(&Value) -> Option<Value>,
    {
        let idx = self
            .column_index(name)
            .with_context(|| format!("No column named {}", name))?;

        let mut changed = 0;
        for row in &mut self.rows {
            if let Some(new) = f(&row[idx]) {
                if new != row[idx] {
                    row[idx] = new;
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_parts(
            vec!["name".into(), "height".into(), "films_1".into()],
            2,
            vec![
                vec![Value::text("Luke"), Value::text("172"), Value::Flag(true)],
                vec![Value::text("R2-D2"), Value::text("96"), Value::Flag(false)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_prefix_and_suffix() {
        let table = sample();
        assert_eq!(table.fixed_columns(), &["name", "height"]);
        assert_eq!(table.indicator_columns(), &["films_1"]);
        assert_eq!(table.get(1, "name"), Some(&Value::text("R2-D2")));
    }

    #[test]
    fn test_rename_rejects_duplicates() {
        let mut table = sample();
        assert!(table.rename_column(2, "name").is_err());
        table.rename_column(2, "A New Hope").unwrap();
        assert_eq!(table.indicator_columns(), &["A New Hope"]);
    }

    #[test]
    fn test_map_column_counts_changes() {
        let mut table = sample();
        let changed = table
            .map_column("height", |v| v.as_f64().map(Value::Number))
            .unwrap();
        assert_eq!(changed, 2);
        assert!(table.map_column("nope", |_| None).is_err());
    }

    #[test]
    fn test_row_width_checked() {
        let mut table = sample();
        assert!(table.push_row(vec![Value::Missing]).is_err());
    }
}
