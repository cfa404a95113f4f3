use anyhow::{bail, Result};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Resource categories exposed by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    People,
    Planets,
    Films,
    Species,
    Vehicles,
    Starships,
}

impl Category {
    /// Categories that are resolved into url -> name reference maps
    pub const REFERENCES: &'static [Category] = &[
        Category::Planets,
        Category::Films,
        Category::Species,
        Category::Vehicles,
        Category::Starships,
    ];

    /// Path segment of the category listing
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::People => "people",
            Category::Planets => "planets",
            Category::Films => "films",
            Category::Species => "species",
            Category::Vehicles => "vehicles",
            Category::Starships => "starships",
        }
    }

    /// Field holding the display name of an entity. Films carry a title instead.
    pub const fn name_field(&self) -> &'static str {
        match self {
            Category::Films => "title",
            _ => "name",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let category = match s.trim().to_ascii_lowercase().as_str() {
            "people" => Category::People,
            "planets" => Category::Planets,
            "films" => Category::Films,
            "species" => Category::Species,
            "vehicles" => Category::Vehicles,
            "starships" => Category::Starships,
            other => bail!("Unknown category: {}", other),
        };
        Ok(category)
    }
}

/// How a fixed-prefix column is read from a record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnKind {
    /// Copied verbatim
    Scalar,
    /// List field with at most one element; empty becomes the "unknown" sentinel
    Singular,
}

/// Fixed-prefix column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    /// Category whose reference map relabels this column's URL values
    pub reference: Option<Category>,
    /// Holds measurements that can be coerced to numbers
    pub numeric: bool,
}

impl Column {
    pub const fn scalar(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Scalar,
            reference: None,
            numeric: false,
        }
    }

    pub const fn singular(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Singular,
            reference: None,
            numeric: false,
        }
    }

    /// Mark the column as holding URLs into `category`
    pub const fn references(self, category: Category) -> Self {
        Self {
            reference: Some(category),
            ..self
        }
    }

    pub const fn numeric(self) -> Self {
        Self {
            numeric: true,
            ..self
        }
    }
}

/// Schema of a paginated listing turned into a table
#[derive(Debug, Clone)]
pub struct ListingSchema {
    pub category: Category,
    /// Fixed prefix, present from row 0
    pub columns: &'static [Column],
    /// Multi-valued reference fields that become indicator columns
    pub indicator_fields: &'static [Category],
    /// Column holding the birth/era encoding
    pub era_column: Option<&'static str>,
}

impl ListingSchema {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Whether a value looks like an absolute http(s) URL
pub fn is_reference_url(value: &str) -> bool {
    Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Stable `<category>_<id>` token for a reference URL.
///
/// `https://swapi.dev/api/films/1/` becomes `films_1`.
pub fn reference_token(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [.., category, id] => Some(format!("{}_{}", category, id)),
        _ => None,
    }
}

/// Category named by a `<category>_<id>` token
pub fn token_category(token: &str) -> Option<Category> {
    let (category, id) = token.rsplit_once('_')?;
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    category.parse().ok()
}
