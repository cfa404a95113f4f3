//! Reference resolution: url -> display name maps per category, cached to disk.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;

use crate::config::Config;
use crate::fetch::{paginate, Fetch, Pagination, ReferenceCache, ReferenceMap};
use crate::schema::Category;
use crate::ui::Ui;

/// Result of resolving one category
#[derive(Debug, Clone)]
pub struct Resolution {
    pub map: ReferenceMap,
    /// `None` when the map came from the cache file
    pub pagination: Option<Pagination>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.pagination.as_ref().map_or(true, Pagination::is_complete)
    }
}

pub struct ReferenceResolver<F> {
    fetcher: F,
    cache: ReferenceCache,
    base_url: String,
    /// Every resolution made by this process, complete or not
    loaded: HashMap<Category, Resolution>,
}

impl<F: Fetch> ReferenceResolver<F> {
    pub fn new(fetcher: F, config: &Config) -> Self {
        Self {
            fetcher,
            cache: ReferenceCache::new(&config.cache_dir),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            loaded: HashMap::new(),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn cache(&self) -> &ReferenceCache {
        &self.cache
    }

    /// Build (or load) the url -> name map for a category.
    ///
    /// Only complete maps are written to the cache file. An interrupted run returns
    /// what it collected and leaves the cache file untouched so the next process
    /// retries; within this process the partial map is reused.
    pub fn resolve_category(&mut self, category: Category, ui: &mut impl Ui) -> Result<Resolution> {
        if let Some(resolution) = self.loaded.get(&category) {
            return Ok(resolution.clone());
        }

        if let Some(map) = self.cache.load(category)? {
            ui.log(format!("Loaded {} {} from cache", map.len(), category));
            let resolution = Resolution {
                map,
                pagination: None,
            };
            self.loaded.insert(category, resolution.clone());
            return Ok(resolution);
        }

        ui.set_info(format!("Resolving {}", category));
        let start = format!("{}/{}/", self.base_url, category.as_str());
        let mut map = ReferenceMap::new();

        let pagination = paginate(&mut self.fetcher, &start, ui, |results| {
            for entity in &results {
                let (url, name) = reference_pair(entity, category)?;
                map.insert(url, name);
            }
            Ok(())
        })?;

        if pagination.is_complete() {
            self.cache.store(category, &map)?;
            ui.log(format!("Resolved {} {}", map.len(), category));
        } else {
            ui.log(format!(
                "Reference map for {} is incomplete ({} entries)",
                category,
                map.len()
            ));
        }

        let resolution = Resolution {
            map,
            pagination: Some(pagination),
        };
        self.loaded.insert(category, resolution.clone());
        Ok(resolution)
    }

    /// Union of the maps for several categories
    pub fn resolve_union(&mut self, categories: &[Category], ui: &mut impl Ui) -> Result<ReferenceMap> {
        let mut union = ReferenceMap::new();
        for category in categories {
            union.extend(self.resolve_category(*category, ui)?.map);
        }
        Ok(union)
    }
}

fn reference_pair(entity: &Value, category: Category) -> Result<(String, String)> {
    let url = entity
        .get("url")
        .and_then(Value::as_str)
        .with_context(|| format!("{} entity without a url", category))?;
    let name = entity
        .get(category.name_field())
        .and_then(Value::as_str)
        .with_context(|| format!("{} entity {} without a {}", category, url, category.name_field()))?;
    Ok((url.to_string(), name.to_string()))
}
