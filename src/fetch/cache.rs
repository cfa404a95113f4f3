use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::schema::Category;

/// Reference url -> display name for one category
pub type ReferenceMap = BTreeMap<String, String>;

/// One JSON file per reference category
pub struct ReferenceCache {
    cache_dir: PathBuf,
}

impl ReferenceCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// `<cache>/<category>.json`
    pub fn path(&self, category: Category) -> PathBuf {
        self.cache_dir.join(format!("{}.json", category.as_str()))
    }

    /// True once a complete map for `category` has been stored
    pub fn is_cached(&self, category: Category) -> bool {
        self.path(category).exists()
    }

    /// Load a cached map, or `None` when no cache file exists
    pub fn load(&self, category: Category) -> Result<Option<ReferenceMap>> {
        let path = self.path(category);
        if !path.exists() {
            return Ok(None);
        }

        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file {:?}", path))?;
        let map: ReferenceMap = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse cache file {:?}", path))?;
        Ok(Some(map))
    }

    pub fn store(&self, category: Category, map: &ReferenceMap) -> Result<()> {
        fs::create_dir_all(&self.cache_dir).context("Failed to create cache directory")?;

        let path = self.path(category);
        let tmp = path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(map).context("Failed to serialize reference map")?;
        fs::write(&tmp, text).with_context(|| format!("Failed to write {:?}", tmp))?;
        fs::rename(&tmp, &path).with_context(|| format!("Failed to move cache into {:?}", path))?;
        Ok(())
    }

    /// Remove cached maps so the next resolve fetches them again
    pub fn clear(&self) -> Result<()> {
        for category in Category::REFERENCES {
            let path = self.path(*category);
            if path.exists() {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {:?}", path))?;
            }
        }
        Ok(())
    }
}
