use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::schema::Category;

pub const DEFAULT_BASE_URL: &str = "https://swapi.dev/api/";
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(3);

const APP_NAME: &str = "swapi-frame";
const FALLBACK_CACHE_DIR: &str = "assets";
const FALLBACK_LOG_DIR: &str = "logs";
const SKIP_LOG_FILE: &str = "skipped_url.log";
const TABLE_FILE: &str = "people.csv";

/// Paths and tunables shared by the fetcher, resolver and writer.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub cache_dir: PathBuf,
    pub log_dir: PathBuf,
    pub request_delay: Duration,
}

/// Optional overrides, usually from the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub request_delay: Option<Duration>,
}

impl Config {
    /// Resolve every directory: override, then platform project dir, then a relative default.
    pub fn new(overrides: Overrides) -> Self {
        let proj_dirs = ProjectDirs::from("", "", APP_NAME);

        let cache_dir = overrides.cache_dir.unwrap_or_else(|| {
            proj_dirs
                .as_ref()
                .map(|dirs| dirs.cache_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(FALLBACK_CACHE_DIR))
        });

        let log_dir = overrides.log_dir.unwrap_or_else(|| {
            proj_dirs
                .as_ref()
                .map(|dirs| dirs.data_local_dir().join(FALLBACK_LOG_DIR))
                .unwrap_or_else(|| PathBuf::from(FALLBACK_LOG_DIR))
        });

        Self {
            base_url: overrides
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            cache_dir,
            log_dir,
            request_delay: overrides.request_delay.unwrap_or(DEFAULT_REQUEST_DELAY),
        }
    }

    /// Config rooted in a single directory with no pacing delay
    pub fn local(root: &Path, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cache_dir: root.join(FALLBACK_CACHE_DIR),
            log_dir: root.join(FALLBACK_LOG_DIR),
            request_delay: Duration::ZERO,
        }
    }

    /// Create the cache and log directories if they do not exist yet
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)
            .with_context(|| format!("Failed to create cache directory {:?}", self.cache_dir))?;
        fs::create_dir_all(&self.log_dir)
            .with_context(|| format!("Failed to create log directory {:?}", self.log_dir))?;
        Ok(())
    }

    /// Listing root for a category, e.g. `https://swapi.dev/api/planets/`
    pub fn listing_url(&self, category: Category) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{}/{}/", base, category.as_str())
    }

    pub fn table_path(&self) -> PathBuf {
        self.cache_dir.join(TABLE_FILE)
    }

    pub fn skip_log_path(&self) -> PathBuf {
        self.log_dir.join(SKIP_LOG_FILE)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Overrides::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win() {
        let config = Config::new(Overrides {
            cache_dir: Some(PathBuf::from("/tmp/c")),
            log_dir: Some(PathBuf::from("/tmp/l")),
            request_delay: Some(Duration::from_millis(5)),
            ..Default::default()
        });
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/c"));
        assert_eq!(config.skip_log_path(), PathBuf::from("/tmp/l/skipped_url.log"));
        assert_eq!(config.request_delay, Duration::from_millis(5));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_listing_url() {
        let config = Config::local(Path::new("/tmp"), "http://example.test/api");
        assert_eq!(config.listing_url(Category::Films), "http://example.test/api/films/");
        assert_eq!(config.table_path(), PathBuf::from("/tmp/assets/people.csv"));
    }
}
