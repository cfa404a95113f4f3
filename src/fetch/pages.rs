use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use super::client::Fetch;
use crate::ui::Ui;

/// One page of a listing: `{"count": n, "results": [...], "next": url|null}`
#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub next: Option<String>,
}

impl Page {
    /// Next page url; empty strings count as the end of the listing
    pub fn next_url(&self) -> Option<&str> {
        self.next.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// How a pagination run ended
#[derive(Debug, Clone, PartialEq)]
pub enum Pagination {
    /// The `next` chain ended cleanly
    Exhausted { pages: usize },
    /// Fetching `url` failed; pages before it were kept
    Interrupted { url: String, pages: usize },
}

impl Pagination {
    pub fn is_complete(&self) -> bool {
        matches!(self, Pagination::Exhausted { .. })
    }

    pub fn pages(&self) -> usize {
        match self {
            Pagination::Exhausted { pages } | Pagination::Interrupted { pages, .. } => *pages,
        }
    }
}

/// Walk a listing from `start`, handing each page's records to `on_page`.
pub fn paginate<F, U, P>(fetcher: &mut F, start: &str, ui: &mut U, mut on_page: P) -> Result<Pagination>
where
    F: Fetch,
    U: Ui,
    P: FnMut(Vec<Value>) -> Result<()>,
{
    let mut next = Some(start.to_string());
    let mut pages = 0;
    let mut seen: u64 = 0;

    while let Some(url) = next.take() {
        let Some(json) = fetcher.fetch(Some(&url))? else {
            ui.log(format!("Fetch failed for {}, stopping after {} pages", url, pages));
            return Ok(Pagination::Interrupted { url, pages });
        };

        let page: Page = serde_json::from_value(json)
            .with_context(|| format!("Unexpected listing shape at {}", url))?;
        pages += 1;
        seen += page.results.len() as u64;
        ui.set_progress(seen, page.count.unwrap_or(seen), format!("page {}", pages));

        next = page.next_url().map(str::to_string);
        on_page(page.results)?;
    }

    Ok(Pagination::Exhausted { pages })
}
