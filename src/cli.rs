use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::Overrides;

#[derive(Parser, Debug)]
#[command(name = "swapi-frame")]
#[command(version, about = "Build a normalized table of Star Wars API people and compare distributions")]
pub struct Cli {
    #[command(flatten)]
    pub paths: PathArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PathArgs {
    /// Directory for reference caches and the exported table
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Directory for the skipped-url log
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// API root, e.g. https://swapi.dev/api/
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Pause after each request, in milliseconds
    #[arg(long, global = true)]
    pub delay_ms: Option<u64>,
}

impl PathArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.base_url.clone(),
            cache_dir: self.cache_dir.clone(),
            log_dir: self.log_dir.clone(),
            request_delay: self.delay_ms.map(Duration::from_millis),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch, normalize and export the people table (reuses a previous export)
    Sync {
        /// Ignore the previous export and reference caches
        #[arg(short, long)]
        force: bool,

        /// Show progress in a full-screen terminal UI
        #[arg(long)]
        tui: bool,
    },

    /// Build or load the url -> name map for one category
    Resolve {
        /// planets, films, species, vehicles or starships
        category: String,
    },

    /// Count the distinct values of a column
    Counts {
        column: String,

        /// Width of each printed column
        #[arg(short, long, default_value_t = 25)]
        width: usize,

        /// Number of side-by-side columns
        #[arg(short, long, default_value_t = 2)]
        cols: usize,
    },

    /// Compare the distribution of a measurement across groups
    Compare {
        /// Column holding the groups, e.g. species
        #[arg(long)]
        by: String,

        /// Groups to compare (comma-separated); "any" matches every row
        #[arg(long, value_delimiter = ',', required = true)]
        values: Vec<String>,

        /// Column holding the measurement
        #[arg(long, default_value = "height")]
        measure: String,

        /// cols or single
        #[arg(long, default_value = "cols")]
        layout: String,

        /// "freedman" or a fixed bin count
        #[arg(long, default_value = "freedman")]
        bins: String,

        /// Figure title
        #[arg(long)]
        title: Option<String>,

        /// Print summary statistics instead of drawing
        #[arg(long)]
        plain: bool,
    },

    /// List the table's columns
    Columns,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
