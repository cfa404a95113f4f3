use anyhow::{bail, Result};
use swapi_frame::{
    analysis::{format_counts, value_counts, BinRule, Comparison},
    cli::{Cli, Commands},
    config::Config,
    fetch::ResourceFetcher,
    pipeline::{ensure_table, SyncOutcome, TableSource},
    resolve::ReferenceResolver,
    schema::{Category, PEOPLE},
    ui::{chart::{ChartLayout, ComparisonChart}, ConsoleUi, Ui, UiApp},
};
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let config = Config::new(cli.paths.overrides());

    match cli.command {
        Commands::Sync { force, tui } => {
            let start = Instant::now();
            let fetcher = ResourceFetcher::from_config(&config)?;

            let outcome = if tui {
                let mut ui = UiApp::new()?;
                let outcome = ensure_table(fetcher, &config, &PEOPLE, force, &mut ui)?;
                ui.finish(&summary(&outcome))?;
                outcome
            } else {
                let mut ui = ConsoleUi::new(false);
                ensure_table(fetcher, &config, &PEOPLE, force, &mut ui)?
            };

            println!(
                "\n{} in {:.1}s",
                summary(&outcome),
                start.elapsed().as_secs_f64()
            );
            for failure in &outcome.failures {
                println!("  HTTP {} for {}", failure.status, failure.url);
            }
            if !outcome.is_complete() {
                println!("Skipped urls are listed in {:?}", config.skip_log_path());
            }
        }

        Commands::Resolve { category } => {
            let category: Category = category.parse()?;
            if category == Category::People {
                bail!("people is the primary listing, not a reference category");
            }
            config.ensure_dirs()?;

            let mut ui = ConsoleUi::new(true);
            let mut resolver = ReferenceResolver::new(ResourceFetcher::from_config(&config)?, &config);
            let resolution = resolver.resolve_category(category, &mut ui)?;

            println!(
                "{} {} names in {:?}{}",
                resolution.map.len(),
                category,
                resolver.cache().path(category),
                if resolution.is_complete() { "" } else { " (incomplete, not cached)" }
            );
        }

        Commands::Counts { column, width, cols } => {
            let outcome = load(&config)?;
            let counts = value_counts(&outcome.table, &column)?;
            print!("{}", format_counts(&counts, width, cols));
        }

        Commands::Compare {
            by,
            values,
            measure,
            layout,
            bins,
            title,
            plain,
        } => {
            let layout: ChartLayout = layout.parse()?;
            let bins: BinRule = bins.parse()?;
            let outcome = load(&config)?;
            let comparison = Comparison::build(&outcome.table, &by, values.as_slice(), &measure, bins)?;

            if plain {
                for series in &comparison.series {
                    match series.fit {
                        Some(fit) => println!(
                            "{:<20} n={:<4} mean={:<10.2} std={:.2}",
                            series.label,
                            series.values.len(),
                            fit.mean,
                            fit.std
                        ),
                        None => println!("{:<20} n=0", series.label),
                    }
                }
            } else {
                let title = title.unwrap_or_else(|| format!("{} across {}", measure, by));
                let chart = ComparisonChart::new(&comparison, title, layout);
                let mut ui = UiApp::new()?;
                ui.show_chart(&chart)?;
                ui.restore()?;
            }
        }

        Commands::Columns => {
            let outcome = load(&config)?;
            let table = &outcome.table;
            println!("Fixed columns:\n");
            for name in table.fixed_columns() {
                println!("  {}", name);
            }
            println!("\n{} indicator columns:\n", table.indicator_columns().len());
            for name in table.indicator_columns() {
                println!("  {}", name);
            }
        }
    }

    Ok(())
}

/// Reuse the export when present, fetching otherwise
fn load(config: &Config) -> Result<SyncOutcome> {
    let mut ui = ConsoleUi::new(false);
    if !config.table_path().exists() {
        ui.log("No exported table yet, fetching");
    }
    ensure_table(ResourceFetcher::from_config(config)?, config, &PEOPLE, false, &mut ui)
}

fn summary(outcome: &SyncOutcome) -> String {
    let table = &outcome.table;
    let shape = format!(
        "{} rows, {} fixed + {} indicator columns",
        table.len(),
        table.fixed_columns().len(),
        table.indicator_columns().len()
    );
    match &outcome.source {
        TableSource::Export => format!("Loaded {}", shape),
        TableSource::Fetched { exported: true, .. } => format!("Built and exported {}", shape),
        TableSource::Fetched { exported: false, .. } => format!("Built partial table of {}", shape),
    }
}
