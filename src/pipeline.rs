//! Fetch -> resolve -> normalize -> export, or reload a previous export.

use anyhow::Result;

use crate::config::Config;
use crate::fetch::{Fetch, FetchFailure, Pagination, ReferenceCache};
use crate::normalize::{normalize, NormalizePlan, NormalizeReport};
use crate::resolve::ReferenceResolver;
use crate::schema::ListingSchema;
use crate::table::{build_table, Table};
use crate::ui::{Phase, Ui};
use crate::writer::{export_table, load_table};

/// Where the returned table came from
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    /// Reloaded from a previous export
    Export,
    /// Built from the API during this run
    Fetched {
        pagination: Pagination,
        report: NormalizeReport,
        exported: bool,
    },
}

#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub table: Table,
    pub source: TableSource,
    /// Non-200 responses seen during this run
    pub failures: Vec<FetchFailure>,
}

impl SyncOutcome {
    /// False when a listing or reference map stopped on a failed fetch
    pub fn is_complete(&self) -> bool {
        match &self.source {
            TableSource::Export => true,
            TableSource::Fetched {
                pagination, report, ..
            } => pagination.is_complete() && report.incomplete.is_empty(),
        }
    }
}

/// Load the exported table, or build and export it.
///
/// Partial results are returned but not exported, so the next run fetches again.
pub fn ensure_table<F: Fetch>(
    fetcher: F,
    config: &Config,
    schema: &ListingSchema,
    force: bool,
    ui: &mut impl Ui,
) -> Result<SyncOutcome> {
    config.ensure_dirs()?;
    let table_path = config.table_path();

    if table_path.exists() && !force {
        ui.log(format!("Loading table from {:?}", table_path));
        let table = load_table(&table_path, schema)?;
        return Ok(SyncOutcome {
            table,
            source: TableSource::Export,
            failures: Vec::new(),
        });
    }

    if force {
        ReferenceCache::new(&config.cache_dir).clear()?;
    }

    let mut fetcher = fetcher;
    ui.set_phase(Phase::FetchingPeople);
    let ingest = build_table(&mut fetcher, config, schema, ui)?;
    let mut table = ingest.table;
    ui.clear_progress();

    ui.set_phase(Phase::ResolvingReferences);
    let plan = NormalizePlan::for_schema(schema);
    let mut resolver = ReferenceResolver::new(fetcher, config);
    for (_, category) in &plan.reference_columns {
        resolver.resolve_category(*category, ui)?;
    }
    resolver.resolve_union(&plan.indicator_categories, ui)?;
    ui.clear_progress();

    ui.set_phase(Phase::Normalizing);
    let report = normalize(&mut table, &plan, &mut resolver, ui)?;
    let failures = resolver.fetcher().failures().to_vec();

    let complete = ingest.pagination.is_complete() && report.incomplete.is_empty();
    if complete {
        ui.set_phase(Phase::Exporting);
        export_table(&table, &table_path)?;
        ui.log(format!("Exported {} rows to {:?}", table.len(), table_path));
    } else {
        ui.log(format!(
            "Table incomplete ({:?}, incomplete references {:?}); not exported",
            ingest.pagination, report.incomplete
        ));
    }

    Ok(SyncOutcome {
        table,
        source: TableSource::Fetched {
            pagination: ingest.pagination,
            report,
            exported: complete,
        },
        failures,
    })
}
