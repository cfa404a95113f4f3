//! End-to-end tests of the fetch -> normalize -> export pipeline.
//!
//! The API is replaced by a scripted transport serving fixture pages from
//! memory, so these run without network access and without pacing delays.

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value as Json};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tempfile::TempDir;

use swapi_frame::config::Config;
use swapi_frame::fetch::{FetchFailure, Pagination, ResourceFetcher, Response, SkipLog, Transport};
use swapi_frame::pipeline::{ensure_table, TableSource};
use swapi_frame::schema::PEOPLE;
use swapi_frame::table::{TableBuilder, Value, UNKNOWN};
use swapi_frame::ui::SilentUi;

// =============================================================================
// Fixtures
// =============================================================================

const BASE: &str = "http://swapi.test/api/";

fn url(path: &str) -> String {
    format!("{}{}", BASE, path)
}

fn person(name: &str, birth: &str, height: &str, species: &[u32], films: &[u32], vehicles: &[u32]) -> Json {
    let refs = |category: &str, ids: &[u32]| -> Vec<String> {
        ids.iter().map(|id| url(&format!("{}/{}/", category, id))).collect()
    };
    json!({
        "name": name,
        "birth_year": birth,
        "eye_color": "blue",
        "gender": if name == "R2-D2" { "n/a" } else { "male" },
        "hair_color": if name == "R2-D2" { "n/a" } else { "unknown" },
        "height": height,
        "mass": "1,358",
        "skin_color": "fair",
        "homeworld": url("planets/1/"),
        "species": refs("species", species),
        "films": refs("films", films),
        "starships": [],
        "vehicles": refs("vehicles", vehicles),
        "url": url(&format!("people/{}/", name.len())),
    })
}

fn listing(results: Vec<Json>, next: Option<String>) -> String {
    json!({ "count": results.len(), "results": results, "next": next }).to_string()
}

/// Every page of the fake API, by url
static PAGES: Lazy<HashMap<String, (u16, String)>> = Lazy::new(|| {
    let mut pages = HashMap::new();
    let mut add = |path: &str, body: String| {
        pages.insert(url(path), (200, body));
    };

    add(
        "people/",
        listing(
            vec![
                person("Luke Skywalker", "19BBY", "172", &[], &[1, 2], &[]),
                person("R2-D2", "33BBY", "96", &[2], &[1], &[]),
            ],
            Some(url("people/?page=2")),
        ),
    );
    add(
        "people/?page=2",
        listing(vec![person("Wedge Antilles", "unknown", "unknown", &[1], &[2, 3], &[14])], None),
    );
    add(
        "planets/",
        listing(vec![json!({"name": "Tatooine", "url": url("planets/1/")})], None),
    );
    add(
        "species/",
        listing(
            vec![
                json!({"name": "Human", "url": url("species/1/")}),
                json!({"name": "Droid", "url": url("species/2/")}),
            ],
            None,
        ),
    );
    add(
        "films/",
        listing(
            vec![
                json!({"title": "A New Hope", "url": url("films/1/")}),
                json!({"title": "The Empire Strikes Back", "url": url("films/2/")}),
            ],
            Some(url("films/?page=2")),
        ),
    );
    add(
        "films/?page=2",
        listing(vec![json!({"title": "Return of the Jedi", "url": url("films/3/")})], None),
    );
    add("starships/", listing(vec![], None));
    add(
        "vehicles/",
        listing(vec![json!({"name": "Snowspeeder", "url": url("vehicles/14/")})], None),
    );
    pages
});

/// Serves `PAGES`, with optional overrides, recording every request
#[derive(Clone, Default)]
struct ScriptedTransport {
    overrides: HashMap<String, (u16, String)>,
    calls: Rc<RefCell<Vec<String>>>,
}

impl ScriptedTransport {
    fn failing(path: &str, status: u16) -> Self {
        let mut transport = Self::default();
        transport.overrides.insert(url(path), (status, "{\"detail\": \"Not found\"}".into()));
        transport
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str) -> anyhow::Result<Response> {
        self.calls.borrow_mut().push(url.to_string());
        let (status, body) = self
            .overrides
            .get(url)
            .or_else(|| PAGES.get(url))
            .cloned()
            .unwrap_or((404, String::new()));
        Ok(Response::new(status, body))
    }
}

fn fetcher(config: &Config, transport: ScriptedTransport) -> ResourceFetcher<ScriptedTransport> {
    ResourceFetcher::new(transport, Duration::ZERO, SkipLog::new(config.skip_log_path()))
}

// =============================================================================
// Pipeline
// =============================================================================

#[test]
fn test_full_sync_normalizes_and_exports() {
    let dir = TempDir::new().unwrap();
    let config = Config::local(dir.path(), BASE);
    let transport = ScriptedTransport::default();

    let outcome = ensure_table(fetcher(&config, transport.clone()), &config, &PEOPLE, false, &mut SilentUi).unwrap();
    assert!(outcome.is_complete());
    assert!(matches!(outcome.source, TableSource::Fetched { exported: true, .. }));

    let table = &outcome.table;
    assert_eq!(table.len(), 3);
    assert_eq!(
        table.indicator_columns(),
        &["A New Hope", "The Empire Strikes Back", "Return of the Jedi", "Snowspeeder"]
    );

    // Luke
    assert_eq!(table.get(0, "birth_year"), Some(&Value::Number(-19.0)));
    assert_eq!(table.get(0, "homeworld"), Some(&Value::text("Tatooine")));
    assert_eq!(table.get(0, "species"), Some(&Value::Missing));
    assert_eq!(table.get(0, "hair_color"), Some(&Value::Missing));
    assert_eq!(table.get(0, "height"), Some(&Value::Number(172.0)));
    assert_eq!(table.get(0, "mass"), Some(&Value::Number(1358.0)));
    assert_eq!(table.get(0, "Return of the Jedi"), Some(&Value::Flag(false)));
    assert_eq!(table.get(0, "Snowspeeder"), Some(&Value::Flag(false)));

    // R2-D2
    assert_eq!(table.get(1, "species"), Some(&Value::text("Droid")));
    assert_eq!(table.get(1, "gender"), Some(&Value::text("genderless")));
    assert_eq!(table.get(1, "hair_color"), Some(&Value::text("none")));

    // Wedge
    assert_eq!(table.get(2, "birth_year"), Some(&Value::Missing));
    assert_eq!(table.get(2, "height"), Some(&Value::Missing));
    assert_eq!(table.get(2, "species"), Some(&Value::text("Human")));
    assert_eq!(table.get(2, "A New Hope"), Some(&Value::Flag(false)));
    assert_eq!(table.get(2, "Snowspeeder"), Some(&Value::Flag(true)));

    assert!(config.table_path().exists());
    for category in ["planets", "species", "films", "starships", "vehicles"] {
        assert!(config.cache_dir.join(format!("{}.json", category)).exists());
    }

    // people x2, planets, species, films x2, starships, vehicles
    assert_eq!(transport.calls().len(), 8);
}

#[test]
fn test_second_run_reloads_export_without_requests() {
    let dir = TempDir::new().unwrap();
    let config = Config::local(dir.path(), BASE);

    let first = ensure_table(fetcher(&config, ScriptedTransport::default()), &config, &PEOPLE, false, &mut SilentUi).unwrap();

    let transport = ScriptedTransport::default();
    let second = ensure_table(fetcher(&config, transport.clone()), &config, &PEOPLE, false, &mut SilentUi).unwrap();

    assert_eq!(second.source, TableSource::Export);
    assert!(second.failures.is_empty());
    assert_eq!(second.table, first.table);
    assert!(transport.calls().is_empty());
}

#[test]
fn test_force_refetches_everything() {
    let dir = TempDir::new().unwrap();
    let config = Config::local(dir.path(), BASE);
    ensure_table(fetcher(&config, ScriptedTransport::default()), &config, &PEOPLE, false, &mut SilentUi).unwrap();

    let transport = ScriptedTransport::default();
    ensure_table(fetcher(&config, transport.clone()), &config, &PEOPLE, true, &mut SilentUi).unwrap();
    assert_eq!(transport.calls().len(), 8);
}

#[test]
fn test_failed_page_keeps_earlier_records() {
    let dir = TempDir::new().unwrap();
    let config = Config::local(dir.path(), BASE);
    let transport = ScriptedTransport::failing("people/?page=2", 404);

    let outcome = ensure_table(fetcher(&config, transport), &config, &PEOPLE, false, &mut SilentUi).unwrap();

    assert!(!outcome.is_complete());
    match &outcome.source {
        TableSource::Fetched {
            pagination, exported, ..
        } => {
            assert_eq!(
                pagination,
                &Pagination::Interrupted {
                    url: url("people/?page=2"),
                    pages: 1
                }
            );
            assert!(!exported);
        }
        other => panic!("unexpected source {:?}", other),
    }

    let names: Vec<_> = outcome.table.column("name").unwrap().cloned().collect();
    assert_eq!(names, vec![Value::text("Luke Skywalker"), Value::text("R2-D2")]);
    assert!(!config.table_path().exists());

    let skipped = SkipLog::new(config.skip_log_path()).entries().unwrap();
    assert_eq!(skipped, vec![url("people/?page=2")]);
    assert_eq!(
        outcome.failures,
        vec![FetchFailure {
            url: url("people/?page=2"),
            status: 404
        }]
    );
}

#[test]
fn test_failed_reference_listing_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = Config::local(dir.path(), BASE);
    let transport = ScriptedTransport::failing("films/?page=2", 500);

    let outcome = ensure_table(fetcher(&config, transport), &config, &PEOPLE, false, &mut SilentUi).unwrap();
    assert!(!outcome.is_complete());

    // Film 3 was on the failed page, so its header keeps the token
    assert!(outcome.table.indicator_columns().contains(&"films_3".to_string()));
    assert!(outcome.table.indicator_columns().contains(&"A New Hope".to_string()));
    assert!(!config.cache_dir.join("films.json").exists());
    assert!(config.cache_dir.join("planets.json").exists());
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].status, 500);
}

// =============================================================================
// Indicator back-fill
// =============================================================================

#[test]
fn test_random_records_have_no_unset_indicators() {
    let mut rng = StdRng::seed_from_u64(42);
    let films: Vec<u32> = (1..=7).collect();

    for _ in 0..20 {
        let records: Vec<Json> = (0..rng.gen_range(1..30))
            .map(|i| {
                let count = rng.gen_range(0..=films.len());
                let chosen: Vec<u32> = films.choose_multiple(&mut rng, count).copied().collect();
                let vehicles: Vec<u32> = if rng.gen_bool(0.3) { vec![rng.gen_range(1..5)] } else { vec![] };
                person(&format!("p{}", i), UNKNOWN, "100", &[], &chosen, &vehicles)
            })
            .collect();

        let mut builder = TableBuilder::new(&PEOPLE);
        builder.append_records(&records).unwrap();
        let table = builder.finish().unwrap();

        let fixed = table.fixed_len();
        for (r, row) in table.rows().iter().enumerate() {
            assert_eq!(row.len(), table.columns().len());
            for (c, cell) in row[fixed..].iter().enumerate() {
                let expected = {
                    let column = &table.indicator_columns()[c];
                    let field = if column.starts_with("films_") { "films" } else { "vehicles" };
                    records[r][field]
                        .as_array()
                        .unwrap()
                        .iter()
                        .filter_map(Json::as_str)
                        .any(|u| u.ends_with(&format!("/{}/", column.rsplit('_').next().unwrap())))
                };
                assert_eq!(cell, &Value::Flag(expected));
            }
        }
    }
}
