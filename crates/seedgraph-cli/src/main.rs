//! Seedgraph command line
//!
//! Loads a schema file, builds an in-memory store and prints generated
//! entities as JSON.

use anyhow::{anyhow, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use seedgraph_core::{GraphBuilder, MemoryStore, Populator, SeedgraphConfig};
use seedgraph_data::{Corpus, MockRegistry};
use seedgraph_schema::{Schema, Value};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn cli() -> Command {
    Command::new("seedgraph")
        .version(seedgraph_core::VERSION)
        .about("Relationally consistent synthetic entity graphs")
        .subcommand_required(true)
        .arg(
            Arg::new("schema")
                .long("schema")
                .short('s')
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Schema file (toml, json or yaml)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_parser(value_parser!(PathBuf))
                .help("Engine configuration file (toml)"),
        )
        .arg(
            Arg::new("corpus")
                .long("corpus")
                .value_parser(value_parser!(PathBuf))
                .help("Reference data replacing the built-in corpus"),
        )
        .arg(
            Arg::new("keywords")
                .long("keywords")
                .value_parser(value_parser!(PathBuf))
                .help("Custom keywords: a toml table of name = [values]"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_parser(value_parser!(u64))
                .help("Seed for reproducible output"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("populate")
                .about("Populate every persistable entity type")
                .arg(
                    Arg::new("if-enabled")
                        .long("if-enabled")
                        .action(ArgAction::SetTrue)
                        .help("Only run when DUMMY_POPULATE=true or the config enables it"),
                )
                .arg(
                    Arg::new("dump")
                        .long("dump")
                        .action(ArgAction::SetTrue)
                        .help("Print every stored instance instead of the counts"),
                ),
        )
        .subcommand(
            Command::new("mock")
                .about("Instantiate one entity type")
                .arg(Arg::new("entity").required(true).help("Entity type name"))
                .arg(
                    Arg::new("count")
                        .long("count")
                        .short('n')
                        .default_value("1")
                        .value_parser(value_parser!(usize))
                        .help("Number of instances"),
                )
                .arg(
                    Arg::new("transient")
                        .long("transient")
                        .action(ArgAction::SetTrue)
                        .help("Build without persisting; references are embedded"),
                ),
        )
        .subcommand(
            Command::new("field")
                .about("Generate values for a single field")
                .arg(Arg::new("entity").required(true).help("Entity type name"))
                .arg(Arg::new("field").required(true).help("Field name"))
                .arg(
                    Arg::new("count")
                        .long("count")
                        .short('n')
                        .default_value("1")
                        .value_parser(value_parser!(usize))
                        .help("Number of values"),
                ),
        )
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));
    let stdout = std::io::stdout();
    run(&matches, &mut stdout.lock())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Engine assembled from the command line
struct Engine {
    builder: Arc<GraphBuilder>,
    store: Arc<MemoryStore>,
    config: SeedgraphConfig,
}

impl Engine {
    fn load(matches: &ArgMatches) -> Result<Self> {
        let schema_path = required::<PathBuf>(matches, "schema")?;
        let schema = Schema::load(schema_path)
            .with_context(|| format!("loading schema {}", schema_path.display()))?;

        let mut config = match matches.get_one::<PathBuf>("config") {
            Some(path) => SeedgraphConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => SeedgraphConfig::default(),
        };
        if let Some(seed) = matches.get_one::<u64>("seed") {
            config.engine.seed = Some(*seed);
        }
        config.population = config
            .population
            .from_env()
            .context("reading population overrides")?;

        let corpus = match matches.get_one::<PathBuf>("corpus") {
            Some(path) => Corpus::load(path)
                .with_context(|| format!("loading corpus {}", path.display()))?,
            None => Corpus::builtin(),
        };
        let registry = match matches.get_one::<PathBuf>("keywords") {
            Some(path) => load_keywords(path)?,
            None => MockRegistry::empty(),
        };

        tracing::info!(
            "loaded schema {} with {} entity types",
            schema_path.display(),
            schema.len()
        );
        let store = Arc::new(MemoryStore::new());
        let builder = GraphBuilder::new(Arc::new(schema), store.clone())
            .with_data(Arc::new(corpus), Arc::new(registry))
            .with_config(config.engine.clone());
        Ok(Self {
            builder: Arc::new(builder),
            store,
            config,
        })
    }
}

fn load_keywords(path: &Path) -> Result<MockRegistry> {
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("reading keywords {}", path.display()))?;
    let table: HashMap<String, Vec<String>> = toml::from_str(&input)
        .with_context(|| format!("parsing keywords {}", path.display()))?;
    Ok(table
        .into_iter()
        .fold(MockRegistry::builder(), |registry, (name, values)| {
            registry.with_keyword(&name, values.into_iter().map(Value::Text).collect())
        })
        .build())
}

fn required<'a, T>(matches: &'a ArgMatches, name: &str) -> Result<&'a T>
where
    T: Clone + Send + Sync + 'static,
{
    matches
        .get_one::<T>(name)
        .ok_or_else(|| anyhow!("missing argument '{name}'"))
}

fn run(matches: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let engine = Engine::load(matches)?;
    match matches.subcommand() {
        Some(("populate", args)) => populate(&engine, args, out),
        Some(("mock", args)) => {
            let entity = required::<String>(args, "entity")?;
            let count = *required::<usize>(args, "count")?;
            let transient = args.get_flag("transient");
            let instances = (0..count)
                .map(|_| {
                    if transient {
                        engine.builder.instantiate_transient(entity)
                    } else {
                        engine.builder.instantiate(entity)
                    }
                })
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("mocking {entity}"))?;
            writeln!(out, "{}", serde_json::to_string_pretty(&instances)?)?;
            Ok(())
        }
        Some(("field", args)) => {
            let entity = required::<String>(args, "entity")?;
            let field = required::<String>(args, "field")?;
            let count = *required::<usize>(args, "count")?;
            let values = (0..count)
                .map(|_| engine.builder.mock_field_value(entity, field))
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("mocking {entity}.{field}"))?;
            writeln!(out, "{}", serde_json::to_string_pretty(&values)?)?;
            Ok(())
        }
        Some((other, _)) => Err(anyhow!("unknown command '{other}'")),
        None => Err(anyhow!("no command given")),
    }
}

fn populate(engine: &Engine, args: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let populator = Populator::new(engine.builder.clone(), engine.config.population.clone());
    let report = if args.get_flag("if-enabled") {
        match populator.populate_if_enabled()? {
            Some(report) => report,
            None => {
                tracing::info!("population disabled, nothing to do");
                return Ok(());
            }
        }
    } else {
        populator.populate()?
    };
    tracing::info!("created {} instances", report.total());

    if args.get_flag("dump") {
        let schema = engine.builder.schema();
        let rows: BTreeMap<String, _> = schema
            .entity_names()
            .into_iter()
            .map(|name| (name.to_string(), engine.store.all(&name)))
            .collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?;
    } else {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SCHEMA: &str = r#"
        [[entity]]
        name = "Customer"
        mock_quantity = 2

        [[entity.field]]
        name = "id"
        shape = { scalar = "long" }
        id = "generated"

        [[entity.field]]
        name = "tier"
        shape = { scalar = "text" }
        mock = { custom_keyword = "tier" }

        [[entity]]
        name = "Order"
        mock_quantity = 3

        [[entity.field]]
        name = "id"
        shape = { scalar = "long" }
        id = "generated"

        [[entity.field]]
        name = "customer"
        shape = { reference = "Customer" }
        relation = { kind = "many_to_one", optional = false }
        join = [{ name = "customer_id", nullable = false }]
    "#;

    fn invoke(dir: &Path, args: &[&str]) -> Result<serde_json::Value> {
        let schema = dir.join("schema.toml");
        let keywords = dir.join("keywords.toml");
        fs::write(&schema, SCHEMA)?;
        fs::write(&keywords, r#"tier = ["gold", "silver"]"#)?;

        let mut argv = vec![
            "seedgraph".to_string(),
            "--schema".into(),
            schema.display().to_string(),
            "--keywords".into(),
            keywords.display().to_string(),
            "--seed".into(),
            "7".into(),
        ];
        argv.extend(args.iter().map(ToString::to_string));
        let matches = cli().try_get_matches_from(argv)?;

        let mut out = Vec::new();
        run(&matches, &mut out)?;
        Ok(serde_json::from_slice(&out)?)
    }

    #[test]
    fn test_cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn test_populate_prints_counts() {
        let dir = tempfile::tempdir().unwrap();
        let report = invoke(dir.path(), &["populate"]).unwrap();
        assert_eq!(report["counts"]["Customer"], 2);
        assert_eq!(report["counts"]["Order"], 3);
    }

    #[test]
    fn test_mock_uses_registered_keywords() {
        let dir = tempfile::tempdir().unwrap();
        let customers = invoke(dir.path(), &["mock", "Customer", "-n", "3"]).unwrap();
        let customers = customers.as_array().unwrap();
        assert_eq!(customers.len(), 3);
        for customer in customers {
            let tier = customer.to_string();
            assert!(tier.contains("gold") || tier.contains("silver"), "{tier}");
        }
    }

    #[test]
    fn test_field_values() {
        let dir = tempfile::tempdir().unwrap();
        let values = invoke(dir.path(), &["field", "Customer", "tier", "-n", "4"]).unwrap();
        assert_eq!(values.as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_unknown_entity_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = invoke(dir.path(), &["mock", "Invoice"]).unwrap_err();
        assert!(err.to_string().contains("Invoice"));
    }

    #[test]
    fn test_missing_schema_is_reported() {
        let matches = cli()
            .try_get_matches_from(["seedgraph", "--schema", "/nonexistent/schema.toml", "mock", "A"])
            .unwrap();
        let err = run(&matches, &mut Vec::new()).unwrap_err();
        assert!(format!("{err:#}").contains("loading schema"));
    }
}
