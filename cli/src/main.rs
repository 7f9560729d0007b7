//! Corpusgraph CLI: import records, run the batch, query the results
//!
//! Works directly on a local RocksDB directory.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use corpusgraph::{
    AnalyticsEngine, ComputeOptions, Dataset, EngineConfig, EntityId, PathOutcome, RocksStore,
    SnapshotQuery, SortField,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;

#[derive(Parser)]
#[command(name = "corpusgraph", version, about = "Entity relationship graph analytics")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory (overrides the config file)
    #[arg(long, global = true, env = "CORPUSGRAPH_DATA")]
    data: Option<String>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Clone, clap::ValueEnum)]
enum SortArg {
    Degree,
    Pagerank,
    Betweenness,
    Cluster,
}

impl From<SortArg> for SortField {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Degree => SortField::Degree,
            SortArg::Pagerank => SortField::Pagerank,
            SortArg::Betweenness => SortField::Betweenness,
            SortArg::Cluster => SortField::ClusterId,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Import entities, relationships, mentions and activities from JSON
    Import {
        file: PathBuf,
    },
    /// Recompute every metric and replace the snapshot
    Compute {
        /// Compute without persisting
        #[arg(long)]
        dry_run: bool,

        /// PageRank iterations
        #[arg(long)]
        iterations: Option<u32>,

        /// Betweenness source samples
        #[arg(long)]
        samples: Option<u32>,

        /// Seed for source sampling
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List the latest snapshot
    Metrics {
        #[arg(long)]
        min_degree: Option<u64>,

        #[arg(long)]
        cluster: Option<u64>,

        /// Sort field (descending)
        #[arg(long, default_value = "pagerank")]
        sort: SortArg,

        #[arg(long, default_value_t = 50)]
        limit: usize,

        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Shortest evidence path between two entity ids
    Path {
        source: u64,
        target: u64,

        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Co-activity clusters of one entity
    Temporal {
        entity: u64,

        #[arg(long)]
        window_days: Option<u32>,

        #[arg(long)]
        max_results: Option<usize>,
    },
    /// Show the latest snapshot header
    Status,
}

type Engine = AnalyticsEngine<RocksStore, RocksStore>;

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_yaml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(data) = cli.data {
        config.storage.data_path = data;
    }

    let store = Arc::new(
        RocksStore::open(&config.storage.data_path)
            .with_context(|| format!("opening {}", config.storage.data_path))?,
    );

    let engine = AnalyticsEngine::new(store.clone(), store.clone(), config);
    match cli.command {
        Commands::Import { file } => run_import(&store, &file, &cli.format),
        Commands::Compute { dry_run, iterations, samples, seed } => {
            let options = ComputeOptions {
                dry_run,
                pagerank_iterations: iterations,
                betweenness_samples: samples,
                sample_seed: seed,
            };
            run_compute(&engine, &options, &cli.format)
        }
        Commands::Metrics { min_degree, cluster, sort, limit, offset } => {
            let query = SnapshotQuery {
                min_degree,
                cluster_id: cluster,
                sort_by: sort.into(),
                limit,
                offset,
            };
            run_metrics(&engine, &query, &cli.format)
        }
        Commands::Path { source, target, max_depth } => {
            run_path(&engine, source, target, max_depth, &cli.format)
        }
        Commands::Temporal { entity, window_days, max_results } => {
            run_temporal(&engine, entity, window_days, max_results, &cli.format)
        }
        Commands::Status => run_status(&engine, &cli.format),
    }
}

fn run_import(store: &RocksStore, file: &Path, format: &OutputFormat) -> anyhow::Result<()> {
    let dataset = Dataset::from_json_file(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let stats = store.import_dataset(&dataset)?;
    store.flush()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        _ => {
            println!("Entities:      {}", stats.entities);
            println!("Relationships: {}", stats.relationships);
            println!("Mentions:      {}", stats.mentions);
            println!("Activities:    {}", stats.activities);
        }
    }
    Ok(())
}

fn run_compute(engine: &Engine, options: &ComputeOptions, format: &OutputFormat) -> anyhow::Result<()> {
    let summary = engine.run(options)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        _ => {
            match summary.run_id {
                Some(run_id) => println!("Run:        {}", run_id),
                None => println!("Run:        dry run (snapshot unchanged)"),
            }
            println!("Entities:   {}", summary.entity_count);
            println!("Edges:      {}", summary.edge_count);
            println!("Clusters:   {}", summary.cluster_count);
            println!("Components: {}", summary.component_count);
            println!("Skipped:    {}", summary.skipped_rows);
            println!("Elapsed:    {} ms", summary.elapsed_ms);
        }
    }
    Ok(())
}

fn run_metrics(engine: &Engine, query: &SnapshotQuery, format: &OutputFormat) -> anyhow::Result<()> {
    let Some(page) = engine.list_metrics(query)? else {
        bail!("no snapshot yet; run `corpusgraph compute` first");
    };

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    let columns = ["entity_id", "name", "type", "degree", "pagerank", "betweenness", "cluster_id"];
    let rows: Vec<Vec<Value>> = page
        .rows
        .iter()
        .map(|row| {
            let entity = engine.entity(row.entity_id).ok();
            vec![
                json!(row.entity_id.as_u64()),
                entity.as_ref().map_or(Value::Null, |e| json!(e.name)),
                entity.as_ref().map_or(Value::Null, |e| json!(e.kind.as_str())),
                json!(row.degree),
                json!(row.pagerank),
                json!(row.betweenness),
                json!(row.cluster_id),
            ]
        })
        .collect();

    print_rows(&columns, &rows, format);
    if let OutputFormat::Table = format {
        println!(
            "{} of {} row(s), run {} at {}",
            page.rows.len(),
            page.total,
            page.header.run_id,
            page.header.computed_at
        );
    }
    Ok(())
}

fn run_path(
    engine: &Engine,
    source: u64,
    target: u64,
    max_depth: Option<usize>,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let outcome = engine.find_path(EntityId::new(source), EntityId::new(target), max_depth)?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let path = match outcome {
        PathOutcome::Found(path) => path,
        PathOutcome::NotFound => {
            println!("(no path found)");
            return Ok(());
        }
    };

    let names: Vec<&str> = path.entities.iter().map(|e| e.name.as_str()).collect();
    println!("{}", names.join(" -> "));

    let columns = ["from", "to", "relationship_types", "evidence", "weight"];
    let rows: Vec<Vec<Value>> = path
        .steps
        .iter()
        .map(|step| {
            let types: Vec<&str> = step.relationship_types.iter().map(|t| t.as_str()).collect();
            let docs: Vec<u64> = step.evidence.iter().map(|d| d.as_u64()).collect();
            vec![
                json!(step.from.as_u64()),
                json!(step.to.as_u64()),
                if types.is_empty() { json!("co-occurrence") } else { json!(types.join("|")) },
                json!(docs),
                json!(step.weight),
            ]
        })
        .collect();
    print_rows(&columns, &rows, format);
    Ok(())
}

fn run_temporal(
    engine: &Engine,
    entity: u64,
    window_days: Option<u32>,
    max_results: Option<usize>,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let report = engine.temporal_clusters(EntityId::new(entity), window_days, max_results)?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let columns = ["start", "end", "kind", "count", "shown", "omitted"];
    let rows: Vec<Vec<Value>> = report
        .clusters
        .iter()
        .flat_map(|cluster| {
            cluster.groups.iter().map(move |group| {
                vec![
                    json!(cluster.start.to_string()),
                    json!(cluster.end.to_string()),
                    json!(group.kind.as_str()),
                    json!(group.count),
                    json!(group.activities.len()),
                    json!(group.omitted),
                ]
            })
        })
        .collect();
    print_rows(&columns, &rows, format);

    if let OutputFormat::Table = format {
        println!(
            "{} cluster(s) from {} dated activities ({} undated), window {} days",
            report.clusters.len(),
            report.total_activities,
            report.undated,
            report.window_days
        );
    }
    Ok(())
}

fn run_status(engine: &Engine, format: &OutputFormat) -> anyhow::Result<()> {
    let header = engine.status()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&header)?),
        _ => match header {
            Some(h) => {
                println!("Run:      {}", h.run_id);
                println!("Computed: {}", h.computed_at);
                println!("Entities: {}", h.entity_count);
                println!("Edges:    {}", h.edge_count);
                println!("Clusters: {}", h.cluster_count);
            }
            None => println!("No snapshot yet"),
        },
    }
    println!("Version:  {}", corpusgraph::version());
    Ok(())
}

fn print_rows(columns: &[&str], rows: &[Vec<Value>], format: &OutputFormat) {
    match format {
        OutputFormat::Csv => {
            println!("{}", columns.join(","));
            for row in rows {
                let cells: Vec<String> = row.iter().map(format_csv_value).collect();
                println!("{}", cells.join(","));
            }
        }
        _ => {
            if rows.is_empty() {
                println!("(no results)");
                return;
            }
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(columns.to_vec());
            for row in rows {
                let cells: Vec<String> = row.iter().map(format_table_value).collect();
                table.add_row(cells);
            }
            println!("{}", table);
        }
    }
}

fn format_table_value(v: &Value) -> String {
    match v {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() => format!("{:.6}", f),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        _ => serde_json::to_string(v).unwrap_or_default(),
    }
}

fn format_csv_value(v: &Value) -> String {
    match v {
        Value::Null => "".to_string(),
        Value::String(s) => {
            if s.contains(',') || s.contains('"') || s.contains('\n') {
                format!("\"{}\"", s.replace('"', "\"\""))
            } else {
                s.clone()
            }
        }
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => {
            let json = serde_json::to_string(v).unwrap_or_default();
            format!("\"{}\"", json.replace('"', "\"\""))
        }
    }
}
