use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quizcast::clusterer::{KMEANS_ITERATIONS, kmeans_run};
use quizcast::session::DEFAULT_K;
use quizcast::{DemoCatalog, Point, ServeArgs, ServerConfig, server};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{EnvFilter, fmt};

/// Live clustering demo server
#[derive(Parser)]
#[command(name = "quizcast")]
#[command(version)]
#[command(about = "Presenter-driven clustering demos mirrored to every audience screen")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP + WebSocket server
    Serve(ServeArgs),
    /// List the demos a catalog provides
    Catalog {
        /// Demo catalog JSON file; the built-in catalog when omitted
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Cluster a JSON file of points offline
    Cluster {
        /// Array of `{"x": .., "y": ..}` objects (an `id` is optional)
        input: PathBuf,

        #[arg(short, default_value_t = DEFAULT_K)]
        k: usize,

        /// Fix the seeding so repeated runs agree
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Deserialize)]
struct RawPoint {
    id: Option<String>,
    x: f64,
    y: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt().with_env_filter(filter).with_target(true).init();

    match cli.command {
        Commands::Serve(args) => server::serve(ServerConfig::from(args)).await,
        Commands::Catalog { catalog } => list_catalog(catalog),
        Commands::Cluster { input, k, seed } => cluster_file(&input, k, seed),
    }
}

fn list_catalog(path: Option<PathBuf>) -> Result<()> {
    let mut config = ServerConfig::new();
    if let Some(path) = path {
        config = config.catalog_path(path);
    }
    let catalog: DemoCatalog = config.load_catalog()?;

    println!("=== {} demo(s) ===\n", catalog.len());
    for demo in catalog.list() {
        println!("{} - {}", demo.id, demo.name);
        if !demo.description.is_empty() {
            println!("  {}", demo.description);
        }
        for (key, value) in &demo.default_params {
            println!("  {} = {}", key, value);
        }
    }
    Ok(())
}

fn cluster_file(input: &Path, k: usize, seed: Option<u64>) -> Result<()> {
    let start_time = Instant::now();

    println!("Step 1: Loading points...");
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let raw: Vec<RawPoint> =
        serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", input.display()))?;
    let points: Vec<Point> = raw
        .into_iter()
        .enumerate()
        .map(|(i, p)| Point::new(p.id.unwrap_or_else(|| format!("p{}", i + 1)), p.x, p.y))
        .collect();
    println!("✓ Loaded {} points\n", points.len());

    println!("Step 2: Running k-means (k={}, {} iterations)...", k, KMEANS_ITERATIONS);
    let step_start = Instant::now();
    let run = kmeans_run(&points, k, seed).context("Clustering failed")?;
    println!(
        "✓ Found {} clusters [{:.3}s]\n",
        run.clusters.len(),
        step_start.elapsed().as_secs_f64()
    );

    for cluster in &run.clusters {
        println!(
            "  cluster {} {} centroid=({:.2}, {:.2}) - {} points",
            cluster.id,
            cluster.color,
            cluster.centroid.x,
            cluster.centroid.y,
            cluster.points.len()
        );
        for point in &cluster.points {
            println!("    {} ({}, {})", point.id, point.x, point.y);
        }
    }

    println!("\n=== Done in {:.2}s ===", start_time.elapsed().as_secs_f64());
    Ok(())
}
