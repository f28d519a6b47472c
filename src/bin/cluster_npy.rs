//! Fuzzy c-means over a `.npy` feature matrix
//!
//! Reads an (n_samples, n_features) f64 matrix, trains the coordinate engine
//! and writes the centers and the membership matrix to `.npy` files.
//!
//! Usage: `cluster-npy <input.npy> <centers.npy> <membership.npy> <n_clusters> <seed> <max_iters> <error>`

use fusioncmeans_rs::{CoordinateEngine, FuzzyConfig};
use ndarray::Array2;
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use std::env;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args: Vec<String> = env::args().collect();

    if args.len() != 8 {
        eprintln!(
            "Usage: {} <input.npy> <centers.npy> <membership.npy> <n_clusters> <seed> <max_iters> <error>",
            args[0]
        );
        std::process::exit(1);
    }

    let input_path = &args[1];
    let centers_path = &args[2];
    let membership_path = &args[3];
    let n_clusters: usize = args[4].parse()?;
    let seed: u64 = args[5].parse()?;
    let max_iters: usize = args[6].parse()?;
    let error: f64 = args[7].parse()?;

    let reader = BufReader::new(File::open(input_path)?);
    let data: Array2<f64> = Array2::read_npy(reader)?;

    info!(
        samples = data.nrows(),
        features = data.ncols(),
        "Loaded {}",
        input_path
    );
    info!(n_clusters, seed, max_iters, error, "Running fuzzy c-means");

    let config = FuzzyConfig::new(n_clusters)
        .with_seed(seed)
        .with_max_iters(max_iters)
        .with_error(error);
    let result = CoordinateEngine::new(config)?.fit(&data.view(), None, None)?;

    info!(
        iterations = result.n_iterations,
        termination = ?result.termination,
        partition_coefficient = result.partition_coefficient,
        "Clustering finished"
    );

    result
        .centers
        .write_npy(BufWriter::new(File::create(centers_path)?))?;
    result
        .membership
        .write_npy(BufWriter::new(File::create(membership_path)?))?;

    info!("Saved centers to {} and membership to {}", centers_path, membership_path);

    Ok(())
}
