//! Basic example demonstrating fusioncmeans-rs usage
//!
//! Run with: cargo run --example basic --release

use fusioncmeans_rs::{CoordinateEngine, FusionEngine, FuzzyConfig, PredictEngine};
use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    println!("=== fusioncmeans-rs example ===\n");

    // Synthetic "locations": 3 clusters in 2D plus a 4-tag profile per location
    let n_samples = 300;
    let n_clusters = 3;

    let centers = [[-5.0f64, -5.0], [0.0, 5.0], [5.0, -5.0]];
    let mut coordinates = Array2::<f64>::zeros((n_samples, 2));
    let mut tags = Array2::<f64>::zeros((n_samples, 4));

    for i in 0..n_samples {
        let cluster_idx = i % 3;
        let noise = Array2::random((1, 2), Uniform::new(-1.0, 1.0));
        coordinates[[i, 0]] = centers[cluster_idx][0] + noise[[0, 0]];
        coordinates[[i, 1]] = centers[cluster_idx][1] + noise[[0, 1]];
        // Tag counts loosely follow the spatial cluster
        tags[[i, cluster_idx]] = 3.0;
        tags[[i, 3]] = (i % 2) as f64;
    }

    println!("True cluster centers:");
    for (i, center) in centers.iter().enumerate() {
        println!("  Cluster {}: ({:.2}, {:.2})", i, center[0], center[1]);
    }
    println!();

    // Spatial clustering alone
    let config = FuzzyConfig::new(n_clusters).with_error(1e-6).with_seed(42);
    let engine = CoordinateEngine::new(config.clone()).expect("Invalid configuration");
    let spatial = engine
        .fit(&coordinates.view(), None, None)
        .expect("Training failed");

    println!("Learned centers ({} iterations):", spatial.n_iterations);
    for (i, center) in spatial.centers.outer_iter().enumerate() {
        println!("  Center {}: ({:.4}, {:.4})", i, center[0], center[1]);
    }
    println!("Partition coefficient: {:.4}\n", spatial.partition_coefficient);

    // Spatial + tag fusion
    let fusion = FusionEngine::new(config.clone().with_weight(0.6)).expect("Invalid configuration");
    let fused = fusion
        .fit(&coordinates.view(), &tags.view(), None, None)
        .expect("Fusion training failed");
    println!(
        "Fused clustering: {} iterations, partition coefficient {:.4}\n",
        fused.n_iterations, fused.partition_coefficient
    );

    // Assign new points to the spatial partition
    let new_points = Array2::random((5, 2), Uniform::new(-6.0, 6.0));
    let predicted = PredictEngine::new(config)
        .expect("Invalid configuration")
        .predict(&spatial.centers.view(), &new_points.view(), None)
        .expect("Prediction failed");

    println!("New point assignments:");
    let labels = predicted.hard_assignments();
    for (i, &label) in labels.iter().enumerate() {
        println!(
            "  Point ({:.2}, {:.2}) -> Cluster {} (membership {:.3})",
            new_points[[i, 0]],
            new_points[[i, 1]],
            label,
            predicted.membership[[label, i]]
        );
    }

    println!("\n=== Done! ===");
}
