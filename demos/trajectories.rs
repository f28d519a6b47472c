//! Center-free clustering of daily trajectories
//!
//! Each trajectory is a sequence of visited location ids. Trajectories are
//! compared with a normalized edit distance on the location ids and on a
//! coarse location category, fused with a weighted sum.
//!
//! Run with: cargo run --example trajectories --release

use fusioncmeans_rs::{
    Algorithm, CenterFreeEngine, EventLog, FnDistance, FuzzyConfig, SeedConfig,
};

/// Levenshtein distance divided by the longer length
fn edit_distance(a: &[u32], b: &[u32]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, x) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, y) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(x != y);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()] as f64 / a.len().max(b.len()) as f64
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .init();

    let trajectories: Vec<Vec<u32>> = vec![
        vec![1, 2, 3, 4],
        vec![1, 2, 4],
        vec![2, 3, 4],
        vec![1, 3, 4, 2],
        vec![10, 11, 12],
        vec![10, 12, 11, 13],
        vec![11, 12, 13],
        vec![10, 11, 13],
        vec![20, 21, 22, 23],
        vec![21, 22, 23],
        vec![20, 22, 23, 21],
    ];
    let categories: Vec<Vec<u32>> = trajectories
        .iter()
        .map(|t| t.iter().map(|id| id / 10).collect())
        .collect();

    let spatial = FnDistance::new(trajectories.len(), |i, j| {
        edit_distance(&trajectories[i], &trajectories[j])
    });
    let semantic = FnDistance::new(categories.len(), |i, j| {
        edit_distance(&categories[i], &categories[j])
    });

    let engine = CenterFreeEngine::new(
        FuzzyConfig::center_free(3)
            .with_algorithm(Algorithm::TwoWeightedDistance)
            .with_weight(0.7),
        SeedConfig::new(3).with_distance_threshold(0.9),
    )
    .expect("Invalid configuration");

    let mut log = EventLog::new();
    let result = engine
        .fit_observed(&spatial, Some(&semantic), None, &mut log)
        .expect("Clustering failed");

    println!("References: {:?}", result.references);
    println!("Exemplars:  {:?}", result.exemplars);
    println!(
        "{} iterations ({:?}), partition coefficient {:.4}",
        result.n_iterations, result.termination, result.partition_coefficient
    );
    for event in log.events() {
        println!(
            "  step {:>2}: objective {:.6}, change {:.6}",
            event.iteration, event.objective, event.convergence_norm
        );
    }

    for (i, label) in result.hard_assignments().iter().enumerate() {
        println!("  {:?} -> cluster {}", trajectories[i], label);
    }
}
