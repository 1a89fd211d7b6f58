// Manual timing harness, in the teacher's style (no criterion): each
// benchmark is a plain function timed with `std::time::Instant` and printed,
// rather than a statistically-analyzed criterion run.
use std::time::Instant;

use dd::{Cube, TreeExpr};

fn clock<F>(name: &str, f: F)
where
    F: FnOnce(),
{
    let start = Instant::now();
    f();
    let elapsed = start.elapsed();
    println!("{name}: {elapsed:?}");
}

fn bench_accumulate_many_observations() {
    let cube = Cube::new();
    let labels = ["a", "b", "c", "d", "e", "f", "g", "h"];
    fastrand::seed(1);
    let observations: Vec<(i64, TreeExpr)> = (0..20_000)
        .map(|_| {
            let depth = fastrand::usize(1..=4);
            let path: Vec<&str> = (0..depth)
                .map(|_| labels[fastrand::usize(0..labels.len())])
                .collect();
            (fastrand::i64(-3..=3), TreeExpr::path(&path))
        })
        .collect();
    cube.sum_subtrees(&observations);
}

fn bench_merge_two_large_accumulators() {
    let cube = Cube::new();
    let labels = ["a", "b", "c", "d"];
    fastrand::seed(2);
    let build = |n: usize| -> Vec<(i64, TreeExpr)> {
        (0..n)
            .map(|_| {
                let depth = fastrand::usize(1..=3);
                let path: Vec<&str> = (0..depth)
                    .map(|_| labels[fastrand::usize(0..labels.len())])
                    .collect();
                (fastrand::i64(-1..=1), TreeExpr::path(&path))
            })
            .collect()
    };
    let left = cube.sum_subtrees(&build(5_000));
    let right = cube.sum_subtrees(&build(5_000));
    cube.merge(&left, &right);
}

fn main() {
    clock("accumulate 20k observations", bench_accumulate_many_observations);
    clock("merge two 5k-observation accumulators", bench_merge_two_large_accumulators);
}
