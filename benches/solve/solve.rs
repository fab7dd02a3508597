use criterion::{criterion_group, criterion_main, Criterion};
use seir_animate::grid::{CellCounts, PopulationGrid, GRID_CELLS};
use seir_animate::{ModelParameters, SeirModel};

use rand::rngs::SmallRng;
use rand::SeedableRng;

static POPULATION: f64 = 1000.0;
static SEED: u64 = 123;

fn solve_reference_model() -> SeirModel {
    let mut model =
        SeirModel::new(ModelParameters::with_population(POPULATION)).expect("valid parameters");
    model.solve().expect("reference model integrates");
    model
}

fn shuffle_grids(model: &SeirModel) -> usize {
    let trajectory = model.trajectory().expect("model was solved");
    let mut rng = SmallRng::seed_from_u64(SEED);
    (0..trajectory.len())
        .filter_map(|index| trajectory.compartments_at(index))
        .map(|sample| {
            let counts = CellCounts::from_compartments(&sample, GRID_CELLS);
            PopulationGrid::shuffled(&counts, &mut rng).cells().len()
        })
        .sum()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("solve reference SEIR model", |bencher| {
        bencher.iter_with_large_drop(solve_reference_model)
    });

    let model = solve_reference_model();
    c.bench_function("shuffle population grids", |bencher| {
        bencher.iter(|| shuffle_grids(&model))
    });
}

criterion_group!(solve_benches, criterion_benchmark);
criterion_main!(solve_benches);
