//! Benchmarks for mesh-constraint force evaluation.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use meshforce::force::run_decomposed;
use meshforce::mesh::primitives::icosphere;
use meshforce::prelude::*;

fn create_sphere(subdivisions: usize) -> (Arc<MeshTopology>, ParticleData) {
    let sphere = icosphere(subdivisions, 5.0).perturbed(0.05);
    let topology = Arc::new(sphere.topology().unwrap());
    let particles = sphere.particles(BoxDim::cube(30.0));
    (topology, particles)
}

fn bench_forces(c: &mut Criterion) {
    let mut group = c.benchmark_group("forces");
    let t0 = TypeId::new(0);

    for subdivisions in [3, 4] {
        let (topology, particles) = create_sphere(subdivisions);
        let n = particles.n_total();

        for (label, options) in [
            ("sequential", EvaluateOptions::new().sequential()),
            ("parallel", EvaluateOptions::new()),
        ] {
            let mut local = TriangleAreaConservation::new(Arc::clone(&topology), Arc::new(SingleRank))
                .with_options(options);
            local.set_params(t0, 1.0, 0.1).unwrap();
            group.bench_with_input(BenchmarkId::new(format!("area_local_{label}"), n), &n, |b, _| {
                let mut forces = ForceBuffer::new(&particles);
                b.iter(|| {
                    forces.zero();
                    local.evaluate(0, &particles, &mut forces).unwrap();
                })
            });

            let mut global = AreaConservation::new(Arc::clone(&topology), Arc::new(SingleRank), false)
                .with_options(options);
            global.set_params(t0, 1.0, 300.0).unwrap();
            group.bench_with_input(BenchmarkId::new(format!("area_global_{label}"), n), &n, |b, _| {
                let mut forces = ForceBuffer::new(&particles);
                b.iter(|| {
                    forces.zero();
                    global.evaluate(0, &particles, &mut forces).unwrap();
                })
            });

            let mut bending = HelfrichBending::new(Arc::clone(&topology)).with_options(options);
            bending.set_params(t0, 20.0).unwrap();
            group.bench_with_input(BenchmarkId::new(format!("helfrich_{label}"), n), &n, |b, _| {
                let mut forces = ForceBuffer::new(&particles);
                b.iter(|| {
                    forces.zero();
                    bending.evaluate(0, &particles, &mut forces).unwrap();
                })
            });
        }
    }

    group.finish();
}

fn bench_decomposed(c: &mut Criterion) {
    let (topology, particles) = create_sphere(3);

    c.bench_function("helfrich_decomposed_4_ranks", |b| {
        b.iter(|| {
            run_decomposed(&particles, 4, 0, |_comm| {
                let mut bending = HelfrichBending::new(Arc::clone(&topology));
                bending.set_params(TypeId::new(0), 20.0)?;
                Ok(vec![Box::new(bending) as Box<dyn MeshForce>])
            })
            .unwrap()
        })
    });
}

criterion_group!(benches, bench_forces, bench_decomposed);
criterion_main!(benches);
