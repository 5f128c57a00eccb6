//! Accessor decoding benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec3;
use seed_gltf::memory::{ComponentType, Vector3Array};
use seed_gltf::ModelRoot;

const VERTICES: usize = 10_000;

fn positions() -> Vec<Vec3> {
    (0..VERTICES)
        .map(|i| Vec3::new(i as f32, (i % 7) as f32, (i % 13) as f32))
        .collect()
}

fn decode_float_vec3(c: &mut Criterion) {
    let mut model = ModelRoot::new();
    let accessor = model.create_vec3_accessor(&positions()).unwrap();

    c.bench_function("decode_float_vec3", |b| {
        b.iter(|| model.accessor_vec3s(black_box(accessor)))
    });
}

fn decode_normalized_short_vec3(c: &mut Criterion) {
    let bytes: Vec<u8> = (0..VERTICES * 3)
        .flat_map(|i| ((i % 32767) as i16).to_le_bytes())
        .collect();

    c.bench_function("decode_normalized_short_vec3", |b| {
        b.iter(|| {
            Vector3Array::new(
                black_box(&bytes[..]),
                0,
                VERTICES,
                0,
                ComponentType::Short,
                true,
            )
            .map(|array| array.to_vec())
        })
    });
}

fn write_glb(c: &mut Criterion) {
    let mut model = ModelRoot::new();
    model.create_vec3_accessor(&positions()).unwrap();
    model
        .create_index_accessor(&(0..VERTICES as u32).collect::<Vec<_>>())
        .unwrap();

    c.bench_function("write_glb", |b| b.iter(|| black_box(&model).write_glb_bytes()));
}

criterion_group!(benches, decode_float_vec3, decode_normalized_short_vec3, write_glb);
criterion_main!(benches);
