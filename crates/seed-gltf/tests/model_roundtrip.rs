//! End-to-end scenarios: building, merging, writing and reading models.

mod common;

use std::sync::Arc;

use glam::Vec3;
use seed_gltf::io::uri::encode_data_uri;
use seed_gltf::memory::{AccessorType, ComponentType};
use seed_gltf::schema::{Accessor, BufferTarget, Mesh, Node, Primitive, Scene};
use seed_gltf::{
    ErrorCategory, MemoryImage, MemoryResolver, ModelRoot, ReadContext, ReadSettings,
    ValidationMode, WriteContext, WriteSettings,
};

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];

fn floats(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn triangle() -> ModelRoot {
    let mut model = ModelRoot::new();
    let position = model
        .create_vec3_accessor(&[Vec3::ZERO, Vec3::X, Vec3::Y])
        .unwrap();
    let normal = model.create_vec3_accessor(&[Vec3::Z; 3]).unwrap();
    let indices = model.create_index_accessor(&[0, 1, 2]).unwrap();

    let mut primitive = Primitive::default();
    primitive.attributes.insert("POSITION".to_string(), position);
    primitive.attributes.insert("NORMAL".to_string(), normal);
    primitive.indices = Some(indices);
    let mesh = model.create_mesh(Mesh {
        primitives: vec![primitive],
        ..Mesh::default()
    });
    let node = model.create_node(Node {
        mesh: Some(mesh),
        ..Node::default()
    });
    model.create_scene(Scene {
        nodes: vec![node],
        ..Scene::default()
    });
    model
}

fn assert_triangle(model: &ModelRoot) {
    assert_eq!(
        model.accessor_vec3s(0).unwrap(),
        vec![Vec3::ZERO, Vec3::X, Vec3::Y]
    );
    assert_eq!(model.accessor_vec3s(1).unwrap(), vec![Vec3::Z; 3]);
    assert_eq!(model.accessor_indices(2).unwrap(), vec![0, 1, 2]);
}

#[test]
fn interleaved_views_read_at_their_own_offsets() {
    common::init_tracing();
    let mut model = ModelRoot::new();
    let bytes: Vec<u8> = (1u16..=12).flat_map(|v| v.to_le_bytes()).collect();
    assert_eq!(bytes.len(), 24);
    let buffer = model.create_buffer(bytes);

    let positions_view = model
        .use_buffer_view(buffer, 0, Some(24), Some(12), Some(BufferTarget::ArrayBuffer))
        .unwrap();
    let normals_view = model
        .use_buffer_view(buffer, 0, Some(24), Some(12), None)
        .unwrap();
    assert_ne!(positions_view, normals_view);

    let mut positions = Accessor::new(AccessorType::Vec3, ComponentType::UnsignedShort, 2);
    positions.buffer_view = Some(positions_view);
    let mut normals = Accessor::new(AccessorType::Vec3, ComponentType::UnsignedShort, 2);
    normals.buffer_view = Some(normals_view);
    normals.byte_offset = 6;
    let positions = model.create_accessor(positions);
    let normals = model.create_accessor(normals);

    // Read in reverse order; results must not depend on iteration order.
    let n = model.accessor_vec3s(normals).unwrap();
    let p = model.accessor_vec3s(positions).unwrap();
    assert_eq!(p[1], Vec3::new(7.0, 8.0, 9.0));
    assert_eq!(n[1], Vec3::new(10.0, 11.0, 12.0));
    assert_eq!(p[0], Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(n[0], Vec3::new(4.0, 5.0, 6.0));
}

#[test]
fn merge_is_idempotent_and_preserves_values() {
    common::init_tracing();
    let mut model = triangle();
    assert_eq!(model.buffer_count(), 3);

    model.merge_buffers().unwrap();
    assert_eq!(model.buffer_count(), 1);
    assert_triangle(&model);

    let views = model.document().buffer_views.clone();
    let bytes = model.buffer_bytes(0).unwrap().to_vec();
    model.merge_buffers().unwrap();
    assert_eq!(model.document().buffer_views, views);
    assert_eq!(model.buffer_bytes(0).unwrap(), &bytes[..]);

    for view in &model.document().buffer_views {
        assert_eq!(view.byte_offset % 4, 0);
    }
}

#[test]
fn glb_roundtrip_in_memory() {
    common::init_tracing();
    let mut model = triangle();
    model.create_image(MemoryImage::new(PNG.to_vec()));

    let bytes = model.write_glb_bytes().unwrap();
    let back = ModelRoot::parse_glb(&bytes).unwrap();

    assert_triangle(&back);
    assert_eq!(back.buffer_count(), 1);
    assert_eq!(back.image_bytes(0).unwrap(), PNG);
    assert_eq!(model.buffer_count(), 3);
}

#[test]
fn directory_roundtrip_with_satellites() {
    common::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mut model = triangle();
    model.create_image(MemoryImage::new(PNG.to_vec()));

    let path = dir.path().join("scene.gltf");
    model.save_gltf(&path).unwrap();
    assert!(dir.path().join("scene.bin").exists());
    assert!(dir.path().join("scene.png").exists());

    let back = ModelRoot::load(&path).unwrap();
    assert_triangle(&back);
    let image = back.image(0).unwrap();
    assert_eq!(image.bytes(), PNG);
    assert!(image.source_path().unwrap().ends_with("scene.png"));
    assert!(back.document().images[0].uri.is_none());
}

#[test]
fn directory_roundtrip_glb() {
    common::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.glb");
    triangle().save_glb(&path).unwrap();

    let back = ModelRoot::load(&path).unwrap();
    assert_triangle(&back);
}

#[test]
fn embedded_gltf_is_self_contained() {
    common::init_tracing();
    let model = triangle();
    let mut resolver = MemoryResolver::new();
    WriteContext::new(&mut resolver)
        .with_settings(WriteSettings::new().embedded().pretty())
        .write_gltf("scene.gltf", &model)
        .unwrap();
    assert_eq!(resolver.len(), 1);

    let json = resolver.get("scene.gltf").unwrap();
    let text = std::str::from_utf8(json).unwrap();
    let back = ModelRoot::parse_gltf(text).unwrap();
    assert_triangle(&back);
}

#[test]
fn sparse_accessor_overrides_base() {
    common::init_tracing();
    let mut bin = floats(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
    bin.extend_from_slice(&1u16.to_le_bytes());
    bin.extend_from_slice(&[0, 0]);
    bin.extend_from_slice(&floats(&[9.0, 8.0, 7.0]));
    let uri = encode_data_uri("application/gltf-buffer", &bin);

    let text = format!(
        r#"{{
            "asset": {{"version": "2.0"}},
            "buffers": [{{"byteLength": {len}, "uri": "{uri}"}}],
            "bufferViews": [
                {{"buffer": 0, "byteLength": 36}},
                {{"buffer": 0, "byteOffset": 36, "byteLength": 2}},
                {{"buffer": 0, "byteOffset": 40, "byteLength": 12}}
            ],
            "accessors": [{{
                "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                "sparse": {{
                    "count": 1,
                    "indices": {{"bufferView": 1, "componentType": 5123}},
                    "values": {{"bufferView": 2}}
                }}
            }}]
        }}"#,
        len = bin.len()
    );

    let mut model = ModelRoot::parse_gltf(&text).unwrap();
    assert_eq!(
        model.accessor_vec3s(0).unwrap(),
        vec![Vec3::ZERO, Vec3::new(9.0, 8.0, 7.0), Vec3::splat(2.0)]
    );

    let err = model.accessor_array_mut::<Vec3>(0).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Contract);
}

fn stretched_normals() -> MemoryResolver {
    let mut bin = floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    bin.extend_from_slice(&floats(&[0.0, 0.0, 2.0, 0.0, 0.0, 2.0, 0.0, 0.0, 2.0]));
    let text = r#"{
        "asset": {"version": "2.0"},
        "buffers": [{"byteLength": 72, "uri": "tri.bin"}],
        "bufferViews": [
            {"buffer": 0, "byteLength": 36, "target": 34962},
            {"buffer": 0, "byteOffset": 36, "byteLength": 36, "target": 34962}
        ],
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"},
            {"bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3"}
        ],
        "meshes": [{"primitives": [{"attributes": {"POSITION": 0, "NORMAL": 1}}]}]
    }"#;

    let mut resolver = MemoryResolver::new();
    resolver.insert("tri.gltf", text.as_bytes().to_vec());
    resolver.insert("tri.bin", bin);
    resolver
}

#[test]
fn strict_read_rejects_content_violations() {
    common::init_tracing();
    let resolver = stretched_normals();
    let err = ReadContext::new(&resolver).read_model("tri.gltf").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Content);
}

#[test]
fn try_fix_read_repairs_without_touching_caller_bytes() {
    common::init_tracing();
    let resolver = stretched_normals();
    let model = ReadContext::new(&resolver)
        .with_settings(ReadSettings::new().with_validation(ValidationMode::TryFix))
        .read_model("tri.gltf")
        .unwrap();

    assert_eq!(model.accessor_vec3s(1).unwrap(), vec![Vec3::Z; 3]);
    assert_eq!(model.accessor(0).unwrap().min, Some(vec![0.0, 0.0, 0.0]));
    assert_eq!(model.accessor(0).unwrap().max, Some(vec![1.0, 1.0, 0.0]));

    let original: &Arc<[u8]> = resolver.get("tri.bin").unwrap();
    assert_eq!(&original[36..40], &0.0f32.to_le_bytes());
    assert_eq!(&original[44..48], &2.0f32.to_le_bytes());
}

#[test]
fn skip_read_keeps_raw_content() {
    common::init_tracing();
    let resolver = stretched_normals();
    let model = ReadContext::new(&resolver)
        .with_settings(ReadSettings::new().with_validation(ValidationMode::Skip))
        .read_model("tri.gltf")
        .unwrap();
    assert_eq!(model.accessor_vec3s(1).unwrap()[0], Vec3::new(0.0, 0.0, 2.0));
}
