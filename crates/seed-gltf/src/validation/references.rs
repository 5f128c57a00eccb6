//! Reference phase: indices resolve and unique references stay unique.

use std::collections::HashSet;

use crate::extensions::{for_each_extension_set, ExtensionParent, ExtensionRegistry};
use crate::schema::{Material, Root};

use super::ValidationResult;

struct Checker<'a> {
    root: &'a Root,
    result: ValidationResult,
}

impl<'a> Checker<'a> {
    fn index(&mut self, target: &str, field: &str, index: usize, count: usize) {
        if index >= count {
            self.result.reference(
                target,
                format!("{} {} does not exist ({} available)", field, index, count),
            );
        }
    }

    fn optional(&mut self, target: &str, field: &str, index: Option<usize>, count: usize) {
        if let Some(index) = index {
            self.index(target, field, index, count);
        }
    }

    fn unique(&mut self, target: &str, field: &str, indices: &[usize], count: usize) {
        let mut seen = HashSet::new();
        for &index in indices {
            self.index(target, field, index, count);
            if !seen.insert(index) {
                self.result
                    .reference(target, format!("{} {} is listed more than once", field, index));
            }
        }
    }

    fn accessor(&mut self, target: &str, field: &str, index: usize) {
        let count = self.root.accessors.len();
        self.index(target, field, index, count);
    }

    fn scenes(&mut self, parents: &[Option<usize>]) {
        let root = self.root;
        self.optional("scene", "scene", root.scene, root.scenes.len());
        for (i, scene) in root.scenes.iter().enumerate() {
            let target = format!("scenes[{}]", i);
            self.unique(&target, "node", &scene.nodes, root.nodes.len());
            for &node in &scene.nodes {
                if let Some(Some(_)) = parents.get(node) {
                    self.result.reference(
                        &target,
                        format!("node {} is a child of another node and cannot be a scene root", node),
                    );
                }
            }
        }
    }

    /// Checks node references and returns the parent of every node.
    fn nodes(&mut self) -> Vec<Option<usize>> {
        let root = self.root;
        let count = root.nodes.len();
        let mut parents: Vec<Option<usize>> = vec![None; count];

        for (i, node) in root.nodes.iter().enumerate() {
            let target = format!("nodes[{}]", i);
            self.unique(&target, "child", &node.children, count);
            self.optional(&target, "mesh", node.mesh, root.meshes.len());
            self.optional(&target, "camera", node.camera, root.cameras.len());
            self.optional(&target, "skin", node.skin, root.skins.len());

            for &child in &node.children {
                if child >= count {
                    continue;
                }
                if child == i {
                    self.result.reference(&target, "node is its own child");
                    continue;
                }
                match parents[child] {
                    Some(other) if other != i => self.result.reference(
                        format!("nodes[{}]", child),
                        format!("node has two parents: {} and {}", other, i),
                    ),
                    _ => parents[child] = Some(i),
                }
            }
        }

        // With at most one parent per node, a cycle shows up as a parent walk
        // that never reaches a root.
        for start in 0..count {
            let mut current = start;
            let mut steps = 0;
            while let Some(parent) = parents[current] {
                current = parent;
                steps += 1;
                if current == start || steps > count {
                    self.result
                        .reference(format!("nodes[{}]", start), "node hierarchy has a cycle");
                    break;
                }
            }
        }
        parents
    }

    fn meshes(&mut self) {
        let root = self.root;
        for (i, mesh) in root.meshes.iter().enumerate() {
            if mesh.primitives.is_empty() {
                self.result
                    .reference(format!("meshes[{}]", i), "mesh has no primitives");
            }
            for (j, primitive) in mesh.primitives.iter().enumerate() {
                let target = format!("meshes[{}].primitives[{}]", i, j);
                for (semantic, &accessor) in &primitive.attributes {
                    self.accessor(&target, semantic, accessor);
                }
                if let Some(indices) = primitive.indices {
                    self.accessor(&target, "indices", indices);
                }
                self.optional(&target, "material", primitive.material, root.materials.len());
                for (t, morph) in primitive.targets.iter().enumerate() {
                    for (semantic, &accessor) in morph {
                        self.accessor(&format!("{}.targets[{}]", target, t), semantic, accessor);
                    }
                }
            }
        }
    }

    fn accessors(&mut self) {
        let root = self.root;
        let views = root.buffer_views.len();
        for (i, accessor) in root.accessors.iter().enumerate() {
            let target = format!("accessors[{}]", i);
            self.optional(&target, "bufferView", accessor.buffer_view, views);
            if let Some(sparse) = &accessor.sparse {
                self.index(&target, "sparse.indices.bufferView", sparse.indices.buffer_view, views);
                self.index(&target, "sparse.values.bufferView", sparse.values.buffer_view, views);
            }
        }
        for (i, view) in root.buffer_views.iter().enumerate() {
            self.index(&format!("bufferViews[{}]", i), "buffer", view.buffer, root.buffers.len());
        }
        for (i, image) in root.images.iter().enumerate() {
            self.optional(&format!("images[{}]", i), "bufferView", image.buffer_view, views);
        }
    }

    fn textures(&mut self, registry: &ExtensionRegistry) {
        let root = self.root;
        for (i, texture) in root.textures.iter().enumerate() {
            let target = format!("textures[{}]", i);
            self.optional(&target, "sampler", texture.sampler, root.samplers.len());
            self.optional(&target, "source", texture.source, root.images.len());
            for (name, value) in &texture.extensions {
                match registry.decode(ExtensionParent::Texture, name, value) {
                    Ok(extension) => {
                        let source = extension.image_source();
                        self.optional(&target, name, source, root.images.len());
                    }
                    Err(e) => self.result.reference(&target, format!("{}: {}", name, e)),
                }
            }
        }
        for (i, material) in root.materials.iter().enumerate() {
            self.material(i, material);
        }
    }

    fn material(&mut self, index: usize, material: &Material) {
        let target = format!("materials[{}]", index);
        let textures = self.root.textures.len();
        if let Some(pbr) = &material.pbr_metallic_roughness {
            if let Some(info) = &pbr.base_color_texture {
                self.index(&target, "baseColorTexture", info.index, textures);
            }
            if let Some(info) = &pbr.metallic_roughness_texture {
                self.index(&target, "metallicRoughnessTexture", info.index, textures);
            }
        }
        if let Some(info) = &material.normal_texture {
            self.index(&target, "normalTexture", info.index, textures);
        }
        if let Some(info) = &material.occlusion_texture {
            self.index(&target, "occlusionTexture", info.index, textures);
        }
        if let Some(info) = &material.emissive_texture {
            self.index(&target, "emissiveTexture", info.index, textures);
        }
    }

    fn animations(&mut self) {
        let root = self.root;
        for (i, animation) in root.animations.iter().enumerate() {
            let target = format!("animations[{}]", i);
            let mut targets = HashSet::new();
            for (c, channel) in animation.channels.iter().enumerate() {
                let channel_target = format!("{}.channels[{}]", target, c);
                self.index(&channel_target, "sampler", channel.sampler, animation.samplers.len());
                self.optional(&channel_target, "node", channel.target.node, root.nodes.len());
                if let Some(node) = channel.target.node {
                    if !targets.insert((node, channel.target.path.as_str())) {
                        self.result.reference(
                            &channel_target,
                            format!("node {} {} is animated twice", node, channel.target.path),
                        );
                    }
                }
            }
            for (s, sampler) in animation.samplers.iter().enumerate() {
                let sampler_target = format!("{}.samplers[{}]", target, s);
                self.accessor(&sampler_target, "input", sampler.input);
                self.accessor(&sampler_target, "output", sampler.output);
            }
        }
    }

    fn skins(&mut self) {
        let root = self.root;
        for (i, skin) in root.skins.iter().enumerate() {
            let target = format!("skins[{}]", i);
            if skin.joints.is_empty() {
                self.result.reference(&target, "skin has no joints");
            }
            self.unique(&target, "joint", &skin.joints, root.nodes.len());
            self.optional(&target, "skeleton", skin.skeleton, root.nodes.len());
            if let Some(matrices) = skin.inverse_bind_matrices {
                self.accessor(&target, "inverseBindMatrices", matrices);
            }
        }
    }

    fn extensions(&mut self, registry: &ExtensionRegistry) {
        let root = self.root;
        let mut undeclared = Vec::new();
        for_each_extension_set(root, |_, path, extensions| {
            for name in extensions.keys() {
                if !root.extensions_used.contains(name) {
                    undeclared.push((path.clone(), name.clone()));
                }
            }
        });
        for (path, name) in undeclared {
            self.result.reference(
                path,
                format!("extension {} is not declared in extensionsUsed", name),
            );
        }

        for name in &root.extensions_required {
            if !root.extensions_used.contains(name) {
                self.result.reference(
                    "extensionsRequired",
                    format!("{} is required but not listed in extensionsUsed", name),
                );
            }
            if !registry.supports(name) {
                self.result.reference(
                    "extensionsRequired",
                    format!("required extension {} is not supported", name),
                );
            }
        }
    }
}

/// Check that every index in the document resolves, unique-reference rules
/// hold, and extensions are declared and supported.
pub fn validate_references(root: &Root, registry: &ExtensionRegistry) -> ValidationResult {
    let mut checker = Checker {
        root,
        result: ValidationResult::new(),
    };
    checker.extensions(registry);
    let parents = checker.nodes();
    checker.scenes(&parents);
    checker.meshes();
    checker.accessors();
    checker.textures(registry);
    checker.animations();
    checker.skins();
    checker.result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(document: serde_json::Value) -> ValidationResult {
        let root: Root = serde_json::from_value(document).unwrap();
        validate_references(&root, &ExtensionRegistry::default())
    }

    #[test]
    fn test_valid_document() {
        let result = check(json!({
            "asset": {"version": "2.0"},
            "scene": 0,
            "scenes": [{"nodes": [0]}],
            "nodes": [{"children": [1]}, {}]
        }));
        assert!(result.is_ok(), "{:?}", result.errors());
    }

    #[test]
    fn test_dangling_mesh() {
        let result = check(json!({
            "asset": {"version": "2.0"},
            "nodes": [{"mesh": 3}]
        }));
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].target, "nodes[0]");
        assert!(result.errors()[0].message.contains("mesh 3"));
    }

    #[test]
    fn test_duplicate_child_and_second_parent() {
        let result = check(json!({
            "asset": {"version": "2.0"},
            "nodes": [{"children": [2, 2]}, {"children": [2]}, {}]
        }));
        let messages: Vec<&str> = result.errors().iter().map(|e| e.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("more than once")));
        assert!(messages.iter().any(|m| m.contains("two parents")));
    }

    #[test]
    fn test_scene_root_must_not_be_a_child() {
        let result = check(json!({
            "asset": {"version": "2.0"},
            "scenes": [{"nodes": [0, 2]}],
            "nodes": [{"children": [1]}, {"children": [2]}, {}]
        }));
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].target, "scenes[0]");
        assert!(result.errors()[0].message.contains("node 2 is a child"));

        let result = check(json!({
            "asset": {"version": "2.0"},
            "scenes": [{"nodes": [0, 9]}],
            "nodes": [{"children": [1]}, {}]
        }));
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].message.contains("node 9 does not exist"));
    }

    #[test]
    fn test_cycle_detected() {
        let result = check(json!({
            "asset": {"version": "2.0"},
            "nodes": [{"children": [1]}, {"children": [0]}]
        }));
        assert!(result
            .errors()
            .iter()
            .any(|e| e.message.contains("cycle")));
    }

    #[test]
    fn test_undeclared_and_unsupported_extensions() {
        let result = check(json!({
            "asset": {"version": "2.0"},
            "extensionsUsed": ["VENDOR_thing"],
            "extensionsRequired": ["VENDOR_thing"],
            "nodes": [{"extensions": {"KHR_other": {}}}]
        }));
        let messages: Vec<&str> = result.errors().iter().map(|e| e.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("KHR_other is not declared")));
        assert!(messages.iter().any(|m| m.contains("VENDOR_thing is not supported")));
    }

    #[test]
    fn test_duplicate_animation_target() {
        let result = check(json!({
            "asset": {"version": "2.0"},
            "nodes": [{}],
            "accessors": [
                {"componentType": 5126, "count": 2, "type": "SCALAR"},
                {"componentType": 5126, "count": 2, "type": "VEC3"}
            ],
            "animations": [{
                "channels": [
                    {"sampler": 0, "target": {"node": 0, "path": "translation"}},
                    {"sampler": 0, "target": {"node": 0, "path": "translation"}}
                ],
                "samplers": [{"input": 0, "output": 1}]
            }]
        }));
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].message.contains("animated twice"));
    }

    #[test]
    fn test_texture_extension_source() {
        let result = check(json!({
            "asset": {"version": "2.0"},
            "extensionsUsed": ["KHR_texture_basisu"],
            "textures": [{"extensions": {"KHR_texture_basisu": {"source": 4}}}]
        }));
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].message.contains("KHR_texture_basisu 4"));
    }
}
