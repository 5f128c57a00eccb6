//! Extension registry.
//!
//! Extension payloads stay as raw JSON on the schema objects. The registry
//! knows which extension names are supported and how to decode the payloads
//! it understands into typed [`Extension`] values; everything else decodes
//! to [`Extension::Opaque`].

use std::collections::HashMap;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GltfError, Result};
use crate::schema::{Extensions, Material, Root};

/// Kind of object an extension payload is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionParent {
    /// The document root.
    Root,
    /// `asset`.
    Asset,
    /// `scenes[*]`.
    Scene,
    /// `nodes[*]`.
    Node,
    /// `meshes[*]`.
    Mesh,
    /// `meshes[*].primitives[*]`.
    Primitive,
    /// `accessors[*]`.
    Accessor,
    /// `accessors[*].sparse`.
    Sparse,
    /// `bufferViews[*]`.
    BufferView,
    /// `buffers[*]`.
    Buffer,
    /// `materials[*]`.
    Material,
    /// `materials[*].pbrMetallicRoughness`.
    PbrMetallicRoughness,
    /// Any texture reference.
    TextureInfo,
    /// `materials[*].normalTexture`.
    NormalTextureInfo,
    /// `materials[*].occlusionTexture`.
    OcclusionTextureInfo,
    /// `textures[*]`.
    Texture,
    /// `images[*]`.
    Image,
    /// `samplers[*]`.
    Sampler,
    /// `animations[*]`.
    Animation,
    /// `skins[*]`.
    Skin,
    /// `cameras[*]`.
    Camera,
}

impl ExtensionParent {
    /// The more general parent whose extensions also apply here.
    pub fn ancestor(self) -> Option<Self> {
        match self {
            ExtensionParent::NormalTextureInfo | ExtensionParent::OcclusionTextureInfo => {
                Some(ExtensionParent::TextureInfo)
            }
            _ => None,
        }
    }

    /// This parent followed by its ancestors, nearest first.
    pub fn lineage(self) -> impl Iterator<Item = ExtensionParent> {
        std::iter::successors(Some(self), |parent| parent.ancestor())
    }
}

/// `KHR_texture_transform` payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureTransform {
    /// UV offset.
    #[serde(default)]
    pub offset: Vec2,
    /// Rotation in radians.
    #[serde(default)]
    pub rotation: f32,
    /// UV scale.
    #[serde(default = "unit_scale")]
    pub scale: Vec2,
    /// Overrides the texture coordinate set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tex_coord: Option<u32>,
}

fn unit_scale() -> Vec2 {
    Vec2::ONE
}

/// An extension payload decoded by the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum Extension {
    /// `KHR_texture_transform`.
    TextureTransform(TextureTransform),
    /// `KHR_materials_unlit`.
    MaterialsUnlit,
    /// `KHR_materials_emissive_strength`.
    EmissiveStrength(f32),
    /// `KHR_materials_ior`.
    MaterialsIor(f32),
    /// `KHR_texture_basisu`: replacement image index.
    TextureBasisu(usize),
    /// `EXT_texture_webp`: replacement image index.
    TextureWebp(usize),
    /// Any payload the registry has no decoder for.
    Opaque {
        /// Extension name.
        name: String,
        /// Raw JSON payload.
        value: Value,
    },
}

impl Extension {
    /// Image index this extension redirects a texture to, if any.
    pub fn image_source(&self) -> Option<usize> {
        match self {
            Extension::TextureBasisu(source) | Extension::TextureWebp(source) => Some(*source),
            _ => None,
        }
    }
}

/// Decodes one extension payload.
pub type ExtensionDecoder = fn(&Value) -> Result<Extension>;

/// Supported extension names and their payload decoders.
#[derive(Clone)]
pub struct ExtensionRegistry {
    decoders: HashMap<(ExtensionParent, String), ExtensionDecoder>,
    names: Vec<String>,
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("names", &self.names)
            .finish()
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(
            ExtensionParent::TextureInfo,
            "KHR_texture_transform",
            decode_texture_transform,
        );
        registry.register(ExtensionParent::Material, "KHR_materials_unlit", |_| {
            Ok(Extension::MaterialsUnlit)
        });
        registry.register(
            ExtensionParent::Material,
            "KHR_materials_emissive_strength",
            |value| {
                Ok(Extension::EmissiveStrength(number_field(
                    value,
                    "emissiveStrength",
                    1.0,
                )?))
            },
        );
        registry.register(ExtensionParent::Material, "KHR_materials_ior", |value| {
            Ok(Extension::MaterialsIor(number_field(value, "ior", 1.5)?))
        });
        registry.register(ExtensionParent::Texture, "KHR_texture_basisu", |value| {
            Ok(Extension::TextureBasisu(source_field(value)?))
        });
        registry.register(ExtensionParent::Texture, "EXT_texture_webp", |value| {
            Ok(Extension::TextureWebp(source_field(value)?))
        });
        // Marker extension without payloads of its own.
        registry.register_name("KHR_mesh_quantization");
        registry
    }
}

impl ExtensionRegistry {
    /// A registry supporting nothing.
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
            names: Vec::new(),
        }
    }

    /// Register a decoder for `name` attached to `parent` (and its descendants).
    pub fn register(&mut self, parent: ExtensionParent, name: &str, decoder: ExtensionDecoder) {
        self.register_name(name);
        self.decoders.insert((parent, name.to_string()), decoder);
    }

    /// Mark `name` as supported without decoding its payloads.
    pub fn register_name(&mut self, name: &str) {
        if !self.names.iter().any(|n| n == name) {
            self.names.push(name.to_string());
        }
    }

    /// True when `name` is supported on any parent.
    pub fn supports(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Supported extension names, in registration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Decode one payload, searching `parent` then its ancestors.
    pub fn decode(&self, parent: ExtensionParent, name: &str, value: &Value) -> Result<Extension> {
        for candidate in parent.lineage() {
            if let Some(decoder) = self.decoders.get(&(candidate, name.to_string())) {
                return decoder(value);
            }
        }
        Ok(Extension::Opaque {
            name: name.to_string(),
            value: value.clone(),
        })
    }

    /// Decode every payload of an object, in document order.
    pub fn decode_all(
        &self,
        parent: ExtensionParent,
        extensions: &Extensions,
    ) -> Result<Vec<Extension>> {
        extensions
            .iter()
            .map(|(name, value)| self.decode(parent, name, value))
            .collect()
    }
}

/// Visit every extension map in the document with its parent kind and path.
pub fn for_each_extension_set<'a>(
    root: &'a Root,
    mut visit: impl FnMut(ExtensionParent, String, &'a Extensions),
) {
    use ExtensionParent as P;

    visit(P::Root, "root".into(), &root.extensions);
    visit(P::Asset, "asset".into(), &root.asset.extensions);
    for (i, scene) in root.scenes.iter().enumerate() {
        visit(P::Scene, format!("scenes[{}]", i), &scene.extensions);
    }
    for (i, node) in root.nodes.iter().enumerate() {
        visit(P::Node, format!("nodes[{}]", i), &node.extensions);
    }
    for (i, mesh) in root.meshes.iter().enumerate() {
        visit(P::Mesh, format!("meshes[{}]", i), &mesh.extensions);
        for (j, primitive) in mesh.primitives.iter().enumerate() {
            visit(
                P::Primitive,
                format!("meshes[{}].primitives[{}]", i, j),
                &primitive.extensions,
            );
        }
    }
    for (i, accessor) in root.accessors.iter().enumerate() {
        visit(P::Accessor, format!("accessors[{}]", i), &accessor.extensions);
        if let Some(sparse) = &accessor.sparse {
            visit(P::Sparse, format!("accessors[{}].sparse", i), &sparse.extensions);
        }
    }
    for (i, view) in root.buffer_views.iter().enumerate() {
        visit(P::BufferView, format!("bufferViews[{}]", i), &view.extensions);
    }
    for (i, buffer) in root.buffers.iter().enumerate() {
        visit(P::Buffer, format!("buffers[{}]", i), &buffer.extensions);
    }
    for (i, material) in root.materials.iter().enumerate() {
        visit_material(i, material, &mut visit);
    }
    for (i, texture) in root.textures.iter().enumerate() {
        visit(P::Texture, format!("textures[{}]", i), &texture.extensions);
    }
    for (i, image) in root.images.iter().enumerate() {
        visit(P::Image, format!("images[{}]", i), &image.extensions);
    }
    for (i, sampler) in root.samplers.iter().enumerate() {
        visit(P::Sampler, format!("samplers[{}]", i), &sampler.extensions);
    }
    for (i, animation) in root.animations.iter().enumerate() {
        visit(P::Animation, format!("animations[{}]", i), &animation.extensions);
    }
    for (i, skin) in root.skins.iter().enumerate() {
        visit(P::Skin, format!("skins[{}]", i), &skin.extensions);
    }
    for (i, camera) in root.cameras.iter().enumerate() {
        visit(P::Camera, format!("cameras[{}]", i), &camera.extensions);
    }
}

fn visit_material<'a>(
    index: usize,
    material: &'a Material,
    visit: &mut impl FnMut(ExtensionParent, String, &'a Extensions),
) {
    use ExtensionParent as P;

    let path = format!("materials[{}]", index);
    visit(P::Material, path.clone(), &material.extensions);
    if let Some(pbr) = &material.pbr_metallic_roughness {
        let pbr_path = format!("{}.pbrMetallicRoughness", path);
        visit(P::PbrMetallicRoughness, pbr_path.clone(), &pbr.extensions);
        if let Some(info) = &pbr.base_color_texture {
            visit(P::TextureInfo, format!("{}.baseColorTexture", pbr_path), &info.extensions);
        }
        if let Some(info) = &pbr.metallic_roughness_texture {
            visit(
                P::TextureInfo,
                format!("{}.metallicRoughnessTexture", pbr_path),
                &info.extensions,
            );
        }
    }
    if let Some(info) = &material.normal_texture {
        visit(P::NormalTextureInfo, format!("{}.normalTexture", path), &info.extensions);
    }
    if let Some(info) = &material.occlusion_texture {
        visit(
            P::OcclusionTextureInfo,
            format!("{}.occlusionTexture", path),
            &info.extensions,
        );
    }
    if let Some(info) = &material.emissive_texture {
        visit(P::TextureInfo, format!("{}.emissiveTexture", path), &info.extensions);
    }
}

/// Names of every extension present in the document, in first-seen order.
pub fn used_extension_names(root: &Root) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for_each_extension_set(root, |_, _, extensions| {
        for name in extensions.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    });
    names
}

fn decode_texture_transform(value: &Value) -> Result<Extension> {
    let transform = TextureTransform::deserialize(value).map_err(|e| {
        GltfError::content("KHR_texture_transform", e.to_string())
    })?;
    Ok(Extension::TextureTransform(transform))
}

fn number_field(value: &Value, field: &str, default: f32) -> Result<f32> {
    match value.get(field) {
        None => Ok(default),
        Some(number) => number.as_f64().map(|n| n as f32).ok_or_else(|| {
            GltfError::content(field.to_string(), format!("expected a number, found {}", number))
        }),
    }
}

fn source_field(value: &Value) -> Result<usize> {
    value
        .get("source")
        .and_then(Value::as_u64)
        .map(|source| source as usize)
        .ok_or_else(|| GltfError::content("source", "missing image index"))
}
