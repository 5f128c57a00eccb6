//! glTF 2.0 JSON schema types.
//!
//! Plain property containers mirroring the glTF 2.0 JSON. Binary content
//! (buffer bytes, image bytes) is not stored here; it lives on
//! [`ModelRoot`](crate::ModelRoot) next to the document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::memory::{AccessorType, ComponentType};

/// Extension payloads keyed by extension name, in document order.
pub type Extensions = IndexMap<String, serde_json::Value>;

/// Primitive mode: points.
pub const MODE_POINTS: u32 = 0;
/// Primitive mode: lines.
pub const MODE_LINES: u32 = 1;
/// Primitive mode: line loop.
pub const MODE_LINE_LOOP: u32 = 2;
/// Primitive mode: line strip.
pub const MODE_LINE_STRIP: u32 = 3;
/// Primitive mode: triangles.
pub const MODE_TRIANGLES: u32 = 4;
/// Primitive mode: triangle strip.
pub const MODE_TRIANGLE_STRIP: u32 = 5;
/// Primitive mode: triangle fan.
pub const MODE_TRIANGLE_FAN: u32 = 6;

/// Root glTF object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Root {
    /// Asset information.
    pub asset: Asset,
    /// Default scene index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<usize>,
    /// Scenes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<Scene>,
    /// Nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
    /// Meshes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meshes: Vec<Mesh>,
    /// Accessors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessors: Vec<Accessor>,
    /// Buffer views.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffer_views: Vec<BufferView>,
    /// Buffers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffers: Vec<Buffer>,
    /// Materials.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<Material>,
    /// Textures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub textures: Vec<Texture>,
    /// Images.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Image>,
    /// Samplers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samplers: Vec<Sampler>,
    /// Animations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animations: Vec<Animation>,
    /// Skins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skins: Vec<Skin>,
    /// Cameras.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cameras: Vec<Camera>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<serde_json::Value>,
    /// Extension names used.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions_used: Vec<String>,
    /// Required extension names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions_required: Vec<String>,
}

/// Asset metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// glTF version.
    pub version: String,
    /// Minimum glTF version required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    /// Generator name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    /// Copyright.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<serde_json::Value>,
}

impl Default for Asset {
    fn default() -> Self {
        Self {
            version: "2.0".to_string(),
            min_version: None,
            generator: None,
            copyright: None,
            extensions: Extensions::new(),
            extras: None,
        }
    }
}

/// A scene containing root nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Scene name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Root node indices.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<usize>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<serde_json::Value>,
}

/// A node in the scene graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Node name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Child node indices.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<usize>,
    /// Mesh index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<usize>,
    /// Camera index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<usize>,
    /// Skin index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skin: Option<usize>,
    /// Local transformation matrix (column-major).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<[f32; 16]>,
    /// Translation (TRS).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<[f32; 3]>,
    /// Rotation quaternion (TRS).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 4]>,
    /// Scale (TRS).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f32; 3]>,
    /// Morph target weights.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f32>>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<serde_json::Value>,
}

/// A mesh containing primitives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Mesh name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Mesh primitives.
    pub primitives: Vec<Primitive>,
    /// Morph target weights.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f32>>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<serde_json::Value>,
}

/// A mesh primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    /// Vertex attributes (POSITION, NORMAL, TEXCOORD_0, etc.).
    pub attributes: IndexMap<String, usize>,
    /// Index accessor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indices: Option<usize>,
    /// Material index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<usize>,
    /// Rendering mode (0=POINTS, 1=LINES, 4=TRIANGLES, etc.).
    #[serde(default = "default_primitive_mode")]
    pub mode: u32,
    /// Morph targets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<IndexMap<String, usize>>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<serde_json::Value>,
}

impl Default for Primitive {
    fn default() -> Self {
        Self {
            attributes: IndexMap::new(),
            indices: None,
            material: None,
            mode: MODE_TRIANGLES,
            targets: Vec::new(),
            extensions: Extensions::new(),
            extras: None,
        }
    }
}

fn default_primitive_mode() -> u32 {
    MODE_TRIANGLES
}

/// An accessor for typed buffer data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    /// Buffer view index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_view: Option<usize>,
    /// Byte offset within buffer view.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub byte_offset: usize,
    /// Component encoding.
    pub component_type: ComponentType,
    /// Number of elements.
    pub count: usize,
    /// Element shape.
    #[serde(rename = "type")]
    pub accessor_type: AccessorType,
    /// Whether values are normalized.
    #[serde(default, skip_serializing_if = "is_false")]
    pub normalized: bool,
    /// Minimum values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Vec<f64>>,
    /// Maximum values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Vec<f64>>,
    /// Sparse accessor data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sparse: Option<Sparse>,
    /// Accessor name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<serde_json::Value>,
}

impl Accessor {
    /// Create an accessor with no backing view yet.
    pub fn new(accessor_type: AccessorType, component_type: ComponentType, count: usize) -> Self {
        Self {
            buffer_view: None,
            byte_offset: 0,
            component_type,
            count,
            accessor_type,
            normalized: false,
            min: None,
            max: None,
            sparse: None,
            name: None,
            extensions: Extensions::new(),
            extras: None,
        }
    }

    /// Size in bytes of a single component.
    pub fn component_size(&self) -> usize {
        self.component_type.byte_size()
    }

    /// Number of components per element.
    pub fn component_count(&self) -> usize {
        self.accessor_type.component_count()
    }

    /// Size in bytes of one element, including matrix column padding.
    pub fn element_size(&self) -> usize {
        self.accessor_type.element_byte_size(self.component_type)
    }

    /// Total byte size of all elements when tightly packed.
    pub fn byte_size(&self) -> usize {
        self.count * self.element_size()
    }
}

/// Sparse storage of accessor values that deviate from their base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sparse {
    /// Number of deviating elements.
    pub count: usize,
    /// Location of the deviating indices.
    pub indices: SparseIndices,
    /// Location of the deviating values.
    pub values: SparseValues,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<serde_json::Value>,
}

/// Indices of the elements a sparse accessor overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseIndices {
    /// Buffer view holding the indices.
    pub buffer_view: usize,
    /// Byte offset within the buffer view.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub byte_offset: usize,
    /// Index encoding (unsigned only).
    pub component_type: ComponentType,
}

/// Replacement values of a sparse accessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseValues {
    /// Buffer view holding the values.
    pub buffer_view: usize,
    /// Byte offset within the buffer view.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub byte_offset: usize,
}

/// Intended GPU binding of a buffer view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BufferTarget {
    /// Vertex attributes (34962).
    ArrayBuffer,
    /// Vertex indices (34963).
    ElementArrayBuffer,
}

impl TryFrom<u32> for BufferTarget {
    type Error = String;

    fn try_from(code: u32) -> std::result::Result<Self, Self::Error> {
        match code {
            34962 => Ok(BufferTarget::ArrayBuffer),
            34963 => Ok(BufferTarget::ElementArrayBuffer),
            other => Err(format!("unknown buffer view target {}", other)),
        }
    }
}

impl From<BufferTarget> for u32 {
    fn from(value: BufferTarget) -> Self {
        match value {
            BufferTarget::ArrayBuffer => 34962,
            BufferTarget::ElementArrayBuffer => 34963,
        }
    }
}

/// A view into a buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    /// Buffer index.
    pub buffer: usize,
    /// Byte offset into buffer.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub byte_offset: usize,
    /// Byte length.
    pub byte_length: usize,
    /// Byte stride for vertex data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_stride: Option<usize>,
    /// Usage hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<BufferTarget>,
    /// Buffer view name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<serde_json::Value>,
}

impl BufferView {
    /// Create a view over `[byte_offset, byte_offset + byte_length)` of a buffer.
    pub fn new(buffer: usize, byte_offset: usize, byte_length: usize) -> Self {
        Self {
            buffer,
            byte_offset,
            byte_length,
            byte_stride: None,
            target: None,
            name: None,
            extensions: Extensions::new(),
            extras: None,
        }
    }
}

/// A buffer containing binary data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    /// Byte length.
    pub byte_length: usize,
    /// URI (data URI or external file). Only present while reading or writing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Buffer name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<serde_json::Value>,
}

/// A PBR material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    /// Material name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// PBR metallic-roughness.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pbr_metallic_roughness: Option<PbrMetallicRoughness>,
    /// Normal texture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_texture: Option<NormalTextureInfo>,
    /// Occlusion texture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occlusion_texture: Option<OcclusionTextureInfo>,
    /// Emissive texture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emissive_texture: Option<TextureInfo>,
    /// Emissive factor.
    #[serde(default = "default_emissive_factor")]
    pub emissive_factor: [f32; 3],
    /// Alpha mode ("OPAQUE", "MASK", "BLEND").
    #[serde(default = "default_alpha_mode")]
    pub alpha_mode: String,
    /// Alpha cutoff for MASK mode.
    #[serde(default = "default_alpha_cutoff")]
    pub alpha_cutoff: f32,
    /// Double-sided rendering.
    #[serde(default)]
    pub double_sided: bool,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<serde_json::Value>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            pbr_metallic_roughness: None,
            normal_texture: None,
            occlusion_texture: None,
            emissive_texture: None,
            emissive_factor: default_emissive_factor(),
            alpha_mode: default_alpha_mode(),
            alpha_cutoff: default_alpha_cutoff(),
            double_sided: false,
            extensions: Extensions::new(),
            extras: None,
        }
    }
}

fn default_emissive_factor() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}

fn default_alpha_mode() -> String {
    "OPAQUE".to_string()
}

fn default_alpha_cutoff() -> f32 {
    0.5
}

/// PBR metallic-roughness properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PbrMetallicRoughness {
    /// Base color factor.
    #[serde(default = "default_base_color_factor")]
    pub base_color_factor: [f32; 4],
    /// Base color texture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_color_texture: Option<TextureInfo>,
    /// Metallic factor.
    #[serde(default = "default_factor_one")]
    pub metallic_factor: f32,
    /// Roughness factor.
    #[serde(default = "default_factor_one")]
    pub roughness_factor: f32,
    /// Metallic-roughness texture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metallic_roughness_texture: Option<TextureInfo>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
}

impl Default for PbrMetallicRoughness {
    fn default() -> Self {
        Self {
            base_color_factor: default_base_color_factor(),
            base_color_texture: None,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            metallic_roughness_texture: None,
            extensions: Extensions::new(),
        }
    }
}

fn default_base_color_factor() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

fn default_factor_one() -> f32 {
    1.0
}

/// Texture reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureInfo {
    /// Texture index.
    pub index: usize,
    /// Texture coordinate set.
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub tex_coord: u32,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
}

/// Normal texture reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalTextureInfo {
    /// Texture index.
    pub index: usize,
    /// Texture coordinate set.
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub tex_coord: u32,
    /// Normal scale.
    #[serde(default = "default_factor_one")]
    pub scale: f32,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
}

/// Occlusion texture reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcclusionTextureInfo {
    /// Texture index.
    pub index: usize,
    /// Texture coordinate set.
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub tex_coord: u32,
    /// Occlusion strength.
    #[serde(default = "default_factor_one")]
    pub strength: f32,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
}

/// A texture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    /// Sampler index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampler: Option<usize>,
    /// Image source index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<usize>,
    /// Texture name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<serde_json::Value>,
}

/// An image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// URI (data URI or external file). Only present while reading or writing,
    /// or when the bytes were not retained on read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// MIME type. Required when the image lives in a buffer view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Buffer view index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_view: Option<usize>,
    /// Image name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<serde_json::Value>,
}

/// A texture sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sampler {
    /// Magnification filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mag_filter: Option<u32>,
    /// Minification filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_filter: Option<u32>,
    /// S (U) wrap mode.
    #[serde(default = "default_wrap_mode")]
    pub wrap_s: u32,
    /// T (V) wrap mode.
    #[serde(default = "default_wrap_mode")]
    pub wrap_t: u32,
    /// Sampler name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            mag_filter: None,
            min_filter: None,
            wrap_s: default_wrap_mode(),
            wrap_t: default_wrap_mode(),
            name: None,
            extensions: Extensions::new(),
        }
    }
}

fn default_wrap_mode() -> u32 {
    10497 // REPEAT
}

/// An animation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    /// Animation name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Animation channels.
    #[serde(default)]
    pub channels: Vec<AnimationChannel>,
    /// Animation samplers.
    #[serde(default)]
    pub samplers: Vec<AnimationSampler>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<serde_json::Value>,
}

/// An animation channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationChannel {
    /// Sampler index.
    pub sampler: usize,
    /// Target.
    pub target: AnimationTarget,
}

/// Animation target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationTarget {
    /// Node index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<usize>,
    /// Target path ("translation", "rotation", "scale", "weights").
    pub path: String,
}

/// Animation sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSampler {
    /// Input accessor (time).
    pub input: usize,
    /// Output accessor (values).
    pub output: usize,
    /// Interpolation ("LINEAR", "STEP", "CUBICSPLINE").
    #[serde(default = "default_interpolation")]
    pub interpolation: String,
}

fn default_interpolation() -> String {
    "LINEAR".to_string()
}

/// A skin for skeletal animation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skin {
    /// Skin name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Inverse bind matrices accessor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inverse_bind_matrices: Option<usize>,
    /// Skeleton root node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<usize>,
    /// Joint node indices.
    #[serde(default)]
    pub joints: Vec<usize>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
}

/// A camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    /// Camera name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Camera type ("perspective" or "orthographic").
    #[serde(rename = "type")]
    pub camera_type: String,
    /// Perspective camera properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perspective: Option<PerspectiveCamera>,
    /// Orthographic camera properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orthographic: Option<OrthographicCamera>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
}

/// Perspective camera properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerspectiveCamera {
    /// Aspect ratio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f32>,
    /// Vertical FOV in radians.
    pub yfov: f32,
    /// Near clipping plane.
    pub znear: f32,
    /// Far clipping plane.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zfar: Option<f32>,
}

/// Orthographic camera properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrthographicCamera {
    /// Horizontal magnification.
    pub xmag: f32,
    /// Vertical magnification.
    pub ymag: f32,
    /// Near clipping plane.
    pub znear: f32,
    /// Far clipping plane.
    pub zfar: f32,
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

fn is_zero_u32(value: &u32) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accessor() {
        let json = r#"{
            "bufferView": 2,
            "componentType": 5123,
            "count": 36,
            "type": "SCALAR",
            "sparse": {
                "count": 2,
                "indices": {"bufferView": 3, "componentType": 5121},
                "values": {"bufferView": 4, "byteOffset": 8}
            }
        }"#;
        let accessor: Accessor = serde_json::from_str(json).unwrap();
        assert_eq!(accessor.buffer_view, Some(2));
        assert_eq!(accessor.component_type, ComponentType::UnsignedShort);
        assert_eq!(accessor.accessor_type, AccessorType::Scalar);
        assert_eq!(accessor.byte_size(), 72);

        let sparse = accessor.sparse.unwrap();
        assert_eq!(sparse.indices.component_type, ComponentType::UnsignedByte);
        assert_eq!(sparse.values.byte_offset, 8);
    }

    #[test]
    fn test_unknown_component_type_is_rejected() {
        let json = r#"{"componentType": 5124, "count": 1, "type": "SCALAR"}"#;
        assert!(serde_json::from_str::<Accessor>(json).is_err());
    }

    #[test]
    fn test_buffer_view_defaults_are_omitted() {
        let mut view = BufferView::new(0, 0, 16);
        view.target = Some(BufferTarget::ElementArrayBuffer);
        let json = serde_json::to_string(&view).unwrap();
        assert_eq!(json, r#"{"buffer":0,"byteLength":16,"target":34963}"#);
    }

    #[test]
    fn test_primitive_defaults() {
        let prim: Primitive = serde_json::from_str(r#"{"attributes": {"POSITION": 0}}"#).unwrap();
        assert_eq!(prim.mode, MODE_TRIANGLES);
        assert!(prim.targets.is_empty());
    }

    #[test]
    fn test_extensions_preserved_in_order() {
        let json = r#"{
            "asset": {"version": "2.0"},
            "extensionsUsed": ["B_ext", "A_ext"],
            "extensions": {"B_ext": {"x": 1}, "A_ext": {}}
        }"#;
        let root: Root = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = root.extensions.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["B_ext", "A_ext"]);
    }
}
