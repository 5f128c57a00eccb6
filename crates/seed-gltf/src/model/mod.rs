//! The in-memory glTF model.
//!
//! [`ModelRoot`] pairs the JSON document with the binary content it refers
//! to. Buffer bytes and image bytes live in parallel lists indexed like the
//! document's `buffers` and `images`; URIs are only populated transiently
//! while reading or writing.

pub mod buffers;
pub mod images;

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use smallvec::SmallVec;
use tracing::trace;

pub use buffers::BufferData;
pub use images::{ImageFormat, MemoryImage};

use crate::error::{GltfError, Result};
use crate::memory::{
    AccessorArray, AccessorType, ComponentType, Element, ElementArray, IntegerArray,
    MemoryAccessInfo, MemoryAccessor, SparseArray,
};
use crate::schema::{Accessor, BufferTarget, Image, Mesh, Node, Root, Scene};

/// Name written to `asset.generator` for models created from scratch.
pub const GENERATOR: &str = concat!("seed-gltf ", env!("CARGO_PKG_VERSION"));

type Bounds = SmallVec<[f64; 16]>;

const EMPTY: &[u8] = &[];

/// A glTF document together with its binary content.
#[derive(Debug)]
pub struct ModelRoot {
    pub(crate) document: Root,
    pub(crate) buffers: Vec<BufferData>,
    pub(crate) images: Vec<Option<MemoryImage>>,
}

impl Default for ModelRoot {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRoot {
    /// Create an empty model.
    pub fn new() -> Self {
        let mut document = Root::default();
        document.asset.generator = Some(GENERATOR.to_string());
        Self {
            document,
            buffers: Vec::new(),
            images: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        document: Root,
        buffers: Vec<BufferData>,
        images: Vec<Option<MemoryImage>>,
    ) -> Self {
        Self {
            document,
            buffers,
            images,
        }
    }

    /// The JSON document.
    pub fn document(&self) -> &Root {
        &self.document
    }

    /// Mutable access to the JSON document.
    ///
    /// Structural edits are not checked until the model is validated or written.
    pub fn document_mut(&mut self) -> &mut Root {
        &mut self.document
    }

    /// Accessor `index`.
    pub fn accessor(&self, index: usize) -> Result<&Accessor> {
        self.document
            .accessors
            .get(index)
            .ok_or(GltfError::OutOfRange {
                index,
                count: self.document.accessors.len(),
            })
    }

    /// Layout of accessor `index`'s dense storage and the bytes it lives in.
    ///
    /// Fails for accessors without a buffer view.
    pub fn accessor_memory(&self, index: usize) -> Result<MemoryAccessor<&[u8]>> {
        let (bytes, info) = self.dense_layout(index)?;
        Ok(MemoryAccessor::new(bytes, info))
    }

    fn dense_layout(&self, index: usize) -> Result<(&[u8], MemoryAccessInfo)> {
        let accessor = self.accessor(index)?;
        let view_index = accessor.buffer_view.ok_or_else(|| {
            GltfError::contract(format!("accessors[{}] has no buffer view", index))
        })?;
        let bytes = self.view_bytes(view_index)?;
        let stride = self
            .document
            .buffer_views
            .get(view_index)
            .and_then(|view| view.byte_stride)
            .unwrap_or(0);
        let info = MemoryAccessInfo {
            byte_offset: accessor.byte_offset,
            count: accessor.count,
            byte_stride: stride,
            accessor_type: accessor.accessor_type,
            component_type: accessor.component_type,
            normalized: accessor.normalized,
        };
        Ok((bytes, info))
    }

    /// Typed values of accessor `index`, sparse overlay included.
    pub fn accessor_array<T: Element>(&self, index: usize) -> Result<AccessorArray<&[u8], T>> {
        let normalized = self.accessor(index)?.normalized;
        self.accessor_array_with(index, normalized)
    }

    fn accessor_array_with<T: Element>(
        &self,
        index: usize,
        normalized: bool,
    ) -> Result<AccessorArray<&[u8], T>> {
        let accessor = self.accessor(index)?;
        if !T::accepts(accessor.accessor_type) {
            return Err(GltfError::type_mismatch(T::NAME, accessor.accessor_type));
        }

        let base = match accessor.buffer_view {
            Some(_) => {
                let (bytes, info) = self.dense_layout(index)?;
                let info = MemoryAccessInfo { normalized, ..info };
                Some(MemoryAccessor::new(bytes, info).as_array::<T>()?)
            }
            None => None,
        };

        match (&accessor.sparse, base) {
            (None, Some(base)) => Ok(AccessorArray::Dense(base)),
            (None, None) => {
                // No storage at all: every element is zero.
                let indices = IntegerArray::new(EMPTY, 0, 0, 0, ComponentType::UnsignedInt)?;
                let values =
                    ElementArray::new(EMPTY, 0, 0, 0, accessor.component_type, normalized)?;
                Ok(AccessorArray::Sparse(SparseArray::new(
                    None,
                    &indices,
                    values,
                    accessor.count,
                )?))
            }
            (Some(sparse), base) => {
                let indices = IntegerArray::new(
                    self.view_bytes(sparse.indices.buffer_view)?,
                    sparse.indices.byte_offset,
                    sparse.count,
                    0,
                    sparse.indices.component_type,
                )?;
                let values = ElementArray::new(
                    self.view_bytes(sparse.values.buffer_view)?,
                    sparse.values.byte_offset,
                    sparse.count,
                    0,
                    accessor.component_type,
                    normalized,
                )?;
                Ok(AccessorArray::Sparse(SparseArray::new(
                    base,
                    &indices,
                    values,
                    accessor.count,
                )?))
            }
        }
    }

    /// Writable typed view over accessor `index`.
    ///
    /// The owning buffer is isolated first. Sparse accessors are refused.
    pub fn accessor_array_mut<T: Element>(
        &mut self,
        index: usize,
    ) -> Result<ElementArray<&mut [u8], T>> {
        let accessor = self.accessor(index)?;
        if accessor.sparse.is_some() {
            return Err(GltfError::contract(
                "writing into a sparse accessor is not supported",
            ));
        }
        if !T::accepts(accessor.accessor_type) {
            return Err(GltfError::type_mismatch(T::NAME, accessor.accessor_type));
        }
        let view_index = accessor.buffer_view.ok_or_else(|| {
            GltfError::contract(format!("accessors[{}] has no buffer view", index))
        })?;
        let (byte_offset, count, component_type, normalized) = (
            accessor.byte_offset,
            accessor.count,
            accessor.component_type,
            accessor.normalized,
        );
        let stride = self
            .document
            .buffer_views
            .get(view_index)
            .and_then(|view| view.byte_stride)
            .unwrap_or(0);
        let bytes = self.view_bytes_mut(view_index)?;
        ElementArray::new(bytes, byte_offset, count, stride, component_type, normalized)
    }

    /// Values of a SCALAR accessor.
    pub fn accessor_scalars(&self, index: usize) -> Result<Vec<f32>> {
        Ok(self.accessor_array::<f32>(index)?.to_vec())
    }

    /// Values of a VEC2 accessor.
    pub fn accessor_vec2s(&self, index: usize) -> Result<Vec<Vec2>> {
        Ok(self.accessor_array::<Vec2>(index)?.to_vec())
    }

    /// Values of a VEC3 accessor.
    pub fn accessor_vec3s(&self, index: usize) -> Result<Vec<Vec3>> {
        Ok(self.accessor_array::<Vec3>(index)?.to_vec())
    }

    /// Values of a VEC4 accessor.
    pub fn accessor_vec4s(&self, index: usize) -> Result<Vec<Vec4>> {
        Ok(self.accessor_array::<Vec4>(index)?.to_vec())
    }

    /// Values of a VEC4 accessor read as rotations.
    pub fn accessor_quats(&self, index: usize) -> Result<Vec<Quat>> {
        Ok(self.accessor_array::<Quat>(index)?.to_vec())
    }

    /// Values of a MAT4 accessor.
    pub fn accessor_mat4s(&self, index: usize) -> Result<Vec<Mat4>> {
        Ok(self.accessor_array::<Mat4>(index)?.to_vec())
    }

    /// Exact integer values of an unsigned SCALAR accessor, sparse overlay included.
    pub fn accessor_indices(&self, index: usize) -> Result<Vec<u32>> {
        let accessor = self.accessor(index)?;
        let mut values = match accessor.buffer_view {
            Some(_) => self.accessor_memory(index)?.as_integer_array()?.to_vec(),
            None => {
                if !accessor.component_type.is_unsigned_integer() {
                    return Err(GltfError::type_mismatch(
                        "unsigned integer",
                        accessor.component_type,
                    ));
                }
                vec![0; accessor.count]
            }
        };

        if let Some(sparse) = &accessor.sparse {
            let positions = IntegerArray::new(
                self.view_bytes(sparse.indices.buffer_view)?,
                sparse.indices.byte_offset,
                sparse.count,
                0,
                sparse.indices.component_type,
            )?;
            let replacements = IntegerArray::new(
                self.view_bytes(sparse.values.buffer_view)?,
                sparse.values.byte_offset,
                sparse.count,
                0,
                accessor.component_type,
            )?;
            for (position, value) in positions.iter().zip(replacements.iter()) {
                let slot = values
                    .get_mut(position as usize)
                    .ok_or(GltfError::OutOfRange {
                        index: position as usize,
                        count: accessor.count,
                    })?;
                *slot = value;
            }
        }
        Ok(values)
    }

    /// Recompute `min` and `max` of accessor `index` from its content.
    ///
    /// Bounds are taken over raw component values, before normalization.
    pub fn update_bounds(&mut self, index: usize) -> Result<()> {
        let accessor_type = self.accessor(index)?.accessor_type;
        let bounds = match accessor_type {
            AccessorType::Scalar => self.component_bounds::<f32>(index)?,
            AccessorType::Vec2 => self.component_bounds::<Vec2>(index)?,
            AccessorType::Vec3 => self.component_bounds::<Vec3>(index)?,
            AccessorType::Vec4 => self.component_bounds::<Vec4>(index)?,
            AccessorType::Mat2 => self.component_bounds::<glam::Mat2>(index)?,
            AccessorType::Mat3 => self.component_bounds::<glam::Mat3>(index)?,
            AccessorType::Mat4 => self.component_bounds::<Mat4>(index)?,
        };

        let accessor = &mut self.document.accessors[index];
        match bounds {
            Some((min, max)) => {
                accessor.min = Some(min.into_vec());
                accessor.max = Some(max.into_vec());
            }
            None => {
                accessor.min = None;
                accessor.max = None;
            }
        }
        trace!(accessor = index, "updated bounds");
        Ok(())
    }

    /// Recompute bounds of every accessor.
    pub fn update_all_bounds(&mut self) -> Result<()> {
        for index in 0..self.document.accessors.len() {
            self.update_bounds(index)?;
        }
        Ok(())
    }

    fn component_bounds<T: Element>(&self, index: usize) -> Result<Option<(Bounds, Bounds)>> {
        let array = self.accessor_array_with::<T>(index, false)?;
        let mut components = [0.0f32; 16];
        let mut bounds: Option<(Bounds, Bounds)> = None;
        for i in 0..array.len() {
            array.get(i)?.to_components(&mut components);
            let values = &components[..T::component_count()];
            if let Some((min, max)) = bounds.as_mut() {
                for (c, &v) in values.iter().enumerate() {
                    min[c] = min[c].min(v as f64);
                    max[c] = max[c].max(v as f64);
                }
            } else {
                let first: Bounds = values.iter().map(|&v| v as f64).collect();
                bounds = Some((first.clone(), first));
            }
        }
        Ok(bounds)
    }

    /// Append an accessor description.
    pub fn create_accessor(&mut self, accessor: Accessor) -> usize {
        self.document.accessors.push(accessor);
        self.document.accessors.len() - 1
    }

    /// Encode `values` into a new buffer and describe them with a new accessor.
    ///
    /// Bounds are computed for the new accessor.
    pub fn create_element_accessor<T: Element>(
        &mut self,
        values: &[T],
        accessor_type: AccessorType,
        component_type: ComponentType,
        normalized: bool,
        target: Option<BufferTarget>,
    ) -> Result<usize> {
        if !T::accepts(accessor_type) {
            return Err(GltfError::type_mismatch(T::NAME, accessor_type));
        }
        let element_size = accessor_type.element_byte_size(component_type);
        let mut bytes = vec![0u8; values.len() * element_size];
        ElementArray::<_, T>::new(
            &mut bytes[..],
            0,
            values.len(),
            0,
            component_type,
            normalized,
        )?
        .fill(values.iter().copied())?;

        let buffer = self.create_buffer(bytes);
        let view = self.use_buffer_view(buffer, 0, None, None, target)?;
        let mut accessor = Accessor::new(accessor_type, component_type, values.len());
        accessor.buffer_view = Some(view);
        accessor.normalized = normalized;
        let index = self.create_accessor(accessor);
        self.update_bounds(index)?;
        Ok(index)
    }

    /// New FLOAT SCALAR accessor.
    pub fn create_scalar_accessor(&mut self, values: &[f32]) -> Result<usize> {
        self.create_element_accessor(values, AccessorType::Scalar, ComponentType::Float, false, None)
    }

    /// New FLOAT VEC2 vertex accessor.
    pub fn create_vec2_accessor(&mut self, values: &[Vec2]) -> Result<usize> {
        self.create_element_accessor(
            values,
            AccessorType::Vec2,
            ComponentType::Float,
            false,
            Some(BufferTarget::ArrayBuffer),
        )
    }

    /// New FLOAT VEC3 vertex accessor.
    pub fn create_vec3_accessor(&mut self, values: &[Vec3]) -> Result<usize> {
        self.create_element_accessor(
            values,
            AccessorType::Vec3,
            ComponentType::Float,
            false,
            Some(BufferTarget::ArrayBuffer),
        )
    }

    /// New FLOAT VEC4 vertex accessor.
    pub fn create_vec4_accessor(&mut self, values: &[Vec4]) -> Result<usize> {
        self.create_element_accessor(
            values,
            AccessorType::Vec4,
            ComponentType::Float,
            false,
            Some(BufferTarget::ArrayBuffer),
        )
    }

    /// New FLOAT VEC4 accessor holding rotations.
    pub fn create_quat_accessor(&mut self, values: &[Quat]) -> Result<usize> {
        self.create_element_accessor(values, AccessorType::Vec4, ComponentType::Float, false, None)
    }

    /// New FLOAT MAT4 accessor, e.g. inverse bind matrices.
    pub fn create_mat4_accessor(&mut self, values: &[Mat4]) -> Result<usize> {
        self.create_element_accessor(values, AccessorType::Mat4, ComponentType::Float, false, None)
    }

    /// New index accessor using the smallest encoding that leaves room for
    /// the primitive-restart value.
    pub fn create_index_accessor(&mut self, indices: &[u32]) -> Result<usize> {
        let max = indices.iter().copied().max().unwrap_or(0);
        let component_type = ComponentType::smallest_index_type(max);
        let mut bytes = vec![0u8; indices.len() * component_type.byte_size()];
        IntegerArray::new(&mut bytes[..], 0, indices.len(), 0, component_type)?
            .fill(indices.iter().copied())?;

        let buffer = self.create_buffer(bytes);
        let view =
            self.use_buffer_view(buffer, 0, None, None, Some(BufferTarget::ElementArrayBuffer))?;
        let mut accessor = Accessor::new(AccessorType::Scalar, component_type, indices.len());
        accessor.buffer_view = Some(view);
        let index = self.create_accessor(accessor);
        self.update_bounds(index)?;
        Ok(index)
    }

    /// Number of images.
    pub fn image_count(&self) -> usize {
        self.document.images.len()
    }

    /// In-memory content of image `index`, if it has not been moved into a buffer view.
    pub fn image(&self, index: usize) -> Option<&MemoryImage> {
        self.images.get(index).and_then(Option::as_ref)
    }

    /// Encoded bytes of image `index`, wherever they currently live.
    pub fn image_bytes(&self, index: usize) -> Result<&[u8]> {
        if let Some(image) = self.image(index) {
            return Ok(image.bytes());
        }
        let schema = self.document.images.get(index).ok_or(GltfError::OutOfRange {
            index,
            count: self.document.images.len(),
        })?;
        match schema.buffer_view {
            Some(view) => self.view_bytes(view),
            None => Err(GltfError::contract(format!(
                "images[{}] has no content",
                index
            ))),
        }
    }

    /// Add an image holding `image`.
    pub fn create_image(&mut self, image: MemoryImage) -> usize {
        self.document.images.push(Image::default());
        self.images.push(Some(image));
        self.images.len() - 1
    }

    /// Replace the content of image `index`.
    pub fn set_image(&mut self, index: usize, image: MemoryImage) -> Result<()> {
        let count = self.images.len();
        let slot = self
            .images
            .get_mut(index)
            .ok_or(GltfError::OutOfRange { index, count })?;
        *slot = Some(image);
        let schema = &mut self.document.images[index];
        schema.buffer_view = None;
        schema.uri = None;
        schema.mime_type = None;
        Ok(())
    }

    /// Append a mesh.
    pub fn create_mesh(&mut self, mesh: Mesh) -> usize {
        self.document.meshes.push(mesh);
        self.document.meshes.len() - 1
    }

    /// Append a node.
    pub fn create_node(&mut self, node: Node) -> usize {
        self.document.nodes.push(node);
        self.document.nodes.len() - 1
    }

    /// Append a scene; the first scene becomes the default one.
    pub fn create_scene(&mut self, scene: Scene) -> usize {
        self.document.scenes.push(scene);
        let index = self.document.scenes.len() - 1;
        if self.document.scene.is_none() {
            self.document.scene = Some(index);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Sparse, SparseIndices, SparseValues};

    #[test]
    fn test_model_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ModelRoot>();
    }

    #[test]
    fn test_vec3_accessor_roundtrip_and_bounds() {
        let mut model = ModelRoot::new();
        let positions = [Vec3::new(-1.0, 0.0, 2.0), Vec3::new(3.0, -4.0, 0.5)];
        let index = model.create_vec3_accessor(&positions).unwrap();

        assert_eq!(model.accessor_vec3s(index).unwrap(), positions.to_vec());
        let accessor = model.accessor(index).unwrap();
        assert_eq!(accessor.min, Some(vec![-1.0, -4.0, 0.5]));
        assert_eq!(accessor.max, Some(vec![3.0, 0.0, 2.0]));
        assert!(matches!(
            model.accessor_scalars(index),
            Err(GltfError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_index_accessor_picks_small_encoding() {
        let mut model = ModelRoot::new();
        let index = model.create_index_accessor(&[0, 1, 2, 2, 1, 3]).unwrap();
        assert_eq!(
            model.accessor(index).unwrap().component_type,
            ComponentType::UnsignedByte
        );
        assert_eq!(model.accessor_indices(index).unwrap(), vec![0, 1, 2, 2, 1, 3]);

        let wide = model.create_index_accessor(&[0, 300]).unwrap();
        assert_eq!(
            model.accessor(wide).unwrap().component_type,
            ComponentType::UnsignedShort
        );
    }

    #[test]
    fn test_sparse_accessor_without_view() {
        let mut model = ModelRoot::new();
        let buffer = model.create_buffer(
            [2u8, 0, 0, 0]
                .into_iter()
                .chain(9.5f32.to_le_bytes())
                .collect(),
        );
        let indices_view = model.use_buffer_view(buffer, 0, Some(1), None, None).unwrap();
        let values_view = model.use_buffer_view(buffer, 4, Some(4), None, None).unwrap();

        let mut accessor = Accessor::new(AccessorType::Scalar, ComponentType::Float, 4);
        accessor.sparse = Some(Sparse {
            count: 1,
            indices: SparseIndices {
                buffer_view: indices_view,
                byte_offset: 0,
                component_type: ComponentType::UnsignedByte,
            },
            values: SparseValues {
                buffer_view: values_view,
                byte_offset: 0,
            },
            extensions: Default::default(),
            extras: None,
        });
        let index = model.create_accessor(accessor);

        assert_eq!(model.accessor_scalars(index).unwrap(), vec![0.0, 0.0, 9.5, 0.0]);
        model.update_bounds(index).unwrap();
        assert_eq!(model.accessor(index).unwrap().max, Some(vec![9.5]));
        assert!(matches!(
            model.accessor_array_mut::<f32>(index),
            Err(GltfError::Contract(_))
        ));
    }

    #[test]
    fn test_accessor_without_storage_reads_zero() {
        let mut model = ModelRoot::new();
        let index = model.create_accessor(Accessor::new(
            AccessorType::Vec2,
            ComponentType::Float,
            3,
        ));
        assert_eq!(model.accessor_vec2s(index).unwrap(), vec![Vec2::ZERO; 3]);
    }

    #[test]
    fn test_accessor_array_mut_writes_through() {
        let mut model = ModelRoot::new();
        let index = model.create_scalar_accessor(&[1.0, 2.0]).unwrap();
        model.accessor_array_mut::<f32>(index).unwrap().set(1, 7.0).unwrap();
        assert_eq!(model.accessor_scalars(index).unwrap(), vec![1.0, 7.0]);
    }

    #[test]
    fn test_images_move_into_views() {
        let mut model = ModelRoot::new();
        let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2];
        let image = model.create_image(MemoryImage::new(png.clone()));

        model.merge_images().unwrap();
        assert!(model.image(image).is_none());
        assert_eq!(model.image_bytes(image).unwrap(), &png[..]);
        let schema = &model.document().images[image];
        assert_eq!(schema.mime_type.as_deref(), Some("image/png"));
        assert!(schema.buffer_view.is_some());
    }

    #[test]
    fn test_first_scene_becomes_default() {
        let mut model = ModelRoot::new();
        let node = model.create_node(Node::default());
        let scene = model.create_scene(Scene {
            nodes: vec![node],
            ..Scene::default()
        });
        model.create_scene(Scene::default());
        assert_eq!(model.document().scene, Some(scene));
    }
}
