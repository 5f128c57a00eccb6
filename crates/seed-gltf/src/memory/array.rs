//! Strided, typed views over raw bytes.
//!
//! An [`ElementArray`] reinterprets `(bytes, offset, count, stride)` as a
//! lazily decoded sequence of one value shape. Nothing is decoded until an
//! element is requested; writes go straight back into the bytes.

use std::fmt;
use std::marker::PhantomData;

use glam::{Affine3A, Mat2, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use super::encoding::{align4, AccessorType, ComponentCodec, ComponentType, IntegerCodec};
use crate::error::{GltfError, Result};

/// Largest component count of any element (4x4 matrix).
const MAX_COMPONENTS: usize = 16;

/// A value shape that can be decoded from accessor components.
pub trait Element: Copy + Default + PartialEq + fmt::Debug {
    /// Number of columns (1 for scalars and vectors).
    const COLUMNS: usize;
    /// Number of rows (components per column).
    const ROWS: usize;
    /// Matrices are column-major and float-only.
    const IS_MATRIX: bool;
    /// Human readable name used in type mismatch errors.
    const NAME: &'static str;

    /// Whether an accessor declared with `accessor_type` can be read as this shape.
    fn accepts(accessor_type: AccessorType) -> bool;

    /// Build a value from `COLUMNS * ROWS` components in column-major order.
    fn from_components(components: &[f32]) -> Self;

    /// Write `COLUMNS * ROWS` components in column-major order.
    fn to_components(&self, out: &mut [f32]);

    /// Total number of components.
    fn component_count() -> usize {
        Self::COLUMNS * Self::ROWS
    }

    /// Byte size of one element under an encoding.
    fn byte_size(component_type: ComponentType) -> usize {
        if Self::IS_MATRIX {
            align4(Self::ROWS * component_type.byte_size()) * Self::COLUMNS
        } else {
            Self::ROWS * component_type.byte_size()
        }
    }
}

impl Element for f32 {
    const COLUMNS: usize = 1;
    const ROWS: usize = 1;
    const IS_MATRIX: bool = false;
    const NAME: &'static str = "scalar";

    fn accepts(accessor_type: AccessorType) -> bool {
        accessor_type == AccessorType::Scalar
    }

    fn from_components(c: &[f32]) -> Self {
        c[0]
    }

    fn to_components(&self, out: &mut [f32]) {
        out[0] = *self;
    }
}

impl Element for Vec2 {
    const COLUMNS: usize = 1;
    const ROWS: usize = 2;
    const IS_MATRIX: bool = false;
    const NAME: &'static str = "vector2";

    fn accepts(accessor_type: AccessorType) -> bool {
        accessor_type == AccessorType::Vec2
    }

    fn from_components(c: &[f32]) -> Self {
        Vec2::new(c[0], c[1])
    }

    fn to_components(&self, out: &mut [f32]) {
        out[..2].copy_from_slice(&self.to_array());
    }
}

impl Element for Vec3 {
    const COLUMNS: usize = 1;
    const ROWS: usize = 3;
    const IS_MATRIX: bool = false;
    const NAME: &'static str = "vector3";

    fn accepts(accessor_type: AccessorType) -> bool {
        accessor_type == AccessorType::Vec3
    }

    fn from_components(c: &[f32]) -> Self {
        Vec3::new(c[0], c[1], c[2])
    }

    fn to_components(&self, out: &mut [f32]) {
        out[..3].copy_from_slice(&self.to_array());
    }
}

impl Element for Vec4 {
    const COLUMNS: usize = 1;
    const ROWS: usize = 4;
    const IS_MATRIX: bool = false;
    const NAME: &'static str = "vector4";

    fn accepts(accessor_type: AccessorType) -> bool {
        accessor_type == AccessorType::Vec4
    }

    fn from_components(c: &[f32]) -> Self {
        Vec4::new(c[0], c[1], c[2], c[3])
    }

    fn to_components(&self, out: &mut [f32]) {
        out[..4].copy_from_slice(&self.to_array());
    }
}

impl Element for Quat {
    const COLUMNS: usize = 1;
    const ROWS: usize = 4;
    const IS_MATRIX: bool = false;
    const NAME: &'static str = "quaternion";

    fn accepts(accessor_type: AccessorType) -> bool {
        accessor_type == AccessorType::Vec4
    }

    fn from_components(c: &[f32]) -> Self {
        Quat::from_xyzw(c[0], c[1], c[2], c[3])
    }

    fn to_components(&self, out: &mut [f32]) {
        out[..4].copy_from_slice(&self.to_array());
    }
}

impl Element for Mat2 {
    const COLUMNS: usize = 2;
    const ROWS: usize = 2;
    const IS_MATRIX: bool = true;
    const NAME: &'static str = "matrix2x2";

    fn accepts(accessor_type: AccessorType) -> bool {
        accessor_type == AccessorType::Mat2
    }

    fn from_components(c: &[f32]) -> Self {
        Mat2::from_cols_slice(c)
    }

    fn to_components(&self, out: &mut [f32]) {
        out[..4].copy_from_slice(&self.to_cols_array());
    }
}

impl Element for Mat3 {
    const COLUMNS: usize = 3;
    const ROWS: usize = 3;
    const IS_MATRIX: bool = true;
    const NAME: &'static str = "matrix3x3";

    fn accepts(accessor_type: AccessorType) -> bool {
        accessor_type == AccessorType::Mat3
    }

    fn from_components(c: &[f32]) -> Self {
        Mat3::from_cols_slice(c)
    }

    fn to_components(&self, out: &mut [f32]) {
        out[..9].copy_from_slice(&self.to_cols_array());
    }
}

/// Four columns of three rows: an affine transform without the projective row.
///
/// glTF has no accessor type for this layout, so it is only reachable
/// through raw memory arrays.
impl Element for Affine3A {
    const COLUMNS: usize = 4;
    const ROWS: usize = 3;
    const IS_MATRIX: bool = true;
    const NAME: &'static str = "matrix4x3";

    fn accepts(_accessor_type: AccessorType) -> bool {
        false
    }

    fn from_components(c: &[f32]) -> Self {
        Affine3A::from_cols_slice(c)
    }

    fn to_components(&self, out: &mut [f32]) {
        out[..12].copy_from_slice(&self.to_cols_array());
    }
}

impl Element for Mat4 {
    const COLUMNS: usize = 4;
    const ROWS: usize = 4;
    const IS_MATRIX: bool = true;
    const NAME: &'static str = "matrix4x4";

    fn accepts(accessor_type: AccessorType) -> bool {
        accessor_type == AccessorType::Mat4
    }

    fn from_components(c: &[f32]) -> Self {
        Mat4::from_cols_slice(c)
    }

    fn to_components(&self, out: &mut [f32]) {
        out[..16].copy_from_slice(&self.to_cols_array());
    }
}

/// Layout of an accessor's elements inside a byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryAccessInfo {
    /// Offset of element 0 from the start of the byte range.
    pub byte_offset: usize,
    /// Number of elements.
    pub count: usize,
    /// Distance between elements; 0 means tightly packed.
    pub byte_stride: usize,
    /// Element shape.
    pub accessor_type: AccessorType,
    /// Component encoding.
    pub component_type: ComponentType,
    /// Whether integer components map to the unit range.
    pub normalized: bool,
}

impl MemoryAccessInfo {
    /// Describe a tightly packed array.
    pub fn packed(
        count: usize,
        accessor_type: AccessorType,
        component_type: ComponentType,
        normalized: bool,
    ) -> Self {
        Self {
            byte_offset: 0,
            count,
            byte_stride: 0,
            accessor_type,
            component_type,
            normalized,
        }
    }

    /// Byte size of one element.
    pub fn element_byte_size(&self) -> usize {
        self.accessor_type.element_byte_size(self.component_type)
    }

    /// Distance between consecutive elements.
    pub fn effective_stride(&self) -> usize {
        if self.byte_stride > 0 {
            self.byte_stride
        } else {
            self.element_byte_size()
        }
    }

    /// Number of bytes from `byte_offset` to the end of the last element,
    /// or `None` if that does not fit in `usize`.
    pub fn byte_span(&self) -> Option<usize> {
        if self.count == 0 {
            return Some(0);
        }
        (self.count - 1)
            .checked_mul(self.effective_stride())
            .and_then(|v| v.checked_add(self.element_byte_size()))
    }
}

/// A byte range paired with the layout of the accessor living in it.
///
/// This is the entry point from accessor metadata to typed arrays: it checks
/// that the requested shape matches the declared one before building a view.
#[derive(Debug, Clone)]
pub struct MemoryAccessor<B> {
    data: B,
    info: MemoryAccessInfo,
}

impl<B: AsRef<[u8]>> MemoryAccessor<B> {
    /// Pair a byte range with a layout.
    pub fn new(data: B, info: MemoryAccessInfo) -> Self {
        Self { data, info }
    }

    /// The layout description.
    pub fn info(&self) -> &MemoryAccessInfo {
        &self.info
    }

    /// The backing bytes.
    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// View the elements as `T`, failing when the declared shape differs.
    pub fn as_array<T: Element>(self) -> Result<ElementArray<B, T>> {
        if !T::accepts(self.info.accessor_type) {
            return Err(GltfError::type_mismatch(T::NAME, self.info.accessor_type));
        }
        ElementArray::new(
            self.data,
            self.info.byte_offset,
            self.info.count,
            self.info.byte_stride,
            self.info.component_type,
            self.info.normalized,
        )
    }

    /// View a scalar accessor as exact unsigned integers.
    pub fn as_integer_array(self) -> Result<IntegerArray<B>> {
        if self.info.accessor_type != AccessorType::Scalar {
            return Err(GltfError::type_mismatch("integer scalar", self.info.accessor_type));
        }
        IntegerArray::new(
            self.data,
            self.info.byte_offset,
            self.info.count,
            self.info.byte_stride,
            self.info.component_type,
        )
    }

    /// View as scalars.
    pub fn as_scalar_array(self) -> Result<ScalarArray<B>> {
        self.as_array()
    }

    /// View as 2D vectors.
    pub fn as_vector2_array(self) -> Result<Vector2Array<B>> {
        self.as_array()
    }

    /// View as 3D vectors.
    pub fn as_vector3_array(self) -> Result<Vector3Array<B>> {
        self.as_array()
    }

    /// View as 4D vectors.
    pub fn as_vector4_array(self) -> Result<Vector4Array<B>> {
        self.as_array()
    }

    /// View as quaternions (x, y, z, w).
    pub fn as_quaternion_array(self) -> Result<QuaternionArray<B>> {
        self.as_array()
    }

    /// View as 4x4 matrices.
    pub fn as_matrix4x4_array(self) -> Result<Matrix4x4Array<B>> {
        self.as_array()
    }
}

/// Lazily decoded strided array of one element shape.
#[derive(Clone)]
pub struct ElementArray<B, T> {
    data: B,
    byte_offset: usize,
    count: usize,
    stride: usize,
    column_stride: usize,
    codec: ComponentCodec,
    _marker: PhantomData<T>,
}

/// Scalar view.
pub type ScalarArray<B> = ElementArray<B, f32>;
/// 2D vector view.
pub type Vector2Array<B> = ElementArray<B, Vec2>;
/// 3D vector view.
pub type Vector3Array<B> = ElementArray<B, Vec3>;
/// 4D vector view.
pub type Vector4Array<B> = ElementArray<B, Vec4>;
/// Quaternion view.
pub type QuaternionArray<B> = ElementArray<B, Quat>;
/// 2x2 matrix view.
pub type Matrix2x2Array<B> = ElementArray<B, Mat2>;
/// 3x3 matrix view.
pub type Matrix3x3Array<B> = ElementArray<B, Mat3>;
/// 4x3 matrix view.
pub type Matrix4x3Array<B> = ElementArray<B, Affine3A>;
/// 4x4 matrix view.
pub type Matrix4x4Array<B> = ElementArray<B, Mat4>;

impl<B, T> fmt::Debug for ElementArray<B, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementArray")
            .field("byte_offset", &self.byte_offset)
            .field("count", &self.count)
            .field("stride", &self.stride)
            .field("codec", &self.codec)
            .finish()
    }
}

impl<B: AsRef<[u8]>, T: Element> ElementArray<B, T> {
    /// Create a view over `data`.
    ///
    /// `byte_stride` of 0 means elements are tightly packed. The whole range
    /// `[byte_offset, byte_offset + span)` must lie inside `data`.
    pub fn new(
        data: B,
        byte_offset: usize,
        count: usize,
        byte_stride: usize,
        component_type: ComponentType,
        normalized: bool,
    ) -> Result<Self> {
        if T::IS_MATRIX && component_type != ComponentType::Float {
            return Err(GltfError::type_mismatch(
                format!("{} of FLOAT", T::NAME),
                component_type,
            ));
        }

        let element_size = T::byte_size(component_type);
        if byte_stride > 0 && byte_stride < element_size {
            return Err(GltfError::Bounds(format!(
                "stride {} is smaller than the {}-byte element",
                byte_stride, element_size
            )));
        }
        let stride = if byte_stride > 0 { byte_stride } else { element_size };

        let len = data.as_ref().len();
        if count > 0 {
            let end = (count - 1)
                .checked_mul(stride)
                .and_then(|v| v.checked_add(byte_offset))
                .and_then(|v| v.checked_add(element_size));
            match end {
                Some(end) if end <= len => {}
                _ => {
                    return Err(GltfError::Bounds(format!(
                        "{} {} elements at offset {} with stride {} exceed {} bytes",
                        count,
                        T::NAME,
                        byte_offset,
                        stride,
                        len
                    )));
                }
            }
        }

        Ok(Self {
            data,
            byte_offset,
            count,
            stride,
            column_stride: align4(T::ROWS * component_type.byte_size()),
            codec: ComponentCodec::new(component_type, normalized),
            _marker: PhantomData,
        })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.count
    }

    /// True if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Distance between consecutive elements in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The component codec in use.
    pub fn codec(&self) -> &ComponentCodec {
        &self.codec
    }

    /// Byte offset of element `index` inside the backing bytes.
    pub fn element_offset(&self, index: usize) -> usize {
        self.byte_offset + index * self.stride
    }

    fn component_offset(&self, column: usize, row: usize) -> usize {
        column * self.column_stride + row * self.codec.byte_size()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.count {
            return Err(GltfError::OutOfRange {
                index,
                count: self.count,
            });
        }
        Ok(())
    }

    /// Decode element `index`.
    pub fn get(&self, index: usize) -> Result<T> {
        self.check_index(index)?;
        Ok(self.decode(index))
    }

    fn decode(&self, index: usize) -> T {
        let bytes = self.data.as_ref();
        let base = self.element_offset(index);
        let mut components = [0.0f32; MAX_COMPONENTS];
        for column in 0..T::COLUMNS {
            for row in 0..T::ROWS {
                let offset = base + self.component_offset(column, row);
                components[column * T::ROWS + row] = self.codec.read(&bytes[offset..]);
            }
        }
        T::from_components(&components[..T::component_count()])
    }

    /// Iterate over all decoded elements.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.count).map(move |i| self.decode(i))
    }

    /// Decode every element into a vector.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Release the backing storage.
    pub fn into_inner(self) -> B {
        self.data
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>, T: Element> ElementArray<B, T> {
    /// Encode `value` into element `index`.
    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        self.check_index(index)?;
        let mut components = [0.0f32; MAX_COMPONENTS];
        value.to_components(&mut components);

        let base = self.element_offset(index);
        let component_size = self.codec.byte_size();
        for column in 0..T::COLUMNS {
            for row in 0..T::ROWS {
                let offset = base + self.component_offset(column, row);
                let bytes = &mut self.data.as_mut()[offset..offset + component_size];
                self.codec.write(bytes, components[column * T::ROWS + row]);
            }
        }
        Ok(())
    }

    /// Encode consecutive values starting at element 0.
    pub fn fill<I: IntoIterator<Item = T>>(&mut self, values: I) -> Result<()> {
        for (index, value) in values.into_iter().enumerate() {
            self.set(index, value)?;
        }
        Ok(())
    }
}

/// Exact unsigned integer view, used for index buffers and sparse indices.
#[derive(Clone)]
pub struct IntegerArray<B> {
    data: B,
    byte_offset: usize,
    count: usize,
    stride: usize,
    codec: IntegerCodec,
}

impl<B> fmt::Debug for IntegerArray<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegerArray")
            .field("byte_offset", &self.byte_offset)
            .field("count", &self.count)
            .field("stride", &self.stride)
            .field("codec", &self.codec)
            .finish()
    }
}

impl<B: AsRef<[u8]>> IntegerArray<B> {
    /// Create an integer view; only unsigned encodings are accepted.
    pub fn new(
        data: B,
        byte_offset: usize,
        count: usize,
        byte_stride: usize,
        component_type: ComponentType,
    ) -> Result<Self> {
        let codec = IntegerCodec::new(component_type)?;
        let size = codec.byte_size();
        let stride = if byte_stride > 0 { byte_stride } else { size };
        if stride < size {
            return Err(GltfError::Bounds(format!(
                "stride {} is smaller than the {}-byte index",
                stride, size
            )));
        }

        let len = data.as_ref().len();
        if count > 0 {
            let end = (count - 1)
                .checked_mul(stride)
                .and_then(|v| v.checked_add(byte_offset))
                .and_then(|v| v.checked_add(size));
            if !matches!(end, Some(end) if end <= len) {
                return Err(GltfError::Bounds(format!(
                    "{} indices at offset {} with stride {} exceed {} bytes",
                    count, byte_offset, stride, len
                )));
            }
        }

        Ok(Self {
            data,
            byte_offset,
            count,
            stride,
            codec,
        })
    }

    /// Number of integers.
    pub fn len(&self) -> usize {
        self.count
    }

    /// True if there are no integers.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The encoding in use.
    pub fn component_type(&self) -> ComponentType {
        self.codec.component_type()
    }

    /// Decode integer `index`.
    pub fn get(&self, index: usize) -> Result<u32> {
        if index >= self.count {
            return Err(GltfError::OutOfRange {
                index,
                count: self.count,
            });
        }
        let offset = self.byte_offset + index * self.stride;
        Ok(self.codec.read(&self.data.as_ref()[offset..]))
    }

    /// Iterate over all integers.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        let bytes = self.data.as_ref();
        (0..self.count).map(move |i| self.codec.read(&bytes[self.byte_offset + i * self.stride..]))
    }

    /// Decode every integer into a vector.
    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> IntegerArray<B> {
    /// Encode `value` into position `index`.
    pub fn set(&mut self, index: usize, value: u32) -> Result<()> {
        if index >= self.count {
            return Err(GltfError::OutOfRange {
                index,
                count: self.count,
            });
        }
        if value > self.codec.max_value() {
            return Err(GltfError::Bounds(format!(
                "{} does not fit in {}",
                value,
                self.codec.component_type()
            )));
        }
        let offset = self.byte_offset + index * self.stride;
        let size = self.codec.byte_size();
        self.codec.write(&mut self.data.as_mut()[offset..offset + size], value);
        Ok(())
    }

    /// Encode consecutive values starting at position 0.
    pub fn fill<I: IntoIterator<Item = u32>>(&mut self, values: I) -> Result<()> {
        for (index, value) in values.into_iter().enumerate() {
            self.set(index, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats_to_bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    #[test]
    fn test_packed_vec3() {
        let bytes = floats_to_bytes(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let array = Vector3Array::new(&bytes[..], 0, 2, 0, ComponentType::Float, false).unwrap();

        assert_eq!(array.len(), 2);
        assert_eq!(array.get(0).unwrap(), Vec3::new(0.0, 1.0, 2.0));
        assert_eq!(array.get(1).unwrap(), Vec3::new(3.0, 4.0, 5.0));
        assert!(matches!(
            array.get(2),
            Err(GltfError::OutOfRange { index: 2, count: 2 })
        ));
    }

    #[test]
    fn test_interleaved_vec3_pair() {
        // Two vertices, each position then normal: stride 24.
        let bytes = floats_to_bytes(&[
            1.0, 2.0, 3.0, 0.0, 0.0, 1.0, //
            4.0, 5.0, 6.0, 0.0, 1.0, 0.0,
        ]);
        let positions = Vector3Array::new(&bytes[..], 0, 2, 24, ComponentType::Float, false).unwrap();
        let normals = Vector3Array::new(&bytes[..], 12, 2, 24, ComponentType::Float, false).unwrap();

        assert_eq!(positions.element_offset(1), 24);
        assert_eq!(normals.element_offset(1), 36);
        assert_eq!(positions.get(1).unwrap(), Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(normals.get(1).unwrap(), Vec3::Y);
        assert_eq!(normals.get(0).unwrap(), Vec3::Z);
    }

    #[test]
    fn test_normalized_u8_colors() {
        let bytes = [255u8, 0, 128, 255];
        let colors = Vector4Array::new(&bytes[..], 0, 1, 0, ComponentType::UnsignedByte, true).unwrap();
        let c = colors.get(0).unwrap();
        assert_eq!(c.x, 1.0);
        assert_eq!(c.y, 0.0);
        assert!((c.z - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.w, 1.0);
    }

    #[test]
    fn test_set_roundtrip_short() {
        let mut bytes = vec![0u8; 8];
        {
            let mut array =
                Vector2Array::new(&mut bytes[..], 0, 2, 0, ComponentType::Short, true).unwrap();
            array.set(1, Vec2::new(1.0, -1.0)).unwrap();
            assert_eq!(array.get(1).unwrap(), Vec2::new(1.0, -1.0));
            assert_eq!(array.get(0).unwrap(), Vec2::ZERO);
        }
        assert_eq!(i16::from_le_bytes([bytes[4], bytes[5]]), i16::MAX);
    }

    #[test]
    fn test_matrix_requires_float() {
        let bytes = vec![0u8; 64];
        let result = Matrix4x4Array::new(&bytes[..], 0, 1, 0, ComponentType::UnsignedByte, true);
        assert!(matches!(result, Err(GltfError::TypeMismatch { .. })));
    }

    #[test]
    fn test_matrix_column_major() {
        let values: Vec<f32> = (0..16).map(|v| v as f32).collect();
        let bytes = floats_to_bytes(&values);
        let matrices = Matrix4x4Array::new(&bytes[..], 0, 1, 0, ComponentType::Float, false).unwrap();
        let m = matrices.get(0).unwrap();
        assert_eq!(m.x_axis, Vec4::new(0.0, 1.0, 2.0, 3.0));
        assert_eq!(m.w_axis, Vec4::new(12.0, 13.0, 14.0, 15.0));

        let affine = Matrix4x3Array::new(&bytes[..48], 0, 1, 0, ComponentType::Float, false).unwrap();
        let a = affine.get(0).unwrap();
        assert_eq!(a.translation, glam::Vec3A::new(9.0, 10.0, 11.0));
    }

    #[test]
    fn test_bounds_checked_on_construction() {
        let bytes = vec![0u8; 20];
        let result = Vector3Array::new(&bytes[..], 0, 2, 0, ComponentType::Float, false);
        assert!(matches!(result, Err(GltfError::Bounds(_))));

        let result = Vector3Array::new(&bytes[..], 0, 1, 8, ComponentType::Float, false);
        assert!(matches!(result, Err(GltfError::Bounds(_))));
    }

    #[test]
    fn test_memory_accessor_type_mismatch() {
        let bytes = floats_to_bytes(&[1.0, 2.0, 3.0]);
        let info = MemoryAccessInfo::packed(3, AccessorType::Scalar, ComponentType::Float, false);

        let err = MemoryAccessor::new(&bytes[..], info).as_vector3_array().unwrap_err();
        assert!(matches!(err, GltfError::TypeMismatch { .. }));

        let scalars = MemoryAccessor::new(&bytes[..], info).as_scalar_array().unwrap();
        assert_eq!(scalars.to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_quaternion_view_of_vec4() {
        let bytes = floats_to_bytes(&[0.0, 0.0, 0.0, 1.0]);
        let info = MemoryAccessInfo::packed(1, AccessorType::Vec4, ComponentType::Float, false);
        let rotations = MemoryAccessor::new(&bytes[..], info).as_quaternion_array().unwrap();
        assert_eq!(rotations.get(0).unwrap(), Quat::IDENTITY);
    }

    #[test]
    fn test_integer_array() {
        let mut bytes = vec![0u8; 6];
        let mut indices =
            IntegerArray::new(&mut bytes[..], 0, 3, 0, ComponentType::UnsignedShort).unwrap();
        indices.fill([0, 1, 65535]).unwrap();
        assert_eq!(indices.to_vec(), vec![0, 1, 65535]);
        assert!(matches!(indices.set(0, 70_000), Err(GltfError::Bounds(_))));

        let result = IntegerArray::new(&bytes[..], 0, 1, 0, ComponentType::Float);
        assert!(matches!(result, Err(GltfError::TypeMismatch { .. })));
    }

    #[test]
    fn test_huge_counts_do_not_overflow() {
        let info = MemoryAccessInfo::packed(1 << 62, AccessorType::Vec3, ComponentType::Float, false);
        assert_eq!(info.byte_span(), None);
        let info = MemoryAccessInfo::packed(3, AccessorType::Vec3, ComponentType::Float, false);
        assert_eq!(info.byte_span(), Some(36));

        let bytes = vec![0u8; 12];
        let result = IntegerArray::new(&bytes[..], usize::MAX, 1, 0, ComponentType::UnsignedInt);
        assert!(matches!(result, Err(GltfError::Bounds(_))));
        let result = IntegerArray::new(&bytes[..], 0, 1 << 62, 0, ComponentType::UnsignedInt);
        assert!(matches!(result, Err(GltfError::Bounds(_))));
    }
}
