//! Numeric encodings and element shapes.
//!
//! An accessor's bytes are described by a component type (the numeric
//! encoding of a single number) and an accessor type (how many numbers make
//! one element). The codecs in this module are picked once per array so the
//! per-element decode is a plain function pointer call.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GltfError, Result};

/// Numeric encoding of a single component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ComponentType {
    /// Signed 8-bit integer (5120).
    Byte,
    /// Unsigned 8-bit integer (5121).
    UnsignedByte,
    /// Signed 16-bit integer (5122).
    Short,
    /// Unsigned 16-bit integer (5123).
    UnsignedShort,
    /// Unsigned 32-bit integer (5125).
    UnsignedInt,
    /// 32-bit IEEE float (5126).
    Float,
}

impl ComponentType {
    /// The numeric code used in glTF JSON.
    pub const fn code(self) -> u32 {
        match self {
            ComponentType::Byte => 5120,
            ComponentType::UnsignedByte => 5121,
            ComponentType::Short => 5122,
            ComponentType::UnsignedShort => 5123,
            ComponentType::UnsignedInt => 5125,
            ComponentType::Float => 5126,
        }
    }

    /// Size of one component in bytes.
    pub const fn byte_size(self) -> usize {
        match self {
            ComponentType::Byte | ComponentType::UnsignedByte => 1,
            ComponentType::Short | ComponentType::UnsignedShort => 2,
            ComponentType::UnsignedInt | ComponentType::Float => 4,
        }
    }

    /// True for every integer encoding.
    pub const fn is_integer(self) -> bool {
        !matches!(self, ComponentType::Float)
    }

    /// True for the signed integer encodings.
    pub const fn is_signed_integer(self) -> bool {
        matches!(self, ComponentType::Byte | ComponentType::Short)
    }

    /// True for the encodings allowed in index and sparse-index arrays.
    pub const fn is_unsigned_integer(self) -> bool {
        matches!(
            self,
            ComponentType::UnsignedByte | ComponentType::UnsignedShort | ComponentType::UnsignedInt
        )
    }

    /// Largest value an unsigned encoding can hold; doubles as the
    /// primitive-restart sentinel for index arrays.
    pub const fn max_unsigned(self) -> Option<u32> {
        match self {
            ComponentType::UnsignedByte => Some(u8::MAX as u32),
            ComponentType::UnsignedShort => Some(u16::MAX as u32),
            ComponentType::UnsignedInt => Some(u32::MAX),
            _ => None,
        }
    }

    /// Smallest unsigned encoding able to hold `max_value`.
    pub fn smallest_index_type(max_value: u32) -> Self {
        if max_value < u8::MAX as u32 {
            ComponentType::UnsignedByte
        } else if max_value < u16::MAX as u32 {
            ComponentType::UnsignedShort
        } else {
            ComponentType::UnsignedInt
        }
    }
}

impl TryFrom<u32> for ComponentType {
    type Error = String;

    fn try_from(code: u32) -> std::result::Result<Self, Self::Error> {
        match code {
            5120 => Ok(ComponentType::Byte),
            5121 => Ok(ComponentType::UnsignedByte),
            5122 => Ok(ComponentType::Short),
            5123 => Ok(ComponentType::UnsignedShort),
            5125 => Ok(ComponentType::UnsignedInt),
            5126 => Ok(ComponentType::Float),
            other => Err(format!("unknown component type {}", other)),
        }
    }
}

impl From<ComponentType> for u32 {
    fn from(value: ComponentType) -> Self {
        value.code()
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentType::Byte => "BYTE",
            ComponentType::UnsignedByte => "UNSIGNED_BYTE",
            ComponentType::Short => "SHORT",
            ComponentType::UnsignedShort => "UNSIGNED_SHORT",
            ComponentType::UnsignedInt => "UNSIGNED_INT",
            ComponentType::Float => "FLOAT",
        };
        f.write_str(name)
    }
}

/// Shape of one accessor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessorType {
    /// One component.
    #[serde(rename = "SCALAR")]
    Scalar,
    /// Two components.
    #[serde(rename = "VEC2")]
    Vec2,
    /// Three components.
    #[serde(rename = "VEC3")]
    Vec3,
    /// Four components.
    #[serde(rename = "VEC4")]
    Vec4,
    /// 2x2 column-major matrix.
    #[serde(rename = "MAT2")]
    Mat2,
    /// 3x3 column-major matrix.
    #[serde(rename = "MAT3")]
    Mat3,
    /// 4x4 column-major matrix.
    #[serde(rename = "MAT4")]
    Mat4,
}

impl AccessorType {
    /// Number of components per element.
    pub const fn component_count(self) -> usize {
        match self {
            AccessorType::Scalar => 1,
            AccessorType::Vec2 => 2,
            AccessorType::Vec3 => 3,
            AccessorType::Vec4 | AccessorType::Mat2 => 4,
            AccessorType::Mat3 => 9,
            AccessorType::Mat4 => 16,
        }
    }

    /// Number of columns; vectors and scalars count as a single column.
    pub const fn columns(self) -> usize {
        match self {
            AccessorType::Mat2 => 2,
            AccessorType::Mat3 => 3,
            AccessorType::Mat4 => 4,
            _ => 1,
        }
    }

    /// True for the matrix shapes.
    pub const fn is_matrix(self) -> bool {
        matches!(self, AccessorType::Mat2 | AccessorType::Mat3 | AccessorType::Mat4)
    }

    /// Size in bytes of one element, including the 4-byte column alignment
    /// matrices require for small encodings (MAT3 of bytes takes 12 bytes).
    pub const fn element_byte_size(self, component_type: ComponentType) -> usize {
        let size = component_type.byte_size();
        if self.is_matrix() {
            let rows = self.component_count() / self.columns();
            let column = align4(rows * size);
            column * self.columns()
        } else {
            self.component_count() * size
        }
    }
}

impl fmt::Display for AccessorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessorType::Scalar => "SCALAR",
            AccessorType::Vec2 => "VEC2",
            AccessorType::Vec3 => "VEC3",
            AccessorType::Vec4 => "VEC4",
            AccessorType::Mat2 => "MAT2",
            AccessorType::Mat3 => "MAT3",
            AccessorType::Mat4 => "MAT4",
        };
        f.write_str(name)
    }
}

/// Round a byte count up to the next multiple of 4.
pub const fn align4(value: usize) -> usize {
    (value + 3) & !3
}

/// Float read/write pair for one `(encoding, normalized)` combination.
#[derive(Clone, Copy)]
pub struct ComponentCodec {
    component_type: ComponentType,
    normalized: bool,
    read: fn(&[u8]) -> f32,
    write: fn(&mut [u8], f32),
}

impl fmt::Debug for ComponentCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentCodec")
            .field("component_type", &self.component_type)
            .field("normalized", &self.normalized)
            .finish()
    }
}

impl ComponentCodec {
    /// Select the codec for an encoding.
    ///
    /// The normalized flag is ignored for floats.
    pub fn new(component_type: ComponentType, normalized: bool) -> Self {
        let (read, write): (fn(&[u8]) -> f32, fn(&mut [u8], f32)) =
            match (component_type, normalized) {
                (ComponentType::Float, _) => (read_f32, write_f32),
                (ComponentType::Byte, false) => (read_i8, write_i8),
                (ComponentType::Byte, true) => (read_i8_norm, write_i8_norm),
                (ComponentType::UnsignedByte, false) => (read_u8, write_u8),
                (ComponentType::UnsignedByte, true) => (read_u8_norm, write_u8_norm),
                (ComponentType::Short, false) => (read_i16, write_i16),
                (ComponentType::Short, true) => (read_i16_norm, write_i16_norm),
                (ComponentType::UnsignedShort, false) => (read_u16, write_u16),
                (ComponentType::UnsignedShort, true) => (read_u16_norm, write_u16_norm),
                (ComponentType::UnsignedInt, false) => (read_u32, write_u32),
                (ComponentType::UnsignedInt, true) => (read_u32_norm, write_u32_norm),
            };

        Self {
            component_type,
            normalized: normalized && component_type.is_integer(),
            read,
            write,
        }
    }

    /// The encoding this codec handles.
    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    /// Whether integer values are mapped to the unit range.
    pub fn normalized(&self) -> bool {
        self.normalized
    }

    /// Component size in bytes.
    pub fn byte_size(&self) -> usize {
        self.component_type.byte_size()
    }

    /// Decode the component starting at `bytes[0]`.
    #[inline]
    pub fn read(&self, bytes: &[u8]) -> f32 {
        (self.read)(bytes)
    }

    /// Encode a component into `bytes[0..byte_size]`.
    #[inline]
    pub fn write(&self, bytes: &mut [u8], value: f32) {
        (self.write)(bytes, value)
    }
}

/// Exact integer read/write pair for unsigned index encodings.
#[derive(Clone, Copy)]
pub struct IntegerCodec {
    component_type: ComponentType,
    read: fn(&[u8]) -> u32,
    write: fn(&mut [u8], u32),
}

impl fmt::Debug for IntegerCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegerCodec")
            .field("component_type", &self.component_type)
            .finish()
    }
}

impl IntegerCodec {
    /// Select the codec for an unsigned encoding.
    pub fn new(component_type: ComponentType) -> Result<Self> {
        let (read, write): (fn(&[u8]) -> u32, fn(&mut [u8], u32)) = match component_type {
            ComponentType::UnsignedByte => (read_index_u8, write_index_u8),
            ComponentType::UnsignedShort => (read_index_u16, write_index_u16),
            ComponentType::UnsignedInt => (read_index_u32, write_index_u32),
            other => {
                return Err(GltfError::type_mismatch("unsigned integer encoding", other));
            }
        };

        Ok(Self {
            component_type,
            read,
            write,
        })
    }

    /// The encoding this codec handles.
    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    /// Component size in bytes.
    pub fn byte_size(&self) -> usize {
        self.component_type.byte_size()
    }

    /// Largest value this encoding can store.
    pub fn max_value(&self) -> u32 {
        self.component_type.max_unsigned().unwrap_or(u32::MAX)
    }

    /// Decode the integer starting at `bytes[0]`.
    #[inline]
    pub fn read(&self, bytes: &[u8]) -> u32 {
        (self.read)(bytes)
    }

    /// Encode an integer; the caller checks the range.
    #[inline]
    pub fn write(&self, bytes: &mut [u8], value: u32) {
        (self.write)(bytes, value)
    }
}

fn read_index_u8(b: &[u8]) -> u32 {
    b[0] as u32
}

fn write_index_u8(b: &mut [u8], v: u32) {
    b[0] = v as u8;
}

fn read_index_u16(b: &[u8]) -> u32 {
    u16::from_le_bytes([b[0], b[1]]) as u32
}

fn write_index_u16(b: &mut [u8], v: u32) {
    b[..2].copy_from_slice(&(v as u16).to_le_bytes());
}

fn read_index_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

fn write_index_u32(b: &mut [u8], v: u32) {
    b[..4].copy_from_slice(&v.to_le_bytes());
}

fn read_f32(b: &[u8]) -> f32 {
    f32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

fn write_f32(b: &mut [u8], v: f32) {
    b[..4].copy_from_slice(&v.to_le_bytes());
}

fn read_i8(b: &[u8]) -> f32 {
    b[0] as i8 as f32
}

fn write_i8(b: &mut [u8], v: f32) {
    b[0] = v.round().clamp(i8::MIN as f32, i8::MAX as f32) as i8 as u8;
}

fn read_i8_norm(b: &[u8]) -> f32 {
    (b[0] as i8 as f32 / i8::MAX as f32).max(-1.0)
}

fn write_i8_norm(b: &mut [u8], v: f32) {
    b[0] = (v.clamp(-1.0, 1.0) * i8::MAX as f32).round() as i8 as u8;
}

fn read_u8(b: &[u8]) -> f32 {
    b[0] as f32
}

fn write_u8(b: &mut [u8], v: f32) {
    b[0] = v.round().clamp(0.0, u8::MAX as f32) as u8;
}

fn read_u8_norm(b: &[u8]) -> f32 {
    b[0] as f32 / u8::MAX as f32
}

fn write_u8_norm(b: &mut [u8], v: f32) {
    b[0] = (v.clamp(0.0, 1.0) * u8::MAX as f32).round() as u8;
}

fn read_i16(b: &[u8]) -> f32 {
    i16::from_le_bytes([b[0], b[1]]) as f32
}

fn write_i16(b: &mut [u8], v: f32) {
    let value = v.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
    b[..2].copy_from_slice(&value.to_le_bytes());
}

fn read_i16_norm(b: &[u8]) -> f32 {
    (i16::from_le_bytes([b[0], b[1]]) as f32 / i16::MAX as f32).max(-1.0)
}

fn write_i16_norm(b: &mut [u8], v: f32) {
    let value = (v.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
    b[..2].copy_from_slice(&value.to_le_bytes());
}

fn read_u16(b: &[u8]) -> f32 {
    u16::from_le_bytes([b[0], b[1]]) as f32
}

fn write_u16(b: &mut [u8], v: f32) {
    let value = v.round().clamp(0.0, u16::MAX as f32) as u16;
    b[..2].copy_from_slice(&value.to_le_bytes());
}

fn read_u16_norm(b: &[u8]) -> f32 {
    u16::from_le_bytes([b[0], b[1]]) as f32 / u16::MAX as f32
}

fn write_u16_norm(b: &mut [u8], v: f32) {
    let value = (v.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16;
    b[..2].copy_from_slice(&value.to_le_bytes());
}

fn read_u32(b: &[u8]) -> f32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f32
}

fn write_u32(b: &mut [u8], v: f32) {
    let value = v.round().clamp(0.0, u32::MAX as f32) as u32;
    b[..4].copy_from_slice(&value.to_le_bytes());
}

fn read_u32_norm(b: &[u8]) -> f32 {
    (u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64 / u32::MAX as f64) as f32
}

fn write_u32_norm(b: &mut [u8], v: f32) {
    let value = (v.clamp(0.0, 1.0) as f64 * u32::MAX as f64).round() as u32;
    b[..4].copy_from_slice(&value.to_le_bytes());
}
