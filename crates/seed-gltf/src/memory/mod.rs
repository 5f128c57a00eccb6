//! Typed access to raw accessor memory.
//!
//! This layer knows nothing about the glTF document: it turns byte ranges
//! plus a layout description into arrays of scalars, vectors, quaternions and
//! matrices, and composes sparse overlays on top of them.

pub mod array;
pub mod encoding;
pub mod sparse;

pub use array::{
    Element, ElementArray, IntegerArray, Matrix2x2Array, Matrix3x3Array, Matrix4x3Array,
    Matrix4x4Array, MemoryAccessInfo, MemoryAccessor, QuaternionArray, ScalarArray, Vector2Array,
    Vector3Array, Vector4Array,
};
pub use encoding::{align4, AccessorType, ComponentCodec, ComponentType, IntegerCodec};
pub use sparse::{check_sparse_indices, AccessorArray, SparseArray};
