//! Sparse overlays and the unified accessor array.

use super::array::{Element, ElementArray, IntegerArray};
use crate::error::{GltfError, Result};

/// A logical array equal to a base array (or zero) except at listed indices.
#[derive(Debug, Clone)]
pub struct SparseArray<B, T> {
    base: Option<ElementArray<B, T>>,
    indices: Vec<u32>,
    values: ElementArray<B, T>,
    count: usize,
}

impl<B: AsRef<[u8]>, T: Element> SparseArray<B, T> {
    /// Compose a sparse overlay.
    ///
    /// `indices` must be strictly increasing, below `count`, and as long as
    /// `values`. When `base` is present it must hold `count` elements.
    pub fn new<I: AsRef<[u8]>>(
        base: Option<ElementArray<B, T>>,
        indices: &IntegerArray<I>,
        values: ElementArray<B, T>,
        count: usize,
    ) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(GltfError::content(
                "sparse",
                format!(
                    "{} indices but {} values",
                    indices.len(),
                    values.len()
                ),
            ));
        }
        if let Some(base) = &base {
            if base.len() != count {
                return Err(GltfError::content(
                    "sparse",
                    format!("base has {} elements, expected {}", base.len(), count),
                ));
            }
        }

        let indices = indices.to_vec();
        check_sparse_indices(&indices, count)?;

        Ok(Self {
            base,
            indices,
            values,
            count,
        })
    }

    /// Logical number of elements.
    pub fn len(&self) -> usize {
        self.count
    }

    /// True if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The overridden positions, ascending.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Decode logical element `index`.
    pub fn get(&self, index: usize) -> Result<T> {
        if index >= self.count {
            return Err(GltfError::OutOfRange {
                index,
                count: self.count,
            });
        }

        match self.indices.binary_search(&(index as u32)) {
            Ok(position) => self.values.get(position),
            Err(_) => match &self.base {
                Some(base) => base.get(index),
                None => Ok(zero::<T>()),
            },
        }
    }

    /// Iterate over all logical elements.
    ///
    /// Walks the index list alongside the positions instead of searching.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let mut next = 0usize;
        (0..self.count).map(move |i| {
            if next < self.indices.len() && self.indices[next] as usize == i {
                next += 1;
                self.values.get(next - 1).unwrap_or_else(|_| zero::<T>())
            } else {
                match &self.base {
                    Some(base) => base.get(i).unwrap_or_else(|_| zero::<T>()),
                    None => zero::<T>(),
                }
            }
        })
    }

    /// Decode every logical element into a vector.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Writing through a sparse overlay would need the index list to grow,
    /// which this layer does not do.
    pub fn set(&mut self, _index: usize, _value: T) -> Result<()> {
        Err(GltfError::contract(
            "writing into a sparse accessor is not supported",
        ))
    }
}

/// Verify sparse indices are strictly increasing and below `count`.
pub fn check_sparse_indices(indices: &[u32], count: usize) -> Result<()> {
    for (position, window) in indices.windows(2).enumerate() {
        if window[1] <= window[0] {
            return Err(GltfError::content(
                "sparse",
                format!(
                    "indices must strictly increase: {} follows {} at position {}",
                    window[1],
                    window[0],
                    position + 1
                ),
            ));
        }
    }
    if let Some(&last) = indices.last() {
        if last as usize >= count {
            return Err(GltfError::content(
                "sparse",
                format!("index {} is not below count {}", last, count),
            ));
        }
    }
    Ok(())
}

fn zero<T: Element>() -> T {
    T::from_components(&[0.0; 16][..T::component_count()])
}

/// An accessor's values: either a plain strided view or a sparse overlay.
#[derive(Debug, Clone)]
pub enum AccessorArray<B, T> {
    /// Values read straight from a buffer view.
    Dense(ElementArray<B, T>),
    /// Values reconstructed from a sparse descriptor.
    Sparse(SparseArray<B, T>),
}

impl<B: AsRef<[u8]>, T: Element> AccessorArray<B, T> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            AccessorArray::Dense(array) => array.len(),
            AccessorArray::Sparse(array) => array.len(),
        }
    }

    /// True if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when backed by a sparse overlay.
    pub fn is_sparse(&self) -> bool {
        matches!(self, AccessorArray::Sparse(_))
    }

    /// Decode element `index`.
    pub fn get(&self, index: usize) -> Result<T> {
        match self {
            AccessorArray::Dense(array) => array.get(index),
            AccessorArray::Sparse(array) => array.get(index),
        }
    }

    /// Iterate over all logical elements without collecting them.
    pub fn iter(&self) -> Box<dyn Iterator<Item = T> + '_> {
        match self {
            AccessorArray::Dense(array) => Box::new(array.iter()),
            AccessorArray::Sparse(array) => Box::new(array.iter()),
        }
    }

    /// Decode every element into a vector.
    pub fn to_vec(&self) -> Vec<T> {
        match self {
            AccessorArray::Dense(array) => array.to_vec(),
            AccessorArray::Sparse(array) => array.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::encoding::ComponentType;
    use glam::{Quat, Vec3};

    fn floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    #[test]
    fn test_sparse_without_base() {
        let values = floats(&[1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
        let index_bytes: Vec<u8> = [1u16, 3].iter().flat_map(|i| i.to_le_bytes()).collect();

        let indices =
            IntegerArray::new(&index_bytes[..], 0, 2, 0, ComponentType::UnsignedShort).unwrap();
        let values = ElementArray::<&[u8], Vec3>::new(&values[..], 0, 2, 0, ComponentType::Float, false)
            .unwrap();

        let sparse = SparseArray::new(None, &indices, values, 5).unwrap();
        assert_eq!(
            sparse.to_vec(),
            vec![Vec3::ZERO, Vec3::ONE, Vec3::ZERO, Vec3::splat(2.0), Vec3::ZERO]
        );
        assert_eq!(sparse.get(3).unwrap(), Vec3::splat(2.0));
        assert!(sparse.get(5).is_err());
    }

    #[test]
    fn test_sparse_over_base() {
        let base = floats(&[10.0, 11.0, 12.0, 13.0]);
        let values = floats(&[-1.0]);
        let index_bytes = [2u8];

        let base = ElementArray::<&[u8], f32>::new(&base[..], 0, 4, 0, ComponentType::Float, false)
            .unwrap();
        let values = ElementArray::new(&values[..], 0, 1, 0, ComponentType::Float, false).unwrap();
        let indices =
            IntegerArray::new(&index_bytes[..], 0, 1, 0, ComponentType::UnsignedByte).unwrap();

        let mut sparse = SparseArray::new(Some(base), &indices, values, 4).unwrap();
        assert_eq!(sparse.to_vec(), vec![10.0, 11.0, -1.0, 13.0]);
        assert!(matches!(sparse.set(0, 1.0), Err(GltfError::Contract(_))));
    }

    #[test]
    fn test_sparse_zero_quaternion_is_all_zero() {
        let values = floats(&[0.0, 0.0, 0.0, 1.0]);
        let index_bytes = [0u8];
        let indices =
            IntegerArray::new(&index_bytes[..], 0, 1, 0, ComponentType::UnsignedByte).unwrap();
        let values = ElementArray::<&[u8], Quat>::new(&values[..], 0, 1, 0, ComponentType::Float, false)
            .unwrap();
        let sparse = SparseArray::new(None, &indices, values, 2).unwrap();
        assert_eq!(sparse.get(0).unwrap(), Quat::IDENTITY);
        assert_eq!(sparse.get(1).unwrap(), Quat::from_xyzw(0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_sparse_indices_rules() {
        assert!(check_sparse_indices(&[0, 2, 5], 6).is_ok());
        assert!(check_sparse_indices(&[0, 2, 2], 6).is_err());
        assert!(check_sparse_indices(&[3, 1], 6).is_err());
        assert!(check_sparse_indices(&[0, 6], 6).is_err());
        assert!(check_sparse_indices(&[], 0).is_ok());
    }
}
