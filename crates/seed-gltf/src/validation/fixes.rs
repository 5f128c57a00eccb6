//! Repairs for fixable content violations.

use std::collections::HashSet;

use glam::{Vec3, Vec4};
use tracing::debug;

use crate::error::Result;
use crate::model::ModelRoot;

use super::ValidationResult;

/// A repair that resolves one content violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fix {
    /// Rescale a node rotation to unit length.
    NormalizeRotation {
        /// Node index.
        node: usize,
    },
    /// Rescale every normal of an accessor to unit length.
    NormalizeNormals {
        /// Accessor index.
        accessor: usize,
    },
    /// Clamp material factors into their valid ranges.
    ClampMaterialFactors {
        /// Material index.
        material: usize,
    },
    /// Recompute an accessor's `min` and `max`.
    UpdateBounds {
        /// Accessor index.
        accessor: usize,
    },
}

impl Fix {
    /// Apply the repair to `model`.
    ///
    /// Buffers touched by the repair are isolated from caller memory first.
    pub fn apply(&self, model: &mut ModelRoot) -> Result<()> {
        match *self {
            Fix::NormalizeRotation { node } => {
                if let Some(rotation) = model
                    .document_mut()
                    .nodes
                    .get_mut(node)
                    .and_then(|n| n.rotation.as_mut())
                {
                    *rotation = Vec4::from_array(*rotation)
                        .try_normalize()
                        .unwrap_or(Vec4::W)
                        .to_array();
                }
            }
            Fix::NormalizeNormals { accessor } => {
                let mut normals = model.accessor_array_mut::<Vec3>(accessor)?;
                for i in 0..normals.len() {
                    let normal = normals.get(i)?;
                    normals.set(i, normal.try_normalize().unwrap_or(Vec3::Z))?;
                }
            }
            Fix::ClampMaterialFactors { material } => {
                if let Some(material) = model.document_mut().materials.get_mut(material) {
                    if let Some(pbr) = material.pbr_metallic_roughness.as_mut() {
                        for c in &mut pbr.base_color_factor {
                            *c = c.clamp(0.0, 1.0);
                        }
                        pbr.metallic_factor = pbr.metallic_factor.clamp(0.0, 1.0);
                        pbr.roughness_factor = pbr.roughness_factor.clamp(0.0, 1.0);
                    }
                    for c in &mut material.emissive_factor {
                        *c = c.clamp(0.0, 1.0);
                    }
                    if let Some(occlusion) = material.occlusion_texture.as_mut() {
                        occlusion.strength = occlusion.strength.clamp(0.0, 1.0);
                    }
                    material.alpha_cutoff = material.alpha_cutoff.max(0.0);
                }
            }
            Fix::UpdateBounds { accessor } => model.update_bounds(accessor)?,
        }
        Ok(())
    }
}

/// Apply every distinct fix offered by `result`. Returns how many were applied.
pub fn apply_fixes(model: &mut ModelRoot, result: &ValidationResult) -> Result<usize> {
    let mut applied = HashSet::new();
    for fix in result.fixes() {
        if applied.insert(*fix) {
            debug!(?fix, "applying fix");
            fix.apply(model)?;
        }
    }
    Ok(applied.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Material, Node, PbrMetallicRoughness};
    use std::sync::Arc;

    #[test]
    fn test_normalize_rotation() {
        let mut model = ModelRoot::new();
        let node = model.create_node(Node {
            rotation: Some([0.0, 0.0, 0.0, 2.0]),
            ..Node::default()
        });
        Fix::NormalizeRotation { node }.apply(&mut model).unwrap();
        assert_eq!(model.document().nodes[node].rotation, Some([0.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_normalize_normals_isolates_caller_memory() {
        let mut model = ModelRoot::new();
        let caller: Arc<[u8]> = [0.0f32, 3.0, 4.0]
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect::<Vec<u8>>()
            .into();
        let buffer = model.use_buffer(Arc::clone(&caller));
        let view = model.use_buffer_view(buffer, 0, None, None, None).unwrap();
        let mut accessor = crate::schema::Accessor::new(
            crate::memory::AccessorType::Vec3,
            crate::memory::ComponentType::Float,
            1,
        );
        accessor.buffer_view = Some(view);
        let accessor = model.create_accessor(accessor);

        Fix::NormalizeNormals { accessor }.apply(&mut model).unwrap();
        let fixed = model.accessor_vec3s(accessor).unwrap()[0];
        assert!(fixed.abs_diff_eq(Vec3::new(0.0, 0.6, 0.8), 1e-6));
        assert_eq!(f32::from_le_bytes([caller[4], caller[5], caller[6], caller[7]]), 3.0);
    }

    #[test]
    fn test_clamp_material_factors() {
        let mut model = ModelRoot::new();
        model.document_mut().materials.push(Material {
            pbr_metallic_roughness: Some(PbrMetallicRoughness {
                base_color_factor: [1.5, 0.5, -0.2, 1.0],
                metallic_factor: 2.0,
                ..PbrMetallicRoughness::default()
            }),
            ..Material::default()
        });
        Fix::ClampMaterialFactors { material: 0 }.apply(&mut model).unwrap();
        let pbr = model.document().materials[0].pbr_metallic_roughness.as_ref().unwrap();
        assert_eq!(pbr.base_color_factor, [1.0, 0.5, 0.0, 1.0]);
        assert_eq!(pbr.metallic_factor, 1.0);
    }
}
