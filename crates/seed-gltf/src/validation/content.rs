//! Content phase: byte ranges, encodings and decoded values.
//!
//! Assumes the reference phase passed, so indices can be used directly.

use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::error::Result;
use crate::memory::{
    check_sparse_indices, AccessorType, ComponentType, Element, IntegerArray, MemoryAccessInfo,
};
use crate::model::ModelRoot;
use crate::schema::{self, Accessor, Material, Primitive};

use super::{Fix, ValidationResult, UNIT_LENGTH_TOLERANCE, WEIGHT_SUM_TOLERANCE};

const ANIMATION_PATHS: [&str; 4] = ["translation", "rotation", "scale", "weights"];
const INTERPOLATIONS: [&str; 3] = ["LINEAR", "STEP", "CUBICSPLINE"];
const ALPHA_MODES: [&str; 3] = ["OPAQUE", "MASK", "BLEND"];

fn non_finite_in<T: Element>(model: &ModelRoot, index: usize) -> Result<Option<usize>> {
    let array = model.accessor_array::<T>(index)?;
    let n = T::component_count();
    let mut components = [0.0f32; 16];
    for i in 0..array.len() {
        array.get(i)?.to_components(&mut components);
        if let Some(c) = components[..n].iter().position(|v| !v.is_finite()) {
            return Ok(Some(i * n + c));
        }
    }
    Ok(None)
}

/// Flat position of the first non-finite component of an accessor.
///
/// Elements are decoded one at a time.
fn first_non_finite(model: &ModelRoot, index: usize) -> Result<Option<usize>> {
    match model.accessor(index)?.accessor_type {
        AccessorType::Scalar => non_finite_in::<f32>(model, index),
        AccessorType::Vec2 => non_finite_in::<Vec2>(model, index),
        AccessorType::Vec3 => non_finite_in::<Vec3>(model, index),
        AccessorType::Vec4 => non_finite_in::<Vec4>(model, index),
        AccessorType::Mat2 => non_finite_in::<Mat2>(model, index),
        AccessorType::Mat3 => non_finite_in::<Mat3>(model, index),
        AccessorType::Mat4 => non_finite_in::<Mat4>(model, index),
    }
}

fn mode_accepts(mode: u32, count: usize) -> bool {
    match mode {
        schema::MODE_POINTS => true,
        schema::MODE_LINES => count % 2 == 0,
        schema::MODE_LINE_LOOP | schema::MODE_LINE_STRIP => count >= 2,
        schema::MODE_TRIANGLES => count % 3 == 0,
        schema::MODE_TRIANGLE_STRIP | schema::MODE_TRIANGLE_FAN => count >= 3,
        _ => false,
    }
}

fn in_unit_range(value: f32) -> bool {
    (0.0..=1.0).contains(&value)
}

struct ContentChecker<'a> {
    model: &'a ModelRoot,
    result: ValidationResult,
    view_ok: Vec<bool>,
    accessor_ok: Vec<bool>,
}

impl<'a> ContentChecker<'a> {
    fn buffers(&mut self) {
        let model = self.model;
        let document = model.document();
        if self.model.buffers.len() != document.buffers.len() {
            self.result.content(
                "buffers",
                format!(
                    "{} buffers declared but {} loaded",
                    document.buffers.len(),
                    self.model.buffers.len()
                ),
            );
            return;
        }
        for (i, (buffer, data)) in document.buffers.iter().zip(&self.model.buffers).enumerate() {
            if data.len() < buffer.byte_length {
                self.result.content(
                    format!("buffers[{}]", i),
                    format!(
                        "byteLength is {} but only {} bytes are present",
                        buffer.byte_length,
                        data.len()
                    ),
                );
            }
        }
    }

    fn buffer_views(&mut self) {
        let model = self.model;
        let document = model.document();
        for (i, view) in document.buffer_views.iter().enumerate() {
            let target = format!("bufferViews[{}]", i);
            let mut ok = true;
            if view.byte_length == 0 {
                self.result.content(&target, "byteLength must be at least 1");
                ok = false;
            }
            let buffer_len = document.buffers[view.buffer]
                .byte_length
                .min(self.model.buffer(view.buffer).map(|b| b.len()).unwrap_or(0));
            match view.byte_offset.checked_add(view.byte_length) {
                Some(end) if end <= buffer_len => {}
                Some(end) => {
                    self.result.content(
                        &target,
                        format!(
                            "range [{}, {}) exceeds buffer {} ({} bytes)",
                            view.byte_offset, end, view.buffer, buffer_len
                        ),
                    );
                    ok = false;
                }
                None => {
                    self.result.content(
                        &target,
                        format!(
                            "byteOffset {} plus byteLength {} overflows",
                            view.byte_offset, view.byte_length
                        ),
                    );
                    ok = false;
                }
            }
            if let Some(stride) = view.byte_stride {
                if !(4..=252).contains(&stride) || stride % 4 != 0 {
                    self.result.content(
                        &target,
                        format!("byteStride {} must be a multiple of 4 in 4..=252", stride),
                    );
                    ok = false;
                }
            }
            self.view_ok.push(ok);
        }
    }

    fn accessors(&mut self) {
        let model = self.model;
        let document = model.document();
        for (i, accessor) in document.accessors.iter().enumerate() {
            let target = format!("accessors[{}]", i);
            let ok = self.accessor_layout(&target, accessor);
            self.accessor_ok.push(ok);
            if !ok {
                continue;
            }
            // Without a buffer view or sparse values every element is zero.
            let stored = accessor.buffer_view.is_some() || accessor.sparse.is_some();
            if accessor.component_type == ComponentType::Float && stored {
                match first_non_finite(self.model, i) {
                    Ok(Some(position)) => self.result.content(
                        &target,
                        format!("component {} is not finite", position),
                    ),
                    Ok(None) => {}
                    Err(e) => self.result.content(&target, e.to_string()),
                }
            }
        }
    }

    fn accessor_layout(&mut self, target: &str, accessor: &Accessor) -> bool {
        let model = self.model;
        let document = model.document();
        let component_size = accessor.component_size();
        let element_size = accessor.element_size();
        let mut ok = true;

        if accessor.count == 0 {
            self.result.content(target, "count must be at least 1");
            ok = false;
        }
        let packed = accessor
            .count
            .checked_mul(element_size)
            .filter(|&size| size <= isize::MAX as usize);
        if packed.is_none() {
            self.result.content(
                target,
                format!(
                    "{} elements of {} bytes overflow the addressable size",
                    accessor.count, element_size
                ),
            );
            return false;
        }
        if accessor.accessor_type.is_matrix() && accessor.component_type != ComponentType::Float {
            self.result.content(
                target,
                format!("{} requires FLOAT components", accessor.accessor_type),
            );
            ok = false;
        }
        if accessor.normalized
            && matches!(
                accessor.component_type,
                ComponentType::Float | ComponentType::UnsignedInt
            )
        {
            self.result.content(
                target,
                format!("{} components cannot be normalized", accessor.component_type),
            );
            ok = false;
        }
        if accessor.byte_offset % component_size != 0 {
            self.result.content(
                target,
                format!(
                    "byteOffset {} is not a multiple of the component size {}",
                    accessor.byte_offset, component_size
                ),
            );
            ok = false;
        }
        let expected = accessor.component_count();
        for (name, bound) in [("min", &accessor.min), ("max", &accessor.max)] {
            if let Some(bound) = bound {
                if bound.len() != expected {
                    self.result.content(
                        target,
                        format!("{} has {} values, expected {}", name, bound.len(), expected),
                    );
                }
            }
        }

        if let Some(view_index) = accessor.buffer_view {
            let view = &document.buffer_views[view_index];
            if !self.view_ok[view_index] {
                return false;
            }
            if (view.byte_offset % component_size + accessor.byte_offset % component_size)
                % component_size
                != 0
            {
                self.result
                    .content(target, "data is not aligned to the component size");
                ok = false;
            }
            let stride = view.byte_stride.unwrap_or(0);
            if stride > 0 && stride < element_size {
                self.result.content(
                    target,
                    format!(
                        "byteStride {} is smaller than the {}-byte element",
                        stride, element_size
                    ),
                );
                ok = false;
            }
            let info = MemoryAccessInfo {
                byte_offset: accessor.byte_offset,
                count: accessor.count,
                byte_stride: stride,
                accessor_type: accessor.accessor_type,
                component_type: accessor.component_type,
                normalized: accessor.normalized,
            };
            let end = info
                .byte_span()
                .and_then(|span| span.checked_add(accessor.byte_offset));
            if !matches!(end, Some(end) if end <= view.byte_length) {
                self.result.content(
                    target,
                    format!(
                        "{} elements from offset {} do not fit bufferViews[{}] ({} bytes)",
                        accessor.count, accessor.byte_offset, view_index, view.byte_length
                    ),
                );
                ok = false;
            }
        }

        if let Some(sparse) = &accessor.sparse {
            ok &= self.sparse_layout(target, accessor, sparse);
        }
        ok
    }

    fn sparse_layout(&mut self, target: &str, accessor: &Accessor, sparse: &schema::Sparse) -> bool {
        let model = self.model;
        let document = model.document();
        if sparse.count == 0 || sparse.count > accessor.count {
            self.result.content(
                target,
                format!(
                    "sparse count {} must be in 1..={}",
                    sparse.count, accessor.count
                ),
            );
            return false;
        }
        if !sparse.indices.component_type.is_unsigned_integer() {
            self.result.content(
                target,
                format!(
                    "sparse indices cannot use {} components",
                    sparse.indices.component_type
                ),
            );
            return false;
        }

        let regions = [
            (
                "indices",
                sparse.indices.buffer_view,
                sparse.indices.byte_offset,
                sparse.count.checked_mul(sparse.indices.component_type.byte_size()),
            ),
            (
                "values",
                sparse.values.buffer_view,
                sparse.values.byte_offset,
                sparse.count.checked_mul(accessor.element_size()),
            ),
        ];
        for (name, view_index, offset, len) in regions {
            if !self.view_ok[view_index] {
                return false;
            }
            let view = &document.buffer_views[view_index];
            if view.byte_stride.is_some() {
                self.result.content(
                    target,
                    format!("sparse {} view must not declare byteStride", name),
                );
                return false;
            }
            let end = len.and_then(|len| len.checked_add(offset));
            if !matches!(end, Some(end) if end <= view.byte_length) {
                self.result.content(
                    target,
                    format!(
                        "sparse {} for {} entries from offset {} exceed bufferViews[{}] ({} bytes)",
                        name, sparse.count, offset, view_index, view.byte_length
                    ),
                );
                return false;
            }
        }

        let indices = self
            .model
            .view_bytes(sparse.indices.buffer_view)
            .and_then(|bytes| {
                IntegerArray::new(
                    bytes,
                    sparse.indices.byte_offset,
                    sparse.count,
                    0,
                    sparse.indices.component_type,
                )
            })
            .map(|array| array.to_vec())
            .and_then(|indices| check_sparse_indices(&indices, accessor.count));
        if let Err(e) = indices {
            self.result.content(target, e.to_string());
            return false;
        }
        true
    }

    fn nodes(&mut self) {
        let model = self.model;
        for (i, node) in model.document().nodes.iter().enumerate() {
            let target = format!("nodes[{}]", i);
            let has_trs =
                node.translation.is_some() || node.rotation.is_some() || node.scale.is_some();

            if let Some(matrix) = &node.matrix {
                if has_trs {
                    self.result
                        .content(&target, "matrix and TRS properties are mutually exclusive");
                }
                if matrix.iter().any(|v| !v.is_finite()) {
                    self.result.content(&target, "matrix is not finite");
                } else if matrix[3] != 0.0
                    || matrix[7] != 0.0
                    || matrix[11] != 0.0
                    || matrix[15] != 1.0
                {
                    self.result.content(&target, "matrix is not affine");
                }
            }
            if let Some(translation) = &node.translation {
                if translation.iter().any(|v| !v.is_finite()) {
                    self.result.content(&target, "translation is not finite");
                }
            }
            if let Some(scale) = &node.scale {
                if scale.iter().any(|v| !v.is_finite()) {
                    self.result.content(&target, "scale is not finite");
                }
            }
            if let Some(rotation) = &node.rotation {
                let rotation = Vec4::from_array(*rotation);
                if !rotation.is_finite() {
                    self.result.content(&target, "rotation is not finite");
                } else if (rotation.length() - 1.0).abs() > UNIT_LENGTH_TOLERANCE {
                    self.result.fixable(
                        &target,
                        format!("rotation length {} is not 1", rotation.length()),
                        Fix::NormalizeRotation { node: i },
                    );
                }
            }
            if let Some(weights) = &node.weights {
                if weights.iter().any(|v| !v.is_finite()) {
                    self.result.content(&target, "weights are not finite");
                }
            }
        }
    }

    fn meshes(&mut self) {
        let model = self.model;
        for (i, mesh) in model.document().meshes.iter().enumerate() {
            for (j, primitive) in mesh.primitives.iter().enumerate() {
                let target = format!("meshes[{}].primitives[{}]", i, j);
                self.primitive(&target, primitive);
            }
        }
    }

    fn primitive(&mut self, target: &str, primitive: &Primitive) {
        let model = self.model;
        let document = model.document();
        if primitive.attributes.is_empty() {
            self.result.content(target, "primitive has no attributes");
            return;
        }
        if primitive.mode > schema::MODE_TRIANGLE_FAN {
            self.result
                .content(target, format!("mode {} is not a valid draw mode", primitive.mode));
            return;
        }

        let mut vertex_count: Option<usize> = None;
        for (semantic, &index) in &primitive.attributes {
            let count = document.accessors[index].count;
            match vertex_count {
                None => vertex_count = Some(count),
                Some(expected) if expected != count => {
                    self.result.content(
                        target,
                        format!(
                            "attribute {} has {} elements, expected {}",
                            semantic, count, expected
                        ),
                    );
                    return;
                }
                _ => {}
            }
        }
        let vertex_count = vertex_count.unwrap_or(0);

        for (semantic, &index) in &primitive.attributes {
            let accessor = &document.accessors[index];
            let accessor_target = format!("accessors[{}]", index);
            match semantic.as_str() {
                "POSITION" => {
                    if accessor.accessor_type != AccessorType::Vec3
                        || accessor.component_type != ComponentType::Float
                    {
                        self.result.content(&accessor_target, "POSITION must be FLOAT VEC3");
                    } else if accessor.min.is_none() || accessor.max.is_none() {
                        self.result.fixable(
                            &accessor_target,
                            "POSITION requires min and max",
                            Fix::UpdateBounds { accessor: index },
                        );
                    }
                }
                "NORMAL" => self.normals(index, accessor),
                "TANGENT" => {
                    if accessor.accessor_type != AccessorType::Vec4 {
                        self.result.content(&accessor_target, "TANGENT must be VEC4");
                    }
                }
                _ => {}
            }
            if let Some(set) = semantic.strip_prefix("JOINTS_") {
                if !primitive.attributes.contains_key(&format!("WEIGHTS_{}", set)) {
                    self.result
                        .content(target, format!("{} has no matching WEIGHTS_{}", semantic, set));
                }
            }
        }
        self.weights(target, primitive, vertex_count);

        for (t, morph) in primitive.targets.iter().enumerate() {
            for (semantic, &index) in morph {
                if document.accessors[index].count != vertex_count {
                    self.result.content(
                        format!("{}.targets[{}]", target, t),
                        format!("{} does not match the vertex count {}", semantic, vertex_count),
                    );
                }
            }
        }

        match primitive.indices {
            Some(index) => self.indices(target, primitive.mode, index, vertex_count),
            None => {
                if !mode_accepts(primitive.mode, vertex_count) {
                    self.result.content(
                        target,
                        format!(
                            "{} vertices do not form whole primitives for mode {}",
                            vertex_count, primitive.mode
                        ),
                    );
                }
            }
        }
    }

    fn normals(&mut self, index: usize, accessor: &Accessor) {
        let target = format!("accessors[{}]", index);
        if accessor.accessor_type != AccessorType::Vec3 {
            self.result.content(&target, "NORMAL must be VEC3");
            return;
        }
        if !self.accessor_ok[index] {
            return;
        }
        let normals = match self.model.accessor_array::<Vec3>(index) {
            Ok(array) => array,
            Err(e) => {
                self.result.content(&target, e.to_string());
                return;
            }
        };
        let bad = normals
            .iter()
            .position(|n| (n.length() - 1.0).abs() > UNIT_LENGTH_TOLERANCE);
        if let Some(position) = bad {
            let message = format!("normal {} is not unit length", position);
            if accessor.sparse.is_some() {
                self.result.content(&target, message);
            } else {
                self.result
                    .fixable(&target, message, Fix::NormalizeNormals { accessor: index });
            }
        }
    }

    fn weights(&mut self, target: &str, primitive: &Primitive, vertex_count: usize) {
        let mut sums: Option<Vec<f32>> = None;
        for (semantic, &index) in &primitive.attributes {
            let Some(set) = semantic.strip_prefix("WEIGHTS_") else {
                continue;
            };
            if !primitive.attributes.contains_key(&format!("JOINTS_{}", set)) {
                self.result
                    .content(target, format!("{} has no matching JOINTS_{}", semantic, set));
            }
            if !self.accessor_ok[index] {
                return;
            }
            match self.model.accessor_array::<Vec4>(index) {
                Ok(array) => {
                    let sums = sums.get_or_insert_with(|| vec![0.0; vertex_count.min(array.len())]);
                    for (sum, weight) in sums.iter_mut().zip(array.iter()) {
                        *sum += weight.element_sum();
                    }
                }
                Err(e) => {
                    self.result.content(format!("accessors[{}]", index), e.to_string());
                    return;
                }
            }
        }
        let Some(sums) = sums else {
            return;
        };
        if let Some(vertex) = sums
            .iter()
            .position(|s| (s - 1.0).abs() > WEIGHT_SUM_TOLERANCE)
        {
            self.result.content(
                target,
                format!("weights of vertex {} sum to {}", vertex, sums[vertex]),
            );
        }
    }

    fn indices(&mut self, target: &str, mode: u32, index: usize, vertex_count: usize) {
        let model = self.model;
        let accessor = &model.document().accessors[index];
        let accessor_target = format!("accessors[{}]", index);
        if accessor.accessor_type != AccessorType::Scalar
            || !accessor.component_type.is_unsigned_integer()
        {
            self.result.content(
                &accessor_target,
                "indices must be SCALAR with an unsigned integer encoding",
            );
            return;
        }
        if !mode_accepts(mode, accessor.count) {
            self.result.content(
                target,
                format!("{} indices do not form whole primitives for mode {}", accessor.count, mode),
            );
        }
        if !self.accessor_ok[index] {
            return;
        }
        let values = match self.model.accessor_indices(index) {
            Ok(values) => values,
            Err(e) => {
                self.result.content(&accessor_target, e.to_string());
                return;
            }
        };
        let restart = accessor.component_type.max_unsigned();
        for (position, &value) in values.iter().enumerate() {
            if Some(value) == restart {
                self.result.content(
                    &accessor_target,
                    format!("index {} is the primitive restart value", position),
                );
                return;
            }
            if value as usize >= vertex_count {
                self.result.content(
                    &accessor_target,
                    format!(
                        "index {} refers to vertex {} of {}",
                        position, value, vertex_count
                    ),
                );
                return;
            }
        }
    }

    fn skins(&mut self) {
        let model = self.model;
        let document = model.document();
        for (i, skin) in document.skins.iter().enumerate() {
            if let Some(index) = skin.inverse_bind_matrices {
                let accessor = &document.accessors[index];
                if accessor.accessor_type != AccessorType::Mat4
                    || accessor.component_type != ComponentType::Float
                {
                    self.result.content(
                        format!("skins[{}]", i),
                        "inverseBindMatrices must be FLOAT MAT4",
                    );
                } else if accessor.count < skin.joints.len() {
                    self.result.content(
                        format!("skins[{}]", i),
                        format!(
                            "{} inverse bind matrices for {} joints",
                            accessor.count,
                            skin.joints.len()
                        ),
                    );
                }
            }
        }
    }

    fn animations(&mut self) {
        let model = self.model;
        let document = model.document();
        for (i, animation) in document.animations.iter().enumerate() {
            for (c, channel) in animation.channels.iter().enumerate() {
                if !ANIMATION_PATHS.contains(&channel.target.path.as_str()) {
                    self.result.content(
                        format!("animations[{}].channels[{}]", i, c),
                        format!("unknown target path {}", channel.target.path),
                    );
                }
            }
            for (s, sampler) in animation.samplers.iter().enumerate() {
                let target = format!("animations[{}].samplers[{}]", i, s);
                if !INTERPOLATIONS.contains(&sampler.interpolation.as_str()) {
                    self.result.content(
                        &target,
                        format!("unknown interpolation {}", sampler.interpolation),
                    );
                }
                let input = &document.accessors[sampler.input];
                if input.accessor_type != AccessorType::Scalar
                    || input.component_type != ComponentType::Float
                {
                    self.result.content(&target, "input must be FLOAT SCALAR");
                    continue;
                }
                let output = &document.accessors[sampler.output];
                let keys = if sampler.interpolation == "CUBICSPLINE" {
                    input.count.checked_mul(3)
                } else {
                    Some(input.count)
                };
                if !matches!(keys, Some(keys) if keys > 0 && output.count % keys == 0) {
                    self.result.content(
                        &target,
                        format!(
                            "{} output elements do not match {} keyframes",
                            output.count, input.count
                        ),
                    );
                }
                if !self.accessor_ok[sampler.input] {
                    continue;
                }
                match self.model.accessor_scalars(sampler.input) {
                    Ok(times) => {
                        if let Some(t) = times.iter().position(|&t| t < 0.0) {
                            self.result
                                .content(&target, format!("keyframe {} time is negative", t));
                        } else if let Some(t) = times.windows(2).position(|w| w[1] <= w[0]) {
                            self.result.content(
                                &target,
                                format!("keyframe {} time does not increase", t + 1),
                            );
                        }
                    }
                    Err(e) => self.result.content(&target, e.to_string()),
                }
            }
        }
    }

    fn materials(&mut self) {
        let model = self.model;
        for (i, material) in model.document().materials.iter().enumerate() {
            let target = format!("materials[{}]", i);
            if !ALPHA_MODES.contains(&material.alpha_mode.as_str()) {
                self.result
                    .content(&target, format!("unknown alphaMode {}", material.alpha_mode));
            }
            if let Some(field) = out_of_range_factor(material) {
                self.result.fixable(
                    &target,
                    format!("{} is out of range", field),
                    Fix::ClampMaterialFactors { material: i },
                );
            }
        }
    }

    fn images(&mut self) {
        let model = self.model;
        let document = model.document();
        if self.model.images.len() != document.images.len() {
            self.result.content(
                "images",
                format!(
                    "{} images declared but {} loaded",
                    document.images.len(),
                    self.model.images.len()
                ),
            );
            return;
        }
        for (i, image) in document.images.iter().enumerate() {
            let target = format!("images[{}]", i);
            match (self.model.image(i), image.buffer_view) {
                (Some(memory), _) => {
                    if memory.is_empty() {
                        self.result.content(&target, "image content is empty");
                    }
                }
                (None, Some(_)) => {
                    if image.mime_type.is_none() {
                        self.result
                            .content(&target, "image in a buffer view needs a mimeType");
                    }
                }
                // A satellite whose bytes the read hook chose not to retain.
                (None, None) if image.uri.is_some() => {}
                (None, None) => self.result.content(&target, "image has no content"),
            }
        }
    }
}

fn out_of_range_factor(material: &Material) -> Option<&'static str> {
    if let Some(pbr) = &material.pbr_metallic_roughness {
        if !pbr.base_color_factor.iter().all(|&c| in_unit_range(c)) {
            return Some("baseColorFactor");
        }
        if !in_unit_range(pbr.metallic_factor) {
            return Some("metallicFactor");
        }
        if !in_unit_range(pbr.roughness_factor) {
            return Some("roughnessFactor");
        }
    }
    if !material.emissive_factor.iter().all(|&c| in_unit_range(c)) {
        return Some("emissiveFactor");
    }
    if let Some(occlusion) = &material.occlusion_texture {
        if !in_unit_range(occlusion.strength) {
            return Some("occlusionTexture.strength");
        }
    }
    if material.alpha_cutoff < 0.0 {
        return Some("alphaCutoff");
    }
    None
}

/// Check decoded content: byte ranges, encodings, numeric domains and
/// index consistency. References must already be valid.
pub fn validate_content(model: &ModelRoot) -> ValidationResult {
    let mut checker = ContentChecker {
        model,
        result: ValidationResult::new(),
        view_ok: Vec::new(),
        accessor_ok: Vec::new(),
    };
    checker.buffers();
    if !checker.result.is_ok() {
        return checker.result;
    }
    checker.buffer_views();
    checker.accessors();
    checker.nodes();
    checker.meshes();
    checker.skins();
    checker.animations();
    checker.materials();
    checker.images();
    checker.result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Mesh, Node};
    use indexmap::IndexMap;

    fn triangle() -> (ModelRoot, usize) {
        let mut model = ModelRoot::new();
        let positions = model
            .create_vec3_accessor(&[Vec3::ZERO, Vec3::X, Vec3::Y])
            .unwrap();
        let normals = model.create_vec3_accessor(&[Vec3::Z; 3]).unwrap();
        let indices = model.create_index_accessor(&[0, 1, 2]).unwrap();
        let mut attributes = IndexMap::new();
        attributes.insert("POSITION".to_string(), positions);
        attributes.insert("NORMAL".to_string(), normals);
        model.create_mesh(Mesh {
            primitives: vec![Primitive {
                attributes,
                indices: Some(indices),
                ..Primitive::default()
            }],
            ..Mesh::default()
        });
        (model, normals)
    }

    #[test]
    fn test_valid_triangle() {
        let (model, _) = triangle();
        let result = validate_content(&model);
        assert!(result.is_ok(), "{:?}", result.errors());
    }

    #[test]
    fn test_non_unit_normals_are_fixable() {
        let (mut model, normals) = triangle();
        model
            .accessor_array_mut::<Vec3>(normals)
            .unwrap()
            .set(1, Vec3::new(0.0, 0.0, 2.0))
            .unwrap();

        let result = validate_content(&model);
        assert_eq!(result.errors().len(), 1);
        assert_eq!(
            result.errors()[0].fix,
            Some(Fix::NormalizeNormals { accessor: normals })
        );
    }

    #[test]
    fn test_index_out_of_vertex_range() {
        let (mut model, _) = triangle();
        let bad = model.create_index_accessor(&[0, 1, 3]).unwrap();
        model.document_mut().meshes[0].primitives[0].indices = Some(bad);
        let result = validate_content(&model);
        assert!(result.errors()[0].message.contains("refers to vertex 3 of 3"));
    }

    #[test]
    fn test_restart_sentinel_rejected() {
        let (mut model, _) = triangle();
        let bad = model.create_index_accessor(&[0, 1, 2]).unwrap();
        model.accessor_array_mut::<f32>(bad).unwrap().set(2, 255.0).unwrap();
        model.document_mut().meshes[0].primitives[0].indices = Some(bad);
        let result = validate_content(&model);
        assert!(result.errors()[0].message.contains("primitive restart"));
    }

    #[test]
    fn test_index_count_must_match_mode() {
        let (mut model, _) = triangle();
        let bad = model.create_index_accessor(&[0, 1, 2, 0]).unwrap();
        model.document_mut().meshes[0].primitives[0].indices = Some(bad);
        let result = validate_content(&model);
        assert!(result.errors()[0].message.contains("whole primitives"));
    }

    #[test]
    fn test_node_rules() {
        let mut model = ModelRoot::new();
        model.create_node(Node {
            matrix: Some([
                1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
            ]),
            translation: Some([1.0, 0.0, 0.0]),
            ..Node::default()
        });
        model.create_node(Node {
            rotation: Some([0.0, 0.0, 0.0, 0.5]),
            ..Node::default()
        });
        let result = validate_content(&model);
        assert_eq!(result.errors().len(), 2);
        assert!(result.errors()[0].message.contains("mutually exclusive"));
        assert_eq!(result.errors()[1].fix, Some(Fix::NormalizeRotation { node: 1 }));
    }

    #[test]
    fn test_stride_rules() {
        let mut model = ModelRoot::new();
        let buffer = model.create_buffer(vec![0u8; 64]);
        model
            .use_buffer_view(buffer, 0, Some(64), Some(6), None)
            .unwrap();
        let result = validate_content(&model);
        assert!(result.errors()[0].message.contains("byteStride 6"));
    }

    #[test]
    fn test_material_factor_is_fixable() {
        let mut model = ModelRoot::new();
        model.document_mut().materials.push(Material {
            emissive_factor: [2.0, 0.0, 0.0],
            ..Material::default()
        });
        let result = validate_content(&model);
        assert_eq!(
            result.errors()[0].fix,
            Some(Fix::ClampMaterialFactors { material: 0 })
        );
    }
}
