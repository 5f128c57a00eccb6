//! The write pipeline.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};

use super::resolver::{DirectoryResolver, FileWriter, MemoryResolver};
use super::settings::{ReadSettings, ResourceWriteMode, WriteSettings};
use super::uri::{encode_data_uri, percent_encode, MIME_OCTET_STREAM};
use super::ReadContext;
use crate::error::{GltfError, Result};
use crate::extensions::{used_extension_names, ExtensionRegistry};
use crate::glb::write_glb;
use crate::model::ModelRoot;
use crate::schema::Root;
use crate::validation::{validate_content, validate_references, ValidationMode};

/// Rewrites the serialized JSON before it is stored.
pub type JsonPostprocessor = Box<dyn Fn(String) -> String + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Gltf,
    Glb,
}

/// Everything needed to store a [`ModelRoot`] and its resources.
pub struct WriteContext<'a> {
    writer: &'a mut dyn FileWriter,
    settings: WriteSettings,
    registry: ExtensionRegistry,
    no_clone_watchdog: bool,
    postprocessor: Option<JsonPostprocessor>,
}

impl<'a> WriteContext<'a> {
    /// Store files through `writer` with default settings.
    pub fn new(writer: &'a mut dyn FileWriter) -> Self {
        Self {
            writer,
            settings: WriteSettings::default(),
            registry: ExtensionRegistry::default(),
            no_clone_watchdog: false,
            postprocessor: None,
        }
    }

    /// Replace the settings.
    pub fn with_settings(mut self, settings: WriteSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the extension registry.
    pub fn with_registry(mut self, registry: ExtensionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Refuse writes that would need a private copy of the model.
    pub fn forbid_clone(mut self) -> Self {
        self.no_clone_watchdog = true;
        self
    }

    /// Install a hook that rewrites the JSON after serialization.
    pub fn with_json_postprocessor(
        mut self,
        hook: impl Fn(String) -> String + Send + Sync + 'static,
    ) -> Self {
        self.postprocessor = Some(Box::new(hook));
        self
    }

    /// The active settings.
    pub fn settings(&self) -> &WriteSettings {
        &self.settings
    }

    /// Write `model` as `name` (a `.gltf` file) plus its satellite files.
    pub fn write_gltf(&mut self, name: &str, model: &ModelRoot) -> Result<()> {
        self.write(name, model, Container::Gltf)
    }

    /// Write `model` as the GLB container `name`.
    pub fn write_glb(&mut self, name: &str, model: &ModelRoot) -> Result<()> {
        self.write(name, model, Container::Glb)
    }

    fn needs_mutation(&self, model: &ModelRoot, container: Container) -> bool {
        let has_memory_images = (0..model.image_count()).any(|i| model.image(i).is_some());
        let has_many_buffers = model.buffer_count() > 1;
        match container {
            Container::Glb => has_memory_images || has_many_buffers,
            Container::Gltf => {
                (self.settings.merge_buffers && has_many_buffers)
                    || (self.settings.image_write_mode == ResourceWriteMode::BufferView
                        && has_memory_images)
            }
        }
    }

    /// A merged private copy of `model`, or `None` when it can be written as is.
    fn prepare(&self, model: &ModelRoot, container: Container) -> Result<Option<ModelRoot>> {
        if !self.needs_mutation(model, container) {
            return Ok(None);
        }
        if self.no_clone_watchdog {
            return Err(GltfError::contract(
                "writing needs a private copy of the model but cloning is forbidden",
            ));
        }

        let mut copy = model.deep_clone_with(&self.registry)?;
        let internalize = container == Container::Glb
            || self.settings.image_write_mode == ResourceWriteMode::BufferView;
        if internalize {
            copy.merge_images()?;
        }
        if container == Container::Glb || self.settings.merge_buffers {
            copy.merge_buffers_with_limit(self.settings.buffers_max_size)?;
        }
        Ok(Some(copy))
    }

    fn validate(&self, model: &ModelRoot, document: &Root) -> Result<()> {
        if self.settings.validation == ValidationMode::Skip {
            debug!("write validation skipped");
            return Ok(());
        }
        validate_references(document, &self.registry).into_result()?;
        validate_content(model).into_result()
    }

    fn write(&mut self, name: &str, model: &ModelRoot, container: Container) -> Result<()> {
        let prepared = self.prepare(model, container)?;
        let model = prepared.as_ref().unwrap_or(model);

        let mut document = model.document().clone();
        let mut declared = used_extension_names(&document);
        for required in &document.extensions_required {
            if !declared.contains(required) {
                declared.push(required.clone());
            }
        }
        document.extensions_used = declared;

        self.validate(model, &document)?;

        let base = base_name(name);
        let mut satellites = Vec::new();
        let bin = self.assign_buffer_uris(&base, model, &mut document, container, &mut satellites)?;
        self.assign_image_uris(&base, model, &mut document, &mut satellites)?;

        let json = if self.settings.json_indented {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        let json = match &self.postprocessor {
            Some(hook) => hook(json),
            None => json,
        };

        for (uri, bytes) in &satellites {
            self.writer.write(uri, bytes)?;
        }
        let uri = percent_encode(name);
        match container {
            Container::Gltf => self.writer.write(&uri, json.as_bytes())?,
            Container::Glb => {
                let glb = write_glb(json.as_bytes(), bin)?;
                self.writer.write(&uri, &glb)?;
            }
        }

        info!(
            name,
            satellites = satellites.len(),
            buffers = document.buffers.len(),
            "model written"
        );
        Ok(())
    }

    /// Set buffer URIs on the serialization copy. Returns the GLB BIN content.
    fn assign_buffer_uris<'m>(
        &self,
        base: &str,
        model: &'m ModelRoot,
        document: &mut Root,
        container: Container,
        satellites: &mut Vec<(String, &'m [u8])>,
    ) -> Result<Option<&'m [u8]>> {
        let mut bin = None;
        let count = document.buffers.len();
        for (i, buffer) in document.buffers.iter_mut().enumerate() {
            let bytes = model.buffer_bytes(i)?;
            if container == Container::Glb && i == 0 {
                buffer.uri = None;
                bin = Some(bytes);
            } else if self.settings.embed_buffers {
                buffer.uri = Some(encode_data_uri(MIME_OCTET_STREAM, bytes));
            } else {
                let uri = percent_encode(&satellite_name(base, i, count, "bin"));
                buffer.uri = Some(uri.clone());
                satellites.push((uri, bytes));
            }
        }
        Ok(bin)
    }

    /// Set image URIs on the serialization copy.
    fn assign_image_uris<'m>(
        &self,
        base: &str,
        model: &'m ModelRoot,
        document: &mut Root,
        satellites: &mut Vec<(String, &'m [u8])>,
    ) -> Result<()> {
        let mut taken: HashSet<String> = satellites.iter().map(|(uri, _)| uri.clone()).collect();
        let count = document.images.len();
        for (i, image) in document.images.iter_mut().enumerate() {
            let Some(content) = model.image(i) else {
                if image.buffer_view.is_none() {
                    return Err(GltfError::contract(format!(
                        "images[{}] has no content to write",
                        i
                    )));
                }
                continue;
            };
            image.mime_type = content.format().map(|f| f.mime_type().to_string());
            if self.settings.image_write_mode == ResourceWriteMode::EmbeddedBase64 {
                image.uri = Some(encode_data_uri(content.mime_type(), content.bytes()));
                continue;
            }
            let mut uri = percent_encode(&satellite_name(base, i, count, content.file_extension()));
            if !taken.insert(uri.clone()) {
                uri = percent_encode(&format!("{}_image_{}.{}", base, i, content.file_extension()));
                taken.insert(uri.clone());
            }
            image.uri = Some(uri.clone());
            satellites.push((uri, content.bytes()));
        }
        Ok(())
    }
}

fn base_name(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("model")
        .to_string()
}

/// `{base}_{index}.{ext}`, or `{base}.{ext}` for a single resource.
fn satellite_name(base: &str, index: usize, count: usize, extension: &str) -> String {
    if count == 1 {
        format!("{}.{}", base, extension)
    } else {
        format!("{}_{}.{}", base, index, extension)
    }
}

impl ModelRoot {
    /// Independent copy of the model, made by a write and read round-trip
    /// in memory.
    pub fn deep_clone(&self) -> Result<ModelRoot> {
        self.deep_clone_with(&ExtensionRegistry::default())
    }

    pub(crate) fn deep_clone_with(&self, registry: &ExtensionRegistry) -> Result<ModelRoot> {
        const NAME: &str = "clone.gltf";
        let mut resolver = MemoryResolver::new();
        let settings = WriteSettings::new()
            .with_validation(ValidationMode::Skip)
            .with_merge_buffers(false)
            .with_image_write_mode(ResourceWriteMode::SatelliteFile);
        WriteContext::new(&mut resolver)
            .with_settings(settings)
            .with_registry(registry.clone())
            .write_gltf(NAME, self)?;
        ReadContext::new(&resolver)
            .with_settings(ReadSettings::new().with_validation(ValidationMode::Skip))
            .with_registry(registry.clone())
            .read_model(NAME)
    }

    /// Save as a GLB container.
    pub fn save_glb(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save(path.as_ref(), WriteSettings::default(), Container::Glb)
    }

    /// Save as a `.gltf` document with satellite files next to it.
    pub fn save_gltf(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save(path.as_ref(), WriteSettings::default(), Container::Gltf)
    }

    /// Save as a `.gltf` document with explicit settings.
    pub fn save_gltf_with(&self, path: impl AsRef<Path>, settings: WriteSettings) -> Result<()> {
        self.save(path.as_ref(), settings, Container::Gltf)
    }

    fn save(&self, path: &Path, settings: WriteSettings, container: Container) -> Result<()> {
        let (mut resolver, name) = DirectoryResolver::for_file(path)?;
        let mut context = WriteContext::new(&mut resolver).with_settings(settings);
        match container {
            Container::Gltf => context.write_gltf(&name, self),
            Container::Glb => context.write_glb(&name, self),
        }
    }

    /// Encode as GLB bytes. Buffers beyond the BIN chunk are embedded.
    pub fn write_glb_bytes(&self) -> Result<Vec<u8>> {
        const NAME: &str = "model.glb";
        let mut resolver = MemoryResolver::new();
        WriteContext::new(&mut resolver)
            .with_settings(WriteSettings::new().embedded())
            .write_glb(NAME, self)?;
        resolver
            .get(NAME)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| GltfError::contract("GLB output was not produced"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::model::MemoryImage;
    use crate::schema::{Mesh, Node, Primitive, Scene};
    use glam::Vec3;

    fn triangle() -> ModelRoot {
        let mut model = ModelRoot::new();
        let position = model
            .create_vec3_accessor(&[Vec3::ZERO, Vec3::X, Vec3::Y])
            .unwrap();
        let indices = model.create_index_accessor(&[0, 1, 2]).unwrap();
        let mut primitive = Primitive::default();
        primitive.attributes.insert("POSITION".to_string(), position);
        primitive.indices = Some(indices);
        let mesh = model.create_mesh(Mesh {
            primitives: vec![primitive],
            ..Mesh::default()
        });
        let node = model.create_node(Node {
            mesh: Some(mesh),
            ..Node::default()
        });
        model.create_scene(Scene {
            nodes: vec![node],
            ..Scene::default()
        });
        model
    }

    fn png() -> Vec<u8> {
        vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0]
    }

    #[test]
    fn test_gltf_satellites_are_named_by_base() {
        let model = triangle();
        let mut resolver = MemoryResolver::new();
        WriteContext::new(&mut resolver)
            .write_gltf("scene.gltf", &model)
            .unwrap();

        let uris: Vec<&str> = resolver.uris().collect();
        assert_eq!(uris, vec!["scene.bin", "scene.gltf"]);
        assert!(model.document().buffers.iter().all(|b| b.uri.is_none()));
    }

    #[test]
    fn test_unmerged_satellites_are_indexed() {
        let model = triangle();
        let mut resolver = MemoryResolver::new();
        WriteContext::new(&mut resolver)
            .with_settings(WriteSettings::new().with_merge_buffers(false))
            .write_gltf("scene.gltf", &model)
            .unwrap();
        assert!(resolver.get("scene_0.bin").is_some());
        assert!(resolver.get("scene_1.bin").is_some());
    }

    #[test]
    fn test_forbidden_clone_is_contract_error() {
        let model = triangle();
        let mut resolver = MemoryResolver::new();
        let err = WriteContext::new(&mut resolver)
            .forbid_clone()
            .write_glb("scene.glb", &model)
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Contract);
    }

    #[test]
    fn test_glb_bytes_roundtrip() {
        let model = triangle();
        let bytes = model.write_glb_bytes().unwrap();
        let back = ModelRoot::parse_glb(&bytes).unwrap();
        assert_eq!(back.buffer_count(), 1);
        assert_eq!(back.accessor_vec3s(0).unwrap(), vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert_eq!(back.accessor_indices(1).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_embedded_images_use_data_uris() {
        let mut model = ModelRoot::new();
        model.create_image(MemoryImage::new(png()));
        let mut resolver = MemoryResolver::new();
        WriteContext::new(&mut resolver)
            .with_settings(WriteSettings::new().embedded())
            .write_gltf("img.gltf", &model)
            .unwrap();

        let json = String::from_utf8(resolver.get("img.gltf").unwrap().to_vec()).unwrap();
        assert!(json.contains("data:image/png;base64,"));
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn test_glb_internalizes_images() {
        let mut model = ModelRoot::new();
        model.create_image(MemoryImage::new(png()));
        let bytes = model.write_glb_bytes().unwrap();

        let back = ModelRoot::parse_glb(&bytes).unwrap();
        assert!(back.image(0).is_none());
        assert_eq!(back.document().images[0].mime_type.as_deref(), Some("image/png"));
        assert_eq!(back.image_bytes(0).unwrap(), &png()[..]);
        assert!(model.image(0).is_some());
    }

    #[test]
    fn test_postprocessor_sees_output() {
        let model = ModelRoot::new();
        let mut resolver = MemoryResolver::new();
        WriteContext::new(&mut resolver)
            .with_json_postprocessor(|json| json.replace("seed-gltf", "custom"))
            .write_gltf("a.gltf", &model)
            .unwrap();
        let json = String::from_utf8(resolver.get("a.gltf").unwrap().to_vec()).unwrap();
        assert!(json.contains("custom"));
    }

    #[test]
    fn test_missing_image_content_is_contract_error() {
        let mut model = ModelRoot::new();
        model.document_mut().images.push(crate::schema::Image::default());
        model.images.push(None);
        let mut resolver = MemoryResolver::new();
        let err = WriteContext::new(&mut resolver)
            .with_settings(WriteSettings::new().with_validation(ValidationMode::Skip))
            .write_gltf("a.gltf", &model)
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Contract);
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let model = triangle();
        let mut copy = model.deep_clone().unwrap();
        copy.buffer_bytes_mut(0).unwrap()[0] = 0xFF;
        assert_eq!(model.buffer_bytes(0).unwrap()[0], 0);
        assert_eq!(copy.document().accessors, model.document().accessors);
    }
}
