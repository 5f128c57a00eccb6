//! The read pipeline.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use super::resolver::{DirectoryResolver, FileReader, MemoryResolver};
use super::settings::ReadSettings;
use super::uri::{decode_buffer_data_uri, decode_data_uri, is_data_uri};
use crate::error::{GltfError, Result};
use crate::extensions::ExtensionRegistry;
use crate::glb::{is_binary_container, read_glb};
use crate::model::{BufferData, MemoryImage, ModelRoot};
use crate::schema::{Asset, Root};
use crate::validation::{check_content, validate_references};

/// Rewrites the JSON text before it is deserialized.
pub type JsonPreprocessor = Box<dyn Fn(String) -> String + Send + Sync>;

/// Decides whether the bytes of a satellite or embedded image are kept.
///
/// Receives the image index and its loaded content. Returning `false` drops
/// the bytes and leaves the image's `uri` in the document.
pub type ImageDecodeHook = Box<dyn Fn(usize, &MemoryImage) -> bool + Send + Sync>;

const BOM: char = '\u{FEFF}';

/// Everything needed to turn a document and its resources into a [`ModelRoot`].
pub struct ReadContext<'a> {
    reader: &'a dyn FileReader,
    settings: ReadSettings,
    registry: ExtensionRegistry,
    preprocessor: Option<JsonPreprocessor>,
    image_decoder: Option<ImageDecodeHook>,
}

impl<'a> ReadContext<'a> {
    /// Read resources through `reader` with default settings.
    pub fn new(reader: &'a dyn FileReader) -> Self {
        Self {
            reader,
            settings: ReadSettings::default(),
            registry: ExtensionRegistry::default(),
            preprocessor: None,
            image_decoder: None,
        }
    }

    /// Replace the settings.
    pub fn with_settings(mut self, settings: ReadSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the extension registry.
    pub fn with_registry(mut self, registry: ExtensionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Install a hook that rewrites the JSON before parsing.
    pub fn with_json_preprocessor(
        mut self,
        hook: impl Fn(String) -> String + Send + Sync + 'static,
    ) -> Self {
        self.preprocessor = Some(Box::new(hook));
        self
    }

    /// Install a hook deciding which image bytes are retained.
    pub fn with_image_decoder(
        mut self,
        hook: impl Fn(usize, &MemoryImage) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.image_decoder = Some(Box::new(hook));
        self
    }

    /// The active settings.
    pub fn settings(&self) -> &ReadSettings {
        &self.settings
    }

    /// Read the document named `uri` through the resolver.
    pub fn read_model(&self, uri: &str) -> Result<ModelRoot> {
        let bytes = self.reader.read(uri)?;
        debug!(uri, bytes = bytes.len(), "reading model");
        self.read_bytes(&bytes)
    }

    /// Read a `.gltf` or `.glb` document held in memory.
    pub fn read_bytes(&self, bytes: &[u8]) -> Result<ModelRoot> {
        if is_binary_container(&mut Cursor::new(bytes))? {
            self.read_glb(bytes)
        } else {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| GltfError::format(format!("JSON is not valid UTF-8: {}", e)))?;
            self.read_gltf(text)
        }
    }

    /// Read a GLB container.
    pub fn read_glb(&self, bytes: &[u8]) -> Result<ModelRoot> {
        let chunks = read_glb(bytes)?;
        let text = std::str::from_utf8(chunks.json)
            .map_err(|e| GltfError::format(format!("JSON chunk is not valid UTF-8: {}", e)))?;
        self.read_document(text, chunks.bin)
    }

    /// Read a `.gltf` JSON document.
    pub fn read_gltf(&self, text: &str) -> Result<ModelRoot> {
        self.read_document(text, None)
    }

    fn read_document(&self, text: &str, bin: Option<&[u8]>) -> Result<ModelRoot> {
        let text = match text.strip_prefix(BOM) {
            Some(stripped) => {
                warn!("JSON starts with a byte order mark");
                stripped
            }
            None => text,
        };
        let text = match &self.preprocessor {
            Some(hook) => hook(text.to_string()),
            None => text.to_string(),
        };

        let mut document: Root = serde_json::from_str(&text)?;
        check_version(&document.asset)?;
        validate_references(&document, &self.registry).into_result()?;

        let buffers = self.resolve_buffers(&mut document, bin)?;
        let images = self.resolve_images(&mut document)?;
        let mut model = ModelRoot::from_parts(document, buffers, images);

        check_content(&mut model, self.settings.validation)?;
        info!(
            buffers = model.buffer_count(),
            meshes = model.document().meshes.len(),
            nodes = model.document().nodes.len(),
            "model read"
        );
        Ok(model)
    }

    fn resolve_buffers(&self, document: &mut Root, bin: Option<&[u8]>) -> Result<Vec<BufferData>> {
        let mut buffers = Vec::with_capacity(document.buffers.len());
        for (i, buffer) in document.buffers.iter_mut().enumerate() {
            let data = match buffer.uri.take() {
                Some(uri) if is_data_uri(&uri) => BufferData::Owned(decode_buffer_data_uri(&uri)?),
                Some(uri) => {
                    trace!(buffer = i, %uri, "resolving satellite buffer");
                    BufferData::Shared(self.reader.read(&uri)?)
                }
                None => match bin {
                    Some(bin) if i == 0 => {
                        let len = buffer.byte_length.min(bin.len());
                        BufferData::Owned(bin[..len].to_vec())
                    }
                    _ if buffer.byte_length == 0 => BufferData::Owned(Vec::new()),
                    _ => {
                        return Err(GltfError::format(format!(
                            "buffers[{}] has no uri and no BIN chunk backs it",
                            i
                        )))
                    }
                },
            };
            buffers.push(data);
        }
        debug!(count = buffers.len(), "buffers resolved");
        Ok(buffers)
    }

    fn resolve_images(&self, document: &mut Root) -> Result<Vec<Option<MemoryImage>>> {
        let mut images = Vec::with_capacity(document.images.len());
        for (i, image) in document.images.iter_mut().enumerate() {
            let Some(uri) = image.uri.as_deref() else {
                // Buffer view images stay where they are.
                images.push(None);
                continue;
            };

            let content = if is_data_uri(uri) {
                let (mime_type, bytes) = decode_data_uri(uri)?;
                let declared = image.mime_type.as_deref().unwrap_or(&mime_type);
                MemoryImage::with_mime_type(bytes, Some(declared))
            } else {
                let bytes: Arc<[u8]> = self.reader.read(uri)?;
                let path = self
                    .reader
                    .resolve_full_path(uri)
                    .unwrap_or_else(|| uri.to_string());
                MemoryImage::with_mime_type(bytes, image.mime_type.as_deref()).with_source_path(path)
            };

            let retained = self
                .image_decoder
                .as_ref()
                .map(|hook| hook(i, &content))
                .unwrap_or(true);
            if retained {
                image.uri = None;
                image.mime_type = None;
                images.push(Some(content));
            } else {
                trace!(image = i, "image bytes not retained");
                images.push(None);
            }
        }
        Ok(images)
    }
}

fn parse_version(version: &str) -> Option<(u32, u32)> {
    let (major, minor) = version.split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

/// Accept `2.x` documents whose `minVersion`, if any, is at most 2.0.
fn check_version(asset: &Asset) -> Result<()> {
    match parse_version(&asset.version) {
        Some((2, _)) => {}
        Some(_) => {
            return Err(GltfError::format(format!(
                "unsupported glTF version {}",
                asset.version
            )))
        }
        None => {
            return Err(GltfError::format(format!(
                "malformed asset version {}",
                asset.version
            )))
        }
    }
    if let Some(min_version) = &asset.min_version {
        match parse_version(min_version) {
            Some(v) if v <= (2, 0) => {}
            _ => {
                return Err(GltfError::format(format!(
                    "document requires glTF {}",
                    min_version
                )))
            }
        }
    }
    Ok(())
}

impl ModelRoot {
    /// Load a `.gltf` or `.glb` file, resolving satellites next to it.
    pub fn load(path: impl AsRef<Path>) -> Result<ModelRoot> {
        Self::load_with(path, ReadSettings::default())
    }

    /// Load a file with explicit settings.
    pub fn load_with(path: impl AsRef<Path>, settings: ReadSettings) -> Result<ModelRoot> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            GltfError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        let (resolver, _) = DirectoryResolver::for_file(path)?;
        ReadContext::new(&resolver)
            .with_settings(settings)
            .read_bytes(&bytes)
    }

    /// Parse a self-contained GLB container.
    pub fn parse_glb(bytes: &[u8]) -> Result<ModelRoot> {
        let resolver = MemoryResolver::new();
        ReadContext::new(&resolver).read_glb(bytes)
    }

    /// Parse a self-contained `.gltf` document.
    pub fn parse_gltf(text: &str) -> Result<ModelRoot> {
        let resolver = MemoryResolver::new();
        ReadContext::new(&resolver).read_gltf(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::validation::ValidationMode;

    const MINIMAL: &str = r#"{"asset":{"version":"2.0"}}"#;

    fn embedded_triangle() -> String {
        let mut bytes = Vec::new();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let uri = crate::io::uri::encode_data_uri("application/octet-stream", &bytes);
        format!(
            r#"{{
                "asset": {{"version": "2.0"}},
                "buffers": [{{"byteLength": 36, "uri": "{uri}"}}],
                "bufferViews": [{{"buffer": 0, "byteLength": 36}}],
                "accessors": [{{"bufferView": 0, "componentType": 5126, "count": 3,
                    "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0]}}],
                "meshes": [{{"primitives": [{{"attributes": {{"POSITION": 0}}}}]}}]
            }}"#
        )
    }

    #[test]
    fn test_parse_minimal() {
        let model = ModelRoot::parse_gltf(MINIMAL).unwrap();
        assert_eq!(model.document().asset.version, "2.0");
        assert_eq!(model.buffer_count(), 0);
    }

    #[test]
    fn test_parse_embedded_buffer() {
        let model = ModelRoot::parse_gltf(&embedded_triangle()).unwrap();
        assert!(model.document().buffers[0].uri.is_none());
        let positions = model.accessor_vec3s(0).unwrap();
        assert_eq!(positions[1], glam::Vec3::X);
    }

    #[test]
    fn test_byte_order_mark_tolerated() {
        let text = format!("{}{}", BOM, MINIMAL);
        assert!(ModelRoot::parse_gltf(&text).is_ok());
    }

    #[test]
    fn test_version_checks() {
        let v3 = ModelRoot::parse_gltf(r#"{"asset":{"version":"3.0"}}"#).unwrap_err();
        assert_eq!(v3.category(), ErrorCategory::Format);

        let min = ModelRoot::parse_gltf(r#"{"asset":{"version":"2.0","minVersion":"2.1"}}"#)
            .unwrap_err();
        assert_eq!(min.category(), ErrorCategory::Format);

        assert!(ModelRoot::parse_gltf(r#"{"asset":{"version":"2.1"}}"#).is_ok());
        assert!(ModelRoot::parse_gltf(r#"{"asset":{"version":"two"}}"#).is_err());
    }

    #[test]
    fn test_invalid_json_is_format_error() {
        let err = ModelRoot::parse_gltf("{ not json").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Format);
    }

    #[test]
    fn test_references_checked_even_when_skipping() {
        let text = r#"{"asset":{"version":"2.0"},"scenes":[{"nodes":[3]}]}"#;
        let resolver = MemoryResolver::new();
        let err = ReadContext::new(&resolver)
            .with_settings(ReadSettings::new().with_validation(ValidationMode::Skip))
            .read_gltf(text)
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Reference);
    }

    #[test]
    fn test_preprocessor_runs_before_parse() {
        let resolver = MemoryResolver::new();
        let model = ReadContext::new(&resolver)
            .with_json_preprocessor(|text| text.replace("\"1.0\"", "\"2.0\""))
            .read_gltf(r#"{"asset":{"version":"1.0"}}"#)
            .unwrap();
        assert_eq!(model.document().asset.version, "2.0");
    }

    #[test]
    fn test_satellite_buffer_is_shared() {
        let mut resolver = MemoryResolver::new();
        resolver.insert("data.bin", vec![0u8; 8]);
        let text = r#"{"asset":{"version":"2.0"},"buffers":[{"byteLength":8,"uri":"data.bin"}]}"#;
        let model = ReadContext::new(&resolver).read_gltf(text).unwrap();
        assert!(model.buffer(0).unwrap().is_shared());
    }

    #[test]
    fn test_missing_satellite_is_io_error() {
        let text = r#"{"asset":{"version":"2.0"},"buffers":[{"byteLength":8,"uri":"gone.bin"}]}"#;
        let err = ModelRoot::parse_gltf(text).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Io);
    }

    #[test]
    fn test_image_decoder_can_drop_bytes() {
        let mut resolver = MemoryResolver::new();
        resolver.insert("tex.png", vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
        let text = r#"{"asset":{"version":"2.0"},"images":[{"uri":"tex.png"}]}"#;

        let kept = ReadContext::new(&resolver).read_gltf(text).unwrap();
        assert_eq!(kept.image(0).unwrap().mime_type(), "image/png");
        assert!(kept.document().images[0].uri.is_none());

        let dropped = ReadContext::new(&resolver)
            .with_image_decoder(|_, _| false)
            .read_gltf(text)
            .unwrap();
        assert!(dropped.image(0).is_none());
        assert_eq!(dropped.document().images[0].uri.as_deref(), Some("tex.png"));
    }
}
