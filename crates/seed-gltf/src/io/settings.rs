//! Read and write settings.

use serde::{Deserialize, Serialize};

use crate::validation::ValidationMode;

/// How image content is stored when writing a `.gltf` document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceWriteMode {
    /// Separate files next to the document.
    #[default]
    SatelliteFile,
    /// Base64 data URIs inside the JSON.
    EmbeddedBase64,
    /// Moved into buffer views (then stored like buffers).
    BufferView,
}

/// Options for reading glTF and GLB files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadSettings {
    /// Content validation mode. References are always validated.
    pub validation: ValidationMode,
}

impl ReadSettings {
    /// Create default read settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the validation mode.
    pub fn with_validation(mut self, mode: ValidationMode) -> Self {
        self.validation = mode;
        self
    }
}

/// Options for writing glTF and GLB files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteSettings {
    /// Validation mode applied before writing.
    pub validation: ValidationMode,
    /// Where image content goes in `.gltf` output. GLB always uses buffer views.
    pub image_write_mode: ResourceWriteMode,
    /// Embed buffers as base64 data URIs in `.gltf` output.
    pub embed_buffers: bool,
    /// Merge all buffers into as few as possible before writing.
    pub merge_buffers: bool,
    /// Upper bound on the size of a merged buffer.
    pub buffers_max_size: usize,
    /// Pretty-print the JSON.
    pub json_indented: bool,
}

impl Default for WriteSettings {
    fn default() -> Self {
        Self {
            validation: ValidationMode::Strict,
            image_write_mode: ResourceWriteMode::SatelliteFile,
            embed_buffers: false,
            merge_buffers: true,
            buffers_max_size: usize::MAX,
            json_indented: false,
        }
    }
}

impl WriteSettings {
    /// Create default write settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the validation mode.
    pub fn with_validation(mut self, mode: ValidationMode) -> Self {
        self.validation = mode;
        self
    }

    /// Set how images are stored.
    pub fn with_image_write_mode(mut self, mode: ResourceWriteMode) -> Self {
        self.image_write_mode = mode;
        self
    }

    /// Embed every resource in the JSON document.
    pub fn embedded(mut self) -> Self {
        self.embed_buffers = true;
        self.image_write_mode = ResourceWriteMode::EmbeddedBase64;
        self
    }

    /// Enable or disable buffer merging.
    pub fn with_merge_buffers(mut self, merge: bool) -> Self {
        self.merge_buffers = merge;
        self
    }

    /// Limit the size of merged buffers.
    pub fn with_buffers_max_size(mut self, max_size: usize) -> Self {
        self.buffers_max_size = max_size;
        self
    }

    /// Pretty-print output.
    pub fn pretty(mut self) -> Self {
        self.json_indented = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_settings_from_partial_json() {
        let settings: WriteSettings =
            serde_json::from_str(r#"{"embed_buffers": true, "validation": "skip"}"#).unwrap();
        assert!(settings.embed_buffers);
        assert_eq!(settings.validation, ValidationMode::Skip);
        assert!(settings.merge_buffers);
        assert_eq!(settings.image_write_mode, ResourceWriteMode::SatelliteFile);
    }

    #[test]
    fn test_builders() {
        let settings = WriteSettings::new().embedded().pretty().with_buffers_max_size(1024);
        assert_eq!(settings.image_write_mode, ResourceWriteMode::EmbeddedBase64);
        assert!(settings.json_indented);
        assert_eq!(settings.buffers_max_size, 1024);

        let read = ReadSettings::new().with_validation(ValidationMode::TryFix);
        assert_eq!(read.validation, ValidationMode::TryFix);
    }
}
