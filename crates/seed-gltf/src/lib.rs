//! seed-gltf: glTF 2.0 reader, writer and binary data-access engine.
//!
//! This crate loads `.gltf` and `.glb` files into a [`ModelRoot`], gives
//! typed access to the binary data behind accessors, and writes models back
//! out with buffer merging and image internalization.
//!
//! # Layers
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`memory`] | Strided, typed views over raw bytes; sparse overlays |
//! | [`schema`] | serde mirror of the glTF JSON document |
//! | [`model`] | Document plus buffers and images; building and merging |
//! | [`glb`] | Binary container framing |
//! | [`extensions`] | Extension registry and typed payloads |
//! | [`validation`] | Reference and content checks, explicit repairs |
//! | [`io`] | Read and write pipelines, resolvers, settings |
//!
//! # Quick Start
//!
//! ```ignore
//! use seed_gltf::ModelRoot;
//!
//! let model = ModelRoot::load("scene.gltf")?;
//! let positions = model.accessor_vec3s(0)?;
//! println!("{} vertices", positions.len());
//!
//! model.save_glb("scene.glb")?;
//! ```
//!
//! # Custom pipelines
//!
//! ```ignore
//! use seed_gltf::{MemoryResolver, ReadContext, ReadSettings, ValidationMode};
//!
//! let mut resolver = MemoryResolver::new();
//! resolver.insert("scene.gltf", json_bytes);
//! resolver.insert("scene.bin", bin_bytes);
//!
//! let model = ReadContext::new(&resolver)
//!     .with_settings(ReadSettings::new().with_validation(ValidationMode::TryFix))
//!     .read_model("scene.gltf")?;
//! ```

pub mod error;
pub mod extensions;
pub mod glb;
pub mod io;
pub mod memory;
pub mod model;
pub mod schema;
pub mod validation;

pub use error::{ErrorCategory, GltfError, Result};
pub use extensions::{Extension, ExtensionParent, ExtensionRegistry};
pub use glb::is_binary_container;
pub use io::{
    DirectoryResolver, FileReader, FileWriter, MemoryResolver, ReadContext, ReadSettings,
    ResourceWriteMode, WriteContext, WriteSettings,
};
pub use memory::{AccessorType, ComponentType, Element};
pub use model::{BufferData, ImageFormat, MemoryImage, ModelRoot};
pub use validation::{Fix, ValidationIssue, ValidationMode, ValidationResult};
