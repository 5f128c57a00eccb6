//! Reading and writing `.gltf` and `.glb` files.
//!
//! [`ReadContext`] and [`WriteContext`] run the full pipelines: container
//! framing, resource resolution, validation and serialization. Satellite
//! files go through a [`FileReader`] / [`FileWriter`], so models can be read
//! from and written to disk or memory alike.

pub mod read;
pub mod resolver;
pub mod settings;
pub mod uri;
pub mod write;

pub use read::{ImageDecodeHook, JsonPreprocessor, ReadContext};
pub use resolver::{DirectoryResolver, FileReader, FileWriter, MemoryResolver};
pub use settings::{ReadSettings, ResourceWriteMode, WriteSettings};
pub use write::{JsonPostprocessor, WriteContext};
