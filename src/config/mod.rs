// src/config/mod.rs
pub mod studio;

pub use studio::{PathsConfig, StorageConfig, StudioConfig};
