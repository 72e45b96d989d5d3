//! Configuration loading
//!
//! This module locates and parses `qcportal_config.yaml`.

pub mod loader;

// Re-export commonly used items
pub use loader::{candidate_paths, expand_home, load_from_file, parse_config};
