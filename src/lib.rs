//! ForgeConfig config generation: builds vendor-native config trees from
//! inventory records and merges them onto per-role baseline templates.

pub mod builders;
pub mod config;
pub mod generator;
pub mod inventory;
pub mod merge;
pub mod models;
pub mod render;
pub mod templates;
pub mod utils;

pub use generator::{ConfigGenerator, GeneratedConfig};
pub use merge::{deep_merge, IdentityKeys, MergeEngine};
pub use models::{DeviceRecord, Mapping, Node, Scalar};
