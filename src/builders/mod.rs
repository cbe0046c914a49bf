//! Config tree builders: shape a normalized device record into an override
//! tree in the target platform's native schema.

pub mod eos;
pub mod openconfig;
pub mod srlinux;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::{platform, DeviceRecord, Node};

pub use eos::EosBuilder;
pub use openconfig::OpenConfigBuilder;
pub use srlinux::SrLinuxBuilder;

/// Description used when the inventory has none
pub const MISSING_DESCRIPTION: &str = "** missing **";

/// Builds a vendor-native override tree for one device
pub trait ConfigTreeBuilder: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    fn build(&self, device: &DeviceRecord) -> Result<Node>;
}

/// Pick the tree shape for a platform. Unknown platforms get OpenConfig.
pub fn builder_for_platform(platform_name: &str) -> Box<dyn ConfigTreeBuilder> {
    match platform_name {
        platform::NOKIA_SRL => Box::new(SrLinuxBuilder),
        platform::ARISTA_EOS => Box::new(EosBuilder),
        _ => Box::new(OpenConfigBuilder),
    }
}

/// Serialize a typed vendor model into a config tree
pub(crate) fn model_to_node<T: Serialize>(model: &T) -> Result<Node> {
    let value = serde_json::to_value(model).context("Failed to serialize config model")?;
    Ok(Node::from(value))
}
