pub mod devices;
pub mod node;

pub use devices::*;
pub use node::{Mapping, Node, Scalar};
