pub mod client;
pub mod codegen;
pub mod config;
pub mod error;
pub mod explorer;
pub mod http;
pub mod locate;
pub mod method;
pub mod naming;
pub mod param;
pub mod render;
pub mod schema;
pub mod tree;

pub use locate::locate;
pub use tree::{NodeId, ResourceNode, ResourceTree};
