pub mod action;
pub mod config;
pub mod error;
pub mod generator;
pub mod mission;
pub mod model;
pub mod package;
pub mod parser;
pub mod sequence;

pub use config::DroneConfig;
pub use error::{Error, ErrorKind, Result};
pub use generator::{Mode, WaylineGenerator};
pub use model::{ActionDescriptor, SemanticNode, Value};
pub use package::{archive_path, convert, WaylinePackage};
pub use parser::normalize;
