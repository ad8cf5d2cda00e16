
pub mod logging;
pub mod config;
pub mod commands;

pub mod error;
pub mod star;
pub mod fields;
pub mod pose;
pub mod ctf;
pub mod grid;
pub mod mrc;
pub mod cs;
pub mod paths;
pub mod particles;
pub mod noise;

pub use error::{Error, Result};
pub use star::MetadataTable;
