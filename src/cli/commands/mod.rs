//! CLI command implementations

pub mod config;
pub mod generate;
pub mod reconstruct;

pub use config::execute as config;
pub use generate::execute as generate;
pub use reconstruct::execute as reconstruct;
