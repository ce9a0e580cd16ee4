pub mod config;
pub mod eval;
pub mod migrate;
pub mod process;
pub mod status;
pub mod step;
pub mod validate;
