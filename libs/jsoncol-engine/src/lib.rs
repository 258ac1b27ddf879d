pub mod bootstrap;
pub mod config;
pub mod conventions;
pub mod error;
pub mod model;
pub mod scanner;
pub mod store;
