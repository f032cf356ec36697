pub mod error;
pub mod config;
pub mod settings;
pub mod instance;
pub mod store;
pub mod service;
pub mod util;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
