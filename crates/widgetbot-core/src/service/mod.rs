pub mod instances;

#[cfg(feature = "http-api")]
pub mod http;

pub use instances::InstanceService;
