//! Domain layer for the static `AuthN` plugin.

pub mod service;

pub use service::Service;
