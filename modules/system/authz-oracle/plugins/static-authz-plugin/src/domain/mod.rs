//! Domain layer for the static authorization oracle.

mod client;
pub mod service;

pub use service::Service;
