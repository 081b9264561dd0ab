//! Storage backends for the domain's collection ports.

pub mod memory;
