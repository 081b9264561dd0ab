pub mod activity;
pub mod decorate;
pub mod dispatch;
pub mod error;
pub mod fields;
pub mod filter;
pub mod listing;
pub mod pagination;
pub mod repo;
pub mod service;
