pub mod cleanup;
pub mod runner;
pub mod storage;
