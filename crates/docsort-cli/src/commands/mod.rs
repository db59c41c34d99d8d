pub mod classify;
pub mod config;
pub mod file;
pub mod process;
