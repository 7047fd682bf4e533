//! Lua-backed mutation commands for the Redis store.

pub mod commands;
pub mod executor;
pub mod scripts;

pub use executor::execute_command;
