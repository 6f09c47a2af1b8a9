//! Command implementations

pub mod cache;
pub mod completions;
pub mod show;
pub mod table;
