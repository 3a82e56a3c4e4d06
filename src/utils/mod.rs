//! Utility modules for the letters website.

pub mod exec;
pub mod hash;
pub mod log;
pub mod minify;
