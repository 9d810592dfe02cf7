//! repotag CLI - inspect and name local images.

pub mod commands;
pub mod output;
