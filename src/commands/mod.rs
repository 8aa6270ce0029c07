//! CLI subcommands

pub mod build;
pub mod clean;
pub mod feed;
pub mod list;
pub mod new;
