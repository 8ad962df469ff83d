pub mod catalog;
pub mod config;
pub mod convert;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod logging;
pub mod pipeline;
pub mod shapefile;
pub mod tool;
