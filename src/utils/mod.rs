//! Utilities: paths, validation, logging, command lookup

pub mod command;
pub mod logging;
pub mod paths;
pub mod validation;
