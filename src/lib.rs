pub mod assemble;
pub mod citation;
pub mod cli;
pub mod commands;
pub mod common;
pub mod dataset;
pub mod site;
