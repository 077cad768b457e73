//! ts-repl command-line front end.
//!
//! Turns a TypeScript file into a harness program, writes it to disk and runs
//! it under `ts-node`.

pub mod cli;
pub mod colors;
pub mod config;
pub mod error_chain;
pub mod harness_file;
pub mod history;
pub mod runner;
