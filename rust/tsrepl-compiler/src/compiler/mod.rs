pub mod ast;
pub mod harness;
pub mod parser;
pub mod symbols;
