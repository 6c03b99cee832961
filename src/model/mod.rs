pub mod config;
pub mod data_core;
pub mod import;
pub mod library;
pub mod navigator;
pub mod pair;
pub mod parser;
pub mod tree;
