//! Module for reading and writing collected result documents

pub mod json;
