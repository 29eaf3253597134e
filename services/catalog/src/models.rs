//! Catalog models

pub mod product;
