//! HTTP request handlers, organised by resource.

pub mod health;
pub mod recipes;
