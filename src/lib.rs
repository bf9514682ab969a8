//! Lexicon: a multi-tenant translation catalog with a filtered, shaped and
//! cached query layer.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
