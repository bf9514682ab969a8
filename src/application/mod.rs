//! Application services layer.

pub mod auth;
pub mod catalog;
pub mod error;
mod input;
pub mod locales;
pub mod repos;
pub mod seed;
pub mod shape;
pub mod tags;
pub mod translations;
