//! Folio - content service for a blog and portfolio site
//!
//! This library provides posts, categories, authors, contact messages and
//! emailing lists on top of SQLite or MySQL.

pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
