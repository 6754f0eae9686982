//! Bookmark - a content directory for manga, anime and movies
//!
//! Serves the admin and public JSON APIs and tracks outbound clicks through
//! the redirect routes.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod pages;
pub mod services;
