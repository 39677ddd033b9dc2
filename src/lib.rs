//! Adoscript - storefront backend for downloadable scripts
//!
//! This library provides the core functionality for the Adoscript store:
//! the public catalog, PayPal checkout, tokenized downloads, transactional
//! email, and the admin back office.

pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod password;
pub mod payments;
pub mod session;
pub mod util;
