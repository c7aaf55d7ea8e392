//! Networking modules for the `/usuarios` REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` issues the HTTP calls and `types` defines the JSON wire schema.

pub mod api;
pub mod types;
