//! Login portal — login and dashboard page handlers for the `/usuarios` API.
//!
//! SYSTEM CONTEXT
//! ==============
//! Two page-scoped handlers share nothing but the persisted identity and the
//! API base URL. `pages::login` exchanges credentials for an identity,
//! `pages::dashboard` greets the stored identity and offers logout. The host
//! surface (browser page, terminal) is abstracted behind `page::Page`.

pub mod config;
pub mod error;
pub mod net;
pub mod page;
pub mod pages;
pub mod session;

#[cfg(test)]
mod test_support;
