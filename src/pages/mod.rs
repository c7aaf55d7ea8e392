//! Page-scoped handlers.
//!
//! Each handler is built with the API, the session, and the host page it
//! drives. They share no state beyond the session.

pub mod dashboard;
pub mod login;
