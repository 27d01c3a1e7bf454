//! Terminal frontend for the user service.
//!
//! [`ApiClient`] talks to the REST API and handles the anti-forgery
//! handshake. The views hold screen state and render it as text.

pub mod client;
pub mod error;
pub mod views;

pub use client::{ApiClient, UserPayload};
pub use error::{ClientError, ClientResult, FieldErrors};
pub use views::{FormMode, ListView, Listing, UserForm};
