//! Screen state and text rendering.

mod form;
mod list;

pub use form::{FormMode, UserForm};
pub use list::{ListView, Listing};
