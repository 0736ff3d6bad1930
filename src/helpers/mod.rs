//! Helper functions shared by the renderers
//!
//! Escaping, link and image tags, URL routes and date formatting.

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
