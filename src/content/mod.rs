//! Content module - CMS documents and rich-text rendering

pub mod portable_text;
mod post;

pub use portable_text::{Block, PortableTextRenderer};
pub use post::{Author, Comment, ImageRef, Post, PostSummary, Reference, Slug};
