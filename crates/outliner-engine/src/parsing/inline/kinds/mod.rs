//! # Inline Kinds
//!
//! Inline-specific types that own their syntax delimiters. The parser calls
//! these constants; it never hardcodes `[[`, `**` or `{{`.
//!
//! ## Types
//!
//! - **`WikiLink`**: `[[Page]]` and the labelled `[label]([[Page]])` form
//! - **`MarkdownLink`**: `[label](url)`
//! - **`Image`**: `![alt](target)`
//! - **`Emphasis`**: bold, italic, strikethrough and both highlight spellings
//! - **`Macro`**: `{{query …}}` and `{{embed …}}`
//! - **`BlockRef`**, **`Tag`**, **`Property`**: outliner references

pub mod emphasis;
pub mod image;
pub mod macros;
pub mod references;
pub mod wikilink;

pub use emphasis::Emphasis;
pub use image::Image;
pub use macros::Macro;
pub use references::{BlockRef, Property, Tag};
pub use wikilink::{MarkdownLink, WikiLink};

/// Whether a link or image target names a PDF document.
pub fn is_pdf_target(target: &str) -> bool {
    target
        .len()
        .checked_sub(4)
        .and_then(|start| target.get(start..))
        .is_some_and(|ext| ext.eq_ignore_ascii_case(".pdf"))
}
