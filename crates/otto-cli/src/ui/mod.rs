//! Terminal output.
//!
//! - [`theme`] - colors and icons
//! - [`output`] - the [`Reporter`](otto_core::Reporter) used by every command
//! - [`list`] - pack and command listings

pub mod list;
pub mod output;
pub mod theme;

pub use output::Output;
pub use theme::Theme;
