//! Pure HTML rendering of notification and acknowledgment emails.

pub mod escape;
pub mod templates;

pub use escape::{escape_html, header_safe};
pub use templates::{render, render_test_email, Branding, RenderedSubmission};
