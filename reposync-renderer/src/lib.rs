//! # reposync-renderer
//!
//! Tera-based rendering of `template:` entries from a reposync manifest.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use reposync_core::manifest;
//! use reposync_renderer::{Renderer, TemplateContext};
//!
//! fn render_all(path: &std::path::Path) {
//!     let Ok(m) = manifest::load(path) else { return };
//!     let Ok(renderer) = Renderer::from_manifest(&m) else { return };
//!     let ctx = TemplateContext::from_manifest(&m, Utc::now());
//!     for entry in &m.files {
//!         if renderer.has_template(&entry.path) {
//!             if let Ok(body) = renderer.render(&entry.path, &ctx) {
//!                 println!("{}: {} bytes", entry.path, body.len());
//!             }
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::TemplateContext;
pub use engine::Renderer;
pub use error::RenderError;
