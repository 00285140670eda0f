//! Tera rendering engine for manifest templates.
//!
//! Every `template:` entry is registered under its repository path, so one
//! template can `{% include "docs/_footer.md" %}` another entry by path.

use tera::Tera;

use reposync_core::{EntryBody, Manifest, RepoPath};

use crate::context::TemplateContext;
use crate::error::RenderError;

/// Tera-based renderer holding every template entry of one manifest.
///
/// Build once per run with [`Renderer::from_manifest`] and reuse.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Register raw `(name, body)` templates.
    pub fn from_templates<I, N, B>(templates: I) -> Result<Self, RenderError>
    where
        I: IntoIterator<Item = (N, B)>,
        N: Into<String>,
        B: Into<String>,
    {
        let mut tera = Tera::default();
        // Generated files are not HTML; never escape.
        tera.autoescape_on(vec![]);
        let items: Vec<(String, String)> = templates
            .into_iter()
            .map(|(n, b)| (n.into(), b.into()))
            .collect();
        tera.add_raw_templates(items)?;
        Ok(Renderer { tera })
    }

    /// Register every `template:` entry of `manifest` under its path.
    pub fn from_manifest(manifest: &Manifest) -> Result<Self, RenderError> {
        let templates = manifest.files.iter().filter_map(|entry| match entry.body() {
            Ok(EntryBody::Template(body)) => Some((entry.path.to_string(), body.to_string())),
            _ => None,
        });
        Self::from_templates(templates)
    }

    pub fn has_template(&self, path: &RepoPath) -> bool {
        self.tera.get_template_names().any(|n| n == path.as_str())
    }

    /// Render the template registered for `path`, with `ctx.path` set to it.
    pub fn render(&self, path: &RepoPath, ctx: &TemplateContext) -> Result<String, RenderError> {
        if !self.has_template(path) {
            return Err(RenderError::UnknownTemplate(path.to_string()));
        }
        let tera_ctx = ctx.for_path(path).to_tera_context()?;
        Ok(self.tera.render(path.as_str(), &tera_ctx)?)
    }
}
