//! Template context: serializable rendering payload built from a [`Manifest`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reposync_core::{Manifest, RepoPath};

use crate::error::RenderError;

/// Variables visible to every template.
///
/// `path` is the repository path of the entry being rendered; it is set per
/// entry by [`TemplateContext::for_path`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateContext {
    pub repository: RepositoryCtx,
    pub branch: Option<String>,
    pub path: String,
    /// RFC 3339 timestamp of the run.
    pub generated_at: String,
    pub vars: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryCtx {
    pub owner: String,
    pub name: String,
    pub full_name: String,
}

impl TemplateContext {
    /// Build a context for `manifest`, stamped with `generated_at`.
    pub fn from_manifest(manifest: &Manifest, generated_at: DateTime<Utc>) -> Self {
        TemplateContext {
            repository: RepositoryCtx {
                owner: manifest.repository.owner.clone(),
                name: manifest.repository.name.clone(),
                full_name: manifest.repository.full_name(),
            },
            branch: manifest.branch.clone(),
            path: String::new(),
            generated_at: generated_at.to_rfc3339(),
            vars: manifest.vars.clone(),
        }
    }

    /// Copy of this context with `path` set to the entry being rendered.
    pub fn for_path(&self, path: &RepoPath) -> Self {
        let mut ctx = self.clone();
        ctx.path = path.to_string();
        ctx
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}
