//! View engine
//!
//! Server-side HTML rendering with Tera. Templates are read from the
//! configured views directory when it exists, otherwise from the copies
//! embedded in the binary at build time. `.html` templates are autoescaped.

use anyhow::{Context, Result};
use rust_embed::RustEmbed;
use std::error::Error as StdError;
use std::fs;
use std::path::Path;
use tera::{Context as TeraContext, Tera};

mod error;

pub use error::ViewError;

/// Templates shipped inside the binary
#[derive(RustEmbed)]
#[folder = "views/"]
#[include = "*.html"]
struct BuiltinViews;

/// Renders named views to HTML
pub struct ViewEngine {
    tera: Tera,
}

impl ViewEngine {
    /// Load templates from `views_path`, falling back to the built-in set
    /// when the directory does not exist.
    pub fn new(views_path: &Path) -> Result<Self> {
        if !views_path.is_dir() {
            tracing::info!(
                "Views directory {:?} not found, using built-in templates",
                views_path
            );
            return Self::builtin();
        }

        let mut templates = Vec::new();
        collect_templates_from_dir(views_path, views_path, &mut templates)?;
        tracing::debug!("Loaded {} template(s) from {:?}", templates.len(), views_path);

        Self::from_templates(templates)
    }

    /// Use the templates embedded in the binary
    pub fn builtin() -> Result<Self> {
        let mut templates = Vec::new();
        for name in BuiltinViews::iter() {
            let file = BuiltinViews::get(&name)
                .ok_or_else(|| ViewError::TemplateError(format!("Missing embedded template {}", name)))?;
            let content = std::str::from_utf8(&file.data)
                .map_err(|e| ViewError::InvalidEncoding(format!("{}: {}", name, e)))?
                .to_string();
            templates.push((name.replace('\\', "/"), content));
        }

        Self::from_templates(templates)
    }

    fn from_templates(templates: Vec<(String, String)>) -> Result<Self> {
        let mut tera = Tera::default();
        // add_raw_templates resolves `extends` regardless of order
        tera.add_raw_templates(templates)
            .map_err(|e| ViewError::TemplateError(error_chain("Failed to load templates", &e)))?;

        Ok(Self { tera })
    }

    /// Render `<view>.html` with the given context
    pub fn render(&self, view: &str, context: &TeraContext) -> Result<String> {
        let template = format!("{}.html", view);
        self.tera.render(&template, context).map_err(|e| {
            ViewError::TemplateError(error_chain(&format!("Failed to render '{}'", template), &e))
                .into()
        })
    }

    /// Whether a view with this name is loaded
    pub fn has_view(&self, view: &str) -> bool {
        let template = format!("{}.html", view);
        self.tera.get_template_names().any(|name| name == template)
    }
}

/// Flatten a Tera error and its causes into one message
fn error_chain(prefix: &str, err: &tera::Error) -> String {
    let mut msg = format!("{}: {}", prefix, err);
    let mut source = err.source();
    while let Some(s) = source {
        msg.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    msg
}

fn collect_templates_from_dir(
    base_path: &Path,
    current_path: &Path,
    templates: &mut Vec<(String, String)>,
) -> Result<()> {
    let entries = fs::read_dir(current_path)
        .with_context(|| format!("Failed to read views directory: {:?}", current_path))?;

    for entry in entries {
        let path = entry.map_err(ViewError::from)?.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path.extension().map_or(false, |ext| ext == "html") {
            let relative_path = path
                .strip_prefix(base_path)
                .map_err(|_| ViewError::TemplateError("Failed to get relative path".to_string()))?;
            let name = relative_path.to_string_lossy().replace('\\', "/");
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read template: {:?}", path))?;

            templates.push((name, content));
        }
    }

    Ok(())
}
