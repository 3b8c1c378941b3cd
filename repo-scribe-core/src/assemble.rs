//! Document Assembler.
//!
//! Section texts are merged into one document through the top-level template, which decides the
//! order sections appear in. Every required section must be present before rendering starts.

use std::collections::BTreeMap;

use serde_json::json;
use tracing::{error, info};

use crate::contract::TemplateRenderer;
use crate::error::ScribeError;
use crate::template::MAIN_TEMPLATE;

/// Section name → rendered text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentationSections {
    sections: BTreeMap<&'static str, String>,
}

impl DocumentationSections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a section. A name can only be set once.
    pub fn insert(&mut self, name: &'static str, text: String) -> Result<(), ScribeError> {
        if self.sections.contains_key(name) {
            return Err(ScribeError::InvalidArgument(format!(
                "section '{name}' was produced twice"
            )));
        }
        self.sections.insert(name, text);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.sections.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Render the final document. Consumes the sections.
pub fn assemble<R>(
    renderer: &R,
    sections: DocumentationSections,
    required: &[&str],
) -> Result<String, ScribeError>
where
    R: TemplateRenderer + ?Sized,
{
    if let Some(missing) = required.iter().find(|name| !sections.sections.contains_key(**name)) {
        error!(section = missing, "[ASSEMBLE] Required section missing");
        return Err(ScribeError::Template(format!(
            "required section '{missing}' is missing"
        )));
    }

    let context = json!({ "sections": &sections.sections });
    let document = renderer.render(MAIN_TEMPLATE, &context).map_err(|e| {
        error!(error = %e, "[ASSEMBLE] Main template failed");
        ScribeError::Template(format!("failed to render '{MAIN_TEMPLATE}': {e}"))
    })?;
    info!(
        sections = sections.len(),
        bytes = document.len(),
        "[ASSEMBLE] Document assembled"
    );
    Ok(document)
}
