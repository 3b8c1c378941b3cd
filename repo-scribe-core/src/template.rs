//! Template engine backing the template-backed stages and final assembly.

use std::path::Path;

use minijinja::{path_loader, Environment, UndefinedBehavior};
use tracing::{debug, info};

use crate::contract::{ServiceError, TemplateRenderer};

pub const MAIN_TEMPLATE: &str = "main.md.j2";
pub const STRUCTURE_TEMPLATE: &str = "structure.md.j2";
pub const CONTRIBUTORS_TEMPLATE: &str = "contributors.md.j2";
pub const DEPENDENCIES_TEMPLATE: &str = "dependencies.md.j2";

const BUNDLED: [(&str, &str); 4] = [
    (MAIN_TEMPLATE, include_str!("../templates/main.md.j2")),
    (STRUCTURE_TEMPLATE, include_str!("../templates/structure.md.j2")),
    (
        CONTRIBUTORS_TEMPLATE,
        include_str!("../templates/contributors.md.j2"),
    ),
    (
        DEPENDENCIES_TEMPLATE,
        include_str!("../templates/dependencies.md.j2"),
    ),
];

/// A minijinja environment in strict-undefined mode: referencing a missing variable is an error.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// The templates compiled into the crate.
    pub fn bundled() -> Result<Self, ServiceError> {
        let mut env = strict_environment();
        for (name, source) in BUNDLED {
            env.add_template(name, source)
                .map_err(|e| format!("bundled template '{name}' is invalid: {e:#}"))?;
        }
        info!("[TEMPLATE] Using bundled templates");
        Ok(Self { env })
    }

    /// Templates loaded on demand from `dir`, replacing the bundled set.
    pub fn from_dir(dir: &Path) -> Result<Self, ServiceError> {
        if !dir.is_dir() {
            return Err(format!("template directory does not exist: {}", dir.display()).into());
        }
        let mut env = strict_environment();
        env.set_loader(path_loader(dir));
        info!(dir = %dir.display(), "[TEMPLATE] Using template directory");
        Ok(Self { env })
    }

    pub fn from_config(templates_dir: Option<&Path>) -> Result<Self, ServiceError> {
        match templates_dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::bundled(),
        }
    }
}

fn strict_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env
}

impl TemplateRenderer for TemplateEngine {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String, ServiceError> {
        debug!(template, "Rendering template");
        let tmpl = self
            .env
            .get_template(template)
            .map_err(|e| format!("{e:#}"))?;
        let rendered = tmpl.render(context).map_err(|e| format!("{e:#}"))?;
        Ok(rendered)
    }
}
