//! Placeholder rendering for rules declared with `each`.
//! A rule like "require the helpers file for every version" is written once
//! with `{{ version }}` placeholders and rendered per value.
use crate::error::Result;
use minijinja::{Environment, UndefinedBehavior};

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template string with the given context.
    ///
    /// # Arguments
    /// * `template` - Template string to render
    /// * `context` - Context variables for rendering
    ///
    /// # Returns
    /// * `Result<String>` - Rendered template string
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String>;
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a renderer that keeps trailing newlines (replacement text often
    /// ends in one) and fails on undefined placeholders.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self { env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    /// # Errors
    /// * `Error::MinijinjaError` if the template does not parse or refers to
    ///   a variable missing from `context`
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String> {
        Ok(self.env.render_str(template, context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_keeps_trailing_newline() {
        let renderer = MiniJinjaRenderer::new();
        let rendered = renderer
            .render("require \"google/cloud/tasks/{{ version }}/helpers\"\n", &json!({"version": "v2beta2"}))
            .unwrap();
        assert_eq!(rendered, "require \"google/cloud/tasks/v2beta2/helpers\"\n");
    }

    #[test]
    fn test_render_undefined_variable_fails() {
        let renderer = MiniJinjaRenderer::new();
        assert!(renderer.render("{{ missing }}", &json!({})).is_err());
    }
}
