//! Named templates rendered against one shared theme

use std::sync::Arc;

use indexmap::IndexMap;

use crate::render::{render, RenderContext, Value};
use crate::template::{CompileConfig, CompiledTemplate, Compiler};
use crate::theme::Theme;
use crate::Error;

/// Compiles templates once and renders them by name.
///
/// Every render gets a fresh [`RenderContext`] with the theme helpers bound,
/// so renders never see each other's assignments.
#[derive(Debug, Clone)]
pub struct Engine {
    theme: Arc<Theme>,
    compiler: Compiler,
    templates: IndexMap<String, Arc<CompiledTemplate>>,
}

impl Engine {
    pub fn new(theme: impl Into<Arc<Theme>>) -> Self {
        Self {
            theme: theme.into(),
            compiler: Compiler::default(),
            templates: IndexMap::new(),
        }
    }

    /// Set the configuration used for templates added from now on
    pub fn with_config(mut self, config: CompileConfig) -> Self {
        self.compiler = Compiler::new(config);
        self
    }

    pub fn theme(&self) -> &Arc<Theme> {
        &self.theme
    }

    /// Compile `source` and store it as `name`, replacing any previous
    /// template of that name
    pub fn add_template(
        &mut self,
        name: impl Into<String>,
        source: &str,
    ) -> Result<Arc<CompiledTemplate>, Error> {
        let name = name.into();
        let template = Arc::new(self.compiler.compile(source)?);
        log::debug!(
            "cached template '{}' ({} nodes)",
            name,
            template.nodes().len()
        );
        self.templates.insert(name, Arc::clone(&template));
        Ok(template)
    }

    pub fn template(&self, name: &str) -> Option<Arc<CompiledTemplate>> {
        self.templates.get(name).cloned()
    }

    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// A fresh context for one render, with theme helpers bound
    pub fn context(&self) -> RenderContext {
        RenderContext::with_theme(Arc::clone(&self.theme))
    }

    /// Render template `name` with the entries of the map `values` as variables
    pub fn render(&self, name: &str, values: Value) -> Result<String, Error> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| Error::TemplateNotFound(name.to_string()))?;
        let mut context = self.context();
        context.extend_from(values);
        Ok(render(template, &mut context)?)
    }

    /// Render template `name` with a context the caller has prepared
    pub fn render_with(&self, name: &str, context: &mut RenderContext) -> Result<String, Error> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| Error::TemplateNotFound(name.to_string()))?;
        Ok(render(template, context)?)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(crate::theme::default_theme())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{EvalError, RenderError};
    use crate::theme::ThemeError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_by_name() {
        let mut engine = Engine::default();
        engine
            .add_template("cell", r#"<td#{{ style("td") }}>#{{ n }}</td>"#)
            .unwrap();
        let html = engine.render("cell", Value::map([("n", 4)])).unwrap();
        assert_eq!(
            html,
            "<td style=\"background: rgb(220,220,220); border: 1px solid #a0a0a0; padding: 2px 4px; text-align: right;\">4</td>"
        );
    }

    #[test]
    fn test_unknown_template() {
        let engine = Engine::default();
        assert!(matches!(
            engine.render("missing", Value::Null),
            Err(Error::TemplateNotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_syntax_error_on_add() {
        let mut engine = Engine::default();
        assert!(matches!(
            engine.add_template("bad", "#{{ 1 +"),
            Err(Error::Syntax(_))
        ));
        assert!(engine.template("bad").is_none());
    }

    #[test]
    fn test_renders_are_isolated() {
        let mut engine = Engine::default();
        engine
            .add_template("count", "<% if seen %>again<% else %>first<% end %><% seen = 1 %>")
            .unwrap();
        let values = || Value::map([("seen", 0)]);
        assert_eq!(engine.render("count", values()).unwrap(), "first");
        assert_eq!(engine.render("count", values()).unwrap(), "first");
    }

    #[test]
    fn test_unknown_class_propagates() {
        let mut engine = Engine::default();
        engine.add_template("t", "<p>#{{ css('nope') }}</p>").unwrap();
        match engine.render("t", Value::Null) {
            Err(Error::Render(RenderError::Evaluation { cause, .. })) => {
                assert_eq!(cause, EvalError::Style(ThemeError::unknown_class("nope")))
            }
            other => panic!("Expected unknown class error, got {:?}", other),
        }
    }

    #[test]
    fn test_config_applies_to_new_templates() {
        let mut engine =
            Engine::default().with_config(CompileConfig::new().with_trim_code_lines(false));
        engine.add_template("t", "a\n<% pass %>\nb").unwrap();
        assert_eq!(engine.render("t", Value::Null).unwrap(), "a\n\nb");
    }
}
