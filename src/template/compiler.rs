//! Template compiler: a single left-to-right scan for markers
//!
//! Literal text is copied until an expression marker (`#{{`, or `${{` for
//! HTML-escaped output) or a code-block marker (`<%`). An expression runs to
//! the first `}}`, a code block to the first `%>`; neither nests. Only marker
//! pairing and the grammar of each fragment are checked here. Whether loops
//! and conditionals are balanced across blocks is decided when rendering.

use crate::error::TemplateSyntaxError;
use crate::template::ast::{Expr, Span, Spanned, Stmt};
use crate::template::config::CompileConfig;
use crate::template::grammar::{parse_block, parse_expression};

const RAW_EXPR_START: &str = "#{{";
const ESCAPED_EXPR_START: &str = "${{";
const EXPR_END: &str = "}}";
const CODE_START: &str = "<%";
const CODE_END: &str = "%>";

/// One piece of a compiled template
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Verbatim output
    Literal(String),
    /// Evaluated and written at this position
    Expression {
        source: String,
        escape: bool,
        expr: Spanned<Expr>,
        span: Span,
    },
    /// Statements that steer which nodes run, and how often
    Code {
        source: String,
        statements: Vec<Spanned<Stmt>>,
        span: Span,
    },
}

/// Parsed, reusable form of a template. Holds no per-render state.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    nodes: Vec<Node>,
}

impl CompiledTemplate {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// True when rendering can only reproduce literal text
    pub fn is_literal_only(&self) -> bool {
        self.nodes.iter().all(|n| matches!(n, Node::Literal(_)))
    }
}

#[derive(Clone, Copy)]
enum Marker {
    Expression { escape: bool },
    Code,
}

impl Marker {
    fn start(&self) -> &'static str {
        match self {
            Marker::Expression { escape: false } => RAW_EXPR_START,
            Marker::Expression { escape: true } => ESCAPED_EXPR_START,
            Marker::Code => CODE_START,
        }
    }
}

/// Compiles template sources with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: CompileConfig,
}

impl Compiler {
    pub fn new(config: CompileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    pub fn compile(&self, source: &str) -> Result<CompiledTemplate, TemplateSyntaxError> {
        let mut nodes = Vec::new();
        let mut literal = String::new();
        let mut pos = 0;

        while let Some((start, marker)) = next_marker(source, pos) {
            literal.push_str(&source[pos..start]);
            let content_start = start + marker.start().len();

            match marker {
                Marker::Expression { escape } => {
                    let content_end = source[content_start..]
                        .find(EXPR_END)
                        .map(|i| content_start + i)
                        .ok_or_else(|| {
                            TemplateSyntaxError::new(start, "expression placeholder is never closed")
                        })?;
                    let inner = &source[content_start..content_end];
                    let expr = parse_expression(inner, content_start)?;
                    pos = content_end + EXPR_END.len();

                    flush(&mut literal, &mut nodes);
                    nodes.push(Node::Expression {
                        source: inner.to_string(),
                        escape,
                        expr,
                        span: start..pos,
                    });
                }
                Marker::Code => {
                    let content_end = source[content_start..]
                        .find(CODE_END)
                        .map(|i| content_start + i)
                        .ok_or_else(|| TemplateSyntaxError::new(start, "code block is never closed"))?;
                    let inner = &source[content_start..content_end];
                    let statements = parse_block(inner, content_start)?;
                    let end = content_end + CODE_END.len();
                    pos = end;

                    if self.config.trim_code_lines {
                        if let Some((indent, line_end)) = standalone_line(source, start, end) {
                            literal.truncate(literal.len() - indent);
                            pos = line_end;
                        }
                    }

                    flush(&mut literal, &mut nodes);
                    nodes.push(Node::Code {
                        source: inner.to_string(),
                        statements,
                        span: start..end,
                    });
                }
            }
        }

        literal.push_str(&source[pos..]);
        flush(&mut literal, &mut nodes);

        log::trace!("compiled template into {} nodes", nodes.len());
        Ok(CompiledTemplate { nodes })
    }
}

/// Compile with the default configuration
pub fn compile(source: &str) -> Result<CompiledTemplate, TemplateSyntaxError> {
    Compiler::default().compile(source)
}

fn flush(literal: &mut String, nodes: &mut Vec<Node>) {
    if !literal.is_empty() {
        nodes.push(Node::Literal(std::mem::take(literal)));
    }
}

/// Earliest marker at or after `from`
fn next_marker(source: &str, from: usize) -> Option<(usize, Marker)> {
    [
        Marker::Expression { escape: false },
        Marker::Expression { escape: true },
        Marker::Code,
    ]
    .into_iter()
    .filter_map(|marker| {
        source[from..]
            .find(marker.start())
            .map(|i| (from + i, marker))
    })
    .min_by_key(|(i, _)| *i)
}

/// If the block `start..end` is alone on its line, return the length of its
/// indentation and the position just past its line break
fn standalone_line(source: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let is_blank = |s: &str| s.chars().all(|c| c == ' ' || c == '\t' || c == '\r');

    let line_start = source[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    if !is_blank(&source[line_start..start]) {
        return None;
    }

    let rest = &source[end..];
    let (tail, line_end) = match rest.find('\n') {
        Some(i) => (&rest[..i], end + i + 1),
        None => (rest, source.len()),
    };
    is_blank(tail).then_some((start - line_start, line_end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::ast::{BinaryOp, EndKind};

    fn literals(template: &CompiledTemplate) -> Vec<&str> {
        template
            .nodes()
            .iter()
            .filter_map(|n| match n {
                Node::Literal(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_literal_only() {
        let source = "<p>plain {text} with } braces and % signs</p>\n";
        let template = compile(source).unwrap();
        assert!(template.is_literal_only());
        assert_eq!(template.nodes(), &[Node::Literal(source.to_string())]);
    }

    #[test]
    fn test_empty_source() {
        assert!(compile("").unwrap().nodes().is_empty());
    }

    #[test]
    fn test_expression_node() {
        let template = compile("<b>#{{1+1}}</b>").unwrap();
        let nodes = template.nodes();
        assert_eq!(nodes.len(), 3);
        match &nodes[1] {
            Node::Expression {
                source,
                escape,
                expr,
                span,
            } => {
                assert_eq!(source, "1+1");
                assert!(!escape);
                assert!(matches!(expr.node, Expr::Binary(BinaryOp::Add, _, _)));
                assert_eq!(expr.span, 6..9);
                assert_eq!(span, &(3..11));
            }
            other => panic!("Expected expression, got {:?}", other),
        }
    }

    #[test]
    fn test_escaped_expression_marker() {
        let template = compile("${{ name }}").unwrap();
        assert!(matches!(
            &template.nodes()[0],
            Node::Expression { escape: true, .. }
        ));
    }

    #[test]
    fn test_first_end_marker_wins() {
        // "}}" inside a string still closes the placeholder
        let err = compile(r#"#{{ "a}}b" }}"#).unwrap_err();
        assert!(err.reason.contains("unexpected") || err.reason.contains("character"));
    }

    #[test]
    fn test_unclosed_expression() {
        let err = compile("<b>#{{ total").unwrap_err();
        assert_eq!(err.position, 3);
        assert!(err.reason.contains("never closed"));
    }

    #[test]
    fn test_unclosed_code_block() {
        let err = compile("a <% for x in xs").unwrap_err();
        assert_eq!(err.position, 2);
        assert!(err.reason.contains("never closed"));
    }

    #[test]
    fn test_grammar_error_position_is_template_relative() {
        let err = compile("abc #{{ 1 + }}").unwrap_err();
        assert!(err.position >= 8);
    }

    #[test]
    fn test_unbalanced_blocks_compile() {
        // Balance is checked when rendering
        let template = compile("<% for x in xs %>body").unwrap();
        assert_eq!(template.nodes().len(), 2);
        let template = compile("<% endfor %>").unwrap();
        match &template.nodes()[0] {
            Node::Code { statements, .. } => {
                assert_eq!(statements[0].node, Stmt::End(EndKind::For))
            }
            other => panic!("Expected code, got {:?}", other),
        }
    }

    #[test]
    fn test_standalone_code_lines_are_trimmed() {
        let source = "<ul>\n  <% for x in xs %>\n  <li>#{{x}}</li>\n  <% endfor %>\n</ul>\n";
        let template = compile(source).unwrap();
        assert_eq!(literals(&template), vec!["<ul>\n", "  <li>", "</li>\n", "</ul>\n"]);
    }

    #[test]
    fn test_inline_code_is_not_trimmed() {
        let source = "a <% x = 1 %> b\n";
        let template = compile(source).unwrap();
        assert_eq!(literals(&template), vec!["a ", " b\n"]);
    }

    #[test]
    fn test_trimming_can_be_disabled() {
        let source = "<ul>\n  <% pass %>\n</ul>";
        let compiler = Compiler::new(CompileConfig::new().with_trim_code_lines(false));
        let template = compiler.compile(source).unwrap();
        assert_eq!(literals(&template), vec!["<ul>\n  ", "\n</ul>"]);
    }

    #[test]
    fn test_trim_consumes_line_break() {
        let template = compile("a\n<% pass %>\nb").unwrap();
        assert_eq!(template.nodes().len(), 3);
        assert_eq!(literals(&template), vec!["a\n", "b"]);
    }
}
