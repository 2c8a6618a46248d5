//! Error types for template compilation

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::template::lexer::Token;

/// A template that cannot be compiled: unclosed markers or an embedded
/// expression/statement outside the grammar
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("template syntax error at byte {position}: {reason}")]
pub struct TemplateSyntaxError {
    /// Byte offset in the template source
    pub position: usize,
    pub reason: String,
}

impl TemplateSyntaxError {
    pub fn new(position: usize, reason: impl Into<String>) -> Self {
        Self {
            position,
            reason: reason.into(),
        }
    }

    /// Convert a parser error inside a fragment starting at `offset`
    pub(crate) fn from_rich(err: chumsky::error::Rich<'_, Token>, offset: usize) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of input".to_string(),
                };
                format!("unexpected {}", found_str)
            }
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of input".to_string()),
                _ => None,
            })
            .collect();

        let reason = if expected.is_empty() {
            message
        } else {
            format!("{}, expected {}", message, expected.join(", "))
        };

        Self::new(err.span().start + offset, reason)
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        let end = (self.position + 1).min(source.len()).max(self.position);
        let written = Report::build(ReportKind::Error, filename, self.position)
            .with_message("template syntax error")
            .with_label(
                Label::new((filename, self.position..end))
                    .with_message(&self.reason)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::Ident(s) => format!("identifier '{}'", s),
        Token::Str(s) => format!("string \"{}\"", s),
        Token::Int(n) => format!("number {}", n),
        Token::Float(n) => format!("number {}", n),
        Token::Newline => "end of line".to_string(),
        Token::For => "keyword 'for'".to_string(),
        Token::In => "keyword 'in'".to_string(),
        Token::If => "keyword 'if'".to_string(),
        Token::Elif => "keyword 'elif'".to_string(),
        Token::Else => "keyword 'else'".to_string(),
        Token::End => "keyword 'end'".to_string(),
        Token::EndFor => "keyword 'endfor'".to_string(),
        Token::EndIf => "keyword 'endif'".to_string(),
        Token::ParenOpen => "'('".to_string(),
        Token::ParenClose => "')'".to_string(),
        Token::BracketOpen => "'['".to_string(),
        Token::BracketClose => "']'".to_string(),
        Token::BraceOpen => "'{'".to_string(),
        Token::BraceClose => "'}'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Colon => "':'".to_string(),
        Token::Equals => "'='".to_string(),
        _ => format!("{:?}", tok),
    }
}
