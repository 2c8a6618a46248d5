//! Lexer for expressions and statements embedded in templates, using logos

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Why a piece of input is not a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexError {
    #[default]
    UnexpectedCharacter,
    NumberOutOfRange,
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexError)]
#[logos(skip r"[ \t\r]+")]
pub enum Token {
    // Statement keywords
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("if")]
    If,
    #[token("elif")]
    Elif,
    #[token("else")]
    Else,
    #[token("end")]
    End,
    #[token("endfor")]
    EndFor,
    #[token("endif")]
    EndIf,
    #[token("pass")]
    Pass,

    // Operator keywords
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,

    // Constants
    #[token("true")]
    #[token("True")]
    True,
    #[token("false")]
    #[token("False")]
    False,
    #[token("none")]
    #[token("None")]
    Null,

    // Operators (longer first)
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    NotEqual,
    #[token("<=")]
    LessOrEqual,
    #[token(">=")]
    GreaterOrEqual,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("+=")]
    PlusEquals,
    #[token("-=")]
    MinusEquals,
    #[token("=")]
    Equals,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("//")]
    SlashSlash,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    // Delimiters
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
    #[token("\n")]
    Newline,

    // Literals - identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| unescape(lex.slice()))]
    Str(String),

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[regex(r"[0-9]+", |lex| {
        lex.slice().parse::<i64>().map_err(|_| LexError::NumberOutOfRange)
    })]
    Int(i64),

    // Comments run to the end of the line
    #[regex(r"#[^\n]*", logos::skip)]
    Comment,
}

/// Strip the quotes of a string literal and resolve its escapes
fn unescape(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Lex input string into tokens with spans.
///
/// The first input that is not a token is returned with its span.
/// Newlines inside brackets are dropped so only statement-level line
/// breaks remain.
pub fn lex(input: &str) -> Result<Vec<(Token, Span)>, (LexError, Span)> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    for (tok, span) in Token::lexer(input).spanned() {
        let tok = tok.map_err(|e| (e, span.clone()))?;
        match tok {
            Token::ParenOpen | Token::BracketOpen | Token::BraceOpen => depth += 1,
            Token::ParenClose | Token::BracketClose | Token::BraceClose => {
                depth = depth.saturating_sub(1)
            }
            Token::Newline if depth > 0 => continue,
            _ => {}
        }
        tokens.push((tok, span));
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        lex(input)
            .expect("Should lex")
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn test_statement_keywords() {
        assert_eq!(
            kinds("for in if elif else end endfor endif pass"),
            vec![
                Token::For,
                Token::In,
                Token::If,
                Token::Elif,
                Token::Else,
                Token::End,
                Token::EndFor,
                Token::EndIf,
                Token::Pass
            ]
        );
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        assert_eq!(
            kinds("format ending index"),
            vec![
                Token::Ident("format".to_string()),
                Token::Ident("ending".to_string()),
                Token::Ident("index".to_string())
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 3.5 -1"),
            vec![
                Token::Int(42),
                Token::Float(3.5),
                Token::Minus,
                Token::Int(1)
            ]
        );
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(
            kinds(r#""a\"b" 'it\'s' "x\ny""#),
            vec![
                Token::Str("a\"b".to_string()),
                Token::Str("it's".to_string()),
                Token::Str("x\ny".to_string())
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("== != <= >= < > += -= = + - * // / %"),
            vec![
                Token::EqualEqual,
                Token::NotEqual,
                Token::LessOrEqual,
                Token::GreaterOrEqual,
                Token::Less,
                Token::Greater,
                Token::PlusEquals,
                Token::MinusEquals,
                Token::Equals,
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::SlashSlash,
                Token::Slash,
                Token::Percent
            ]
        );
    }

    #[test]
    fn test_constants_both_spellings() {
        assert_eq!(
            kinds("true True false False none None"),
            vec![
                Token::True,
                Token::True,
                Token::False,
                Token::False,
                Token::Null,
                Token::Null
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            kinds("x = 1 # set x\ny"),
            vec![
                Token::Ident("x".to_string()),
                Token::Equals,
                Token::Int(1),
                Token::Newline,
                Token::Ident("y".to_string())
            ]
        );
        assert!(kinds("# only a comment").is_empty());
    }

    #[test]
    fn test_newlines_inside_brackets_dropped() {
        assert_eq!(
            kinds("f(a,\n b)\nc"),
            vec![
                Token::Ident("f".to_string()),
                Token::ParenOpen,
                Token::Ident("a".to_string()),
                Token::Comma,
                Token::Ident("b".to_string()),
                Token::ParenClose,
                Token::Newline,
                Token::Ident("c".to_string())
            ]
        );
    }

    #[test]
    fn test_unknown_character_is_error() {
        assert_eq!(lex("a $ b"), Err((LexError::UnexpectedCharacter, 2..3)));
    }

    #[test]
    fn test_integer_overflow_is_error() {
        assert_eq!(
            lex("x = 99999999999999999999"),
            Err((LexError::NumberOutOfRange, 4..24))
        );
        assert_eq!(kinds("9223372036854775807"), vec![Token::Int(i64::MAX)]);
    }
}
