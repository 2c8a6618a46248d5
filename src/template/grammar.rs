//! Parser for embedded expressions and code-block statements using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::TemplateSyntaxError;
use crate::template::ast::{
    offset_expr, AssignOp, BinaryOp, EndKind, Expr, Literal, Span, Spanned, Stmt, UnaryOp,
};
use crate::template::lexer::{self, LexError, Token};

/// Postfix operation applied to an atom
#[derive(Debug, Clone)]
enum Postfix {
    Attr(String),
    Index(Spanned<Expr>),
    Call(Vec<Spanned<Expr>>),
}

/// Parse the source of an expression placeholder.
///
/// `offset` is the position of `source` inside the template and is added
/// to every span, including the error position.
pub fn parse_expression(source: &str, offset: usize) -> Result<Spanned<Expr>, TemplateSyntaxError> {
    let tokens: Vec<_> = tokenize(source, offset)?
        .into_iter()
        .filter(|(tok, _)| *tok != Token::Newline)
        .collect();
    let len = source.len();

    let token_stream = Stream::from_iter(tokens.into_iter().map(|(tok, span)| (tok, span.into())))
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    expr_parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map(|expr| offset_expr(expr, offset))
        .map_err(|errs| first_error(errs, offset, "empty expression"))
}

/// Parse the statements of a code block
pub fn parse_block(source: &str, offset: usize) -> Result<Vec<Spanned<Stmt>>, TemplateSyntaxError> {
    let tokens = tokenize(source, offset)?;
    let len = source.len();

    let token_stream = Stream::from_iter(tokens.into_iter().map(|(tok, span)| (tok, span.into())))
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    block_parser()
        .parse(token_stream)
        .into_result()
        .map(|stmts| {
            stmts
                .into_iter()
                .map(|stmt| Spanned::new(stmt.node.offset(offset), stmt.span).offset(offset))
                .collect()
        })
        .map_err(|errs| first_error(errs, offset, "invalid statement"))
}

fn tokenize(source: &str, offset: usize) -> Result<Vec<(Token, Span)>, TemplateSyntaxError> {
    lexer::lex(source).map_err(|(error, span)| {
        let text = &source[span.clone()];
        let reason = match error {
            LexError::UnexpectedCharacter => format!("unexpected character '{}'", text),
            LexError::NumberOutOfRange => format!("number '{}' is out of range", text),
        };
        TemplateSyntaxError::new(span.start + offset, reason)
    })
}

fn first_error(
    errs: Vec<Rich<'_, Token>>,
    offset: usize,
    fallback: &str,
) -> TemplateSyntaxError {
    errs.into_iter()
        .next()
        .map(|e| TemplateSyntaxError::from_rich(e, offset))
        .unwrap_or_else(|| TemplateSyntaxError::new(offset, fallback))
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn fold_binary((first, rest): (Spanned<Expr>, Vec<(BinaryOp, Spanned<Expr>)>)) -> Spanned<Expr> {
    rest.into_iter().fold(first, |lhs, (op, rhs)| {
        let span = lhs.span.start..rhs.span.end;
        Spanned::new(Expr::Binary(op, Box::new(lhs), Box::new(rhs)), span)
    })
}

fn fold_unary(op: UnaryOp) -> impl Fn((Vec<Span>, Spanned<Expr>)) -> Spanned<Expr> + Clone {
    move |(prefixes, operand)| {
        prefixes.into_iter().rev().fold(operand, |inner, prefix| {
            let span = prefix.start..inner.span.end;
            Spanned::new(Expr::Unary(op, Box::new(inner)), span)
        })
    }
}

fn expr_parser<'a, I>() -> impl Parser<'a, I, Spanned<Expr>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    recursive(|expr| {
        let literal = select! {
            Token::Int(n) => Expr::Literal(Literal::Int(n)),
            Token::Float(f) => Expr::Literal(Literal::Float(f)),
            Token::Str(s) => Expr::Literal(Literal::Str(s)),
            Token::True => Expr::Literal(Literal::Bool(true)),
            Token::False => Expr::Literal(Literal::Bool(false)),
            Token::Null => Expr::Literal(Literal::Null),
            Token::Ident(name) => Expr::Name(name),
        }
        .map_with(|node, e| Spanned::new(node, span_range(&e.span())));

        let list = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
            .map_with(|items, e| Spanned::new(Expr::List(items), span_range(&e.span())));

        // Map keys: bare identifiers read as strings, like CSS property names
        let map_key = select! {
            Token::Ident(s) => Expr::Literal(Literal::Str(s)),
            Token::Str(s) => Expr::Literal(Literal::Str(s)),
            Token::Int(n) => Expr::Literal(Literal::Int(n)),
        }
        .map_with(|node, e| Spanned::new(node, span_range(&e.span())));

        let map = map_key
            .then_ignore(just(Token::Colon))
            .then(expr.clone())
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::BraceOpen), just(Token::BraceClose))
            .map_with(|entries, e| Spanned::new(Expr::Map(entries), span_range(&e.span())));

        let parenthesized = expr
            .clone()
            .delimited_by(just(Token::ParenOpen), just(Token::ParenClose));

        let atom = choice((literal, list, map, parenthesized));

        let arguments = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::ParenOpen), just(Token::ParenClose));

        let postfix_op = choice((
            just(Token::Dot)
                .ignore_then(select! { Token::Ident(name) => name })
                .map(Postfix::Attr),
            expr.clone()
                .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
                .map(Postfix::Index),
            arguments.map(Postfix::Call),
        ))
        .map_with(|op, e| (op, span_range(&e.span())));

        let postfix = atom
            .then(postfix_op.repeated().collect::<Vec<_>>())
            .map(|(first, ops)| {
                ops.into_iter().fold(first, |target, (op, op_span)| {
                    let span = target.span.start..op_span.end;
                    let node = match op {
                        Postfix::Attr(name) => Expr::Attr(Box::new(target), name),
                        Postfix::Index(index) => Expr::Index(Box::new(target), Box::new(index)),
                        Postfix::Call(args) => Expr::Call(Box::new(target), args),
                    };
                    Spanned::new(node, span)
                })
            })
            .boxed();

        let negation = just(Token::Minus)
            .map_with(|_, e| span_range(&e.span()))
            .repeated()
            .collect::<Vec<_>>()
            .then(postfix)
            .map(fold_unary(UnaryOp::Neg));

        let product_op = choice((
            just(Token::Star).to(BinaryOp::Mul),
            just(Token::SlashSlash).to(BinaryOp::FloorDiv),
            just(Token::Slash).to(BinaryOp::Div),
            just(Token::Percent).to(BinaryOp::Rem),
        ));
        let product = negation
            .clone()
            .then(product_op.then(negation).repeated().collect::<Vec<_>>())
            .map(fold_binary);

        let sum_op = choice((
            just(Token::Plus).to(BinaryOp::Add),
            just(Token::Minus).to(BinaryOp::Sub),
        ));
        let sum = product
            .clone()
            .then(sum_op.then(product).repeated().collect::<Vec<_>>())
            .map(fold_binary)
            .boxed();

        let comparison_op = choice((
            just(Token::EqualEqual).to(BinaryOp::Eq),
            just(Token::NotEqual).to(BinaryOp::NotEq),
            just(Token::LessOrEqual).to(BinaryOp::LtEq),
            just(Token::GreaterOrEqual).to(BinaryOp::GtEq),
            just(Token::Less).to(BinaryOp::Lt),
            just(Token::Greater).to(BinaryOp::Gt),
            just(Token::Not).then(just(Token::In)).to(BinaryOp::NotIn),
            just(Token::In).to(BinaryOp::In),
        ));
        let comparison = sum
            .clone()
            .then(comparison_op.then(sum).or_not())
            .map(|(lhs, rest)| fold_binary((lhs, rest.into_iter().collect())));

        let inversion = just(Token::Not)
            .map_with(|_, e| span_range(&e.span()))
            .repeated()
            .collect::<Vec<_>>()
            .then(comparison)
            .map(fold_unary(UnaryOp::Not));

        let conjunction = inversion
            .clone()
            .then(
                just(Token::And)
                    .to(BinaryOp::And)
                    .then(inversion)
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .map(fold_binary);

        conjunction
            .clone()
            .then(
                just(Token::Or)
                    .to(BinaryOp::Or)
                    .then(conjunction)
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .map(fold_binary)
            .boxed()
    })
}

fn block_parser<'a, I>() -> impl Parser<'a, I, Vec<Spanned<Stmt>>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let expr = expr_parser();
    let ident = select! { Token::Ident(name) => name };
    let colon = just(Token::Colon).or_not();

    let for_stmt = just(Token::For)
        .ignore_then(
            ident
                .separated_by(just(Token::Comma))
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .then_ignore(just(Token::In))
        .then(expr.clone())
        .then_ignore(colon.clone())
        .map(|(targets, iterable)| Stmt::For { targets, iterable });

    let if_stmt = just(Token::If)
        .ignore_then(expr.clone())
        .then_ignore(colon.clone())
        .map(Stmt::If);

    let elif_stmt = just(Token::Elif)
        .ignore_then(expr.clone())
        .then_ignore(colon.clone())
        .map(Stmt::Elif);

    let else_stmt = just(Token::Else).then(colon).to(Stmt::Else);

    let end_stmt = choice((
        just(Token::End).to(Stmt::End(EndKind::Any)),
        just(Token::EndFor).to(Stmt::End(EndKind::For)),
        just(Token::EndIf).to(Stmt::End(EndKind::If)),
    ));

    let assign_op = choice((
        just(Token::Equals).to(AssignOp::Set),
        just(Token::PlusEquals).to(AssignOp::Add),
        just(Token::MinusEquals).to(AssignOp::Sub),
    ));
    let assign = ident
        .then(assign_op)
        .then(expr)
        .map(|((target, op), value)| Stmt::Assign { target, op, value });

    let statement = choice((
        for_stmt,
        if_stmt,
        elif_stmt,
        else_stmt,
        end_stmt,
        just(Token::Pass).to(Stmt::Pass),
        assign,
    ))
    .map_with(|stmt, e| Spanned::new(stmt, span_range(&e.span())));

    // Blank lines and stray separators are allowed between statements
    statement
        .or_not()
        .separated_by(choice((just(Token::Newline), just(Token::Semicolon))))
        .collect::<Vec<_>>()
        .then_ignore(end())
        .map(|stmts| stmts.into_iter().flatten().collect())
}
