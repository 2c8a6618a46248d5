//! Renders a compiled template against a context
//!
//! The nodes of a template, with every statement of every code block in
//! order, form one flat list of steps. A stack of open `for`/`if` frames
//! decides whether a step runs, and loop terminators jump back to the
//! first step of the loop body.

use std::borrow::Cow;

use super::context::RenderContext;
use super::error::{EvalError, RenderError};
use super::helpers::escape_html;
use super::value::Value;
use crate::template::ast::{AssignOp, BinaryOp, EndKind, Expr, Literal, Spanned, Stmt, UnaryOp};
use crate::template::{CompiledTemplate, Node};

enum Step<'t> {
    Literal(&'t str),
    Output { expr: &'t Spanned<Expr>, escape: bool },
    Statement(&'t Spanned<Stmt>),
}

enum Frame<'t> {
    Loop {
        targets: &'t [String],
        items: Vec<Value>,
        index: usize,
        body_start: usize,
        active: bool,
        position: usize,
    },
    Cond {
        active: bool,
        /// Some branch has already run (or the whole chain is skipped)
        taken: bool,
        parent_active: bool,
        else_seen: bool,
        position: usize,
    },
}

impl Frame<'_> {
    fn active(&self) -> bool {
        match self {
            Frame::Loop { active, .. } | Frame::Cond { active, .. } => *active,
        }
    }

    fn position(&self) -> usize {
        match self {
            Frame::Loop { position, .. } | Frame::Cond { position, .. } => *position,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            Frame::Loop { .. } => "for",
            Frame::Cond { .. } => "if",
        }
    }
}

/// Render `template`. Assignments made by the template stay in `context`.
///
/// On error nothing is returned but the error; output produced before the
/// failure is discarded.
pub fn render(template: &CompiledTemplate, context: &mut RenderContext) -> Result<String, RenderError> {
    let steps = flatten(template);
    log::trace!("rendering {} steps", steps.len());
    Executor {
        context,
        stack: Vec::new(),
        out: String::new(),
    }
    .run(&steps)
}

fn flatten(template: &CompiledTemplate) -> Vec<Step<'_>> {
    let mut steps = Vec::new();
    for node in template.nodes() {
        match node {
            Node::Literal(text) => steps.push(Step::Literal(text)),
            Node::Expression { expr, escape, .. } => steps.push(Step::Output {
                expr,
                escape: *escape,
            }),
            Node::Code { statements, .. } => {
                steps.extend(statements.iter().map(Step::Statement))
            }
        }
    }
    steps
}

struct Executor<'c, 't> {
    context: &'c mut RenderContext,
    stack: Vec<Frame<'t>>,
    out: String,
}

impl<'c, 't> Executor<'c, 't> {
    fn run(mut self, steps: &[Step<'t>]) -> Result<String, RenderError> {
        let mut pc = 0;
        while pc < steps.len() {
            let active = self.stack.last().map_or(true, Frame::active);
            match &steps[pc] {
                Step::Literal(text) => {
                    if active {
                        self.out.push_str(text);
                    }
                }
                Step::Output { expr, escape } => {
                    if active {
                        let text = self.eval_ref(expr)?.to_string();
                        if *escape {
                            self.out.push_str(&escape_html(&text));
                        } else {
                            self.out.push_str(&text);
                        }
                    }
                }
                Step::Statement(stmt) => {
                    if let Some(target) = self.execute(*stmt, pc, active)? {
                        pc = target;
                        continue;
                    }
                }
            }
            pc += 1;
        }

        if let Some(frame) = self.stack.last() {
            return Err(RenderError::structure(
                frame.position(),
                format!("'{}' block is never closed", frame.keyword()),
            ));
        }
        Ok(self.out)
    }

    /// Run one statement; returns the step to jump to, if any
    fn execute(
        &mut self,
        stmt: &'t Spanned<Stmt>,
        pc: usize,
        active: bool,
    ) -> Result<Option<usize>, RenderError> {
        let position = stmt.span.start;
        match &stmt.node {
            Stmt::For { targets, iterable } => {
                let items = if active {
                    let value = self.eval(iterable)?;
                    iterate(value, targets.len())
                        .map_err(|cause| RenderError::evaluation(iterable.span.start, cause))?
                } else {
                    Vec::new()
                };
                let runs = !items.is_empty();
                if runs {
                    self.bind(targets, items[0].clone(), position)?;
                }
                self.stack.push(Frame::Loop {
                    targets,
                    items,
                    index: 0,
                    body_start: pc + 1,
                    active: runs,
                    position,
                });
            }
            Stmt::If(cond) => {
                let taken = active && self.eval_ref(cond)?.is_truthy();
                self.stack.push(Frame::Cond {
                    active: taken,
                    taken: taken || !active,
                    parent_active: active,
                    else_seen: false,
                    position,
                });
            }
            Stmt::Elif(cond) => {
                let (parent_active, taken) = self.open_conditional(position, "elif")?;
                let run = parent_active && !taken && self.eval_ref(cond)?.is_truthy();
                if let Some(Frame::Cond { active, taken, .. }) = self.stack.last_mut() {
                    *active = run;
                    *taken |= run;
                }
            }
            Stmt::Else => {
                let (parent_active, taken) = self.open_conditional(position, "else")?;
                if let Some(Frame::Cond {
                    active,
                    taken: chain_taken,
                    else_seen,
                    ..
                }) = self.stack.last_mut()
                {
                    *active = parent_active && !taken;
                    *chain_taken = true;
                    *else_seen = true;
                }
            }
            Stmt::End(kind) => return self.close(*kind, position),
            Stmt::Assign { target, op, value } => {
                if active {
                    let rhs = self.eval(value)?;
                    let result = match op {
                        AssignOp::Set => rhs,
                        AssignOp::Add | AssignOp::Sub => {
                            let current = self.context.get(target).ok_or_else(|| {
                                RenderError::evaluation(
                                    position,
                                    EvalError::UndefinedName(target.clone()),
                                )
                            })?;
                            let binary = if *op == AssignOp::Add {
                                BinaryOp::Add
                            } else {
                                BinaryOp::Sub
                            };
                            current
                                .binary(binary, &rhs)
                                .map_err(|cause| RenderError::evaluation(position, cause))?
                        }
                    };
                    self.context.insert(target.clone(), result);
                }
            }
            Stmt::Pass => {}
        }
        Ok(None)
    }

    /// Check that `elif`/`else` continues an open `if` without an `else`;
    /// returns the frame's parent activity and whether a branch ran already
    fn open_conditional(
        &self,
        position: usize,
        keyword: &str,
    ) -> Result<(bool, bool), RenderError> {
        match self.stack.last() {
            Some(Frame::Cond {
                else_seen: true, ..
            }) => Err(RenderError::structure(
                position,
                format!("'{}' after 'else'", keyword),
            )),
            Some(Frame::Cond {
                parent_active,
                taken,
                ..
            }) => Ok((*parent_active, *taken)),
            _ => Err(RenderError::structure(
                position,
                format!("'{}' without an open 'if'", keyword),
            )),
        }
    }

    /// Handle a terminator: advance the innermost loop or pop the innermost block
    fn close(&mut self, kind: EndKind, position: usize) -> Result<Option<usize>, RenderError> {
        let frame = self
            .stack
            .last_mut()
            .ok_or_else(|| RenderError::structure(position, "terminator without an open block"))?;

        match (kind, &*frame) {
            (EndKind::For, Frame::Cond { .. }) => {
                return Err(RenderError::structure(position, "'endfor' closes an 'if' block"))
            }
            (EndKind::If, Frame::Loop { .. }) => {
                return Err(RenderError::structure(position, "'endif' closes a 'for' block"))
            }
            _ => {}
        }

        if let Frame::Loop {
            targets,
            items,
            index,
            body_start,
            active: true,
            ..
        } = frame
        {
            if *index + 1 < items.len() {
                *index += 1;
                let item = items[*index].clone();
                let (targets, body_start) = (*targets, *body_start);
                self.bind(targets, item, position)?;
                return Ok(Some(body_start));
            }
        }

        self.stack.pop();
        Ok(None)
    }

    fn bind(&mut self, targets: &[String], item: Value, position: usize) -> Result<(), RenderError> {
        if let [target] = targets {
            self.context.insert(target.clone(), item);
            return Ok(());
        }
        match item {
            Value::List(values) if values.len() == targets.len() => {
                for (target, value) in targets.iter().zip(values) {
                    self.context.insert(target.clone(), value);
                }
                Ok(())
            }
            other => {
                let found = match &other {
                    Value::List(values) => format!("list of {}", values.len()),
                    _ => other.type_name().to_string(),
                };
                Err(RenderError::evaluation(
                    position,
                    EvalError::Unpack {
                        expected: targets.len(),
                        found,
                    },
                ))
            }
        }
    }

    fn eval(&self, expr: &Spanned<Expr>) -> Result<Value, RenderError> {
        Ok(self.eval_ref(expr)?.into_owned())
    }

    /// Evaluate `expr`, borrowing from the context when it names a stored
    /// value or a part of one
    fn eval_ref(&self, expr: &Spanned<Expr>) -> Result<Cow<'_, Value>, RenderError> {
        let fail = |cause: EvalError| RenderError::evaluation(expr.span.start, cause);

        match &expr.node {
            Expr::Name(name) => self
                .context
                .get(name)
                .map(Cow::Borrowed)
                .ok_or_else(|| fail(EvalError::UndefinedName(name.clone()))),
            Expr::Attr(target, name) => match self.eval_ref(target)? {
                Cow::Borrowed(Value::Map(entries)) => entries
                    .get(name)
                    .map(Cow::Borrowed)
                    .ok_or_else(|| fail(EvalError::MissingKey(name.clone()))),
                Cow::Owned(Value::Map(mut entries)) => entries
                    .swap_remove(name)
                    .map(Cow::Owned)
                    .ok_or_else(|| fail(EvalError::MissingKey(name.clone()))),
                other => Err(fail(EvalError::NotIndexable {
                    target: other.type_name(),
                    index: "attribute",
                })),
            },
            Expr::Index(target, index) => {
                let container = self.eval_ref(target)?;
                let index = self.eval_ref(index)?;
                match container {
                    Cow::Borrowed(container) => lookup(container, &index).map_err(fail),
                    Cow::Owned(container) => lookup(&container, &index)
                        .map(|item| Cow::Owned(item.into_owned()))
                        .map_err(fail),
                }
            }
            _ => self.eval_value(expr).map(Cow::Owned),
        }
    }

    /// Evaluate an expression that builds a new value
    fn eval_value(&self, expr: &Spanned<Expr>) -> Result<Value, RenderError> {
        let fail = |cause: EvalError| RenderError::evaluation(expr.span.start, cause);

        match &expr.node {
            Expr::Name(_) | Expr::Attr(..) | Expr::Index(..) => self.eval(expr),
            Expr::Literal(lit) => Ok(match lit {
                Literal::Null => Value::Null,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Int(n) => Value::Int(*n),
                Literal::Float(x) => Value::Float(*x),
                Literal::Str(s) => Value::Str(s.clone()),
            }),
            Expr::List(items) => Ok(Value::List(
                items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<_, _>>()?,
            )),
            Expr::Map(entries) => {
                let mut map = indexmap::IndexMap::new();
                for (key, value) in entries {
                    let k = self.eval(key)?;
                    let k = k.key_string().ok_or_else(|| {
                        RenderError::evaluation(
                            key.span.start,
                            EvalError::NotIndexable {
                                target: "map",
                                index: k.type_name(),
                            },
                        )
                    })?;
                    map.insert(k, self.eval(value)?);
                }
                Ok(Value::Map(map))
            }
            Expr::Call(callee, args) => {
                let values = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                match &callee.node {
                    Expr::Name(name) if self.context.helper(name).is_some() => {
                        self.context.call(name, &values).map_err(fail)
                    }
                    Expr::Name(name) if self.context.get(name).is_none() => {
                        Err(fail(EvalError::UndefinedName(name.clone())))
                    }
                    Expr::Name(name) => Err(fail(EvalError::NotCallable(name.clone()))),
                    _ => {
                        let value = self.eval(callee)?;
                        Err(fail(EvalError::NotCallable(value.type_name().to_string())))
                    }
                }
            }
            Expr::Unary(op, operand) => {
                let value = self.eval_ref(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                    UnaryOp::Neg => match &*value {
                        Value::Int(n) => Ok(n
                            .checked_neg()
                            .map_or(Value::Float(-(*n as f64)), Value::Int)),
                        Value::Float(x) => Ok(Value::Float(-x)),
                        other => Err(fail(EvalError::operand(*op, other))),
                    },
                }
            }
            Expr::Binary(BinaryOp::And, lhs, rhs) => Ok(Value::Bool(
                self.eval_ref(lhs)?.is_truthy() && self.eval_ref(rhs)?.is_truthy(),
            )),
            Expr::Binary(BinaryOp::Or, lhs, rhs) => Ok(Value::Bool(
                self.eval_ref(lhs)?.is_truthy() || self.eval_ref(rhs)?.is_truthy(),
            )),
            Expr::Binary(op, lhs, rhs) => {
                let left = self.eval_ref(lhs)?;
                let right = self.eval_ref(rhs)?;
                left.binary(*op, &right).map_err(fail)
            }
        }
    }
}

/// `container[index]`, borrowing the item when the container holds it
fn lookup<'v>(container: &'v Value, index: &Value) -> Result<Cow<'v, Value>, EvalError> {
    match (container, index) {
        (Value::List(items), Value::Int(i)) => {
            let at = resolve_index(*i, items.len())?;
            Ok(Cow::Borrowed(&items[at]))
        }
        (Value::Str(s), Value::Int(i)) => {
            let chars: Vec<char> = s.chars().collect();
            let at = resolve_index(*i, chars.len())?;
            Ok(Cow::Owned(Value::Str(chars[at].to_string())))
        }
        (Value::Map(entries), key) => match key.key_string() {
            Some(k) => entries.get(&k).map(Cow::Borrowed).ok_or(EvalError::MissingKey(k)),
            None => Err(EvalError::NotIndexable {
                target: "map",
                index: key.type_name(),
            }),
        },
        (other, key) => Err(EvalError::NotIndexable {
            target: other.type_name(),
            index: key.type_name(),
        }),
    }
}

/// Position for a possibly negative index, counted from the end
fn resolve_index(index: i64, len: usize) -> Result<usize, EvalError> {
    let resolved = if index < 0 {
        i64::try_from(len).ok().map(|n| n + index)
    } else {
        Some(index)
    };
    resolved
        .and_then(|i| usize::try_from(i).ok())
        .filter(|i| *i < len)
        .ok_or(EvalError::IndexOutOfRange { index, len })
}

/// Items a `for` with `targets` names walks over
fn iterate(value: Value, targets: usize) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::List(items) => Ok(items),
        Value::Map(entries) if targets == 1 => Ok(entries.into_keys().map(Value::Str).collect()),
        Value::Map(entries) => Ok(entries
            .into_iter()
            .map(|(k, v)| Value::List(vec![Value::Str(k), v]))
            .collect()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        other => Err(EvalError::NotIterable(other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::compile;
    use pretty_assertions::assert_eq;

    fn render_with(source: &str, context: &mut RenderContext) -> Result<String, RenderError> {
        render(&compile(source).unwrap(), context)
    }

    fn render_str(source: &str) -> Result<String, RenderError> {
        render_with(source, &mut RenderContext::new())
    }

    #[test]
    fn test_arithmetic_output() {
        assert_eq!(render_str("<b>#{{1+1}}</b>").unwrap(), "<b>2</b>");
        assert_eq!(render_str("#{{ 7 / 2 }} #{{ 7 // 2 }}").unwrap(), "3.5 3");
    }

    #[test]
    fn test_literal_round_trip() {
        let source = "<p>nothing {to} see } here</p>\n";
        assert_eq!(render_str(source).unwrap(), source);
    }

    #[test]
    fn test_escaped_output() {
        let mut context = RenderContext::new().with_value("name", "<Tom & Jerry>");
        assert_eq!(
            render_with("${{name}} #{{name}}", &mut context).unwrap(),
            "&lt;Tom &amp; Jerry&gt; <Tom & Jerry>"
        );
    }

    #[test]
    fn test_none_renders_empty() {
        assert_eq!(render_str("[#{{ none }}]").unwrap(), "[]");
    }

    #[test]
    fn test_for_loop() {
        let mut context = RenderContext::new().with_value("xs", vec![1, 2, 3]);
        assert_eq!(
            render_with("<% for x in xs %>(#{{x}})<% end %>", &mut context).unwrap(),
            "(1)(2)(3)"
        );
    }

    #[test]
    fn test_zero_iteration_loop() {
        let mut context = RenderContext::new().with_value("xs", Vec::<i64>::new());
        assert_eq!(
            render_with("a<% for x in xs %>#{{ undefined }}<% endfor %>b", &mut context).unwrap(),
            "ab"
        );
    }

    #[test]
    fn test_nested_loops() {
        let source = "<% for row in rows %><% for cell in row %>#{{cell}}<% end %>;<% end %>";
        let mut context =
            RenderContext::new().with_value("rows", Value::list([Value::list([1, 2]), Value::list([3])]));
        assert_eq!(render_with(source, &mut context).unwrap(), "12;3;");
    }

    #[test]
    fn test_map_iteration() {
        let mut context = RenderContext::new().with_value("m", Value::map([("a", 1), ("b", 2)]));
        assert_eq!(
            render_with("<% for k in m %>#{{k}}<% end %>", &mut context).unwrap(),
            "ab"
        );
        assert_eq!(
            render_with("<% for k, v in m %>#{{k}}=#{{v}} <% end %>", &mut context).unwrap(),
            "a=1 b=2 "
        );
    }

    #[test]
    fn test_conditionals() {
        let source = "<% if n > 10 %>big<% elif n > 5 %>medium<% else %>small<% endif %>";
        for (n, expected) in [(20, "big"), (7, "medium"), (1, "small")] {
            let mut context = RenderContext::new().with_value("n", n);
            assert_eq!(render_with(source, &mut context).unwrap(), expected);
        }
    }

    #[test]
    fn test_skipped_branches_are_not_evaluated() {
        let source = "<% if true %>yes<% elif 1 / 0 %>no<% else %>#{{ missing }}<% end %>";
        assert_eq!(render_str(source).unwrap(), "yes");
    }

    #[test]
    fn test_blocks_inside_skipped_branch() {
        let source = "<% if false %><% for x in nothing %><% if x %>.<% end %><% end %><% end %>ok";
        assert_eq!(render_str(source).unwrap(), "ok");
    }

    #[test]
    fn test_assignments() {
        let source = "<% total = 0\nfor x in xs:\n  total += x\nend %>#{{ total }}";
        let mut context = RenderContext::new().with_value("xs", vec![1, 2, 3]);
        assert_eq!(render_with(source, &mut context).unwrap(), "6");
        assert_eq!(context.get("total"), Some(&Value::Int(6)));
    }

    #[test]
    fn test_indexing() {
        let mut context = RenderContext::new()
            .with_value("xs", vec![10, 20, 30])
            .with_value("m", Value::map([("key", "v"), ("5", "five")]));
        assert_eq!(
            render_with("#{{xs[0]}} #{{xs[-1]}} #{{m.key}} #{{m[5]}} #{{'abc'[1]}}", &mut context)
                .unwrap(),
            "10 30 v five b"
        );
    }

    #[test]
    fn test_nested_place_expressions() {
        let mut context = RenderContext::new()
            .with_value("days", vec![0, 1])
            .with_value("types", vec![0, 1])
            .with_value(
                "matrix",
                Value::list([Value::list([1, 2]), Value::list([3, 4])]),
            )
            .with_value("cache", Value::map([("owner", Value::map([("name", "geo")]))]));
        assert_eq!(
            render_with(
                "<% for t in types %><% for d in days %>#{{ matrix[t][d] * 10 }} <% end %><% end %>",
                &mut context
            )
            .unwrap(),
            "10 20 30 40 "
        );
        assert_eq!(
            render_with(
                "#{{ cache.owner.name }} #{{ cache['owner'].name }} #{{ -matrix[1][-1] }}",
                &mut context
            )
            .unwrap(),
            "geo geo -4"
        );
        assert_eq!(
            render_with("#{{ [[1, 2], [3, 4]][1][0] }} #{{ {'a': {'b': 5} }.a.b }}", &mut context)
                .unwrap(),
            "3 5"
        );
        assert_eq!(
            context.get("matrix"),
            Some(&Value::list([Value::list([1, 2]), Value::list([3, 4])]))
        );
    }

    #[test]
    fn test_undefined_name_position() {
        let err = render_str("abc #{{ total + 1 }}").unwrap_err();
        assert_eq!(
            err,
            RenderError::evaluation(8, EvalError::UndefinedName("total".to_string()))
        );
    }

    #[test]
    fn test_evaluation_errors() {
        let mut context = RenderContext::new().with_value("xs", vec![1]);
        let cases = [
            ("#{{ 1 / 0 }}", EvalError::DivisionByZero),
            ("#{{ xs[3] }}", EvalError::IndexOutOfRange { index: 3, len: 1 }),
            ("#{{ xs(1) }}", EvalError::NotCallable("xs".to_string())),
            ("<% for x in 5 %><% end %>", EvalError::NotIterable("int")),
        ];
        for (source, cause) in cases {
            match render_with(source, &mut context) {
                Err(RenderError::Evaluation { cause: found, .. }) => assert_eq!(found, cause),
                other => panic!("Expected evaluation error for {}, got {:?}", source, other),
            }
        }
    }

    #[test]
    fn test_unpack_error() {
        let mut context = RenderContext::new().with_value("xs", vec![1, 2]);
        let err = render_with("<% for a, b in xs %><% end %>", &mut context).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Evaluation {
                cause: EvalError::Unpack { expected: 2, .. },
                ..
            }
        ));
    }

    #[test]
    fn test_structure_errors() {
        let cases = [
            ("<% end %>", "terminator without an open block"),
            ("<% for x in [1] %><% endif %>", "'endif' closes a 'for' block"),
            ("<% if true %><% endfor %>", "'endfor' closes an 'if' block"),
            ("<% else %>", "'else' without an open 'if'"),
            ("<% if 1 %><% else %><% elif 2 %><% end %>", "'elif' after 'else'"),
            ("<% if true %>open", "'if' block is never closed"),
        ];
        for (source, reason) in cases {
            match render_str(source) {
                Err(RenderError::Structure { reason: found, .. }) => assert_eq!(found, reason),
                other => panic!("Expected structure error for {}, got {:?}", source, other),
            }
        }
    }

    #[test]
    fn test_short_circuit() {
        assert_eq!(render_str("#{{ false and 1/0 }}").unwrap(), "false");
        assert_eq!(render_str("#{{ 1 or missing }}").unwrap(), "true");
    }
}
