//! Token grammar for tag code, and assembly of tags into a node tree.

use std::path::Path;

use chumsky::{
    input::{Stream, ValueInput},
    pratt::*,
    prelude::*,
};
use vista_core::Value;

use super::ast::{Expr, Node, Stmt};
use super::lexer::{segments, syntax, syntax_at, tokenize, Segment, Token};
use crate::error::ViewError;

type ParseError<'src> = Rich<'src, Token<'src>>;

/// What one `<% ... %>` tag holds.
#[derive(Debug, Clone, PartialEq)]
enum Tag {
    If(Expr),
    Else,
    End,
    For { var: String, iter: Expr },
    Stmts(Vec<Stmt>),
}

/// A postfix access applied to an atom.
#[derive(Debug, Clone)]
enum Access {
    Member(String),
    Index(Expr),
}

fn name<'src, I>() -> impl Parser<'src, I, String, extra::Err<ParseError<'src>>> + Clone
where
    I: ValueInput<'src, Token = Token<'src>, Span = SimpleSpan>,
{
    select! { Token::Ident(name) => name.to_string() }
}

fn expression<'src, I>() -> impl Parser<'src, I, Expr, extra::Err<ParseError<'src>>> + Clone
where
    I: ValueInput<'src, Token = Token<'src>, Span = SimpleSpan>,
{
    recursive(|expression| {
        let ctrl = |c: char| just(Token::Ctrl(c));

        let literal = select! {
            Token::Str(text) => Value::String(text),
            Token::Int(n) => Value::from(n),
            Token::Float(n) => Value::from(n),
            Token::True => Value::Bool(true),
            Token::False => Value::Bool(false),
            Token::Null => Value::Null,
        }
        .map(Expr::Literal);

        let arguments = expression
            .clone()
            .separated_by(ctrl(','))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(ctrl('('), ctrl(')'));

        let call = name()
            .then(arguments.clone())
            .map(|(name, args)| Expr::Call { name, args });

        // `this.name(...)` is the same call as `name(...)`.
        let method = just(Token::This)
            .ignore_then(ctrl('.'))
            .ignore_then(name())
            .then(arguments)
            .map(|(name, args)| Expr::Call { name, args });

        let array = expression
            .clone()
            .separated_by(ctrl(','))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(ctrl('['), ctrl(']'))
            .map(Expr::Array);

        let key = name().or(select! { Token::Str(key) => key });
        let object = key
            .then_ignore(ctrl(':'))
            .then(expression.clone())
            .separated_by(ctrl(','))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(ctrl('{'), ctrl('}'))
            .map(Expr::Object);

        let nested = expression.clone().delimited_by(ctrl('('), ctrl(')'));

        let atom = choice((
            literal,
            method,
            call,
            name().map(Expr::Var),
            array,
            object,
            nested,
        ));

        let access = choice((
            ctrl('.').ignore_then(name()).map(Access::Member),
            expression
                .clone()
                .delimited_by(ctrl('['), ctrl(']'))
                .map(Access::Index),
        ));

        let accessed = atom.foldl(access.repeated(), |base, access| match access {
            Access::Member(field) => Expr::Member(Box::new(base), field),
            Access::Index(index) => Expr::Index(Box::new(base), Box::new(index)),
        });

        accessed.pratt((
            prefix(3, just(Token::Bang), |_, operand, _| Expr::Not(Box::new(operand))),
            infix(left(2), just(Token::EqEq), |l, _, r, _| {
                Expr::Eq(Box::new(l), Box::new(r))
            }),
            infix(left(2), just(Token::NotEq), |l, _, r, _| {
                Expr::NotEq(Box::new(l), Box::new(r))
            }),
            infix(left(1), just(Token::Coalesce), |l, _, r, _| {
                Expr::Coalesce(Box::new(l), Box::new(r))
            }),
        ))
    })
}

fn echo_tag<'src, I>() -> impl Parser<'src, I, Expr, extra::Err<ParseError<'src>>>
where
    I: ValueInput<'src, Token = Token<'src>, Span = SimpleSpan>,
{
    expression()
        .then_ignore(just(Token::Ctrl(';')).repeated())
        .then_ignore(end())
}

fn code_tag<'src, I>() -> impl Parser<'src, I, Tag, extra::Err<ParseError<'src>>>
where
    I: ValueInput<'src, Token = Token<'src>, Span = SimpleSpan>,
{
    let semis = just(Token::Ctrl(';')).repeated();

    let statement = choice((
        just(Token::Let)
            .ignore_then(name())
            .then_ignore(just(Token::Assign))
            .then(expression())
            .map(|(name, value)| Stmt::Let(name, value)),
        expression().map(Stmt::Expr),
    ));

    let statements = semis
        .clone()
        .ignore_then(
            statement
                .separated_by(semis.clone().at_least(1))
                .allow_trailing()
                .collect::<Vec<_>>(),
        )
        .map(Tag::Stmts);

    // Control keywords stand alone in their tag.
    choice((
        just(Token::If).ignore_then(expression()).map(Tag::If),
        just(Token::Else).to(Tag::Else),
        just(Token::End).to(Tag::End),
        just(Token::For)
            .ignore_then(name())
            .then_ignore(just(Token::In))
            .then(expression())
            .map(|(var, iter)| Tag::For { var, iter }),
        statements,
    ))
    .then_ignore(semis)
    .then_ignore(end())
}

fn token_stream<'src>(
    tokens: Vec<(Token<'src>, SimpleSpan)>,
    eoi: usize,
) -> impl ValueInput<'src, Token = Token<'src>, Span = SimpleSpan> {
    Stream::from_iter(tokens).map(SimpleSpan::from(eoi..eoi), |(token, span)| (token, span))
}

fn parse_tag<'src, I, T>(
    grammar: impl Parser<'src, I, T, extra::Err<ParseError<'src>>>,
    input: I,
    code: &str,
    line: usize,
    path: &Path,
) -> Result<T, ViewError>
where
    I: ValueInput<'src, Token = Token<'src>, Span = SimpleSpan>,
{
    grammar.parse(input).into_result().map_err(|errs| match errs.first() {
        Some(err) => syntax_at(path, code, line, err),
        None => syntax(path, line, "invalid tag"),
    })
}

fn parse_echo(code: &str, line: usize, path: &Path) -> Result<Expr, ViewError> {
    let tokens = tokenize(code, line, path)?;
    parse_tag(echo_tag(), token_stream(tokens, code.len()), code, line, path)
}

fn parse_code(code: &str, line: usize, path: &Path) -> Result<Tag, ViewError> {
    let tokens = tokenize(code, line, path)?;
    parse_tag(code_tag(), token_stream(tokens, code.len()), code, line, path)
}

/// A control tag waiting for its `end`.
enum Open {
    If {
        cond: Expr,
        then: Option<Vec<Node>>,
        line: usize,
        outer: Vec<Node>,
    },
    For {
        var: String,
        iter: Expr,
        line: usize,
        outer: Vec<Node>,
    },
}

/// Parse a whole view source into nodes.
pub(crate) fn parse(source: &str, path: &Path) -> Result<Vec<Node>, ViewError> {
    let mut stack: Vec<Open> = Vec::new();
    let mut nodes: Vec<Node> = Vec::new();

    for segment in segments(source, path)? {
        match segment {
            Segment::Text(text) => nodes.push(Node::Text(text.to_string())),
            Segment::Echo { code, line } => nodes.push(Node::Echo(parse_echo(code, line, path)?)),
            Segment::Code { code, line } => match parse_code(code, line, path)? {
                Tag::If(cond) => stack.push(Open::If {
                    cond,
                    then: None,
                    line,
                    outer: std::mem::take(&mut nodes),
                }),
                Tag::For { var, iter } => stack.push(Open::For {
                    var,
                    iter,
                    line,
                    outer: std::mem::take(&mut nodes),
                }),
                Tag::Else => match stack.last_mut() {
                    Some(Open::If { then, .. }) if then.is_none() => {
                        *then = Some(std::mem::take(&mut nodes));
                    }
                    Some(Open::If { .. }) => return Err(syntax(path, line, "`else` repeated within one `if`")),
                    _ => return Err(syntax(path, line, "`else` without a matching `if`")),
                },
                Tag::End => {
                    let node = match stack.pop() {
                        Some(Open::If { cond, then, outer, .. }) => {
                            let body = std::mem::replace(&mut nodes, outer);
                            match then {
                                Some(then) => Node::If { cond, then, otherwise: body },
                                None => Node::If { cond, then: body, otherwise: Vec::new() },
                            }
                        }
                        Some(Open::For { var, iter, outer, .. }) => {
                            let body = std::mem::replace(&mut nodes, outer);
                            Node::For { var, iter, body }
                        }
                        None => return Err(syntax(path, line, "`end` without an open `if` or `for`")),
                    };
                    nodes.push(node);
                }
                Tag::Stmts(stmts) => {
                    if !stmts.is_empty() {
                        nodes.push(Node::Exec(stmts));
                    }
                }
            },
        }
    }

    match stack.pop() {
        None => Ok(nodes),
        Some(Open::If { line, .. }) => Err(syntax(path, line, "`if` is never closed with `end`")),
        Some(Open::For { line, .. }) => Err(syntax(path, line, "`for` is never closed with `end`")),
    }
}
