//! Splitting view source into text and tags, and tokenizing tag code.

use std::fmt;
use std::path::Path;

use chumsky::prelude::*;

use crate::error::ViewError;

pub(crate) type LexError<'src> = Rich<'src, char>;

/// A raw piece of view source.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment<'src> {
    Text(&'src str),
    /// `<%= ... %>`
    Echo { code: &'src str, line: usize },
    /// `<% ... %>`
    Code { code: &'src str, line: usize },
}

#[derive(Debug, Clone, Copy)]
enum TagKind {
    Echo,
    Code,
    Comment,
}

#[derive(Debug, Clone)]
enum Piece<'src> {
    Segment(Segment<'src>),
    Comment,
    Unterminated { line: usize },
}

pub(crate) fn syntax(path: &Path, line: usize, message: impl Into<String>) -> ViewError {
    ViewError::Syntax {
        path: path.to_path_buf(),
        line,
        message: message.into(),
    }
}

fn newlines(text: &str, offset: usize) -> usize {
    let end = offset.min(text.len());
    text.as_bytes()[..end].iter().filter(|b| **b == b'\n').count()
}

/// Syntax error for a chumsky error found in `code`, which starts at source line `line`.
pub(crate) fn syntax_at<T: fmt::Display>(path: &Path, code: &str, line: usize, err: &Rich<'_, T>) -> ViewError {
    syntax(path, line + newlines(code, err.span().start), err.to_string())
}

fn splitter<'src>(source: &'src str) -> impl Parser<'src, &'src str, Vec<Piece<'src>>, extra::Err<LexError<'src>>> {
    let open = just("<%");
    let close = choice((just("-%>"), just("%>")));

    let quoted = |quote: char| {
        just(quote)
            .then(
                choice((
                    just('\\').then(any()).ignored(),
                    none_of([quote, '\\']).ignored(),
                ))
                .repeated(),
            )
            .then(just(quote))
            .ignored()
    };

    // `%>` inside a quoted string does not end the tag.
    let code = choice((
        quoted('"'),
        quoted('\''),
        any().and_is(close.clone().not()).ignored(),
    ))
    .repeated()
    .to_slice();
    let comment = any().and_is(close.clone().not()).repeated().to_slice();

    let closing = choice((
        just("-%>").then(text::newline().or_not()).ignored(),
        just("%>").ignored(),
    ));

    let text = any()
        .and_is(open.clone().not())
        .repeated()
        .at_least(1)
        .to_slice()
        .map(|text| Piece::Segment(Segment::Text(text)));

    let tag = open
        .ignore_then(choice((
            just('=').ignore_then(code.clone()).map(|code| (TagKind::Echo, code)),
            just('#').ignore_then(comment).map(|code| (TagKind::Comment, code)),
            code.map(|code| (TagKind::Code, code)),
        )))
        .then(closing.or_not())
        .map_with(move |((kind, code), closed), extra: &mut chumsky::input::MapExtra<'src, '_, &'src str, extra::Err<LexError<'src>>>| {
            let line = 1 + newlines(source, extra.span().start);
            match (closed, kind) {
                (None, _) => Piece::Unterminated { line },
                (Some(()), TagKind::Comment) => Piece::Comment,
                (Some(()), TagKind::Echo) => Piece::Segment(Segment::Echo { code, line }),
                (Some(()), TagKind::Code) => Piece::Segment(Segment::Code { code, line }),
            }
        });

    choice((text, tag)).repeated().collect::<Vec<_>>().then_ignore(end())
}

/// Split `source` into segments. Comments (`<%# ... %>`) are dropped.
pub(crate) fn segments<'src>(source: &'src str, path: &Path) -> Result<Vec<Segment<'src>>, ViewError> {
    let pieces = splitter(source)
        .parse(source)
        .into_result()
        .map_err(|errs| match errs.first() {
            Some(err) => syntax_at(path, source, 1, err),
            None => syntax(path, 1, "invalid view source"),
        })?;

    let mut out = Vec::with_capacity(pieces.len());
    for piece in pieces {
        match piece {
            Piece::Segment(segment) => out.push(segment),
            Piece::Comment => {}
            Piece::Unterminated { line } => return Err(syntax(path, line, "unterminated tag, expected `%>`")),
        }
    }
    Ok(out)
}

/// A token of tag code.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token<'src> {
    Ident(&'src str),
    Str(String),
    Int(i64),
    Float(f64),
    Let,
    If,
    Else,
    End,
    For,
    In,
    True,
    False,
    Null,
    This,
    /// One of `( ) [ ] { } , : . ;`
    Ctrl(char),
    Assign,
    EqEq,
    NotEq,
    Bang,
    Coalesce,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "{name}"),
            Self::Str(text) => write!(f, "{text:?}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Let => write!(f, "let"),
            Self::If => write!(f, "if"),
            Self::Else => write!(f, "else"),
            Self::End => write!(f, "end"),
            Self::For => write!(f, "for"),
            Self::In => write!(f, "in"),
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Null => write!(f, "null"),
            Self::This => write!(f, "this"),
            Self::Ctrl(c) => write!(f, "{c}"),
            Self::Assign => write!(f, "="),
            Self::EqEq => write!(f, "=="),
            Self::NotEq => write!(f, "!="),
            Self::Bang => write!(f, "!"),
            Self::Coalesce => write!(f, "??"),
        }
    }
}

pub(crate) fn lexer<'src>() -> impl Parser<'src, &'src str, Vec<(Token<'src>, SimpleSpan)>, extra::Err<LexError<'src>>> {
    let number = text::int(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .try_map(|number: &str, span| {
            let token = if number.contains('.') {
                number.parse::<f64>().ok().filter(|n| n.is_finite()).map(Token::Float)
            } else {
                number.parse().ok().map(Token::Int)
            };
            token.ok_or_else(|| Rich::custom(span, format!("invalid number `{number}`")))
        });

    let escape = just('\\').ignore_then(choice((just('n').to('\n'), just('t').to('\t'), any())));
    let double_quoted = just('"')
        .ignore_then(none_of("\\\"").or(escape.clone()).repeated().collect::<String>())
        .then_ignore(just('"'));
    let single_quoted = just('\'')
        .ignore_then(none_of("\\'").or(escape).repeated().collect::<String>())
        .then_ignore(just('\''));
    let string = double_quoted.or(single_quoted).map(Token::Str);

    let operator = choice((
        just("==").to(Token::EqEq),
        just("!=").to(Token::NotEq),
        just("??").to(Token::Coalesce),
        just('=').to(Token::Assign),
        just('!').to(Token::Bang),
    ));

    let ctrl = one_of("()[]{},:.;").map(Token::Ctrl);

    let word = any()
        .filter(|c: &char| c.is_alphabetic() || *c == '_')
        .then(any().filter(|c: &char| c.is_alphanumeric() || *c == '_').repeated())
        .to_slice()
        .map(|word| match word {
            "let" => Token::Let,
            "if" => Token::If,
            "else" => Token::Else,
            "end" => Token::End,
            "for" => Token::For,
            "in" => Token::In,
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            "this" => Token::This,
            _ => Token::Ident(word),
        });

    let token = choice((number, string, operator, ctrl, word));

    token
        .map_with(|token, extra| (token, extra.span()))
        .padded()
        .repeated()
        .collect::<Vec<_>>()
        .padded()
        .then_ignore(end())
}

/// Tokenize the code of one tag starting at source line `line`.
pub(crate) fn tokenize<'src>(
    code: &'src str,
    line: usize,
    path: &Path,
) -> Result<Vec<(Token<'src>, SimpleSpan)>, ViewError> {
    lexer().parse(code).into_result().map_err(|errs| match errs.first() {
        Some(err) => syntax_at(path, code, line, err),
        None => syntax(path, line, "invalid tag code"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> &'static Path {
        Path::new("test.html")
    }

    fn toks(code: &str) -> Vec<Token<'_>> {
        tokenize(code, 1, path())
            .expect("tokenize")
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn splits_text_and_tags() {
        let segs = segments("<p><%= title %></p>\n<% layout(\"main\") %>", path()).unwrap();
        assert_eq!(
            segs,
            vec![
                Segment::Text("<p>"),
                Segment::Echo { code: " title ", line: 1 },
                Segment::Text("</p>\n"),
                Segment::Code { code: " layout(\"main\") ", line: 2 },
            ]
        );
    }

    #[test]
    fn close_marker_inside_string_does_not_end_tag() {
        let segs = segments(r#"<%= "100%>" %>!"#, path()).unwrap();
        assert_eq!(
            segs,
            vec![Segment::Echo { code: r#" "100%>" "#, line: 1 }, Segment::Text("!")]
        );
    }

    #[test]
    fn comments_are_dropped_and_dash_trims_newline() {
        let segs = segments("a<%# note %>b<% x -%>\nc", path()).unwrap();
        assert_eq!(
            segs,
            vec![
                Segment::Text("a"),
                Segment::Text("b"),
                Segment::Code { code: " x ", line: 1 },
                Segment::Text("c"),
            ]
        );
    }

    #[test]
    fn tag_lines_are_tracked() {
        let segs = segments("one\ntwo\n<%\n\n%>\n<%= x %>", path()).unwrap();
        assert!(segs.contains(&Segment::Code { code: "\n\n", line: 3 }));
        assert!(segs.contains(&Segment::Echo { code: " x ", line: 6 }));
    }

    #[test]
    fn unterminated_tag_reports_the_line_it_opens_on() {
        let err = segments("line\n<%= title\nmore\ntext", path()).unwrap_err();
        assert!(matches!(err, ViewError::Syntax { line: 2, .. }), "got: {err}");
    }

    #[test]
    fn tokenizes_operators_and_literals() {
        assert_eq!(
            toks(r#"a ?? 'x\'y' == 1.5 != "#),
            vec![
                Token::Ident("a"),
                Token::Coalesce,
                Token::Str("x'y".into()),
                Token::EqEq,
                Token::Float(1.5),
                Token::NotEq,
            ]
        );
        assert_eq!(
            toks("let n = items[0].name;"),
            vec![
                Token::Let,
                Token::Ident("n"),
                Token::Assign,
                Token::Ident("items"),
                Token::Ctrl('['),
                Token::Int(0),
                Token::Ctrl(']'),
                Token::Ctrl('.'),
                Token::Ident("name"),
                Token::Ctrl(';'),
            ]
        );
    }

    #[test]
    fn blank_code_has_no_tokens() {
        assert!(toks(" \n\t ").is_empty());
    }

    #[test]
    fn unknown_character_is_rejected() {
        let err = tokenize("a + b", 4, path()).unwrap_err();
        assert!(matches!(err, ViewError::Syntax { line: 4, .. }), "got: {err}");
        let err = tokenize("a\n\n'open", 4, path()).unwrap_err();
        assert!(matches!(err, ViewError::Syntax { line: 6, .. }), "got: {err}");
    }
}
