//! Tokenizer for Bagel source text.

use bagel_core::Span;
use winnow::combinator::{alt, delimited, opt, repeat};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{any, one_of, take, take_till, take_until, take_while};

use crate::ParseError;

/// Reserved words. `expr`, `block`, `from` and `forever` are contextual and
/// lex as identifiers.
const KEYWORDS: &[&str] = &[
    "as", "autorun", "case", "const", "default", "else", "export", "extends", "false", "for",
    "func", "if", "import", "let", "nil", "nominal", "of", "private", "proc", "public",
    "readonly", "store", "switch", "test", "this", "true", "type", "visible", "while",
];

/// Longest first, so that a prefix never shadows a longer operator.
const PUNCTUATION: &[&str] = &[
    "|>", "??", "?.", "||", "&&", "==", "!=", "<=", ">=", "=>", "..", "+", "-", "*", "/", "<",
    ">", "=", "!", "(", ")", "{", "}", "[", "]", ",", ":", ".", "?", "|", ";",
];

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Keyword(&'static str),
    Number(f64),
    Str(String),
    /// Contents of a `js# ... #js` escape.
    Escape(String),
    Punct(&'static str),
    Eof,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier `{name}`"),
            TokenKind::Keyword(word) => format!("keyword `{word}`"),
            TokenKind::Number(n) => format!("number `{n}`"),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Escape(_) => "escape block".to_string(),
            TokenKind::Punct(p) => format!("`{p}`"),
            TokenKind::Eof => "end of file".to_string(),
        }
    }
}

/// Split `source` into tokens, ending with a single [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut input = source;
    let mut tokens = Vec::new();
    loop {
        let _ = trivia.parse_next(&mut input);
        let start = source.len() - input.len();
        if input.is_empty() {
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: Span::new(start, start),
            });
            return Ok(tokens);
        }

        let rest = input;
        let kind = token
            .parse_next(&mut input)
            .map_err(|_| lex_error(rest, start))?;
        let end = source.len() - input.len();
        tokens.push(Token {
            kind,
            span: Span::new(start, end),
        });
    }
}

fn lex_error(rest: &str, start: usize) -> ParseError {
    let message = if rest.starts_with("/*") {
        "unterminated block comment".to_string()
    } else if rest.starts_with("js#") {
        "unterminated escape block, expected `#js`".to_string()
    } else if rest.starts_with(['\'', '"']) {
        "unterminated string literal".to_string()
    } else {
        match rest.chars().next() {
            Some(c) => format!("unexpected character `{c}`"),
            None => "unexpected end of file".to_string(),
        }
    };
    ParseError::new(message, Span::new(start, start + 1))
}

/// Whitespace and comments.
fn trivia(input: &mut &str) -> ModalResult<()> {
    repeat(
        0..,
        alt((
            take_while(1.., char::is_whitespace).void(),
            ("//", take_till(0.., '\n')).void(),
            ("/*", take_until(0.., "*/"), "*/").void(),
        )),
    )
    .parse_next(input)
}

fn token(input: &mut &str) -> ModalResult<TokenKind> {
    alt((
        escape.map(TokenKind::Escape),
        number.map(TokenKind::Number),
        string_lit.map(TokenKind::Str),
        word,
        punct.map(TokenKind::Punct),
    ))
    .parse_next(input)
}

fn escape(input: &mut &str) -> ModalResult<String> {
    delimited("js#", take_until(0.., "#js"), "#js")
        .map(|code: &str| code.to_string())
        .parse_next(input)
}

fn digits<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)
}

/// `12`, `1.5`, `2e10`. A `.` must be followed by a digit so that `1..5`
/// lexes as a range.
fn number(input: &mut &str) -> ModalResult<f64> {
    let text = (
        digits,
        opt(('.', digits)),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digits)),
    )
        .take()
        .parse_next(input)?;
    text.parse::<f64>()
        .map_err(|_| ErrMode::Backtrack(ContextError::new()))
}

/// Single- or double-quoted string with backslash escapes.
fn string_lit(input: &mut &str) -> ModalResult<String> {
    let quote = one_of(['\'', '"']).parse_next(input)?;
    let mut result = String::new();
    loop {
        let c = any.parse_next(input)?;
        match c {
            c if c == quote => break,
            '\\' => {
                let escaped = any.parse_next(input)?;
                match escaped {
                    'n' => result.push('\n'),
                    't' => result.push('\t'),
                    'r' => result.push('\r'),
                    '0' => result.push('\0'),
                    other => result.push(other),
                }
            }
            c => result.push(c),
        }
    }
    Ok(result)
}

fn word(input: &mut &str) -> ModalResult<TokenKind> {
    let text = (
        one_of(|c: char| c.is_alphabetic() || c == '_' || c == '$'),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '_' || c == '$'),
    )
        .take()
        .parse_next(input)?;
    Ok(match KEYWORDS.iter().find(|kw| **kw == text) {
        Some(kw) => TokenKind::Keyword(*kw),
        None => TokenKind::Ident(text.to_string()),
    })
}

fn punct(input: &mut &str) -> ModalResult<&'static str> {
    for &p in PUNCTUATION {
        if input.starts_with(p) {
            take(p.len()).void().parse_next(input)?;
            return Ok(p);
        }
    }
    Err(ErrMode::Backtrack(ContextError::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_declaration_tokens() {
        assert_eq!(
            kinds("const x: number = 12.5"),
            vec![
                TokenKind::Keyword("const"),
                TokenKind::Ident("x".into()),
                TokenKind::Punct(":"),
                TokenKind::Ident("number".into()),
                TokenKind::Punct("="),
                TokenKind::Number(12.5),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_range_is_not_a_float() {
        assert_eq!(
            kinds("1..5"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Punct(".."),
                TokenKind::Number(5.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_longest_punctuation_wins() {
        assert_eq!(
            kinds("a?.b ?? c |> d"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Punct("?."),
                TokenKind::Ident("b".into()),
                TokenKind::Punct("??"),
                TokenKind::Ident("c".into()),
                TokenKind::Punct("|>"),
                TokenKind::Ident("d".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_and_strings() {
        assert_eq!(
            kinds("// leading\n'it\\'s' /* inner */ \"x\""),
            vec![
                TokenKind::Str("it's".into()),
                TokenKind::Str("x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_escape_block() {
        assert_eq!(
            kinds("js# console.log(1) #js"),
            vec![TokenKind::Escape(" console.log(1) ".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_spans_are_byte_offsets() {
        let tokens = tokenize("  foo =").unwrap();
        assert_eq!(tokens[0].span, Span::new(2, 5));
        assert_eq!(tokens[1].span, Span::new(6, 7));
        assert_eq!(tokens[2].span, Span::new(7, 7));
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("const a = 'oops").unwrap_err();
        assert_eq!(err.message, "unterminated string literal");
        assert_eq!(err.span, Span::new(10, 11));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("a # b").unwrap_err();
        assert_eq!(err.message, "unexpected character `#`");
    }
}
