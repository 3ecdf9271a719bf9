//! Logos-derived lexer for the host language.

use std::ops::Range;

use logos::Logos;

use crate::error::SyntaxError;

/// Token kinds produced by the lexer. Literal payloads are cooked during
/// lexing (escapes resolved, numbers parsed).
#[derive(Logos, Clone, Debug, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    #[token("let")]
    Let,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("return")]
    Return,
    #[token("break")]
    Break,
    #[token("true")]
    True,
    #[token("false")]
    False,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| cook_string(lex.slice()))]
    #[regex(r"'([^'\\]|\\.)*'", |lex| cook_string(lex.slice()))]
    Str(String),

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse().ok())]
    Float(f64),
    #[regex(r"[0-9]+", |lex| lex.slice().parse().ok())]
    Int(i64),

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("=>")]
    FatArrow,

    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Assign,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("!")]
    Bang,
}

/// A token with its byte span in the source.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

/// Resolve backslash escapes inside a quoted literal. `\n`, `\t`, `\r`,
/// `\0` cook to their control characters; any other escaped character
/// stands for itself.
fn cook_string(slice: &str) -> Option<String> {
    let inner = &slice[1..slice.len() - 1];
    let mut cooked = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next()? {
                'n' => cooked.push('\n'),
                't' => cooked.push('\t'),
                'r' => cooked.push('\r'),
                '0' => cooked.push('\0'),
                other => cooked.push(other),
            }
        } else {
            cooked.push(c);
        }
    }
    Some(cooked)
}

/// Lex a whole source string, failing on the first unrecognized input.
pub fn lex(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(kind) => tokens.push(Token { kind, span }),
            Err(()) => {
                return Err(SyntaxError::new(
                    format!("unexpected input `{}`", &source[span.clone()]),
                    span.start,
                ));
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn lexes_generated_declaration_shape() {
        assert_eq!(
            kinds("let _t_0 = () => (x);"),
            vec![
                TokenKind::Let,
                TokenKind::Ident("_t_0".into()),
                TokenKind::Assign,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::FatArrow,
                TokenKind::LParen,
                TokenKind::Ident("x".into()),
                TokenKind::RParen,
                TokenKind::Semi,
            ]
        );
    }

    #[test]
    fn both_quote_styles_cook_escapes() {
        assert_eq!(
            kinds(r#""a\"b" '\n' '\}'"#),
            vec![
                TokenKind::Str("a\"b".into()),
                TokenKind::Str("\n".into()),
                TokenKind::Str("}".into()),
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("1 23.5"),
            vec![TokenKind::Int(1), TokenKind::Float(23.5)]
        );
    }

    #[test]
    fn compound_operators_win_over_singles() {
        assert_eq!(
            kinds("== = => >="),
            vec![
                TokenKind::EqEq,
                TokenKind::Assign,
                TokenKind::FatArrow,
                TokenKind::Ge,
            ]
        );
    }

    #[test]
    fn rejects_stray_backslash() {
        let err = lex(r"( \ )").unwrap_err();
        assert_eq!(err.offset, 2);
    }
}
