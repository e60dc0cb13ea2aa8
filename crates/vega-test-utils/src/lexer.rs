//! Tokenizer for the Java subset the fixture parser understands.
//!
//! `>>` and `>>>` are never produced: nested type arguments close one `>` at a
//! time and shift operators are not supported.

use vega_syntax::{TextRange, TextSize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    Punct,
    Eof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
}

const PUNCTUATION: &[&str] = &[
    "...", "->", "::", "++", "--", "&&", "||", "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=",
    "%=", "&=", "|=", "^=", "(", ")", "{", "}", "[", "]", ";", ",", ".", "@", "=", "<", ">", "!",
    "~", "?", ":", "+", "-", "*", "/", "&", "|", "^", "%",
];

pub const KEYWORDS: &[&str] = &[
    "abstract", "boolean", "break", "byte", "case", "catch", "char", "class", "continue",
    "default", "do", "double", "else", "extends", "false", "final", "finally", "float", "for",
    "if", "implements", "import", "instanceof", "int", "interface", "long", "native", "new",
    "null", "package", "private", "protected", "public", "return", "short", "static", "super",
    "switch", "synchronized", "this", "throw", "throws", "transient", "true", "try", "void",
    "volatile", "while",
];

pub fn is_keyword(text: &str) -> bool {
    KEYWORDS.contains(&text)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub offset: TextSize,
    pub message: &'static str,
}

pub fn tokenize(text: &str) -> Result<Vec<Token>, LexError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0usize;

    let token = |kind, start: usize, end: usize| Token {
        kind,
        range: TextRange::new((start as u32).into(), (end as u32).into()),
    };
    let error = |offset: usize, message| LexError {
        offset: (offset as u32).into(),
        message,
    };

    while pos < bytes.len() {
        let b = bytes[pos];
        if b.is_ascii_whitespace() {
            pos += 1;
            continue;
        }
        if text[pos..].starts_with("//") {
            pos = text[pos..].find('\n').map_or(bytes.len(), |idx| pos + idx);
            continue;
        }
        if text[pos..].starts_with("/*") {
            let Some(end) = text[pos + 2..].find("*/") else {
                return Err(error(pos, "unterminated block comment"));
            };
            pos += 2 + end + 2;
            continue;
        }

        let start = pos;
        if b.is_ascii_alphabetic() || b == b'_' || b == b'$' {
            while pos < bytes.len()
                && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_' || bytes[pos] == b'$')
            {
                pos += 1;
            }
            tokens.push(token(TokenKind::Ident, start, pos));
            continue;
        }

        if b.is_ascii_digit() || (b == b'.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit)) {
            let mut kind = TokenKind::Int;
            if text[pos..].starts_with("0x") || text[pos..].starts_with("0X") {
                pos += 2;
                while pos < bytes.len() && (bytes[pos].is_ascii_hexdigit() || bytes[pos] == b'_') {
                    pos += 1;
                }
            } else {
                while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == b'_') {
                    pos += 1;
                }
                if pos < bytes.len()
                    && bytes[pos] == b'.'
                    && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit)
                {
                    kind = TokenKind::Double;
                    pos += 1;
                    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                        pos += 1;
                    }
                }
            }
            match bytes.get(pos) {
                Some(b'L' | b'l') => {
                    kind = TokenKind::Long;
                    pos += 1;
                }
                Some(b'F' | b'f') => {
                    kind = TokenKind::Float;
                    pos += 1;
                }
                Some(b'D' | b'd') => {
                    kind = TokenKind::Double;
                    pos += 1;
                }
                _ => {}
            }
            tokens.push(token(kind, start, pos));
            continue;
        }

        if b == b'"' || b == b'\'' {
            pos += 1;
            loop {
                match bytes.get(pos) {
                    None | Some(b'\n') => return Err(error(start, "unterminated literal")),
                    Some(b'\\') => pos += 2,
                    Some(c) if *c == b => {
                        pos += 1;
                        break;
                    }
                    Some(_) => pos += 1,
                }
            }
            let kind = if b == b'"' {
                TokenKind::String
            } else {
                TokenKind::Char
            };
            tokens.push(token(kind, start, pos));
            continue;
        }

        match PUNCTUATION.iter().find(|p| text[pos..].starts_with(**p)) {
            Some(punct) => {
                pos += punct.len();
                tokens.push(token(TokenKind::Punct, start, pos));
            }
            None => return Err(error(pos, "unexpected character")),
        }
    }

    tokens.push(token(TokenKind::Eof, bytes.len(), bytes.len()));
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(text: &str) -> Vec<&str> {
        tokenize(text)
            .unwrap()
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| &text[t.range])
            .collect()
    }

    #[test]
    fn nested_generics_close_one_bracket_at_a_time() {
        assert_eq!(
            texts("Map<String, List<String>> m;"),
            vec!["Map", "<", "String", ",", "List", "<", "String", ">", ">", "m", ";"]
        );
    }

    #[test]
    fn comments_and_markers_are_skipped() {
        assert_eq!(texts("int x = /*]*/0/*[*/; // done"), vec!["int", "x", "=", "0", ";"]);
    }

    #[test]
    fn literals_keep_their_suffix() {
        let tokens = tokenize("1L 2.5 'c' \"s\\\"\"").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Long,
                TokenKind::Double,
                TokenKind::Char,
                TokenKind::String,
                TokenKind::Eof
            ]
        );
    }
}
