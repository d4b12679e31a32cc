//! Script tokenizer.
//!
//! Keywords and identifiers are case-insensitive; identifiers are lowercased
//! at this stage so every later lookup is exact. Date literals are written
//! inline as `yyyy-mm-dd`; an exact digit-pattern lookahead decides between a
//! date literal and subtraction, so `2026-01-15` is one token while
//! `2026 - 01` is three.

use tenor_core::Date;

use crate::error::ScriptError;

/// A script token.
#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    /// Numeric literal
    Number(f64),
    /// Inline date literal, `yyyy-mm-dd`
    Date(Date),
    /// Identifier, lowercased
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
    Colon,
    /// `=`, used both for assignment and equality comparison
    Assign,
    /// `!=`
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    If,
    Then,
    Else,
    /// `end` or `endif`
    End,
    Pays,
    And,
    Or,
    Not,
}

/// A token with its 1-based source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub line: u32,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Checks whether `src[at..]` starts with exactly `yyyy-mm-dd`.
fn date_lookahead(src: &[u8], at: usize) -> bool {
    if at + 10 > src.len() {
        return false;
    }
    let pat = &src[at..at + 10];
    let shape_ok = pat[0].is_ascii_digit()
        && pat[1].is_ascii_digit()
        && pat[2].is_ascii_digit()
        && pat[3].is_ascii_digit()
        && pat[4] == b'-'
        && pat[5].is_ascii_digit()
        && pat[6].is_ascii_digit()
        && pat[7] == b'-'
        && pat[8].is_ascii_digit()
        && pat[9].is_ascii_digit();
    // A trailing digit means this is arithmetic, not a date
    shape_ok && src.get(at + 10).map_or(true, |b| !b.is_ascii_digit())
}

/// Tokenizes one event's script text.
pub fn lex(src: &str) -> Result<Vec<Token>, ScriptError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut line: u32 = 1;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'\n' => {
                line += 1;
                i += 1;
            }
            b' ' | b'\t' | b'\r' => {
                i += 1;
            }
            b'+' => {
                tokens.push(Token { tok: Tok::Plus, line });
                i += 1;
            }
            b'-' => {
                tokens.push(Token { tok: Tok::Minus, line });
                i += 1;
            }
            b'*' => {
                tokens.push(Token { tok: Tok::Star, line });
                i += 1;
            }
            b'/' => {
                tokens.push(Token { tok: Tok::Slash, line });
                i += 1;
            }
            b'^' => {
                tokens.push(Token { tok: Tok::Caret, line });
                i += 1;
            }
            b'(' => {
                tokens.push(Token { tok: Tok::LParen, line });
                i += 1;
            }
            b')' => {
                tokens.push(Token { tok: Tok::RParen, line });
                i += 1;
            }
            b',' => {
                tokens.push(Token { tok: Tok::Comma, line });
                i += 1;
            }
            b':' => {
                tokens.push(Token { tok: Tok::Colon, line });
                i += 1;
            }
            b'=' => {
                tokens.push(Token { tok: Tok::Assign, line });
                i += 1;
            }
            b'!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token { tok: Tok::Neq, line });
                    i += 2;
                } else {
                    return Err(ScriptError::Syntax {
                        line,
                        msg: "expected '=' after '!'".to_string(),
                    });
                }
            }
            b'<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token { tok: Tok::Le, line });
                    i += 2;
                } else {
                    tokens.push(Token { tok: Tok::Lt, line });
                    i += 1;
                }
            }
            b'>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token { tok: Tok::Ge, line });
                    i += 2;
                } else {
                    tokens.push(Token { tok: Tok::Gt, line });
                    i += 1;
                }
            }
            b'0'..=b'9' => {
                if date_lookahead(bytes, i) {
                    let text = &src[i..i + 10];
                    let date = Date::parse(text).map_err(|e| ScriptError::Syntax {
                        line,
                        msg: format!("bad date literal '{}': {}", text, e),
                    })?;
                    tokens.push(Token {
                        tok: Tok::Date(date),
                        line,
                    });
                    i += 10;
                } else {
                    let start = i;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                    if i < bytes.len() && bytes[i] == b'.' {
                        i += 1;
                        while i < bytes.len() && bytes[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                    let text = &src[start..i];
                    let value: f64 = text.parse().map_err(|_| ScriptError::Syntax {
                        line,
                        msg: format!("bad number literal '{}'", text),
                    })?;
                    tokens.push(Token {
                        tok: Tok::Number(value),
                        line,
                    });
                }
            }
            _ if is_ident_start(b) => {
                let start = i;
                while i < bytes.len() && is_ident_continue(bytes[i]) {
                    i += 1;
                }
                let word = src[start..i].to_lowercase();
                let tok = match word.as_str() {
                    "if" => Tok::If,
                    "then" => Tok::Then,
                    "else" => Tok::Else,
                    "end" | "endif" => Tok::End,
                    "pays" => Tok::Pays,
                    "and" => Tok::And,
                    "or" => Tok::Or,
                    "not" => Tok::Not,
                    _ => Tok::Ident(word),
                };
                tokens.push(Token { tok, line });
            }
            _ => {
                return Err(ScriptError::Syntax {
                    line,
                    msg: format!("unexpected character '{}'", b as char),
                });
            }
        }
    }
    Ok(tokens)
}
