use crate::errors;
use std::collections::VecDeque;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Keyword or identifier, as written.
    Word(String),
    /// Quoted text with the quotes removed.
    Str(String),
    /// Numeric literal text.
    Number(String),
    /// One of `( ) , = * ;`.
    Symbol(char),
}

impl Token {
    /// Returns true if the token is the given keyword (case-insensitive).
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(w) if w.eq_ignore_ascii_case(keyword))
    }
}

/// Splits a statement into tokens.
///
/// Text literals are enclosed in single or double quotes; a doubled quote
/// inside a literal stands for one quote character.
pub fn tokenize_sql(sql: &str) -> Result<VecDeque<Token>, errors::Error> {
    let mut result = VecDeque::new();
    let mut chars = sql.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '\'' | '"' => {
                chars.next();
                result.push_back(Token::Str(read_text(&mut chars, c)?));
            }
            '(' | ')' | ',' | '=' | '*' | ';' => {
                chars.next();
                result.push_back(Token::Symbol(c));
            }
            c if c.is_ascii_digit() || c == '-' || c == '.' => {
                result.push_back(Token::Number(read_number(&mut chars)?));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_alphanumeric() || c == '_') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                result.push_back(Token::Word(word));
            }
            _ => {
                return Err(errors::Error::Syntax(format!(
                    "Unexpected character '{}'.",
                    c
                )))
            }
        }
    }

    Ok(result)
}

fn read_text(chars: &mut Peekable<Chars>, quote: char) -> Result<String, errors::Error> {
    let mut text = String::new();
    while let Some(c) = chars.next() {
        if c == quote {
            if chars.peek() == Some(&quote) {
                chars.next();
                text.push(quote);
                continue;
            }
            return Ok(text);
        }
        text.push(c);
    }
    Err(errors::Error::Syntax("Unclosed text literal.".to_owned()))
}

fn read_number(chars: &mut Peekable<Chars>) -> Result<String, errors::Error> {
    let mut number = String::new();
    if chars.peek() == Some(&'-') {
        number.push('-');
        chars.next();
    }
    while let Some(&c) = chars.peek() {
        if !(c.is_ascii_digit() || c == '.') {
            break;
        }
        number.push(c);
        chars.next();
    }
    if !number.chars().any(|c| c.is_ascii_digit()) {
        return Err(errors::Error::Syntax(format!(
            "Invalid number literal '{}'.",
            number
        )));
    }
    Ok(number)
}
