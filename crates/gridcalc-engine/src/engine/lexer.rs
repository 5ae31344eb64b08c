//! Formula tokenizer.
//!
//! Turns the text after a formula's leading `=` into a flat token list.
//! Whitespace is kept as [`TokenKind::Space`] tokens so a formula can be
//! written back out byte-for-byte after its references have been rewritten
//! (see [`stringify_tokens`]).
//!
//! Bare identifiers are classified once the whole run has been read:
//!
//! - digits with an optional decimal part -> number [`TokenKind::Value`]
//! - `true`/`false` (any case) -> boolean [`TokenKind::Value`]
//! - followed directly by `(` -> [`TokenKind::Function`]
//! - `#REF!` -> [`TokenKind::Unreferenced`]
//! - starting with `#` -> [`TokenKind::Id`], or [`TokenKind::IdRange`] if it contains `:`
//! - containing `:` -> [`TokenKind::Range`]
//! - ending in a digit -> [`TokenKind::Ref`], otherwise [`TokenKind::InvalidRef`]

use regex::Regex;
use std::sync::OnceLock;

use super::value::Value;

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum TokenKind {
    Value,
    Ref,
    Range,
    Id,
    IdRange,
    Function,
    PrefixOperator,
    InfixOperator,
    Open,
    Close,
    Comma,
    Space,
    Unreferenced,
    InvalidRef,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text, exactly as written.
    pub text: String,
    /// Literal payload for [`TokenKind::Value`] tokens.
    pub value: Option<Value>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Token {
        Token {
            kind,
            text: text.into(),
            value: None,
        }
    }

    fn literal(text: impl Into<String>, value: Value) -> Token {
        Token {
            kind: TokenKind::Value,
            text: text.into(),
            value: Some(value),
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::InfixOperator | TokenKind::PrefixOperator
        )
    }
}

/// Binding power of an infix operator, or of unary minus when `prefix` is set.
pub fn precedence(op: &str, prefix: bool) -> u8 {
    if prefix {
        return 6;
    }
    match op {
        "=" | "<>" => 1,
        ">" | ">=" | "<" | "<=" => 2,
        "+" | "-" => 3,
        "/" | "*" | "&" => 4,
        "^" => 5,
        _ => 0,
    }
}

/// Name of the built-in function an infix operator is evaluated with.
pub fn infix_function(op: &str) -> Option<&'static str> {
    let name = match op {
        "+" => "add",
        "-" => "minus",
        "/" => "divide",
        "*" => "multiply",
        "^" => "power",
        "&" => "concat",
        "=" => "eq",
        "<>" => "ne",
        ">" => "gt",
        ">=" => "gte",
        "<" => "lt",
        "<=" => "lte",
        _ => return None,
    };
    Some(name)
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)$").expect("number literal regex must compile")
    })
}

pub struct Lexer {
    chars: Vec<char>,
    tokens: Vec<Token>,
    word: String,
}

impl Lexer {
    /// `formula` is the text after the leading `=`.
    pub fn new(formula: &str) -> Lexer {
        Lexer {
            chars: formula.chars().collect(),
            tokens: Vec::new(),
            word: String::new(),
        }
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut i = 0;
        while i < self.chars.len() {
            let c = self.chars[i];
            match c {
                '"' => {
                    self.flush_word(false);
                    i = self.read_string(i);
                    continue;
                }
                c if c.is_whitespace() => {
                    self.flush_word(false);
                    let start = i;
                    while i < self.chars.len() && self.chars[i].is_whitespace() {
                        i += 1;
                    }
                    let text: String = self.chars[start..i].iter().collect();
                    self.tokens.push(Token::new(TokenKind::Space, text));
                    continue;
                }
                '(' => {
                    self.flush_word(true);
                    self.tokens.push(Token::new(TokenKind::Open, "("));
                }
                ')' => {
                    self.flush_word(false);
                    self.tokens.push(Token::new(TokenKind::Close, ")"));
                }
                ',' => {
                    self.flush_word(false);
                    self.tokens.push(Token::new(TokenKind::Comma, ","));
                }
                '+' | '*' | '/' | '^' | '&' | '=' => {
                    self.flush_word(false);
                    self.tokens
                        .push(Token::new(TokenKind::InfixOperator, c.to_string()));
                }
                '<' | '>' => {
                    self.flush_word(false);
                    let next = self.chars.get(i + 1).copied();
                    let op = match (c, next) {
                        ('<', Some('>')) => "<>",
                        ('<', Some('=')) => "<=",
                        ('>', Some('=')) => ">=",
                        ('<', _) => "<",
                        _ => ">",
                    };
                    i += op.len();
                    self.tokens.push(Token::new(TokenKind::InfixOperator, op));
                    continue;
                }
                '-' => {
                    self.flush_word(false);
                    let kind = if self.minus_is_prefix() {
                        TokenKind::PrefixOperator
                    } else {
                        TokenKind::InfixOperator
                    };
                    self.tokens.push(Token::new(kind, "-"));
                }
                _ => self.word.push(c),
            }
            i += 1;
        }
        self.flush_word(false);
        self.tokens
    }

    /// Unary iff the previous non-space token is an operator, an opening
    /// paren, a comma, or there is none.
    fn minus_is_prefix(&self) -> bool {
        match self.tokens.iter().rev().find(|t| t.kind != TokenKind::Space) {
            None => true,
            Some(t) => {
                t.is_operator() || matches!(t.kind, TokenKind::Open | TokenKind::Comma)
            }
        }
    }

    /// Reads a quoted string starting at `start`; `""` is an escaped quote.
    /// Returns the index just past the closing quote.
    fn read_string(&mut self, start: usize) -> usize {
        let mut i = start + 1;
        let mut content = String::new();
        while i < self.chars.len() {
            let c = self.chars[i];
            if c == '"' {
                if self.chars.get(i + 1) == Some(&'"') {
                    content.push('"');
                    i += 2;
                    continue;
                }
                i += 1;
                break;
            }
            content.push(c);
            i += 1;
        }
        let text: String = self.chars[start..i].iter().collect();
        self.tokens.push(Token::literal(text, Value::Text(content)));
        i
    }

    fn flush_word(&mut self, before_open: bool) {
        if self.word.is_empty() {
            return;
        }
        let word = std::mem::take(&mut self.word);
        self.tokens.push(classify(word, before_open));
    }
}

fn classify(word: String, before_open: bool) -> Token {
    if number_re().is_match(&word) {
        let n = word.parse::<f64>().unwrap_or(0.0);
        return Token::literal(word, Value::Number(n));
    }
    if word.eq_ignore_ascii_case("true") {
        return Token::literal(word, Value::Bool(true));
    }
    if word.eq_ignore_ascii_case("false") {
        return Token::literal(word, Value::Bool(false));
    }
    if before_open {
        return Token::new(TokenKind::Function, word);
    }
    if word.eq_ignore_ascii_case("#REF!") {
        return Token::new(TokenKind::Unreferenced, word);
    }
    if word.starts_with('#') {
        let kind = if word.contains(':') {
            TokenKind::IdRange
        } else {
            TokenKind::Id
        };
        return Token::new(kind, word);
    }
    if word.contains(':') {
        return Token::new(TokenKind::Range, word);
    }
    if word.ends_with(|c: char| c.is_ascii_digit()) {
        Token::new(TokenKind::Ref, word)
    } else {
        Token::new(TokenKind::InvalidRef, word)
    }
}

/// Write tokens back out as formula text (without the leading `=`).
pub fn stringify_tokens(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(formula: &str) -> Vec<TokenKind> {
        Lexer::new(formula)
            .tokenize()
            .into_iter()
            .filter(|t| t.kind != TokenKind::Space)
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_classifies_identifiers() {
        use TokenKind::*;
        assert_eq!(
            kinds("SUM(A1:B2, #3, #4:#5, C7, foo, TRUE, 1.5)"),
            vec![
                Function, Open, Range, Comma, Id, Comma, IdRange, Comma, Ref, Comma, InvalidRef,
                Comma, Value, Comma, Value, Close
            ]
        );
    }

    #[test]
    fn test_minus_prefix_vs_infix() {
        use TokenKind::*;
        assert_eq!(kinds("-1"), vec![PrefixOperator, Value]);
        assert_eq!(kinds("2 - 1"), vec![Value, InfixOperator, Value]);
        assert_eq!(kinds("2*-1"), vec![Value, InfixOperator, PrefixOperator, Value]);
        assert_eq!(
            kinds("MAX(-1, (-2))"),
            vec![
                Function, Open, PrefixOperator, Value, Comma, Open, PrefixOperator, Value, Close,
                Close
            ]
        );
    }

    #[test]
    fn test_two_char_operators() {
        let tokens = Lexer::new("A1<>B1>=C1").tokenize();
        let ops: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::InfixOperator)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(ops, vec!["<>", ">="]);
    }

    #[test]
    fn test_string_with_escaped_quote() {
        let tokens = Lexer::new(r#""say ""hi""" & A1"#).tokenize();
        assert_eq!(tokens[0].value, Some(Value::from(r#"say "hi""#)));
        assert_eq!(tokens[0].text, r#""say ""hi""""#);
    }

    #[test]
    fn test_stringify_is_lossless() {
        let formula = r#"  SUM( A1 ,$B$2:C3 )&" x "" y" "#;
        let tokens = Lexer::new(formula).tokenize();
        assert_eq!(stringify_tokens(&tokens), formula);
    }

    #[test]
    fn test_ref_error_literal_is_unreferenced() {
        assert_eq!(kinds("#REF!+1")[0], TokenKind::Unreferenced);
    }
}
