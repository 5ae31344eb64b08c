//! Precedence-climbing parser.
//!
//! Builds an [`Expr`] tree from the token stream produced by the lexer.
//! Infix operators become calls to the matching built-in (`1+2` parses to
//! `add(1, 2)`), function arguments are parsed as nested sub-expressions,
//! and structural errors (unbalanced parentheses, stray commas, missing
//! operands) are reported here rather than at evaluation time.

use super::error::{FormulaError, Result};
use super::lexer::{Lexer, Token, TokenKind, infix_function, precedence};
use super::value::Value;

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Value(Value),
    /// A single address, e.g. `A1` or `$B$2`.
    Ref(String),
    /// An address range, e.g. `A1:B3` or `A:A`.
    Range(String),
    /// A stable id literal, e.g. `#1f`.
    Id(String),
    /// A range between two id literals, e.g. `#1f:#2k`.
    IdRange(String),
    Function {
        name: String,
        args: Vec<Expr>,
    },
    /// A reference that was deleted (`#REF!`).
    Unreferenced,
    /// An identifier that is not a reference.
    InvalidRef(String),
}

/// Lex and parse formula text (without the leading `=`).
pub fn parse_formula(formula: &str) -> Result<Expr> {
    parse(&Lexer::new(formula).tokenize())
}

pub fn parse(tokens: &[Token]) -> Result<Expr> {
    let tokens: Vec<&Token> = tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Space)
        .collect();
    if tokens.is_empty() {
        return Ok(Expr::Value(Value::Null));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expression(1)?;
    match parser.peek() {
        None => Ok(expr),
        Some(t) if t.kind == TokenKind::Close => Err(FormulaError::syntax("unmatched ')'")),
        Some(t) if t.kind == TokenKind::Comma => {
            Err(FormulaError::syntax("',' outside of a function call"))
        }
        Some(t) => Err(FormulaError::syntax(format!("unexpected '{}'", t.text))),
    }
}

struct Parser<'t> {
    tokens: Vec<&'t Token>,
    pos: usize,
    depth: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<&'t Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expression(&mut self, min_precedence: u8) -> Result<Expr> {
        let mut left = self.operand()?;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::InfixOperator => {}
                TokenKind::Close | TokenKind::Comma => break,
                _ => return Err(FormulaError::syntax(format!("unexpected '{}'", token.text))),
            }
            let power = precedence(&token.text, false);
            if power < min_precedence {
                break;
            }
            self.pos += 1;
            let right = self.expression(power + 1)?;
            left = binary(&token.text, left, right)?;
        }
        Ok(left)
    }

    fn operand(&mut self) -> Result<Expr> {
        let Some(token) = self.next() else {
            return Err(FormulaError::syntax("missing operand"));
        };
        match token.kind {
            TokenKind::Value => Ok(Expr::Value(token.value.clone().unwrap_or_default())),
            TokenKind::Ref => Ok(Expr::Ref(token.text.clone())),
            TokenKind::Range => Ok(Expr::Range(token.text.clone())),
            TokenKind::Id => Ok(Expr::Id(token.text.clone())),
            TokenKind::IdRange => Ok(Expr::IdRange(token.text.clone())),
            TokenKind::Unreferenced => Ok(Expr::Unreferenced),
            TokenKind::InvalidRef => Ok(Expr::InvalidRef(token.text.clone())),
            TokenKind::PrefixOperator => {
                let arg = self.expression(precedence(&token.text, true))?;
                Ok(Expr::Function {
                    name: "uminus".to_string(),
                    args: vec![arg],
                })
            }
            TokenKind::InfixOperator if token.text == "+" || token.text == "-" => {
                // Leading sign with nothing on its left: `+5` is `0+5`.
                let right = self.expression(precedence(&token.text, false) + 1)?;
                binary(&token.text, Expr::Value(Value::Number(0.0)), right)
            }
            TokenKind::InfixOperator => Err(FormulaError::syntax(format!(
                "missing left operand for '{}'",
                token.text
            ))),
            TokenKind::Function => self.call(&token.text),
            TokenKind::Open => {
                self.depth += 1;
                let inner = self.expression(1)?;
                self.close()?;
                Ok(inner)
            }
            TokenKind::Close => Err(FormulaError::syntax("unmatched ')'")),
            TokenKind::Comma => Err(FormulaError::syntax("',' outside of a function call")),
            TokenKind::Space => Err(FormulaError::syntax("unexpected whitespace")),
        }
    }

    fn call(&mut self, name: &str) -> Result<Expr> {
        match self.next() {
            Some(t) if t.kind == TokenKind::Open => self.depth += 1,
            _ => return Err(FormulaError::syntax(format!("expected '(' after {}", name))),
        }
        let depth = self.depth;

        let mut args = Vec::new();
        if self.peek().is_some_and(|t| t.kind == TokenKind::Close) {
            self.close()?;
            return Ok(Expr::Function {
                name: name.to_string(),
                args,
            });
        }

        loop {
            // An omitted argument (`F(1,,2)`) is blank.
            let arg = match self.peek() {
                Some(t) if matches!(t.kind, TokenKind::Comma | TokenKind::Close) => {
                    Expr::Value(Value::Null)
                }
                _ => self.expression(1)?,
            };
            args.push(arg);

            if self.depth != depth {
                return Err(FormulaError::syntax("unbalanced parentheses"));
            }
            match self.peek() {
                Some(t) if t.kind == TokenKind::Comma => self.pos += 1,
                Some(t) if t.kind == TokenKind::Close => {
                    self.close()?;
                    break;
                }
                Some(t) => {
                    return Err(FormulaError::syntax(format!("unexpected '{}'", t.text)));
                }
                None => return Err(FormulaError::syntax(format!("unmatched '(' in {}", name))),
            }
        }

        Ok(Expr::Function {
            name: name.to_string(),
            args,
        })
    }

    fn close(&mut self) -> Result<()> {
        match self.next() {
            Some(t) if t.kind == TokenKind::Close && self.depth > 0 => {
                self.depth -= 1;
                Ok(())
            }
            Some(t) if t.kind == TokenKind::Comma => {
                Err(FormulaError::syntax("',' outside of a function call"))
            }
            Some(t) if t.kind == TokenKind::Close => Err(FormulaError::syntax("unmatched ')'")),
            Some(t) => Err(FormulaError::syntax(format!("unexpected '{}'", t.text))),
            None => Err(FormulaError::syntax("unmatched '('")),
        }
    }
}

fn binary(op: &str, left: Expr, right: Expr) -> Result<Expr> {
    let name = infix_function(op)
        .ok_or_else(|| FormulaError::syntax(format!("unknown operator '{}'", op)))?;
    Ok(Expr::Function {
        name: name.to_string(),
        args: vec![left, right],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ErrorKind;

    fn call(name: &str, args: Vec<Expr>) -> Expr {
        Expr::Function {
            name: name.to_string(),
            args,
        }
    }

    fn num(n: f64) -> Expr {
        Expr::Value(Value::Number(n))
    }

    #[test]
    fn test_precedence_climbing() {
        assert_eq!(
            parse_formula("1+2*3").unwrap(),
            call("add", vec![num(1.0), call("multiply", vec![num(2.0), num(3.0)])])
        );
        assert_eq!(
            parse_formula("1-2-3").unwrap(),
            call("minus", vec![call("minus", vec![num(1.0), num(2.0)]), num(3.0)])
        );
        assert_eq!(
            parse_formula("1+2=3").unwrap(),
            call("eq", vec![call("add", vec![num(1.0), num(2.0)]), num(3.0)])
        );
    }

    #[test]
    fn test_unary_minus_binds_tighter_than_power() {
        assert_eq!(
            parse_formula("-2^2").unwrap(),
            call("power", vec![call("uminus", vec![num(2.0)]), num(2.0)])
        );
    }

    #[test]
    fn test_leading_plus_is_implicit_zero() {
        assert_eq!(
            parse_formula("+5").unwrap(),
            call("add", vec![num(0.0), num(5.0)])
        );
    }

    #[test]
    fn test_function_arguments() {
        assert_eq!(
            parse_formula("SUM(A1:B2, (1+2), MAX(C3))").unwrap(),
            call(
                "SUM",
                vec![
                    Expr::Range("A1:B2".into()),
                    call("add", vec![num(1.0), num(2.0)]),
                    call("MAX", vec![Expr::Ref("C3".into())]),
                ]
            )
        );
        assert_eq!(parse_formula("PI()").unwrap(), call("PI", vec![]));
        assert_eq!(
            parse_formula("IFERROR(A1,)").unwrap(),
            call("IFERROR", vec![Expr::Ref("A1".into()), Expr::Value(Value::Null)])
        );
    }

    #[test]
    fn test_structural_errors_at_parse_time() {
        for formula in ["SUM(1,2", "(1+2", "1+2)", "1,2", "(1,2)", "*3", "1+", "A1 B1"] {
            let err = parse_formula(formula).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Syntax, "{}", formula);
        }
    }

    #[test]
    fn test_lazy_error_leaves_parse() {
        assert_eq!(
            parse_formula("IFERROR(#REF!, foo)").unwrap(),
            call(
                "IFERROR",
                vec![Expr::Unreferenced, Expr::InvalidRef("foo".into())]
            )
        );
    }
}
