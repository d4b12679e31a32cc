//! Recursive-descent parser.
//!
//! Parsing happens after a token-level prepass has collected every written
//! variable across the whole product, so the parser can resolve every name
//! on the spot: cells fold to constants, variables to table indices, and
//! anything else is an unbound identifier.

use std::collections::HashMap;

use tenor_core::{Date, DayCount};

use crate::ast::{CmpOp, Cond, Expr, Stmt};
use crate::error::ScriptError;
use crate::lexer::{Tok, Token};

/// Built-in function names; these can never be assigned.
pub(crate) const BUILTINS: [&str; 7] = ["spot", "max", "min", "log", "sqrt", "exp", "dcf"];

/// Variable backing `pays` statements with no explicit leg name. The name
/// can never collide with a user identifier because `pays` lexes as a
/// keyword.
pub(crate) const IMPLICIT_LEG: &str = "pays";

/// Name resolution tables for one product.
pub(crate) struct Symbols<'a> {
    /// Named constants from marker events, lowercased
    pub cells: &'a HashMap<String, f64>,
    /// State variables by lowercased name
    pub vars: &'a HashMap<String, usize>,
}

/// Whether the token at `i` can begin a statement: it is first, follows a
/// block keyword, or follows the token that ended the previous statement's
/// expression.
fn starts_statement(tokens: &[Token], i: usize) -> bool {
    match i.checked_sub(1).map(|p| &tokens[p].tok) {
        None => true,
        Some(Tok::Then | Tok::Else | Tok::End) => true,
        Some(Tok::Number(_) | Tok::Ident(_) | Tok::Date(_) | Tok::RParen) => true,
        Some(_) => false,
    }
}

/// Scans a token stream for write targets: identifiers that begin an
/// assignment or a `pays` statement.
///
/// Targets only count at a statement start. This keeps equality comparisons
/// inside conditions (`if x = y then`) out of the variable table, and an
/// identifier that merely ends the previous expression (`x = y pays 3`)
/// from naming the leg: that `pays` starts its own statement and
/// accumulates into the implicit leg. Returns `(name, is_pays)` pairs in
/// source order.
pub(crate) fn write_targets(tokens: &[Token]) -> Vec<(String, bool)> {
    let mut targets = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        let Tok::Ident(name) = &token.tok else {
            if matches!(token.tok, Tok::Pays) {
                let named = i.checked_sub(1).is_some_and(|p| {
                    matches!(tokens[p].tok, Tok::Ident(_)) && starts_statement(tokens, p)
                });
                if !named {
                    targets.push((IMPLICIT_LEG.to_string(), true));
                }
            }
            continue;
        };
        if !starts_statement(tokens, i) {
            continue;
        }
        match tokens.get(i + 1).map(|t| &t.tok) {
            Some(Tok::Pays) => targets.push((name.clone(), true)),
            Some(Tok::Assign) => targets.push((name.clone(), false)),
            _ => {}
        }
    }
    targets
}

/// Parses one event's token stream into statements.
pub(crate) fn parse_event(tokens: &[Token], symbols: &Symbols) -> Result<Vec<Stmt>, ScriptError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        symbols,
    };
    let stmts = parser.parse_stmts()?;
    if let Some(token) = parser.peek() {
        return Err(ScriptError::Syntax {
            line: token.line,
            msg: "unexpected token after statement".to_string(),
        });
    }
    Ok(stmts)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    symbols: &'a Symbols<'a>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    /// Line of the current token, or of the last one at end of input.
    fn line(&self) -> u32 {
        self.tokens
            .get(self.pos.min(self.tokens.len().saturating_sub(1)))
            .map_or(1, |t| t.line)
    }

    fn syntax(&self, msg: impl Into<String>) -> ScriptError {
        ScriptError::Syntax {
            line: self.line(),
            msg: msg.into(),
        }
    }

    fn expect(&mut self, expected: &Tok, what: &str) -> Result<(), ScriptError> {
        match self.peek() {
            Some(token) if &token.tok == expected => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.syntax(format!("expected {}", what))),
        }
    }

    fn parse_stmts(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        let mut stmts = Vec::new();
        while let Some(token) = self.peek() {
            match token.tok {
                Tok::Else | Tok::End => break,
                _ => stmts.push(self.parse_stmt()?),
            }
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ScriptError> {
        match self.peek().map(|t| &t.tok) {
            Some(Tok::If) => self.parse_if(),
            Some(Tok::Pays) => {
                self.pos += 1;
                let var = self
                    .symbols
                    .vars
                    .get(IMPLICIT_LEG)
                    .copied()
                    .ok_or_else(|| self.syntax("'pays' used outside a statement"))?;
                let expr = self.parse_expr()?;
                Ok(Stmt::Pays { var, expr })
            }
            Some(Tok::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                match self.peek().map(|t| &t.tok) {
                    Some(Tok::Assign) => {
                        self.pos += 1;
                        let var = self.resolve_target(&name)?;
                        let expr = self.parse_expr()?;
                        Ok(Stmt::Assign { var, expr })
                    }
                    Some(Tok::Pays) => {
                        self.pos += 1;
                        let var = self.resolve_target(&name)?;
                        let expr = self.parse_expr()?;
                        Ok(Stmt::Pays { var, expr })
                    }
                    _ => Err(self.syntax(format!("expected '=' or 'pays' after '{}'", name))),
                }
            }
            _ => Err(self.syntax("expected a statement")),
        }
    }

    fn resolve_target(&self, name: &str) -> Result<usize, ScriptError> {
        if BUILTINS.contains(&name) {
            return Err(self.syntax(format!("'{}' is reserved and cannot be assigned", name)));
        }
        if self.symbols.cells.contains_key(name) {
            return Err(self.syntax(format!("cannot assign to cell '{}'", name)));
        }
        self.symbols
            .vars
            .get(name)
            .copied()
            .ok_or_else(|| self.syntax(format!("cannot assign to '{}' here", name)))
    }

    fn parse_if(&mut self) -> Result<Stmt, ScriptError> {
        self.expect(&Tok::If, "'if'")?;
        let cond = self.parse_cond()?;
        self.expect(&Tok::Then, "'then'")?;
        let then_branch = self.parse_stmts()?;
        let else_branch = if matches!(self.peek().map(|t| &t.tok), Some(Tok::Else)) {
            self.pos += 1;
            self.parse_stmts()?
        } else {
            Vec::new()
        };
        self.expect(&Tok::End, "'end' or 'endif'")?;
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
            affected: Vec::new(),
        })
    }

    fn parse_cond(&mut self) -> Result<Cond, ScriptError> {
        let mut left = self.parse_cond_and()?;
        while matches!(self.peek().map(|t| &t.tok), Some(Tok::Or)) {
            self.pos += 1;
            let right = self.parse_cond_and()?;
            left = Cond::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_cond_and(&mut self) -> Result<Cond, ScriptError> {
        let mut left = self.parse_cond_atom()?;
        while matches!(self.peek().map(|t| &t.tok), Some(Tok::And)) {
            self.pos += 1;
            let right = self.parse_cond_atom()?;
            left = Cond::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_cond_atom(&mut self) -> Result<Cond, ScriptError> {
        match self.peek().map(|t| &t.tok) {
            Some(Tok::Not) => {
                self.pos += 1;
                let inner = self.parse_cond_atom()?;
                Ok(Cond::Not(Box::new(inner)))
            }
            Some(Tok::LParen) => {
                // '(' may open a nested condition or a parenthesised
                // comparison operand; try the condition first and backtrack.
                let saved = self.pos;
                self.pos += 1;
                if let Ok(cond) = self.parse_cond() {
                    if matches!(self.peek().map(|t| &t.tok), Some(Tok::RParen)) {
                        self.pos += 1;
                        return Ok(cond);
                    }
                }
                self.pos = saved;
                self.parse_cmp()
            }
            _ => self.parse_cmp(),
        }
    }

    fn parse_cmp(&mut self) -> Result<Cond, ScriptError> {
        let lhs = self.parse_expr()?;
        let op_token = self
            .advance()
            .ok_or_else(|| self.syntax("expected a comparison operator"))?;
        let rhs_first = match op_token.tok {
            Tok::Gt | Tok::Ge | Tok::Assign | Tok::Neq => false,
            Tok::Lt | Tok::Le => true,
            _ => {
                return Err(ScriptError::Syntax {
                    line: op_token.line,
                    msg: "expected a comparison operator".to_string(),
                })
            }
        };
        let rhs = self.parse_expr()?;
        let width = self.parse_width()?;
        // Normalise to spread form: '<' flips the spread so only one ramp
        // direction survives.
        let spread = if rhs_first {
            Expr::Sub(Box::new(rhs), Box::new(lhs))
        } else {
            Expr::Sub(Box::new(lhs), Box::new(rhs))
        };
        let op = match op_token.tok {
            Tok::Assign => CmpOp::Eq,
            Tok::Neq => CmpOp::Neq,
            _ => CmpOp::Gt,
        };
        Ok(Cond::Cmp { spread, op, width })
    }

    fn parse_width(&mut self) -> Result<Option<f64>, ScriptError> {
        if !matches!(self.peek().map(|t| &t.tok), Some(Tok::Colon)) {
            return Ok(None);
        }
        self.pos += 1;
        let line = self.line();
        match self.advance().map(|t| &t.tok) {
            Some(&Tok::Number(width)) => {
                if width <= 0.0 {
                    Err(ScriptError::NonPositiveWidth { line })
                } else {
                    Ok(Some(width))
                }
            }
            _ => Err(ScriptError::Syntax {
                line,
                msg: "expected a smoothing width after ':'".to_string(),
            }),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.parse_term()?;
        loop {
            match self.peek().map(|t| &t.tok) {
                Some(Tok::Plus) => {
                    self.pos += 1;
                    let right = self.parse_term()?;
                    left = Expr::Add(Box::new(left), Box::new(right));
                }
                Some(Tok::Minus) => {
                    self.pos += 1;
                    let right = self.parse_term()?;
                    left = Expr::Sub(Box::new(left), Box::new(right));
                }
                _ => return Ok(left),
            }
        }
    }

    fn parse_term(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.parse_unary()?;
        loop {
            match self.peek().map(|t| &t.tok) {
                Some(Tok::Star) => {
                    self.pos += 1;
                    let right = self.parse_unary()?;
                    left = Expr::Mul(Box::new(left), Box::new(right));
                }
                Some(Tok::Slash) => {
                    self.pos += 1;
                    let right = self.parse_unary()?;
                    left = Expr::Div(Box::new(left), Box::new(right));
                }
                _ => return Ok(left),
            }
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ScriptError> {
        match self.peek().map(|t| &t.tok) {
            Some(Tok::Minus) => {
                self.pos += 1;
                let inner = self.parse_unary()?;
                Ok(Expr::Neg(Box::new(inner)))
            }
            Some(Tok::Plus) => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, ScriptError> {
        let base = self.parse_primary()?;
        if matches!(self.peek().map(|t| &t.tok), Some(Tok::Caret)) {
            self.pos += 1;
            // Right-associative, binds tighter than unary minus on the left
            // but the exponent may itself be signed: -x^2 is -(x^2), x^-2
            // is x^(-2).
            let exponent = self.parse_unary()?;
            Ok(Expr::Pow(Box::new(base), Box::new(exponent)))
        } else {
            Ok(base)
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ScriptError> {
        let token = self
            .advance()
            .ok_or_else(|| self.syntax("expected an expression"))?;
        match &token.tok {
            Tok::Number(value) => Ok(Expr::Const(*value)),
            Tok::LParen => {
                let expr = self.parse_expr()?;
                self.expect(&Tok::RParen, "')'")?;
                Ok(expr)
            }
            Tok::Ident(name) => self.parse_name(name, token.line),
            Tok::Date(_) => Err(ScriptError::Syntax {
                line: token.line,
                msg: "date literals are only allowed inside DCF".to_string(),
            }),
            _ => Err(ScriptError::Syntax {
                line: token.line,
                msg: "expected an expression".to_string(),
            }),
        }
    }

    fn parse_name(&mut self, name: &str, line: u32) -> Result<Expr, ScriptError> {
        match name {
            "spot" => {
                self.expect(&Tok::LParen, "'(' after spot")?;
                self.expect(&Tok::RParen, "')'")?;
                Ok(Expr::Spot)
            }
            "log" | "sqrt" | "exp" => {
                self.expect(&Tok::LParen, &format!("'(' after {}", name))?;
                let arg = self.parse_expr()?;
                self.expect(&Tok::RParen, "')'")?;
                Ok(match name {
                    "log" => Expr::Log(Box::new(arg)),
                    "sqrt" => Expr::Sqrt(Box::new(arg)),
                    _ => Expr::Exp(Box::new(arg)),
                })
            }
            "max" | "min" => {
                self.expect(&Tok::LParen, &format!("'(' after {}", name))?;
                let mut args = vec![self.parse_expr()?];
                while matches!(self.peek().map(|t| &t.tok), Some(Tok::Comma)) {
                    self.pos += 1;
                    args.push(self.parse_expr()?);
                }
                self.expect(&Tok::RParen, "')'")?;
                if args.len() < 2 {
                    return Err(ScriptError::Syntax {
                        line,
                        msg: format!("{} needs at least two arguments", name),
                    });
                }
                Ok(if name == "max" {
                    Expr::Max(args)
                } else {
                    Expr::Min(args)
                })
            }
            "dcf" => self.parse_dcf(),
            _ => {
                if let Some(&value) = self.symbols.cells.get(name) {
                    Ok(Expr::Const(value))
                } else if let Some(&index) = self.symbols.vars.get(name) {
                    Ok(Expr::Var(index))
                } else {
                    Err(ScriptError::UnboundIdentifier {
                        name: name.to_string(),
                    })
                }
            }
        }
    }

    /// `DCF(basis, start, end)` is fully known at parse time and folds to a
    /// constant year fraction.
    fn parse_dcf(&mut self) -> Result<Expr, ScriptError> {
        self.expect(&Tok::LParen, "'(' after dcf")?;
        let basis = match self.advance().map(|t| &t.tok) {
            Some(Tok::Ident(name)) => name
                .parse::<DayCount>()
                .map_err(|e| self.syntax(e.to_string()))?,
            _ => return Err(self.syntax("expected a day count basis")),
        };
        self.expect(&Tok::Comma, "','")?;
        let start = self.parse_date_arg()?;
        self.expect(&Tok::Comma, "','")?;
        let end = self.parse_date_arg()?;
        self.expect(&Tok::RParen, "')'")?;
        if start > end {
            return Err(ScriptError::InvalidDateOrder {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Expr::Const(basis.year_fraction(start, end)))
    }

    fn parse_date_arg(&mut self) -> Result<Date, ScriptError> {
        match self.advance().map(|t| &t.tok) {
            Some(&Tok::Date(date)) => Ok(date),
            _ => Err(self.syntax("expected a date literal")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use approx::assert_relative_eq;

    fn parse(src: &str) -> Result<Vec<Stmt>, ScriptError> {
        let tokens = lex(src).unwrap();
        let mut vars = HashMap::new();
        for (i, (name, _)) in write_targets(&tokens).iter().enumerate() {
            vars.entry(name.clone()).or_insert(i);
        }
        let mut cells = HashMap::new();
        cells.insert("strike".to_string(), 100.0);
        let symbols = Symbols {
            cells: &cells,
            vars: &vars,
        };
        parse_event(&tokens, &symbols)
    }

    #[test]
    fn test_write_targets_skip_condition_equality() {
        let tokens = lex("if x = 1 then y = 2 end z pays 3").unwrap();
        assert_eq!(
            write_targets(&tokens),
            vec![("y".to_string(), false), ("z".to_string(), true)]
        );
    }

    #[test]
    fn test_bare_pays_uses_implicit_leg() {
        let tokens = lex("pays spot() - 1").unwrap();
        assert_eq!(write_targets(&tokens), vec![("pays".to_string(), true)]);

        let stmts = parse("pays spot() - strike").unwrap();
        assert!(matches!(stmts[0], Stmt::Pays { .. }));
    }

    #[test]
    fn test_pays_after_expression_operand_is_implicit() {
        // `y` ends the assignment's expression; it does not name the leg
        let tokens = lex("y = 1 x = y pays 3").unwrap();
        assert_eq!(
            write_targets(&tokens),
            vec![
                ("y".to_string(), false),
                ("x".to_string(), false),
                ("pays".to_string(), true),
            ]
        );

        let stmts = parse("y = 1 x = y pays 3").unwrap();
        assert_eq!(stmts.len(), 3);
        assert!(matches!(stmts[2], Stmt::Pays { .. }));
    }

    #[test]
    fn test_precedence_and_power() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let stmts = parse("x = 1 + 2 * 3").unwrap();
        let Stmt::Assign { expr, .. } = &stmts[0] else {
            panic!("expected assignment");
        };
        assert_eq!(
            *expr,
            Expr::Add(
                Box::new(Expr::Const(1.0)),
                Box::new(Expr::Mul(
                    Box::new(Expr::Const(2.0)),
                    Box::new(Expr::Const(3.0))
                ))
            )
        );

        // -x ^ 2 parses as -(x ^ 2)
        let stmts = parse("x = 1 y = -x ^ 2").unwrap();
        let Stmt::Assign { expr, .. } = &stmts[1] else {
            panic!("expected assignment");
        };
        assert!(matches!(expr, Expr::Neg(inner) if matches!(**inner, Expr::Pow(..))));
    }

    #[test]
    fn test_cell_folds_to_constant() {
        let stmts = parse("x = strike + 1").unwrap();
        let Stmt::Assign { expr, .. } = &stmts[0] else {
            panic!("expected assignment");
        };
        assert_eq!(
            *expr,
            Expr::Add(Box::new(Expr::Const(100.0)), Box::new(Expr::Const(1.0)))
        );
    }

    #[test]
    fn test_cannot_assign_to_cell_or_builtin() {
        assert!(matches!(
            parse("strike = 2"),
            Err(ScriptError::Syntax { .. })
        ));
        assert!(matches!(parse("max = 2"), Err(ScriptError::Syntax { .. })));
    }

    #[test]
    fn test_unbound_identifier() {
        assert!(matches!(
            parse("x = barrier"),
            Err(ScriptError::UnboundIdentifier { name }) if name == "barrier"
        ));
    }

    #[test]
    fn test_if_else_structure() {
        let stmts = parse("if spot() > strike then x pays 1 else x pays 0 end").unwrap();
        let Stmt::If {
            cond,
            then_branch,
            else_branch,
            ..
        } = &stmts[0]
        else {
            panic!("expected if");
        };
        assert!(matches!(
            cond,
            Cond::Cmp {
                op: CmpOp::Gt,
                width: None,
                ..
            }
        ));
        assert_eq!(then_branch.len(), 1);
        assert_eq!(else_branch.len(), 1);
    }

    #[test]
    fn test_less_than_flips_spread() {
        let stmts = parse("if spot() < 90 then x = 1 end").unwrap();
        let Stmt::If { cond, .. } = &stmts[0] else {
            panic!("expected if");
        };
        let Cond::Cmp { spread, op, .. } = cond else {
            panic!("expected comparison");
        };
        assert_eq!(*op, CmpOp::Gt);
        // spread is 90 - spot()
        assert_eq!(
            *spread,
            Expr::Sub(Box::new(Expr::Const(90.0)), Box::new(Expr::Spot))
        );
    }

    #[test]
    fn test_explicit_width() {
        let stmts = parse("if spot() > 100 : 0.5 then x = 1 end").unwrap();
        let Stmt::If { cond, .. } = &stmts[0] else {
            panic!("expected if");
        };
        assert!(matches!(cond, Cond::Cmp { width: Some(w), .. } if *w == 0.5));

        assert!(matches!(
            parse("if spot() > 100 : 0 then x = 1 end"),
            Err(ScriptError::NonPositiveWidth { .. })
        ));
    }

    #[test]
    fn test_parenthesised_condition_vs_operand() {
        // Grouped conditions
        let stmts = parse("if (spot() > 90 and spot() < 110) or strike = 100 then y = 1 end");
        assert!(stmts.is_ok());
        // Parenthesised comparison operand
        let stmts = parse("if (spot() - strike) > 0 then y = 1 end").unwrap();
        assert!(matches!(&stmts[0], Stmt::If { .. }));
    }

    #[test]
    fn test_dcf_folds_at_parse() {
        let stmts = parse("x = dcf(act365f, 2026-01-01, 2026-07-01) * 2").unwrap();
        let Stmt::Assign { expr, .. } = &stmts[0] else {
            panic!("expected assignment");
        };
        let Expr::Mul(lhs, _) = expr else {
            panic!("expected product");
        };
        let Expr::Const(yf) = **lhs else {
            panic!("expected folded constant");
        };
        assert_relative_eq!(yf, 181.0 / 365.0, epsilon = 1e-12);

        assert!(matches!(
            parse("x = dcf(act365f, 2026-07-01, 2026-01-01)"),
            Err(ScriptError::InvalidDateOrder { .. })
        ));
    }

    #[test]
    fn test_min_max_arity() {
        assert!(parse("x = max(1, 2, 3)").is_ok());
        assert!(matches!(
            parse("x = min(1)"),
            Err(ScriptError::Syntax { .. })
        ));
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(matches!(
            parse("x = 1 )"),
            Err(ScriptError::Syntax { .. })
        ));
        assert!(matches!(
            parse("if spot() > 1 then x = 1"),
            Err(ScriptError::Syntax { .. })
        ));
    }

    #[test]
    fn test_date_outside_dcf_rejected() {
        assert!(matches!(
            parse("x = 2026-01-01"),
            Err(ScriptError::Syntax { .. })
        ));
    }
}
