//! Recursive-descent parser for OpenQASM 2.0.

use alsvin_ir::{BinaryOp, Expr, Gate, Program, Stmt, StmtKind, UnaryOp, VarAccess};

use crate::error::{ParseError, ParseResult};
use crate::lexer::{SpannedToken, Token, tokenize};
use crate::stdlib::STD_INCLUDES;

/// Parse OpenQASM 2.0 source text into a program.
pub fn parse(source: &str) -> ParseResult<Program> {
    let tokens = tokenize(source).map_err(|(line, text)| ParseError::Lexer { line, text })?;
    Parser::new(tokens).parse_program()
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn line(&self) -> u32 {
        self.tokens
            .get(self.pos.min(self.tokens.len().saturating_sub(1)))
            .map_or(0, |t| t.line)
    }

    fn advance(&mut self) -> Option<SpannedToken> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: &Token) -> ParseResult<u32> {
        match self.advance() {
            Some(tok) if tok.token == *expected => Ok(tok.line),
            Some(tok) => Err(ParseError::UnexpectedToken {
                line: tok.line,
                expected: expected.to_string(),
                found: tok.token.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof(expected.to_string())),
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<(u32, String)> {
        match self.advance() {
            Some(SpannedToken {
                token: Token::Identifier(name),
                line,
            }) => Ok((line, name)),
            Some(tok) => Err(ParseError::UnexpectedToken {
                line: tok.line,
                expected: "identifier".into(),
                found: tok.token.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof("identifier".into())),
        }
    }

    fn expect_nat(&mut self) -> ParseResult<u64> {
        match self.advance() {
            Some(SpannedToken {
                token: Token::NatLiteral(v),
                ..
            }) => Ok(v),
            Some(tok) => Err(ParseError::UnexpectedToken {
                line: tok.line,
                expected: "integer".into(),
                found: tok.token.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof("integer".into())),
        }
    }

    fn parse_program(&mut self) -> ParseResult<Program> {
        self.parse_version()?;

        let mut prog = Program::new();
        while self.peek().is_some() {
            prog.stmts.push(self.parse_stmt()?);
        }
        Ok(prog)
    }

    fn parse_version(&mut self) -> ParseResult<()> {
        self.expect(&Token::OpenQasm)?;
        match self.advance() {
            Some(SpannedToken {
                token: Token::RealLiteral(v),
                ..
            }) if (v - 2.0).abs() < 1e-9 => {}
            Some(tok) => return Err(ParseError::InvalidVersion(tok.token.to_string())),
            None => return Err(ParseError::UnexpectedEof("version".into())),
        }
        self.expect(&Token::Semicolon)?;
        Ok(())
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        match self.peek() {
            Some(Token::Include) => self.parse_include(),
            Some(Token::QReg) => self.parse_register(true),
            Some(Token::CReg) => self.parse_register(false),
            Some(Token::Gate) => self.parse_gate_decl(),
            Some(Token::Opaque) => self.parse_opaque_decl(),
            Some(Token::If) => self.parse_if(),
            _ => self.parse_qop(),
        }
    }

    fn parse_include(&mut self) -> ParseResult<Stmt> {
        let line = self.expect(&Token::Include)?;
        let file = match self.advance() {
            Some(SpannedToken {
                token: Token::StringLiteral(file),
                ..
            }) => file,
            Some(tok) => {
                return Err(ParseError::UnexpectedToken {
                    line: tok.line,
                    expected: "string".into(),
                    found: tok.token.to_string(),
                });
            }
            None => return Err(ParseError::UnexpectedEof("string".into())),
        };
        if !STD_INCLUDES.contains(&file.as_str()) {
            return Err(ParseError::UnknownInclude { line, file });
        }
        self.expect(&Token::Semicolon)?;
        Ok(Stmt::new(line, StmtKind::Include(file)))
    }

    fn parse_register(&mut self, quantum: bool) -> ParseResult<Stmt> {
        let keyword = if quantum { Token::QReg } else { Token::CReg };
        let line = self.expect(&keyword)?;
        let (_, name) = self.expect_identifier()?;
        self.expect(&Token::LBracket)?;
        let size = u32::try_from(self.expect_nat()?).unwrap_or(u32::MAX);
        self.expect(&Token::RBracket)?;
        self.expect(&Token::Semicolon)?;
        Ok(Stmt::new(
            line,
            StmtKind::RegisterDecl {
                name,
                quantum,
                size,
            },
        ))
    }

    fn parse_gate_decl(&mut self) -> ParseResult<Stmt> {
        let line = self.expect(&Token::Gate)?;
        let (_, name) = self.expect_identifier()?;

        let c_params = if self.peek() == Some(&Token::LParen) {
            self.advance();
            let params = self.parse_id_list()?;
            self.expect(&Token::RParen)?;
            params
        } else {
            vec![]
        };
        let q_params = self.parse_id_list()?;

        self.expect(&Token::LBrace)?;
        let mut body = vec![];
        while self.peek() != Some(&Token::RBrace) {
            body.push(self.parse_gate_body_stmt()?);
        }
        self.expect(&Token::RBrace)?;

        Ok(Stmt::new(
            line,
            StmtKind::GateDecl {
                name,
                c_params,
                q_params,
                body: Some(body),
            },
        ))
    }

    fn parse_opaque_decl(&mut self) -> ParseResult<Stmt> {
        let line = self.expect(&Token::Opaque)?;
        let (_, name) = self.expect_identifier()?;

        let c_params = if self.peek() == Some(&Token::LParen) {
            self.advance();
            let params = self.parse_id_list()?;
            self.expect(&Token::RParen)?;
            params
        } else {
            vec![]
        };
        let q_params = self.parse_id_list()?;
        self.expect(&Token::Semicolon)?;

        Ok(Stmt::new(
            line,
            StmtKind::GateDecl {
                name,
                c_params,
                q_params,
                body: None,
            },
        ))
    }

    /// One statement of a gate body: a gate operation or an ancilla
    /// declaration (a local extension to the base language).
    fn parse_gate_body_stmt(&mut self) -> ParseResult<Stmt> {
        match self.peek() {
            Some(Token::Ancilla) => {
                let line = self.expect(&Token::Ancilla)?;
                self.parse_ancilla_tail(line, false)
            }
            Some(Token::Dirty) => {
                let line = self.expect(&Token::Dirty)?;
                self.expect(&Token::Ancilla)?;
                self.parse_ancilla_tail(line, true)
            }
            _ => self.parse_qop(),
        }
    }

    fn parse_ancilla_tail(&mut self, line: u32, dirty: bool) -> ParseResult<Stmt> {
        let (_, name) = self.expect_identifier()?;
        self.expect(&Token::LBracket)?;
        let size = u32::try_from(self.expect_nat()?).unwrap_or(u32::MAX);
        self.expect(&Token::RBracket)?;
        self.expect(&Token::Semicolon)?;
        Ok(Stmt::new(line, StmtKind::AncillaDecl { name, size, dirty }))
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let line = self.expect(&Token::If)?;
        self.expect(&Token::LParen)?;
        let (_, reg) = self.expect_identifier()?;
        self.expect(&Token::EqEq)?;
        let value = self.expect_nat()?;
        self.expect(&Token::RParen)?;
        let then = self.parse_qop()?;
        Ok(Stmt::new(
            line,
            StmtKind::If {
                reg,
                value,
                then: Box::new(then),
            },
        ))
    }

    /// A quantum operation: built-in gate, gate call, barrier, measure or
    /// reset.
    fn parse_qop(&mut self) -> ParseResult<Stmt> {
        match self.peek() {
            Some(Token::GateU) => {
                let line = self.expect(&Token::GateU)?;
                self.expect(&Token::LParen)?;
                let theta = self.parse_expr()?;
                self.expect(&Token::Comma)?;
                let phi = self.parse_expr()?;
                self.expect(&Token::Comma)?;
                let lambda = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                let arg = self.parse_arg()?;
                self.expect(&Token::Semicolon)?;
                Ok(Stmt::gate(
                    line,
                    Gate::U {
                        theta,
                        phi,
                        lambda,
                        arg,
                    },
                ))
            }
            Some(Token::GateCX) => {
                let line = self.expect(&Token::GateCX)?;
                let ctrl = self.parse_arg()?;
                self.expect(&Token::Comma)?;
                let tgt = self.parse_arg()?;
                self.expect(&Token::Semicolon)?;
                Ok(Stmt::gate(line, Gate::CNot { ctrl, tgt }))
            }
            Some(Token::Barrier) => {
                let line = self.expect(&Token::Barrier)?;
                let args = self.parse_arg_list()?;
                self.expect(&Token::Semicolon)?;
                Ok(Stmt::gate(line, Gate::Barrier { args }))
            }
            Some(Token::Measure) => {
                let line = self.expect(&Token::Measure)?;
                let qarg = self.parse_arg()?;
                self.expect(&Token::Arrow)?;
                let carg = self.parse_arg()?;
                self.expect(&Token::Semicolon)?;
                Ok(Stmt::new(line, StmtKind::Measure { qarg, carg }))
            }
            Some(Token::Reset) => {
                let line = self.expect(&Token::Reset)?;
                let arg = self.parse_arg()?;
                self.expect(&Token::Semicolon)?;
                Ok(Stmt::new(line, StmtKind::Reset { arg }))
            }
            Some(Token::Identifier(_)) => {
                let (line, name) = self.expect_identifier()?;
                let cargs = if self.peek() == Some(&Token::LParen) {
                    self.advance();
                    let mut cargs = vec![];
                    if self.peek() != Some(&Token::RParen) {
                        cargs.push(self.parse_expr()?);
                        while self.peek() == Some(&Token::Comma) {
                            self.advance();
                            cargs.push(self.parse_expr()?);
                        }
                    }
                    self.expect(&Token::RParen)?;
                    cargs
                } else {
                    vec![]
                };
                let qargs = self.parse_arg_list()?;
                self.expect(&Token::Semicolon)?;
                Ok(Stmt::gate(line, Gate::Call { name, cargs, qargs }))
            }
            Some(other) => Err(ParseError::UnexpectedToken {
                line: self.line(),
                expected: "statement".into(),
                found: other.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof("statement".into())),
        }
    }

    fn parse_id_list(&mut self) -> ParseResult<Vec<String>> {
        let mut ids = vec![];
        if matches!(self.peek(), Some(Token::Identifier(_))) {
            ids.push(self.expect_identifier()?.1);
            while self.peek() == Some(&Token::Comma) {
                self.advance();
                ids.push(self.expect_identifier()?.1);
            }
        }
        Ok(ids)
    }

    fn parse_arg(&mut self) -> ParseResult<VarAccess> {
        let (_, reg) = self.expect_identifier()?;
        let offset = if self.peek() == Some(&Token::LBracket) {
            self.advance();
            let index = u32::try_from(self.expect_nat()?).unwrap_or(u32::MAX);
            self.expect(&Token::RBracket)?;
            Some(index)
        } else {
            None
        };
        Ok(VarAccess { reg, offset })
    }

    fn parse_arg_list(&mut self) -> ParseResult<Vec<VarAccess>> {
        let mut args = vec![self.parse_arg()?];
        while self.peek() == Some(&Token::Comma) {
            self.advance();
            args.push(self.parse_arg()?);
        }
        Ok(args)
    }

    // Expression grammar, lowest precedence first:
    //   expr   := term (('+' | '-') term)*
    //   term   := factor (('*' | '/') factor)*
    //   factor := '-' factor | power
    //   power  := primary ('^' factor)?
    fn parse_expr(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_term()?;
            lhs = Expr::binary(lhs, op, rhs);
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_factor()?;
            lhs = Expr::binary(lhs, op, rhs);
        }
        Ok(lhs)
    }

    fn parse_factor(&mut self) -> ParseResult<Expr> {
        if self.peek() == Some(&Token::Minus) {
            self.advance();
            let sub = self.parse_factor()?;
            return Ok(Expr::unary(UnaryOp::Neg, sub));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> ParseResult<Expr> {
        let base = self.parse_primary()?;
        if self.peek() == Some(&Token::Caret) {
            self.advance();
            // Right-associative.
            let exp = self.parse_factor()?;
            return Ok(Expr::binary(base, BinaryOp::Pow, exp));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        match self.advance() {
            Some(SpannedToken {
                token: Token::NatLiteral(v),
                ..
            }) => Ok(Expr::Int(i64::try_from(v).unwrap_or(i64::MAX))),
            Some(SpannedToken {
                token: Token::RealLiteral(v),
                ..
            }) => Ok(Expr::Real(v)),
            Some(SpannedToken {
                token: Token::Pi, ..
            }) => Ok(Expr::Pi),
            Some(SpannedToken {
                token: Token::Identifier(name),
                line,
            }) => {
                if let Some(op) = unary_fn(&name) {
                    if self.peek() == Some(&Token::LParen) {
                        self.advance();
                        let sub = self.parse_expr()?;
                        self.expect(&Token::RParen)?;
                        return Ok(Expr::unary(op, sub));
                    }
                    return Err(ParseError::UnexpectedToken {
                        line,
                        expected: "(".into(),
                        found: self.peek().map_or("end of input".into(), Token::to_string),
                    });
                }
                Ok(Expr::Var(name))
            }
            Some(SpannedToken {
                token: Token::LParen,
                ..
            }) => {
                let expr = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Some(tok) => Err(ParseError::UnexpectedToken {
                line: tok.line,
                expected: "expression".into(),
                found: tok.token.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof("expression".into())),
        }
    }
}

fn unary_fn(name: &str) -> Option<UnaryOp> {
    match name {
        "sin" => Some(UnaryOp::Sin),
        "cos" => Some(UnaryOp::Cos),
        "tan" => Some(UnaryOp::Tan),
        "exp" => Some(UnaryOp::Exp),
        "ln" => Some(UnaryOp::Ln),
        "sqrt" => Some(UnaryOp::Sqrt),
        _ => None,
    }
}
