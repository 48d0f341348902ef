// File: src/parser.rs
//
// Recursive descent parser for the Khwarizmi language.
// Transforms a sequence of tokens into an Abstract Syntax Tree (AST).
//
// The parser uses single-token lookahead and one function per precedence
// level, lowest to highest:
//   or -> and -> equality (== !=) -> relational (< > <= >=)
//      -> additive (+ -) -> multiplicative (* /) -> unary (- !) -> primary
//
// Statements are terminated by newlines. When a statement is malformed the
// parser records a diagnostic, skips to the next newline or `end`, and keeps
// going so that a single pass reports as many problems as possible.

use crate::ast::{BinaryOp, Block, Equation, Expr, ExprKind, Program, Stmt, StmtKind, Type, UnaryOp};
use crate::errors::{Diagnostic, SourceLocation};
use crate::lexer::{Keyword, Operator, Token, TokenKind};
use tracing::debug;

type ParseResult<T> = Result<T, Diagnostic>;

/// Parser maintains position in token stream and provides methods to parse statements and expressions
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<Diagnostic>,
}

impl Parser {
    /// Creates a new parser from a vector of tokens.
    ///
    /// Error tokens produced by the lexer are reported as lexical diagnostics
    /// here and removed from the stream, so one stray character does not
    /// cascade into a run of syntax errors.
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut errors = Vec::new();
        let mut kept = Vec::with_capacity(tokens.len());
        for token in tokens {
            match token.kind {
                TokenKind::Error(text) => errors.push(Diagnostic::lexical(
                    format!("unrecognized input '{}'", text),
                    token.location,
                )),
                _ => kept.push(token),
            }
        }
        Parser { tokens: kept, pos: 0, errors }
    }

    /// Peek at the current token without consuming it
    fn peek(&self) -> &TokenKind {
        self.tokens.get(self.pos).map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    /// Peek `offset` tokens past the current one
    fn peek_at(&self, offset: usize) -> &TokenKind {
        self.tokens.get(self.pos + offset).map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    fn location(&self) -> SourceLocation {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.location)
            .unwrap_or_default()
    }

    /// Consume and return the current token, then advance to the next
    fn advance(&mut self) -> TokenKind {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        matches!(self.peek(), TokenKind::Keyword(k) if *k == kw)
    }

    fn at_operator(&self, op: Operator) -> bool {
        matches!(self.peek(), TokenKind::Operator(o) if *o == op)
    }

    fn unexpected(&self, expected: &str) -> Diagnostic {
        Diagnostic::syntax(format!("expected {}, found {}", expected, self.peek()), self.location())
    }

    fn expect_keyword(&mut self, kw: Keyword) -> ParseResult<()> {
        if self.at_keyword(kw) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", kw.as_str())))
        }
    }

    fn expect_operator(&mut self, op: Operator) -> ParseResult<()> {
        if self.at_operator(op) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", op.as_str())))
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<String> {
        match self.peek() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), TokenKind::Newline) {
            self.advance();
        }
    }

    /// True when `kw` is the next token once newlines are ignored
    fn keyword_after_newlines(&self, kw: Keyword) -> bool {
        let mut offset = 0;
        while matches!(self.peek_at(offset), TokenKind::Newline) {
            offset += 1;
        }
        matches!(self.peek_at(offset), TokenKind::Keyword(k) if *k == kw)
    }

    /// Skip to the next newline or block terminator without consuming `end`
    fn synchronize(&mut self) {
        loop {
            match self.peek() {
                TokenKind::Newline => {
                    self.advance();
                    return;
                }
                TokenKind::Keyword(Keyword::End) | TokenKind::Eof => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Parse the entire token stream into a program.
    ///
    /// Returns every lexical and syntax diagnostic found if any occurred.
    pub fn parse(mut self) -> Result<Program, Vec<Diagnostic>> {
        self.skip_newlines();
        let body = match self.parse_block() {
            Ok(block) => block,
            Err(err) => {
                self.errors.push(err);
                Block::default()
            }
        };
        self.skip_newlines();
        if !matches!(self.peek(), TokenKind::Eof) {
            let err = self.unexpected("end of input after the program's closing 'end'");
            self.errors.push(err);
        }

        if self.errors.is_empty() {
            debug!(statements = body.statements.len(), "parsed program");
            Ok(Program { body })
        } else {
            self.errors.sort_by_key(|d| (d.location.line, d.location.column));
            Err(self.errors)
        }
    }

    /// block := begin NEWLINE* (statement terminator)* end
    fn parse_block(&mut self) -> ParseResult<Block> {
        self.expect_keyword(Keyword::Begin)?;
        let mut statements = Vec::new();

        loop {
            self.skip_newlines();
            match self.peek() {
                TokenKind::Keyword(Keyword::End) => {
                    self.advance();
                    return Ok(Block { statements });
                }
                TokenKind::Eof => {
                    return Err(Diagnostic::syntax("unterminated block: expected 'end'", self.location())
                        .with_help("every 'begin' needs a matching 'end'"));
                }
                _ => {}
            }

            match self.parse_stmt().and_then(|stmt| self.expect_terminator().map(|_| stmt)) {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }
    }

    /// True when the token `offset` ahead can end the current statement
    fn ends_statement_at(&self, offset: usize) -> bool {
        match self.peek_at(offset) {
            TokenKind::Newline | TokenKind::Eof | TokenKind::Identifier(_) => true,
            TokenKind::Keyword(kw) => !matches!(kw, Keyword::Elif | Keyword::Else),
            _ => false,
        }
    }

    /// A statement ends at a newline, before `end`, or where the next statement begins
    fn expect_terminator(&mut self) -> ParseResult<()> {
        match self.peek() {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            _ if self.ends_statement_at(0) => Ok(()),
            _ => Err(self.unexpected("a newline after the statement")),
        }
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        let location = self.location();
        let kind = match self.peek() {
            TokenKind::Keyword(Keyword::Int) => self.parse_declaration(Type::Integer)?,
            TokenKind::Keyword(Keyword::Bool) => self.parse_declaration(Type::Boolean)?,
            TokenKind::Keyword(Keyword::Eq) => self.parse_equation_declaration()?,
            TokenKind::Keyword(Keyword::If) => self.parse_if()?,
            TokenKind::Keyword(Keyword::While) => self.parse_while()?,
            TokenKind::Keyword(Keyword::Print) => {
                self.advance();
                StmtKind::Print(self.parse_arguments()?)
            }
            TokenKind::Keyword(Keyword::Show) => {
                self.advance();
                StmtKind::Show(self.parse_arguments()?)
            }
            TokenKind::Keyword(Keyword::Input) => {
                self.advance();
                StmtKind::Input(self.expect_identifier()?)
            }
            TokenKind::Keyword(Keyword::Solve) => self.parse_solve()?,
            TokenKind::Keyword(Keyword::Begin) => StmtKind::Block(self.parse_block()?),
            TokenKind::Identifier(_) => {
                let name = self.expect_identifier()?;
                self.expect_operator(Operator::Assign)?;
                StmtKind::Assign { name, value: self.parse_expr()? }
            }
            _ => return Err(self.unexpected("a statement")),
        };
        Ok(Stmt::new(kind, location))
    }

    /// declaration := (int | bool) IDENT (= expr)?
    fn parse_declaration(&mut self, ty: Type) -> ParseResult<StmtKind> {
        self.advance(); // type keyword
        let name = self.expect_identifier()?;
        let init = if self.at_operator(Operator::Assign) {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(StmtKind::Declare { name, ty, init })
    }

    /// eq-declaration := eq IDENT = expr
    fn parse_equation_declaration(&mut self) -> ParseResult<StmtKind> {
        self.advance(); // eq
        let name = self.expect_identifier()?;
        self.expect_operator(Operator::Assign)?;
        let equation = self.parse_expr()?;
        Ok(StmtKind::DeclareEquation { name, equation })
    }

    fn parse_if(&mut self) -> ParseResult<StmtKind> {
        self.advance(); // if
        let mut branches = Vec::new();
        let condition = self.parse_expr()?;
        self.skip_newlines();
        branches.push((condition, self.parse_block()?));

        while self.keyword_after_newlines(Keyword::Elif) {
            self.skip_newlines();
            self.advance(); // elif
            let condition = self.parse_expr()?;
            self.skip_newlines();
            branches.push((condition, self.parse_block()?));
        }

        let else_block = if self.keyword_after_newlines(Keyword::Else) {
            self.skip_newlines();
            self.advance(); // else
            self.skip_newlines();
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(StmtKind::If { branches, else_block })
    }

    fn parse_while(&mut self) -> ParseResult<StmtKind> {
        self.advance(); // while
        let condition = self.parse_expr()?;
        self.skip_newlines();
        let body = self.parse_block()?;
        Ok(StmtKind::While { condition, body })
    }

    fn parse_comma_list(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = vec![self.parse_expr()?];
        while matches!(self.peek(), TokenKind::Punctuation(',')) {
            self.advance();
            args.push(self.parse_expr()?);
        }
        Ok(args)
    }

    /// args := expr ("," expr)* | "(" expr ("," expr)* ")"
    ///
    /// The call form only applies when the statement ends at the closing
    /// paren, so `print (1 + 2) * 3` still reads as one expression.
    fn parse_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        if matches!(self.peek(), TokenKind::Punctuation('(')) {
            let start = self.pos;
            self.advance(); // (
            let call = self.parse_comma_list().and_then(|args| {
                if matches!(self.peek(), TokenKind::Punctuation(')')) && self.ends_statement_at(1) {
                    self.advance(); // )
                    Ok(args)
                } else {
                    Err(self.unexpected("')'"))
                }
            });
            match call {
                Ok(args) => return Ok(args),
                Err(_) => self.pos = start,
            }
        }
        self.parse_comma_list()
    }

    /// solve := solve IDENT | solve "(" IDENT ")" | solve expr
    fn parse_solve(&mut self) -> ParseResult<StmtKind> {
        self.advance(); // solve
        let bare_name = matches!(self.peek(), TokenKind::Identifier(_)) && self.ends_statement_at(1);
        let called_name = matches!(self.peek(), TokenKind::Punctuation('('))
            && matches!(self.peek_at(1), TokenKind::Identifier(_))
            && matches!(self.peek_at(2), TokenKind::Punctuation(')'))
            && self.ends_statement_at(3);

        if called_name {
            self.advance(); // (
            let name = self.expect_identifier()?;
            self.advance(); // )
            return Ok(StmtKind::Solve(Equation::Named(name)));
        }
        if bare_name {
            return Ok(StmtKind::Solve(Equation::Named(self.expect_identifier()?)));
        }
        Ok(StmtKind::Solve(Equation::Inline(self.parse_expr()?)))
    }

    pub(crate) fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_or()
    }

    /// Parses one left-associative precedence level
    fn parse_binary_level(
        &mut self,
        ops: &[(Operator, BinaryOp)],
        next: fn(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let mut left = next(self)?;
        loop {
            let found = match self.peek() {
                TokenKind::Operator(o) => ops.iter().find(|(tok, _)| tok == o).map(|(_, op)| *op),
                _ => None,
            };
            let Some(op) = found else { break };
            self.advance();
            let right = next(self)?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(&[(Operator::Or, BinaryOp::Or)], Self::parse_and)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(&[(Operator::And, BinaryOp::And)], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(
            &[(Operator::Equal, BinaryOp::Eq), (Operator::NotEqual, BinaryOp::Ne)],
            Self::parse_relational,
        )
    }

    fn parse_relational(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(
            &[
                (Operator::Less, BinaryOp::Lt),
                (Operator::Greater, BinaryOp::Gt),
                (Operator::LessEqual, BinaryOp::Le),
                (Operator::GreaterEqual, BinaryOp::Ge),
            ],
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(
            &[(Operator::Plus, BinaryOp::Add), (Operator::Minus, BinaryOp::Sub)],
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(
            &[(Operator::Star, BinaryOp::Mul), (Operator::Slash, BinaryOp::Div)],
            Self::parse_unary,
        )
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let location = self.location();
        let op = match self.peek() {
            TokenKind::Operator(Operator::Minus) => UnaryOp::Neg,
            TokenKind::Operator(Operator::Not) => UnaryOp::Not,
            _ => return self.parse_primary(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::new(ExprKind::Unary { op, operand: Box::new(operand) }, location))
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let location = self.location();
        let kind = match self.peek() {
            TokenKind::Int(n) => ExprKind::Int(*n),
            TokenKind::Bool(b) => ExprKind::Bool(*b),
            TokenKind::Identifier(name) => ExprKind::Variable(name.clone()),
            TokenKind::Punctuation('(') => {
                self.advance(); // (
                let inner = self.parse_expr()?;
                if !matches!(self.peek(), TokenKind::Punctuation(')')) {
                    return Err(self.unexpected("')'"));
                }
                self.advance(); // )
                return Ok(inner);
            }
            _ => return Err(self.unexpected("an expression")),
        };
        self.advance();
        Ok(Expr::new(kind, location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Severity;
    use crate::lexer::tokenize;

    fn parse(source: &str) -> Result<Program, Vec<Diagnostic>> {
        Parser::new(tokenize(source)).parse()
    }

    fn parse_expr(source: &str) -> Expr {
        let mut parser = Parser::new(tokenize(source));
        parser.parse_expr().expect("expression should parse")
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        assert_eq!(parse_expr("1 + 2 * 3").to_string(), "1 + 2 * 3");
        match parse_expr("1 + 2 * 3").kind {
            ExprKind::Binary { op: BinaryOp::Add, right, .. } => {
                assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_unary_minus_binds_tightest() {
        match parse_expr("-2 + 3").kind {
            ExprKind::Binary { op: BinaryOp::Add, left, .. } => {
                assert!(matches!(left.kind, ExprKind::Unary { op: UnaryOp::Neg, .. }));
            }
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_binary_operators_are_left_associative() {
        match parse_expr("10 - 4 - 3").kind {
            ExprKind::Binary { op: BinaryOp::Sub, left, right } => {
                assert!(matches!(left.kind, ExprKind::Binary { op: BinaryOp::Sub, .. }));
                assert!(matches!(right.kind, ExprKind::Int(3)));
            }
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_logical_precedence() {
        // and binds tighter than or, comparisons tighter than both
        assert_eq!(
            parse_expr("a || b && 1 < 2 == c").to_string(),
            "a || b && 1 < 2 == c"
        );
        match parse_expr("a || b && c").kind {
            ExprKind::Binary { op: BinaryOp::Or, right, .. } => {
                assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::And, .. }));
            }
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_parses_full_program() {
        let program = parse(
            "begin\n  int x = 4\n  bool b\n  if x > 3 begin\n    print x\n  end elif b begin\n    show x\n  end\n  else begin\n    x = 1\n  end\nend\n",
        )
        .expect("program should parse");
        assert_eq!(program.body.statements.len(), 3);
        match &program.body.statements[2].kind {
            StmtKind::If { branches, else_block } => {
                assert_eq!(branches.len(), 2);
                assert!(else_block.is_some());
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_one_line_program() {
        let program = parse("begin int x x = 4 print x end").expect("program should parse");
        assert_eq!(program.body.statements.len(), 3);
    }

    #[test]
    fn test_solve_forms() {
        let program = parse("begin\n eq e = 2 * x == 8\n solve e\n solve y + 1 == 2\nend").unwrap();
        assert!(matches!(
            &program.body.statements[1].kind,
            StmtKind::Solve(Equation::Named(name)) if name == "e"
        ));
        assert!(matches!(
            &program.body.statements[2].kind,
            StmtKind::Solve(Equation::Inline(_))
        ));
    }

    #[test]
    fn test_call_style_print_and_show() {
        let program = parse("begin\n print(1, 2)\n show(x + 1, y)\n print (1 + 2) * 3\nend").unwrap();
        match &program.body.statements[0].kind {
            StmtKind::Print(args) => assert_eq!(args.len(), 2),
            other => panic!("unexpected statement {:?}", other),
        }
        match &program.body.statements[1].kind {
            StmtKind::Show(args) => assert_eq!(args[0].to_string(), "x + 1"),
            other => panic!("unexpected statement {:?}", other),
        }
        match &program.body.statements[2].kind {
            StmtKind::Print(args) => {
                assert_eq!(args.len(), 1);
                assert!(matches!(args[0].kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_call_style_solve() {
        let program = parse("begin\n eq e = x == 3\n solve(e)\n solve(y + 1 == 2)\n solve (z) == 4\nend").unwrap();
        assert!(matches!(
            &program.body.statements[1].kind,
            StmtKind::Solve(Equation::Named(name)) if name == "e"
        ));
        assert!(matches!(&program.body.statements[2].kind, StmtKind::Solve(Equation::Inline(_))));
        assert!(matches!(&program.body.statements[3].kind, StmtKind::Solve(Equation::Inline(_))));
    }

    #[test]
    fn test_call_style_one_line() {
        let program = parse("begin int x x = 4 print(x) solve(e) end").unwrap();
        assert_eq!(program.body.statements.len(), 4);
    }

    #[test]
    fn test_collects_multiple_errors() {
        let errors = parse("begin\n  int = 3\n  x = \n  print 1\n  y = )\nend").unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.severity == Severity::Syntax));
        assert_eq!(errors[0].location.line, 2);
        assert_eq!(errors[1].location.line, 3);
        assert_eq!(errors[2].location.line, 5);
    }

    #[test]
    fn test_lexical_errors_are_reported() {
        let errors = parse("begin\n  int x = 3 $ 4\nend").unwrap_err();
        assert_eq!(errors[0].severity, Severity::Lexical);
    }

    #[test]
    fn test_missing_end() {
        let errors = parse("begin\n print 1\n").unwrap_err();
        assert!(errors[0].message.contains("unterminated block"));
    }

    #[test]
    fn test_trailing_tokens_after_program() {
        assert!(parse("begin\nend\nprint 1").is_err());
    }
}
