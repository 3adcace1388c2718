use super::lexer::{Spanned, Token};
use super::ExpressionError;

/// Binary operators supported in formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl BinaryOp {
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Subtract => lhs - rhs,
            BinaryOp::Multiply => lhs * rhs,
            BinaryOp::Divide => lhs / rhs,
            BinaryOp::Power => lhs.powf(rhs),
        }
    }
}

/// Parsed formula
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Column(String),
    Negate(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// Recursive-descent parser with Python operator precedence:
///
/// ```text
/// expr    := term (('+' | '-') term)*
/// term    := unary (('*' | '/') unary)*
/// unary   := ('+' | '-') unary | power
/// power   := atom ('**' unary)?
/// atom    := NUMBER | IDENTIFIER | '(' expr ')'
/// ```
pub struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    source_len: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Spanned], source_len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            source_len,
        }
    }

    /// Parses the whole token stream into one expression.
    pub fn parse(mut self) -> Result<Expr, ExpressionError> {
        if self.tokens.is_empty() {
            return Err(ExpressionError::Empty);
        }

        let expr = self.expr()?;
        match self.tokens.get(self.pos) {
            None => Ok(expr),
            Some(extra) => Err(ExpressionError::UnexpectedToken {
                offset: extra.offset,
                found: describe(&extra.token),
            }),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<&'a Spanned> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Subtract,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn term(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Multiply,
                Some(Token::Slash) => BinaryOp::Divide,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn unary(&mut self) -> Result<Expr, ExpressionError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Negate(Box::new(self.unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, ExpressionError> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::Power) {
            self.pos += 1;
            // Right-associative, and the exponent may carry its own sign
            let exponent = self.unary()?;
            return Ok(binary(BinaryOp::Power, base, exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, ExpressionError> {
        let source_len = self.source_len;
        let Some(spanned) = self.advance() else {
            return Err(ExpressionError::UnexpectedEnd { offset: source_len });
        };

        match &spanned.token {
            Token::Number(value) => Ok(Expr::Number(*value)),
            Token::Identifier(name) => Ok(Expr::Column(name.clone())),
            Token::LeftParen => {
                let inner = self.expr()?;
                match self.advance() {
                    Some(Spanned {
                        token: Token::RightParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(ExpressionError::UnexpectedToken {
                        offset: other.offset,
                        found: describe(&other.token),
                    }),
                    None => Err(ExpressionError::UnclosedParenthesis {
                        offset: spanned.offset,
                    }),
                }
            }
            other => Err(ExpressionError::UnexpectedToken {
                offset: spanned.offset,
                found: describe(other),
            }),
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(value) => value.to_string(),
        Token::Identifier(name) => name.clone(),
        Token::Plus => "+".into(),
        Token::Minus => "-".into(),
        Token::Star => "*".into(),
        Token::Slash => "/".into(),
        Token::Power => "**".into(),
        Token::LeftParen => "(".into(),
        Token::RightParen => ")".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::tokenize;
    use super::*;

    fn parse(source: &str) -> Result<Expr, ExpressionError> {
        let tokens = tokenize(source)?;
        Parser::new(&tokens, source.len()).parse()
    }

    fn col(name: &str) -> Expr {
        Expr::Column(name.to_string())
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            parse("a + b * 2").unwrap(),
            binary(
                BinaryOp::Add,
                col("a"),
                binary(BinaryOp::Multiply, col("b"), Expr::Number(2.0))
            )
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(
            parse("a - b - c").unwrap(),
            binary(
                BinaryOp::Subtract,
                binary(BinaryOp::Subtract, col("a"), col("b")),
                col("c")
            )
        );
    }

    #[test]
    fn power_is_right_associative_and_beats_unary_minus() {
        assert_eq!(
            parse("-a ** b ** 2").unwrap(),
            Expr::Negate(Box::new(binary(
                BinaryOp::Power,
                col("a"),
                binary(BinaryOp::Power, col("b"), Expr::Number(2.0))
            )))
        );
    }

    #[test]
    fn parentheses_group() {
        assert_eq!(
            parse("(a + b) / 2").unwrap(),
            binary(
                BinaryOp::Divide,
                binary(BinaryOp::Add, col("a"), col("b")),
                Expr::Number(2.0)
            )
        );
    }

    #[test]
    fn unclosed_parenthesis() {
        assert_eq!(
            parse("(a + b").unwrap_err(),
            ExpressionError::UnclosedParenthesis { offset: 0 }
        );
    }

    #[test]
    fn dangling_operator() {
        assert_eq!(
            parse("a +").unwrap_err(),
            ExpressionError::UnexpectedEnd { offset: 3 }
        );
    }

    #[test]
    fn juxtaposed_operands() {
        assert_eq!(
            parse("a b").unwrap_err(),
            ExpressionError::UnexpectedToken {
                offset: 2,
                found: "b".into()
            }
        );
    }

    #[test]
    fn empty_formula() {
        assert_eq!(parse("   ").unwrap_err(), ExpressionError::Empty);
    }
}
