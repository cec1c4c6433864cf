use super::lexer::{tokenize, Token};
use super::ExpressionError;
use crate::evaluation::InputValue;

/// Nesting beyond this depth is rejected before it can exhaust the stack.
const MAX_DEPTH: usize = 64;

/// Binary operators beyond this count are rejected; long flat chains build
/// trees as deep as they are long.
const MAX_OPERATORS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
        }
    }

    /// Comparator that keeps the meaning when the operands swap sides.
    pub fn flipped(&self) -> Self {
        match self {
            Comparator::Lt => Comparator::Gt,
            Comparator::Le => Comparator::Ge,
            Comparator::Gt => Comparator::Lt,
            Comparator::Ge => Comparator::Le,
            Comparator::Eq => Comparator::Eq,
            Comparator::Ne => Comparator::Ne,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Parsed condition expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(InputValue),
    Variable(String),
    Negate(Box<Expr>),
    Not(Box<Expr>),
    Arithmetic {
        op: ArithmeticOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Compare {
        op: Comparator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// Parses a condition expression into a tree.
///
/// Grammar, loosest binding first:
///
/// ```text
/// or         := and (("or" | "||") and)*
/// and        := not (("and" | "&&") not)*
/// not        := ("not" | "!") not | comparison
/// comparison := additive (cmp additive)*
/// additive   := term (("+" | "-") term)*
/// term       := unary (("*" | "/") unary)*
/// unary      := "-" unary | primary
/// primary    := number | string | "true" | "false" | identifier | "(" or ")"
/// ```
///
/// Chained comparisons (`18 <= age < 65`) read as the conjunction of each
/// adjacent pair.
pub fn parse(source: &str) -> Result<Expr, ExpressionError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ExpressionError::Unsafe("empty expression".to_string()));
    }

    let mut parser = Parser {
        tokens,
        cursor: 0,
        depth: 0,
        operators: 0,
    };
    let expr = parser.parse_or()?;

    if let Some(token) = parser.peek() {
        return Err(ExpressionError::Unsafe(format!(
            "unexpected {} after end of expression",
            token.describe()
        )));
    }

    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    depth: usize,
    operators: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn descend(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExpressionError::Unsafe(
                "expression nested too deeply".to_string(),
            ));
        }
        Ok(())
    }

    fn count_operator(&mut self) -> Result<(), ExpressionError> {
        self.operators += 1;
        if self.operators > MAX_OPERATORS {
            return Err(ExpressionError::Unsafe("expression too large".to_string()));
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::Or) {
            self.count_operator()?;
            let rhs = self.parse_and()?;
            lhs = Expr::Logical {
                op: LogicalOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.parse_not()?;
        while self.eat(&Token::And) {
            self.count_operator()?;
            let rhs = self.parse_not()?;
            lhs = Expr::Logical {
                op: LogicalOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, ExpressionError> {
        if self.eat(&Token::Not) {
            self.descend()?;
            let operand = self.parse_not()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExpressionError> {
        let first = self.parse_additive()?;
        let mut pairs: Vec<Expr> = Vec::new();
        let mut lhs = first.clone();

        while let Some(op) = self.peek().and_then(comparator_for) {
            self.cursor += 1;
            self.count_operator()?;
            let rhs = self.parse_additive()?;
            pairs.push(Expr::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs.clone()),
            });
            lhs = rhs;
        }

        let mut pairs = pairs.into_iter();
        let Some(mut combined) = pairs.next() else {
            return Ok(first);
        };
        for pair in pairs {
            combined = Expr::Logical {
                op: LogicalOp::And,
                lhs: Box::new(combined),
                rhs: Box::new(pair),
            };
        }
        Ok(combined)
    }

    fn parse_additive(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithmeticOp::Add,
                Some(Token::Minus) => ArithmeticOp::Subtract,
                _ => break,
            };
            self.cursor += 1;
            self.count_operator()?;
            let rhs = self.parse_term()?;
            lhs = Expr::Arithmetic {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => ArithmeticOp::Multiply,
                Some(Token::Slash) => ArithmeticOp::Divide,
                _ => break,
            };
            self.cursor += 1;
            self.count_operator()?;
            let rhs = self.parse_unary()?;
            lhs = Expr::Arithmetic {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExpressionError> {
        if self.eat(&Token::Minus) {
            self.descend()?;
            let operand = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Negate(Box::new(operand)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ExpressionError> {
        let token = self
            .advance()
            .ok_or_else(|| ExpressionError::Unsafe("unexpected end of expression".to_string()))?;

        match token {
            Token::Int(value) => Ok(Expr::Literal(InputValue::Integer(value))),
            Token::Float(value) => Ok(Expr::Literal(InputValue::Float(value))),
            Token::Str(value) => Ok(Expr::Literal(InputValue::Text(value))),
            Token::True => Ok(Expr::Literal(InputValue::Boolean(true))),
            Token::False => Ok(Expr::Literal(InputValue::Boolean(false))),
            Token::Ident(name) => {
                if self.peek() == Some(&Token::LParen) {
                    return Err(ExpressionError::Unsafe(format!(
                        "call syntax is not allowed ('{name}(...)')"
                    )));
                }
                Ok(Expr::Variable(name))
            }
            Token::LParen => {
                self.descend()?;
                let inner = self.parse_or()?;
                self.depth -= 1;
                if !self.eat(&Token::RParen) {
                    return Err(ExpressionError::Unsafe(
                        "missing closing parenthesis".to_string(),
                    ));
                }
                Ok(inner)
            }
            other => Err(ExpressionError::Unsafe(format!(
                "unexpected {}",
                other.describe()
            ))),
        }
    }
}

fn comparator_for(token: &Token) -> Option<Comparator> {
    match token {
        Token::Lt => Some(Comparator::Lt),
        Token::Le => Some(Comparator::Le),
        Token::Gt => Some(Comparator::Gt),
        Token::Ge => Some(Comparator::Ge),
        Token::Eq => Some(Comparator::Eq),
        Token::Ne => Some(Comparator::Ne),
        _ => None,
    }
}
