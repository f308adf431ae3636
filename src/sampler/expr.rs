//! A small expression language over one variable `x`.

use std::fmt;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("unexpected character '{0}' at {1}")]
    UnexpectedChar(char, usize),
    #[error("unexpected {0}")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unknown identifier '{0}'")]
    UnknownIdent(String),
    #[error("{name} takes {expected} argument(s), got {got}")]
    Arity {
        name: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("result is not a finite number")]
    NonFinite,
    #[error("expression is nested too deeply")]
    TooDeep,
    #[error("expression is too long")]
    TooLong,
}

/// Limit on nested groups, calls and signs. Evaluation recurses as deep as parsing.
pub const MAX_DEPTH: usize = 256;
/// Limit on input length, which bounds left-leaning operator chains.
pub const MAX_TOKENS: usize = 4096;

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Op(char),
    Open(char),
    Close(char),
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(n) => write!(f, "number {}", n),
            Token::Ident(s) => write!(f, "identifier '{}'", s),
            Token::Op(c) | Token::Open(c) | Token::Close(c) => write!(f, "'{}'", c),
            Token::Comma => f.write_str("','"),
        }
    }
}

fn tokenize(src: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            // Exponent only when digits follow, so `2e` stays `2 * e`.
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text: String = chars[start..i].iter().collect();
            let value = text
                .parse::<f64>()
                .map_err(|_| ExprError::UnexpectedToken(format!("number '{}'", text)))?;
            tokens.push(Token::Num(value));
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
        } else {
            let token = match c {
                '+' | '-' | '*' | '/' | '^' => Token::Op(c),
                '(' | '{' => Token::Open(c),
                ')' | '}' => Token::Close(c),
                ',' => Token::Comma,
                _ => return Err(ExprError::UnexpectedChar(c, i)),
            };
            tokens.push(token);
            i += 1;
        }
    }
    Ok(tokens)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Log10,
    Log2,
    Sqrt,
    Abs,
    Floor,
    Ceil,
    Round,
    Sign,
    Pow,
    Min,
    Max,
    Mod,
}

impl Func {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "asin" => Func::Asin,
            "acos" => Func::Acos,
            "atan" => Func::Atan,
            "sinh" => Func::Sinh,
            "cosh" => Func::Cosh,
            "tanh" => Func::Tanh,
            "exp" => Func::Exp,
            "log" | "ln" => Func::Ln,
            "log10" => Func::Log10,
            "log2" => Func::Log2,
            "sqrt" => Func::Sqrt,
            "abs" => Func::Abs,
            "floor" => Func::Floor,
            "ceil" => Func::Ceil,
            "round" => Func::Round,
            "sign" => Func::Sign,
            "pow" => Func::Pow,
            "min" => Func::Min,
            "max" => Func::Max,
            "mod" => Func::Mod,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Asin => "asin",
            Func::Acos => "acos",
            Func::Atan => "atan",
            Func::Sinh => "sinh",
            Func::Cosh => "cosh",
            Func::Tanh => "tanh",
            Func::Exp => "exp",
            Func::Ln => "log",
            Func::Log10 => "log10",
            Func::Log2 => "log2",
            Func::Sqrt => "sqrt",
            Func::Abs => "abs",
            Func::Floor => "floor",
            Func::Ceil => "ceil",
            Func::Round => "round",
            Func::Sign => "sign",
            Func::Pow => "pow",
            Func::Min => "min",
            Func::Max => "max",
            Func::Mod => "mod",
        }
    }

    fn arity(self) -> usize {
        match self {
            Func::Pow | Func::Min | Func::Max | Func::Mod => 2,
            _ => 1,
        }
    }

    fn apply(self, args: &[f64]) -> f64 {
        let a = args[0];
        match self {
            Func::Sin => a.sin(),
            Func::Cos => a.cos(),
            Func::Tan => a.tan(),
            Func::Asin => a.asin(),
            Func::Acos => a.acos(),
            Func::Atan => a.atan(),
            Func::Sinh => a.sinh(),
            Func::Cosh => a.cosh(),
            Func::Tanh => a.tanh(),
            Func::Exp => a.exp(),
            Func::Ln => a.ln(),
            Func::Log10 => a.log10(),
            Func::Log2 => a.log2(),
            Func::Sqrt => a.sqrt(),
            Func::Abs => a.abs(),
            Func::Floor => a.floor(),
            Func::Ceil => a.ceil(),
            Func::Round => a.round(),
            Func::Sign => {
                if a == 0.0 {
                    0.0
                } else {
                    a.signum()
                }
            }
            Func::Pow => a.powf(args[1]),
            Func::Min => a.min(args[1]),
            Func::Max => a.max(args[1]),
            Func::Mod => a % args[1],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Node {
    Num(f64),
    Var,
    Neg(Box<Node>),
    Bin(char, Box<Node>, Box<Node>),
    Call(Func, Vec<Node>),
}

/// A parsed expression, ready to evaluate at many `x`.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    root: Node,
}

impl Expr {
    pub fn parse(src: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(src)?;
        if tokens.len() > MAX_TOKENS {
            return Err(ExprError::TooLong);
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let root = parser.sum()?;
        match parser.peek() {
            None => Ok(Self { root }),
            Some(t) => Err(ExprError::UnexpectedToken(t.to_string())),
        }
    }

    /// Evaluates at `x`. Non-finite results (domain errors, division by zero) are errors.
    pub fn eval(&self, x: f64) -> Result<f64, ExprError> {
        let y = eval_node(&self.root, x);
        if y.is_finite() {
            Ok(y)
        } else {
            Err(ExprError::NonFinite)
        }
    }
}

fn eval_node(node: &Node, x: f64) -> f64 {
    match node {
        Node::Num(n) => *n,
        Node::Var => x,
        Node::Neg(inner) => -eval_node(inner, x),
        Node::Bin(op, a, b) => {
            let (a, b) = (eval_node(a, x), eval_node(b, x));
            match op {
                '+' => a + b,
                '-' => a - b,
                '*' => a * b,
                '/' => a / b,
                _ => a.powf(b),
            }
        }
        Node::Call(func, args) => {
            let values: Vec<f64> = args.iter().map(|a| eval_node(a, x)).collect();
            func.apply(&values)
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ExprError>,
    ) -> Result<T, ExprError> {
        if self.depth >= MAX_DEPTH {
            return Err(ExprError::TooDeep);
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn eat_op(&mut self, ops: &[char]) -> Option<char> {
        match self.peek() {
            Some(Token::Op(c)) if ops.contains(c) => {
                let c = *c;
                self.pos += 1;
                Some(c)
            }
            _ => None,
        }
    }

    fn starts_operand(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Num(_) | Token::Ident(_) | Token::Open(_))
        )
    }

    fn sum(&mut self) -> Result<Node, ExprError> {
        let mut lhs = self.product()?;
        while let Some(op) = self.eat_op(&['+', '-']) {
            let rhs = self.product()?;
            lhs = Node::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn product(&mut self) -> Result<Node, ExprError> {
        let mut lhs = self.unary()?;
        loop {
            if let Some(op) = self.eat_op(&['*', '/']) {
                let rhs = self.unary()?;
                lhs = Node::Bin(op, Box::new(lhs), Box::new(rhs));
            } else if self.starts_operand() {
                // Implicit multiplication: `2x`, `3(x+1)`.
                let rhs = self.power()?;
                lhs = Node::Bin('*', Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn unary(&mut self) -> Result<Node, ExprError> {
        match self.eat_op(&['-', '+']) {
            Some('-') => Ok(Node::Neg(Box::new(self.nested(Self::unary)?))),
            Some(_) => self.nested(Self::unary),
            None => self.power(),
        }
    }

    /// Right associative, and the exponent may carry a sign: `2^-x`.
    fn power(&mut self) -> Result<Node, ExprError> {
        let base = self.primary()?;
        if self.eat_op(&['^']).is_some() {
            let exponent = self.nested(Self::unary)?;
            return Ok(Node::Bin('^', Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Node, ExprError> {
        match self.next() {
            Some(Token::Num(n)) => Ok(Node::Num(n)),
            Some(Token::Open(open)) => self.nested(|p| {
                let inner = p.sum()?;
                p.close(open)?;
                Ok(inner)
            }),
            Some(Token::Ident(name)) => self.ident(name),
            Some(t) => Err(ExprError::UnexpectedToken(t.to_string())),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn close(&mut self, open: char) -> Result<(), ExprError> {
        let expected = if open == '(' { ')' } else { '}' };
        match self.next() {
            Some(Token::Close(c)) if c == expected => Ok(()),
            Some(t) => Err(ExprError::UnexpectedToken(t.to_string())),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn ident(&mut self, name: String) -> Result<Node, ExprError> {
        match name.as_str() {
            "x" => return Ok(Node::Var),
            "pi" => return Ok(Node::Num(std::f64::consts::PI)),
            "e" => return Ok(Node::Num(std::f64::consts::E)),
            _ => {}
        }
        let func = Func::lookup(&name).ok_or(ExprError::UnknownIdent(name))?;
        let open = match self.next() {
            Some(Token::Open(c)) => c,
            Some(t) => return Err(ExprError::UnexpectedToken(t.to_string())),
            None => return Err(ExprError::UnexpectedEnd),
        };
        let args = self.nested(|p| {
            let mut args = vec![p.sum()?];
            while matches!(p.peek(), Some(Token::Comma)) {
                p.pos += 1;
                args.push(p.sum()?);
            }
            p.close(open)?;
            Ok(args)
        })?;
        if args.len() != func.arity() {
            return Err(ExprError::Arity {
                name: func.name(),
                expected: func.arity(),
                got: args.len(),
            });
        }
        Ok(Node::Call(func, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str, x: f64) -> f64 {
        Expr::parse(src).unwrap().eval(x).unwrap()
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(eval("1 + 2 * 3", 0.0), 7.0);
        assert_eq!(eval("2^3^2", 0.0), 512.0);
        assert_eq!(eval("-x^2", 3.0), -9.0);
        assert_eq!(eval("2^-1", 0.0), 0.5);
        assert_eq!(eval("(1 + 2) * 3", 0.0), 9.0);
        assert_eq!(eval("{1 + 2} * 3", 0.0), 9.0);
        assert_eq!(eval("10 - 4 - 3", 0.0), 3.0);
    }

    #[test]
    fn implicit_multiplication() {
        assert_eq!(eval("2x", 4.0), 8.0);
        assert_eq!(eval("3(x+1)", 1.0), 6.0);
        assert_eq!(eval("2x^2", 3.0), 18.0);
    }

    #[test]
    fn functions_and_constants() {
        assert!((eval("sin(pi/2)", 0.0) - 1.0).abs() < 1e-12);
        assert!((eval("log(e)", 0.0) - 1.0).abs() < 1e-12);
        assert_eq!(eval("max(x, 2)", 5.0), 5.0);
        assert_eq!(eval("sqrt(16)", 0.0), 4.0);
        assert_eq!(eval("1.5e2", 0.0), 150.0);
        assert!((eval("2e", 0.0) - 2.0 * std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    fn domain_errors_are_reported() {
        let sqrt = Expr::parse("sqrt(x)").unwrap();
        assert_eq!(sqrt.eval(-1.0), Err(ExprError::NonFinite));
        let inv = Expr::parse("1/x").unwrap();
        assert_eq!(inv.eval(0.0), Err(ExprError::NonFinite));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(Expr::parse("1 +"), Err(ExprError::UnexpectedEnd));
        assert_eq!(
            Expr::parse("foo(x)"),
            Err(ExprError::UnknownIdent("foo".to_string()))
        );
        assert!(matches!(
            Expr::parse("x $ 2"),
            Err(ExprError::UnexpectedChar('$', 2))
        ));
        assert!(matches!(
            Expr::parse("pow(x)"),
            Err(ExprError::Arity { name: "pow", .. })
        ));
        assert!(Expr::parse("(x").is_err());
        assert!(Expr::parse("(x}").is_err());
        assert!(Expr::parse("x)").is_err());
    }

    #[test]
    fn nesting_is_capped() {
        let deep = format!("{}x{}", "(".repeat(100_000), ")".repeat(100_000));
        assert_eq!(Expr::parse(&deep), Err(ExprError::TooLong));
        let deep = format!("{}x{}", "(".repeat(300), ")".repeat(300));
        assert_eq!(Expr::parse(&deep), Err(ExprError::TooDeep));
        let signs = format!("{}x", "-".repeat(300));
        assert_eq!(Expr::parse(&signs), Err(ExprError::TooDeep));
        let powers = format!("{}2", "2^".repeat(300));
        assert_eq!(Expr::parse(&powers), Err(ExprError::TooDeep));
        let calls = format!("{}x{}", "sin(".repeat(300), ")".repeat(300));
        assert_eq!(Expr::parse(&calls), Err(ExprError::TooDeep));

        let fine = format!("{}x{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(eval(&fine, 3.0), 3.0);
    }

    #[test]
    fn long_chains_are_capped() {
        let chain = vec!["x"; 3000].join("+");
        assert_eq!(Expr::parse(&chain), Err(ExprError::TooLong));
        let chain = vec!["x"; 2000].join("+");
        assert_eq!(eval(&chain, 1.0), 2000.0);
    }
}
