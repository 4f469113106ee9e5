//! Calculator tool - safe arithmetic evaluation
//!
//! Expressions are parsed by a small recursive-descent evaluator; nothing is
//! ever handed to a shell or interpreter.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/' | '//' | '%') unary)*
//! unary  := ('-' | '+') unary | power
//! power  := atom (('^' | '**') unary)?
//! atom   := number | name | name '(' expr (',' expr)* ')' | '(' expr ')'
//! ```

use crate::error::{Error, Result};
use crate::registry::{
    str_arg, ParamKind, ParamSpec, RiskLevel, Tool, ToolCategory, ToolOutput, ToolSpec, Trigger,
};

/// Bare arithmetic such as `2 + 2`, `(3 + 4) * 2` or `2 ** 10`
const ARITHMETIC_PATTERN: &str =
    r"^[\d\s.()]*\d[\d\s.()]*(?:(?:\*\*|//|[-+*/%^])[\d\s.()]*\d[\d\s.()]*)+$";

/// Calculator tool
pub struct CalculatorTool {
    spec: ToolSpec,
}

impl CalculatorTool {
    /// Create a new calculator tool
    #[must_use]
    pub fn new() -> Self {
        let spec = ToolSpec::new(
            "calculator",
            "Evaluate a mathematical expression (e.g. '2 + 2', 'sqrt(9)')",
        )
        .with_usage("calc <expression>, e.g. calc sqrt(16) + 2^3")
        .with_category(ToolCategory::Math)
        .with_risk_level(RiskLevel::Low)
        .with_param(ParamSpec::required("expression", ParamKind::String))
        .with_trigger(Trigger::prefix("calculate"))
        .with_trigger(Trigger::prefix("calc"))
        .with_trigger(Trigger::prefix("="))
        .with_trigger(Trigger::pattern(ARITHMETIC_PATTERN));

        Self { spec }
    }
}

impl Default for CalculatorTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for CalculatorTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput> {
        let expression = str_arg(&input, "expression")?;
        let value = evaluate(expression)?;
        let formatted = format_number(value);

        Ok(ToolOutput::text(formatted.clone()).with_data(serde_json::json!({
            "expression": expression,
            "result": value,
            "formatted": formatted,
        })))
    }
}

/// Evaluate an arithmetic expression
pub fn evaluate(expression: &str) -> Result<f64> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(Error::InvalidInput("empty expression".to_string()));
    }

    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if let Some(tok) = parser.peek() {
        return Err(Error::InvalidInput(format!("unexpected '{}'", tok)));
    }
    if !value.is_finite() {
        return Err(Error::InvalidInput("result is not a finite number".to_string()));
    }
    Ok(value)
}

/// Whole numbers print without a fractional part
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Num(n) => write!(f, "{}", n),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Op(op) => write!(f, "{}", op),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| Error::InvalidInput(format!("bad number '{}'", text)))?;
                tokens.push(Token::Num(n));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Op("**"));
                i += 2;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                tokens.push(Token::Op("//"));
                i += 2;
            }
            '+' | '-' | '*' | '/' | '%' | '^' => {
                tokens.push(Token::Op(match c {
                    '+' => "+",
                    '-' => "-",
                    '*' => "*",
                    '/' => "/",
                    '%' => "%",
                    _ => "^",
                }));
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            other => {
                return Err(Error::InvalidInput(format!(
                    "unsupported character '{}'",
                    other
                )))
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn eat_op(&mut self, ops: &[&'static str]) -> Option<&'static str> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(tok) if tok == expected => Ok(()),
            Some(tok) => Err(Error::InvalidInput(format!(
                "expected '{}', found '{}'",
                expected, tok
            ))),
            None => Err(Error::InvalidInput(format!(
                "expected '{}' at end of expression",
                expected
            ))),
        }
    }

    fn expr(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        while let Some(op) = self.eat_op(&["+", "-"]) {
            let rhs = self.term()?;
            value = if op == "+" { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64> {
        let mut value = self.unary()?;
        while let Some(op) = self.eat_op(&["*", "/", "//", "%"]) {
            let rhs = self.unary()?;
            if op != "*" && rhs == 0.0 {
                return Err(Error::InvalidInput("division by zero".to_string()));
            }
            value = match op {
                "*" => value * rhs,
                "/" => value / rhs,
                "//" => (value / rhs).floor(),
                // floored modulo: result takes the sign of the divisor
                _ => value - rhs * (value / rhs).floor(),
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64> {
        match self.eat_op(&["-", "+"]) {
            Some("-") => Ok(-self.unary()?),
            Some(_) => self.unary(),
            None => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64> {
        let base = self.atom()?;
        if self.eat_op(&["^", "**"]).is_some() {
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let mut args = vec![self.expr()?];
                    while self.peek() == Some(&Token::Comma) {
                        self.pos += 1;
                        args.push(self.expr()?);
                    }
                    self.expect(Token::RParen)?;
                    call(&name, &args)
                } else {
                    constant(&name)
                }
            }
            Some(tok) => Err(Error::InvalidInput(format!("unexpected '{}'", tok))),
            None => Err(Error::InvalidInput("unexpected end of expression".to_string())),
        }
    }
}

fn constant(name: &str) -> Result<f64> {
    match name.to_ascii_lowercase().as_str() {
        "pi" => Ok(std::f64::consts::PI),
        "e" => Ok(std::f64::consts::E),
        other => Err(Error::InvalidInput(format!("unknown name '{}'", other))),
    }
}

fn call(name: &str, args: &[f64]) -> Result<f64> {
    let name = name.to_ascii_lowercase();
    let arity = |n: usize| -> Result<()> {
        if args.len() == n {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "{}() takes {} argument(s), got {}",
                name,
                n,
                args.len()
            )))
        }
    };

    let x = args[0];
    let value = match name.as_str() {
        "abs" => {
            arity(1)?;
            x.abs()
        }
        "sqrt" => {
            arity(1)?;
            if x < 0.0 {
                return Err(Error::InvalidInput("math domain error".to_string()));
            }
            x.sqrt()
        }
        "sin" => {
            arity(1)?;
            x.sin()
        }
        "cos" => {
            arity(1)?;
            x.cos()
        }
        "tan" => {
            arity(1)?;
            x.tan()
        }
        "ceil" => {
            arity(1)?;
            x.ceil()
        }
        "floor" => {
            arity(1)?;
            x.floor()
        }
        "log10" => {
            arity(1)?;
            if x <= 0.0 {
                return Err(Error::InvalidInput("math domain error".to_string()));
            }
            x.log10()
        }
        "log" => {
            if x <= 0.0 {
                return Err(Error::InvalidInput("math domain error".to_string()));
            }
            match args {
                [_] => x.ln(),
                [_, base] if *base > 0.0 && *base != 1.0 => x.log(*base),
                [_, _] => return Err(Error::InvalidInput("math domain error".to_string())),
                _ => {
                    return Err(Error::InvalidInput(
                        "log() takes 1 or 2 arguments".to_string(),
                    ))
                }
            }
        }
        "round" => match args {
            [_] => round_half_even(x),
            [_, digits] => {
                let factor = 10f64.powi(*digits as i32);
                round_half_even(x * factor) / factor
            }
            _ => {
                return Err(Error::InvalidInput(
                    "round() takes 1 or 2 arguments".to_string(),
                ))
            }
        },
        other => return Err(Error::InvalidInput(format!("unknown function '{}'", other))),
    };
    Ok(value)
}

/// Banker's rounding, so `round(2.5)` is 2 and `round(3.5)` is 4
fn round_half_even(x: f64) -> f64 {
    let r = x.round();
    if (x - x.trunc()).abs() == 0.5 && r % 2.0 != 0.0 {
        r - x.signum()
    } else {
        r
    }
}
