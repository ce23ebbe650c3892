//! Arithmetic calculator tool.
//!
//! Supports `+ - * / %`, exponentiation with `**` or `^`, parentheses, unary
//! signs and decimal literals. `%` is floored modulo, exponentiation binds
//! tighter than unary minus and associates to the right.

use crate::builtins::utils::{parse_args, schema_value};
use crate::{Tool, ToolContext};
use aibot_rs_protocol::ToolError;
use async_trait::async_trait;
use autoagents_core::tool::ToolInputT;
use autoagents_derive::ToolInput;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Serialize, Deserialize, ToolInput)]
struct CalculatorArgs {
    #[input(description = "Arithmetic expression, or a sentence containing one.")]
    expression: String,
}

/// Evaluates the arithmetic expression found in its input.
#[derive(Debug, Default)]
pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "Calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression"
    }

    fn args_schema(&self) -> Value {
        schema_value(CalculatorArgs::io_schema())
    }

    async fn call(&self, _ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
        let input: CalculatorArgs = parse_args(args)?;
        let expression = extract_expression(&input.expression).ok_or_else(|| {
            ToolError::InvalidArguments("no arithmetic expression found".to_string())
        })?;
        let value = evaluate(&expression)?;
        debug!("evaluated expression (len={})", expression.len());
        Ok(json!({
            "expression": expression,
            "value": value,
            "result": format_number(value),
        }))
    }
}

/// Longest run of arithmetic characters in `text` that contains a digit.
pub fn extract_expression(text: &str) -> Option<String> {
    let is_arith = |c: char| c.is_ascii_digit() || "+-*/%^().".contains(c) || c == ' ';
    let mut best: Option<&str> = None;
    let mut start = None;
    for (idx, c) in text.char_indices().chain(std::iter::once((text.len(), '\0'))) {
        if c != '\0' && is_arith(c) {
            start.get_or_insert(idx);
            continue;
        }
        if let Some(from) = start.take() {
            let candidate = text[from..idx].trim();
            let candidate = candidate.trim_end_matches(['.', ' ']);
            if candidate.chars().any(|c| c.is_ascii_digit())
                && best.is_none_or(|current| candidate.len() > current.len())
            {
                best = Some(candidate);
            }
        }
    }
    best.map(str::to_string)
}

/// Render a result the way a person would write it: integral values without a
/// fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Evaluate an arithmetic expression.
pub fn evaluate(expression: &str) -> Result<f64, ToolError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(ToolError::InvalidArguments("empty expression".to_string()));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(ToolError::InvalidArguments(format!(
            "unexpected token {token:?}"
        )));
    }
    if !value.is_finite() {
        return Err(ToolError::ExecutionFailed(
            "result is not a finite number".to_string(),
        ));
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Pow,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ToolError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let token = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal.parse::<f64>().map_err(|_| {
                    ToolError::InvalidArguments(format!("invalid number {literal:?}"))
                })?;
                tokens.push(Token::Num(value));
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 1;
                Token::Pow
            }
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '^' => Token::Pow,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "unsupported character {other:?}"
                )));
            }
        };
        tokens.push(token);
        i += 1;
    }
    Ok(tokens)
}

/// Deepest nesting of parentheses, signs and exponents the parser accepts.
const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_DEPTH`].
    fn nested(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<f64, ToolError>,
    ) -> Result<f64, ToolError> {
        if self.depth >= MAX_DEPTH {
            return Err(ToolError::InvalidArguments(format!(
                "expression nests deeper than {MAX_DEPTH} levels"
            )));
        }
        self.depth += 1;
        let value = f(self);
        self.depth -= 1;
        value
    }

    fn expr(&mut self) -> Result<f64, ToolError> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ToolError> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash | Token::Percent)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match op {
                Token::Star => value * rhs,
                _ if rhs == 0.0 => {
                    return Err(ToolError::ExecutionFailed("division by zero".to_string()));
                }
                Token::Slash => value / rhs,
                _ => value - rhs * (value / rhs).floor(),
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, ToolError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.nested(Self::unary)?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.nested(Self::unary)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, ToolError> {
        let base = self.atom()?;
        if self.peek() == Some(Token::Pow) {
            self.pos += 1;
            let exponent = self.nested(Self::unary)?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, ToolError> {
        match self.next() {
            Some(Token::Num(value)) => Ok(value),
            Some(Token::LParen) => {
                let value = self.nested(Self::expr)?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(ToolError::InvalidArguments("missing ')'".to_string())),
                }
            }
            Some(token) => Err(ToolError::InvalidArguments(format!(
                "unexpected token {token:?}"
            ))),
            None => Err(ToolError::InvalidArguments(
                "unexpected end of expression".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn eval(expr: &str) -> f64 {
        evaluate(expr).expect("evaluate")
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(eval("2+2"), 4.0);
        assert_eq!(eval("2 + 3 * 4"), 14.0);
        assert_eq!(eval("(2 + 3) * 4"), 20.0);
        assert_eq!(eval("2 ** 3 ** 2"), 512.0);
        assert_eq!(eval("2^10"), 1024.0);
        assert_eq!(eval("-2 ** 2"), -4.0);
        assert_eq!(eval("2 ** -1"), 0.5);
        assert_eq!(eval("10 - 4 - 3"), 3.0);
        assert_eq!(eval("7 / 2"), 3.5);
        assert_eq!(eval("1.5 * 4"), 6.0);
    }

    #[test]
    fn modulo_is_floored() {
        assert_eq!(eval("7 % 3"), 1.0);
        assert_eq!(eval("-7 % 3"), 2.0);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(evaluate("1 / 0"), Err(ToolError::ExecutionFailed(_))));
        assert!(matches!(evaluate("5 % 0"), Err(ToolError::ExecutionFailed(_))));
        assert!(matches!(evaluate(""), Err(ToolError::InvalidArguments(_))));
        assert!(matches!(evaluate("2 +"), Err(ToolError::InvalidArguments(_))));
        assert!(matches!(evaluate("(1 + 2"), Err(ToolError::InvalidArguments(_))));
        assert!(matches!(evaluate("1..2"), Err(ToolError::InvalidArguments(_))));
        assert!(matches!(evaluate("2 x 3"), Err(ToolError::InvalidArguments(_))));
    }

    #[test]
    fn deep_nesting_is_rejected_not_fatal() {
        let parens = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert!(matches!(evaluate(&parens), Err(ToolError::InvalidArguments(_))));

        let signs = format!("{}1", "-".repeat(100_000));
        assert!(matches!(evaluate(&signs), Err(ToolError::InvalidArguments(_))));

        let powers = vec!["1"; 100_000].join("**");
        assert!(matches!(evaluate(&powers), Err(ToolError::InvalidArguments(_))));
    }

    #[test]
    fn moderate_nesting_still_evaluates() {
        let parens = format!("{}7{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(eval(&parens), 7.0);
        assert_eq!(eval(&format!("{}3", "-".repeat(100))), 3.0);
    }

    #[tokio::test]
    async fn deeply_nested_prompt_fails_the_call() {
        let ctx = ToolContext::for_root(".");
        let prompt = format!(
            "calculate {}1{}",
            "(".repeat(200_000),
            ")".repeat(200_000)
        );
        let err = CalculatorTool
            .call(&ctx, json!({ "expression": prompt }))
            .await
            .expect_err("too deep");
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn extracts_expression_from_prompt() {
        assert_eq!(
            extract_expression("please calculate 12 * (3 + 4) for me").as_deref(),
            Some("12 * (3 + 4)")
        );
        assert_eq!(extract_expression("math: 2^8.").as_deref(), Some("2^8"));
        assert_eq!(extract_expression("do some math"), None);
    }

    #[test]
    fn formats_integral_results_without_fraction() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(3.5), "3.5");
    }

    #[tokio::test]
    async fn tool_call_reports_result() {
        let ctx = ToolContext::for_root(".");
        let out = CalculatorTool
            .call(&ctx, json!({ "expression": "calculate 6 * 7" }))
            .await
            .expect("call");
        assert_eq!(out["result"], json!("42"));
        assert_eq!(out["expression"], json!("6 * 7"));
    }
}
