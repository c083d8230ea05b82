use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static BINARY_EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+\.?\d*)\s*([+\-*/])\s*(\d+\.?\d*)").expect("binary expression pattern is valid")
});

pub const DIVIDE_BY_ZERO: &str = "Cannot divide by zero.";

/// Result of looking for an arithmetic expression in free text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MathOutcome {
    Value(f64),
    DivideByZero,
    /// Nothing recognisable was found; the caller should ask the model instead.
    NoMatch,
}

impl MathOutcome {
    /// The user-facing answer, or `None` when the text held no expression.
    pub fn answer(&self) -> Option<String> {
        match self {
            MathOutcome::NoMatch => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for MathOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathOutcome::Value(value) => write!(f, "{}", format_number(*value)),
            MathOutcome::DivideByZero => write!(f, "{}", DIVIDE_BY_ZERO),
            MathOutcome::NoMatch => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Operator::Add),
            "-" => Some(Operator::Subtract),
            "*" => Some(Operator::Multiply),
            "/" => Some(Operator::Divide),
            _ => None,
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> MathOutcome {
        let result = match self {
            Operator::Add => lhs + rhs,
            Operator::Subtract => lhs - rhs,
            Operator::Multiply => lhs * rhs,
            Operator::Divide => {
                if rhs == 0.0 {
                    return MathOutcome::DivideByZero;
                }
                lhs / rhs
            }
        };

        if result.is_finite() {
            MathOutcome::Value(result)
        } else {
            MathOutcome::NoMatch
        }
    }
}

/// Evaluates the first `<number> <op> <number>` found in a message.
#[derive(Debug, Default, Clone, Copy)]
pub struct Calculator;

impl Calculator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, text: &str) -> MathOutcome {
        let Some(caps) = BINARY_EXPRESSION.captures(text) else {
            return MathOutcome::NoMatch;
        };

        let lhs = caps[1].parse::<f64>();
        let op = Operator::parse(&caps[2]);
        let rhs = caps[3].parse::<f64>();

        match (lhs, op, rhs) {
            (Ok(lhs), Some(op), Ok(rhs)) => op.apply(lhs, rhs),
            _ => MathOutcome::NoMatch,
        }
    }
}

/// Whole numbers print without a decimal point, everything else is rounded
/// to two places. A fraction that rounds to a whole number keeps one
/// decimal (`2.999` prints as `3.0`).
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        return format!("{:.0}", value);
    }
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        return format!("{:.1}", rounded);
    }
    format!("{}", rounded)
}
