use localbot::tools::calculator::DIVIDE_BY_ZERO;
use localbot::tools::{Calculator, MathOutcome};

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(text: &str) -> Option<String> {
        Calculator::new().evaluate(text).answer()
    }

    #[test]
    fn test_basic_arithmetic() {
        assert_eq!(answer("2 + 2").as_deref(), Some("4"));
        assert_eq!(answer("10 - 15").as_deref(), Some("-5"));
        assert_eq!(answer("6*7").as_deref(), Some("42"));
        assert_eq!(answer("7 / 2").as_deref(), Some("3.5"));
        println!("✅ Basic arithmetic test passed");
    }

    #[test]
    fn test_rounding_to_two_places() {
        assert_eq!(answer("10 / 3").as_deref(), Some("3.33"));
        assert_eq!(answer("2.5 * 2").as_deref(), Some("5"));
        assert_eq!(answer("0.1 + 0.2").as_deref(), Some("0.3"));
    }

    #[test]
    fn test_fraction_rounding_to_whole_keeps_decimal() {
        assert_eq!(answer("2.999 + 0").as_deref(), Some("3.0"));
        assert_eq!(answer("0.001 + 0").as_deref(), Some("0.0"));
        assert_eq!(answer("0.001 - 0.002").as_deref(), Some("-0.0"));
        // Exact whole results still print bare.
        assert_eq!(answer("1.5 + 1.5").as_deref(), Some("3"));
    }

    #[test]
    fn test_divide_by_zero_is_an_answer() {
        let outcome = Calculator::new().evaluate("5 / 0");
        assert_eq!(outcome, MathOutcome::DivideByZero);
        assert_eq!(outcome.answer().as_deref(), Some(DIVIDE_BY_ZERO));
        assert_eq!(answer("what is 3.0 / 0.0?").as_deref(), Some("Cannot divide by zero."));
    }

    #[test]
    fn test_expression_inside_sentence() {
        assert_eq!(answer("Can you tell me what 12 * 12 is?").as_deref(), Some("144"));
    }

    #[test]
    fn test_only_first_expression_is_used() {
        assert_eq!(answer("1 + 2 and 3 * 4").as_deref(), Some("3"));
        assert_eq!(answer("1 + 2 + 3").as_deref(), Some("3"));
    }

    #[test]
    fn test_no_match() {
        let calc = Calculator::new();
        assert_eq!(calc.evaluate("hello there"), MathOutcome::NoMatch);
        assert_eq!(calc.evaluate("what is five plus six"), MathOutcome::NoMatch);
        assert_eq!(calc.evaluate("well-known"), MathOutcome::NoMatch);
        assert!(calc.evaluate("").answer().is_none());
    }
}
