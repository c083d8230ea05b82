use tracing::debug;

pub const GREETING_REPLY: &str = "Hello! How can I help you today?";

const SIMPLE_GREETINGS: [&str; 6] = ["hi", "hello", "hey", "sup", "yo", "greetings"];

const MATH_INDICATORS: [&str; 8] = ["+", "-", "*", "/", "plus", "minus", "times", "divided"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Exact greeting, answered without the model.
    Greeting,
    /// Looks arithmetic; try the calculator before the model.
    Math,
    General,
}

pub fn is_simple_greeting(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    SIMPLE_GREETINGS.contains(&normalized.as_str())
}

pub fn is_math_question(text: &str) -> bool {
    let lower = text.to_lowercase();
    MATH_INDICATORS.iter().any(|indicator| lower.contains(indicator))
}

pub fn classify(text: &str) -> QueryKind {
    let kind = if is_simple_greeting(text) {
        QueryKind::Greeting
    } else if is_math_question(text) {
        QueryKind::Math
    } else {
        QueryKind::General
    };
    debug!("Classified input as {:?}", kind);
    kind
}

/// Builds the instruction prompt for the general path.
pub fn build_prompt(context: &str, user_input: &str) -> String {
    if context.is_empty() {
        format!("Answer: {}", user_input)
    } else {
        format!("Based on this conversation:\n{}\n\nAnswer this: {}", context, user_input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greetings_tolerate_surrounding_whitespace() {
        assert!(is_simple_greeting("  YO "));
        assert!(!is_simple_greeting("hiya"));
    }

    #[test]
    fn word_indicators_are_case_insensitive() {
        assert!(is_math_question("What is 3 TIMES 4"));
        assert!(is_math_question("ten divided by two"));
        assert!(!is_math_question("what is the capital of France?"));
    }

    #[test]
    fn greeting_wins_over_math() {
        assert_eq!(classify("hey"), QueryKind::Greeting);
        assert_eq!(classify("1+1"), QueryKind::Math);
        assert_eq!(classify("hello world"), QueryKind::General);
    }
}
