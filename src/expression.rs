//! Template evaluation
//!
//! Some configuration values (CDN URLs, the version string, the CDN disable flag) may be
//! templates that the host evaluates per request. The engine only sees the
//! [`ExpressionEvaluator`] trait; [`VariableEvaluator`] is a small stand-in that substitutes
//! `#{name}` placeholders from a map.

use std::collections::HashMap;

const OPEN: &str = "#{";
const CLOSE: char = '}';

/// Host-provided evaluation of configuration templates
pub trait ExpressionEvaluator: Send + Sync {
    fn evaluate(&self, template: &str) -> String;
}

/// Whether a value needs evaluation at all
pub fn is_template(value: &str) -> bool {
    value.contains(OPEN)
}

/// Evaluator that returns every template unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEvaluation;

impl ExpressionEvaluator for NoEvaluation {
    fn evaluate(&self, template: &str) -> String {
        template.to_string()
    }
}

/// Substitutes `#{name}` placeholders from a fixed set of variables
///
/// Unknown variables evaluate to an empty string. An unterminated placeholder is kept as
/// literal text.
#[derive(Debug, Clone, Default)]
pub struct VariableEvaluator {
    variables: HashMap<String, String>,
}

impl VariableEvaluator {
    pub fn new(variables: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            variables: variables.into_iter().collect(),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }
}

impl ExpressionEvaluator for VariableEvaluator {
    fn evaluate(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find(OPEN) {
            out.push_str(&rest[..start]);
            let after = &rest[start + OPEN.len()..];
            let Some(end) = after.find(CLOSE) else {
                out.push_str(&rest[start..]);
                return out;
            };

            let name = after[..end].trim();
            match self.variables.get(name) {
                Some(value) => out.push_str(value),
                None => tracing::debug!(variable = name, "undefined template variable"),
            }
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator(pairs: &[(&str, &str)]) -> VariableEvaluator {
        VariableEvaluator::new(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
        )
    }

    #[test]
    fn test_substitutes_variables() {
        let eval = evaluator(&[("host", "cdn.example"), ("ver", "3")]);
        assert_eq!(
            eval.evaluate("https://#{host}/v#{ ver }/*"),
            "https://cdn.example/v3/*"
        );
    }

    #[test]
    fn test_unknown_variable_is_empty() {
        let eval = evaluator(&[]);
        assert_eq!(eval.evaluate("a#{missing}b"), "ab");
    }

    #[test]
    fn test_unterminated_placeholder_is_literal() {
        let eval = evaluator(&[("x", "1")]);
        assert_eq!(eval.evaluate("#{x}-#{x"), "1-#{x");
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        assert_eq!(evaluator(&[]).evaluate("1.4.2"), "1.4.2");
        assert_eq!(NoEvaluation.evaluate("#{x}"), "#{x}");
        assert!(is_template("#{x}"));
        assert!(!is_template("1.4.2"));
    }
}
