//! Minimal placeholder templating for the pipeline document
//!
//! Placeholders are `{{ ... }}` with one of two forms:
//! - `{{ quote name }}`: the value as a YAML double-quoted scalar
//! - `{{ indent N name }}`: the value with every line after the first
//!   prefixed by N spaces, for use inside block scalars
//!
//! Unknown names and malformed placeholders are errors.

use crate::error::{CupError, CupResult};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("placeholder pattern is valid")
});

/// Substitute every placeholder in `template` from `values`
pub fn render(template: &str, values: &BTreeMap<&str, String>) -> CupResult<String> {
    let mut failure = None;

    let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        match expand(&caps[1], values) {
            Ok(text) => text,
            Err(e) => {
                failure.get_or_insert(e);
                String::new()
            }
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(rendered.into_owned()),
    }
}

/// Prefix every line after the first with `count` spaces
pub fn indent(count: usize, text: &str) -> String {
    let pad = format!("\n{}", " ".repeat(count));
    text.replace('\n', &pad)
}

fn expand(directive: &str, values: &BTreeMap<&str, String>) -> CupResult<String> {
    let words: Vec<&str> = directive.split_whitespace().collect();
    let lookup = |name: &str| {
        values
            .get(name)
            .ok_or_else(|| CupError::Template(format!("unknown parameter `{}`", name)))
    };

    match words.as_slice() {
        ["quote", name] => Ok(serde_json::to_string(lookup(name)?)?),
        ["indent", count, name] => {
            let count: usize = count.parse().map_err(|_| {
                CupError::Template(format!("invalid indent width `{}`", count))
            })?;
            Ok(indent(count, lookup(name)?))
        }
        _ => Err(CupError::Template(format!(
            "malformed placeholder `{{{{ {} }}}}`",
            directive
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&'static str, &str)]) -> BTreeMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn substitutes_quoted_values() {
        let v = values(&[("name", "myteam"), ("secret", r#"a"b\c"#)]);
        let out = render("x: {{ quote name }}\ny: {{quote secret}}", &v).unwrap();
        assert_eq!(out, "x: \"myteam\"\ny: \"a\\\"b\\\\c\"");
    }

    #[test]
    fn indent_prefixes_following_lines() {
        assert_eq!(indent(8, "line one\nline two"), "line one\n        line two");
        assert_eq!(indent(8, ""), "");
    }

    #[test]
    fn unknown_parameter_is_an_error() {
        let err = render("{{ quote missing }}", &values(&[])).unwrap_err();
        assert!(err.to_string().contains("unknown parameter `missing`"));
    }

    #[test]
    fn malformed_placeholder_is_an_error() {
        let v = values(&[("a", "1")]);
        assert!(render("{{ indent eight a }}", &v).is_err());
        assert!(render("{{ shout a }}", &v).is_err());
        assert!(render("{{ a }}", &v).is_err());
    }

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let text = "source: {interval: 730h}\n";
        assert_eq!(render(text, &values(&[])).unwrap(), text);
    }
}
