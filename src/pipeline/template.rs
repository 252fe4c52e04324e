//! `{name}` placeholder substitution for task descriptions.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Names referenced by a template, in first-appearance order, deduplicated.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for caps in PLACEHOLDER_RE.captures_iter(template) {
        if let Some(name) = caps.get(1).map(|m| m.as_str()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// A rendered template plus the placeholders that had no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub missing: Vec<String>,
}

/// Substitute `{name}` placeholders from `values`.
///
/// Unknown names are left verbatim and reported in `missing`.
pub fn render(template: &str, values: &BTreeMap<String, String>) -> Rendered {
    let mut missing: Vec<String> = Vec::new();
    let text = PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            match values.get(name) {
                Some(value) => value.clone(),
                None => {
                    if !missing.iter().any(|m| m == name) {
                        missing.push(name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        })
        .into_owned();
    Rendered { text, missing }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn lists_placeholders_once_in_order() {
        assert_eq!(
            placeholders("A {symptoms} B {demographics} C {symptoms}"),
            vec!["symptoms", "demographics"]
        );
        assert!(placeholders("no braces { here }").is_empty());
    }

    #[test]
    fn substitutes_known_values() {
        let rendered = render(
            "Patient Symptoms: {symptoms}\nDemographics: {demographics}",
            &values(&[("symptoms", "fever, cough"), ("demographics", "34F")]),
        );
        assert_eq!(rendered.text, "Patient Symptoms: fever, cough\nDemographics: 34F");
        assert!(rendered.missing.is_empty());
    }

    #[test]
    fn leaves_unknown_placeholders_verbatim() {
        let rendered = render("{history} / {medications} / {history}", &values(&[("history", "asthma")]));
        assert_eq!(rendered.text, "asthma / {medications} / asthma");
        assert_eq!(rendered.missing, vec!["medications".to_string()]);
    }

    #[test]
    fn values_are_not_rescanned() {
        let rendered = render("{a}", &values(&[("a", "{b}")]));
        assert_eq!(rendered.text, "{b}");
        assert!(rendered.missing.is_empty());
    }
}
