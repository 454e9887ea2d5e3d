//! `{name}` placeholders in argument and stdin templates.

use std::{collections::BTreeMap, sync::LazyLock};

use regex::{Captures, Regex};

use super::SweepError;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").expect("valid regex"));

/// The placeholder names used in `template`, in order of appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Replace every `{name}` in `template` with `parameters[name]`.
pub fn render(template: &str, parameters: &BTreeMap<String, String>) -> Result<String, SweepError> {
    let mut unknown = None;
    let rendered = PLACEHOLDER.replace_all(template, |c: &Captures| {
        let name = &c[1];
        match parameters.get(name) {
            Some(value) => value.clone(),
            None => {
                unknown.get_or_insert_with(|| name.to_owned());
                String::new()
            }
        }
    });
    if let Some(name) = unknown {
        return Err(SweepError::InvalidDefinition(format!(
            "unknown placeholder {{{name}}} in template {template:?}"
        )));
    }
    Ok(rendered.into_owned())
}
