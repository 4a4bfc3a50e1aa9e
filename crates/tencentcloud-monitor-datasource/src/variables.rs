/*! Template variable handling for dimension values.

Dimension values may reference dashboard template variables, e.g. `$instance`.
[`resolve_variables`] decides which values need substituting and delegates the
substitution itself to a [`TemplateSrv`].
*/
use std::{collections::HashMap, sync::LazyLock};

use regex::{Captures, Regex};

use crate::model::MonitorQuery;

/// Matches `$name`, `${name}`, `${name:format}` and `[[name]]`.
static VARIABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(\w+)|\$\{(\w+)(?::[^}]*)?\}|\[\[(\w+)\]\]").expect("valid regex")
});

/// Returns `true` if `value` is a template variable reference, i.e. starts with `$`.
///
/// This is purely syntactic: the referenced variable need not exist.
pub fn has_variable(value: &str) -> bool {
    value.starts_with('$')
}

/// Something that can substitute template variables in a string.
pub trait TemplateSrv {
    /// Return `raw` with any variable references replaced.
    fn replace(&self, raw: &str) -> String;
}

impl<F> TemplateSrv for F
where
    F: Fn(&str) -> String,
{
    fn replace(&self, raw: &str) -> String {
        self(raw)
    }
}

/// A [`TemplateSrv`] backed by a fixed table of variable values.
///
/// References to unknown variables are left as they are.
#[derive(Clone, Debug, Default)]
pub struct VariableMap {
    values: HashMap<String, String>,
}

impl VariableMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value of `name`, which is given without the leading `$`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style variant of [`VariableMap::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }
}

impl TemplateSrv for VariableMap {
    fn replace(&self, raw: &str) -> String {
        VARIABLE_RE
            .replace_all(raw, |caps: &Captures<'_>| {
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .map_or("", |m| m.as_str());
                self.values
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Substitute every dimension value of every query that references a variable.
///
/// Values are updated in place and each one is visited exactly once; a
/// substituted value that is itself a reference is not substituted again.
/// Values that are not references are left untouched.
pub fn resolve_variables<'a, I, T>(queries: I, template_srv: &T)
where
    I: IntoIterator<Item = &'a mut MonitorQuery>,
    T: TemplateSrv + ?Sized,
{
    for query in queries {
        for dimension in &mut query.dimensions {
            if has_variable(&dimension.value) {
                dimension.value = template_srv.replace(&dimension.value);
            }
        }
    }
}
