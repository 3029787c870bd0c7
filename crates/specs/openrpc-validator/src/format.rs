//! Pluggable `format` checks.
//!
//! Draft-07 treats an unknown format as valid, so an empty registry turns
//! `format` into a pure annotation. Callers opt into checking by
//! registering a [`FormatCheck`] under the format's name.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A semantic check for one `format` name.
pub trait FormatCheck: Send + Sync {
    /// `Err` carries the message reported for the failing value.
    fn check(&self, value: &Value) -> Result<(), String>;
}

impl<F> FormatCheck for F
where
    F: Fn(&Value) -> Result<(), String> + Send + Sync,
{
    fn check(&self, value: &Value) -> Result<(), String> {
        self(value)
    }
}

#[derive(Clone, Default)]
pub struct FormatRegistry {
    checks: HashMap<String, Arc<dyn FormatCheck>>,
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.checks.keys().collect();
        names.sort();
        f.debug_struct("FormatRegistry")
            .field("formats", &names)
            .finish()
    }
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `email`, `uri` and `regex` checks.
    pub fn with_builtin() -> Self {
        Self::new()
            .with("email", string_check(validate_email))
            .with("uri", string_check(validate_uri))
            .with("regex", string_check(validate_regex))
    }

    pub fn register(&mut self, name: impl Into<String>, check: impl FormatCheck + 'static) {
        self.checks.insert(name.into(), Arc::new(check));
    }

    pub fn with(mut self, name: impl Into<String>, check: impl FormatCheck + 'static) -> Self {
        self.register(name, check);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.checks.contains_key(name)
    }

    /// Run the check for `name`; unregistered formats pass.
    pub fn check(&self, name: &str, value: &Value) -> Result<(), String> {
        match self.checks.get(name) {
            Some(check) => check.check(value),
            None => Ok(()),
        }
    }
}

/// Adapt a string check so that non-string values pass.
fn string_check(
    check: fn(&str) -> Result<(), String>,
) -> impl Fn(&Value) -> Result<(), String> + Send + Sync {
    move |value: &Value| match value {
        Value::String(text) => check(text),
        _ => Ok(()),
    }
}

pub fn validate_email(email: &str) -> Result<(), String> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(format!("`{}` is not an email address", email));
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(format!("`{}` is not an email address", email));
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(format!("`{}` has an invalid email domain", email));
    }
    Ok(())
}

pub fn validate_uri(uri: &str) -> Result<(), String> {
    url::Url::parse(uri)
        .map(|_| ())
        .map_err(|err| format!("`{}` is not an absolute URI: {}", uri, err))
}

pub fn validate_regex(pattern: &str) -> Result<(), String> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|err| format!("`{}` is not a valid regular expression: {}", pattern, err))
}
