// Copyright 2025 Cowboy AI, LLC.

//! Field-keyed rule engine for raw input

use super::patterns::PatternKind;
use crate::errors::{DomainError, DomainResult};
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A keyed record of raw string input, in insertion order
pub type Record = IndexMap<String, String>;

/// A custom check over a raw value
pub type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// What a field must satisfy
#[derive(Clone)]
pub enum Rule {
    /// A named pattern
    Pattern {
        /// The pattern to match
        kind: PatternKind,
        /// For path kinds: also require the entry to exist on disk
        must_exist: bool,
    },
    /// A caller-supplied predicate, reported under `name` when it rejects
    Custom {
        /// Name used in failure messages
        name: String,
        /// Returns true for acceptable values
        predicate: Predicate,
    },
}

impl Rule {
    /// Match a named pattern
    pub fn pattern(kind: PatternKind) -> Self {
        Rule::Pattern {
            kind,
            must_exist: false,
        }
    }

    /// Match a path pattern and require the entry to exist
    pub fn existing(kind: PatternKind) -> Self {
        Rule::Pattern {
            kind,
            must_exist: true,
        }
    }

    /// Accept values for which `predicate` returns true
    pub fn custom<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Rule::Custom {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Name shown in failure messages
    pub fn name(&self) -> &str {
        match self {
            Rule::Pattern { kind, .. } => kind.name(),
            Rule::Custom { name, .. } => name,
        }
    }
}

impl From<PatternKind> for Rule {
    fn from(kind: PatternKind) -> Self {
        Rule::pattern(kind)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Pattern { kind, must_exist } => f
                .debug_struct("Pattern")
                .field("kind", kind)
                .field("must_exist", must_exist)
                .finish(),
            Rule::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish(),
        }
    }
}

/// Maps field names to rules and checks raw values against them
///
/// Fields without a rule pass through unchanged. Pattern expressions are
/// compiled when a rule is registered, once per pattern kind.
///
/// # Examples
///
/// ```rust
/// use cim_cli::validation::{PatternKind, PatternValidator, Record};
///
/// let mut validator = PatternValidator::new();
/// validator.add_validation("email", PatternKind::Email).unwrap();
///
/// let record: Record = [("email".to_string(), "a@b.com".to_string())].into_iter().collect();
/// assert_eq!(validator.validate_dict(&record).unwrap(), record);
///
/// let bad: Record = [("email".to_string(), "not-an-email".to_string())].into_iter().collect();
/// assert!(validator.validate_dict(&bad).unwrap_err().to_string().contains("email"));
/// ```
#[derive(Clone, Default)]
pub struct PatternValidator {
    rules: IndexMap<String, Rule>,
    required: IndexSet<String>,
    matchers: HashMap<PatternKind, Regex>,
}

impl PatternValidator {
    /// An empty validator that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a validator from `(field, pattern name)` pairs
    ///
    /// Unknown pattern names are rejected here rather than at validation time.
    pub fn from_named<'a>(
        rules: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> DomainResult<Self> {
        let mut validator = Self::new();
        for (field, pattern) in rules {
            validator.add_validation(field, pattern.parse::<PatternKind>()?)?;
        }
        Ok(validator)
    }

    /// Validator for web input: `email` and `url`
    pub fn web() -> DomainResult<Self> {
        Self::new()
            .with_rule("email", PatternKind::Email)?
            .with_rule("url", PatternKind::Url)
    }

    /// Validator for credentials: `username` and `password`
    pub fn security() -> DomainResult<Self> {
        Self::new()
            .with_rule("username", PatternKind::Username)?
            .with_rule("password", PatternKind::Password)
    }

    /// Register or replace the rule for a field
    pub fn add_validation(
        &mut self,
        field: impl Into<String>,
        rule: impl Into<Rule>,
    ) -> DomainResult<&mut Self> {
        let field = field.into();
        let rule = rule.into();
        if field.trim().is_empty() {
            return Err(DomainError::validation("field name cannot be empty"));
        }

        if let Rule::Pattern { kind, must_exist } = &rule {
            if *must_exist && !kind.is_path() {
                return Err(DomainError::validation(format!(
                    "existence checks apply to path, file and dir patterns, not '{kind}'"
                )));
            }
            if !self.matchers.contains_key(kind) {
                if let Some(re) = kind.compile()? {
                    self.matchers.insert(*kind, re);
                }
            }
        }

        debug!(field = %field, rule = rule.name(), "validation rule registered");
        self.rules.insert(field, rule);
        Ok(self)
    }

    /// Builder form of [`add_validation`](Self::add_validation)
    pub fn with_rule(mut self, field: impl Into<String>, rule: impl Into<Rule>) -> DomainResult<Self> {
        self.add_validation(field, rule)?;
        Ok(self)
    }

    /// Require a field to be present and non-blank in `validate_dict`
    pub fn require(&mut self, field: impl Into<String>) -> &mut Self {
        self.required.insert(field.into());
        self
    }

    /// Builder form of [`require`](Self::require)
    pub fn with_required<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            self.require(field);
        }
        self
    }

    /// The rule registered for a field
    pub fn rule(&self, field: &str) -> Option<&Rule> {
        self.rules.get(field)
    }

    /// Fields with a rule, in registration order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Check one value against its field's rule
    ///
    /// Returns the value to store: unchanged, except for patterns that
    /// normalize (emails are trimmed and lower-cased).
    pub fn validate(&self, field: &str, value: &str) -> DomainResult<String> {
        self.check(field, value).map_err(DomainError::ValidationError)
    }

    /// Check every field of a record that has a rule
    ///
    /// All violations are reported together, joined by `"; "`, in the
    /// order required fields and then record fields are visited.
    pub fn validate_dict(&self, record: &Record) -> DomainResult<Record> {
        let mut failures: Vec<String> = self
            .required
            .iter()
            .filter(|field| {
                record
                    .get(field.as_str())
                    .map_or(true, |value| value.trim().is_empty())
            })
            .map(|field| format!("field '{field}' required"))
            .collect();

        let mut validated = Record::with_capacity(record.len());
        for (field, value) in record {
            match self.check(field, value) {
                Ok(accepted) => {
                    validated.insert(field.clone(), accepted);
                }
                Err(reason) => failures.push(reason),
            }
        }

        if failures.is_empty() {
            Ok(validated)
        } else {
            debug!(violations = failures.len(), "record rejected");
            Err(DomainError::ValidationError(failures.join("; ")))
        }
    }

    fn check(&self, field: &str, value: &str) -> Result<String, String> {
        let Some(rule) = self.rules.get(field) else {
            return Ok(value.to_string());
        };

        match rule {
            Rule::Pattern { kind, must_exist } => kind
                .check(value, self.matchers.get(kind), *must_exist)
                .map(|()| kind.normalize(value))
                .map_err(|reason| format!("field '{field}' failed rule '{kind}': {reason}")),
            Rule::Custom { name, predicate } => {
                if predicate(value) {
                    Ok(value.to_string())
                } else {
                    Err(format!("field '{field}' failed rule '{name}'"))
                }
            }
        }
    }
}

impl fmt::Debug for PatternValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternValidator")
            .field("rules", &self.rules)
            .field("required", &self.required)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_unregistered_field_passes_through() {
        let validator = PatternValidator::new();
        assert_eq!(validator.validate("anything", "  raw  ").unwrap(), "  raw  ");
    }

    #[test]
    fn test_validate_names_field_and_rule() {
        let validator = PatternValidator::web().unwrap();
        let err = validator.validate("url", "example.com").unwrap_err();

        assert!(err.is_validation_error());
        let message = err.to_string();
        assert!(message.contains("field 'url'"), "{message}");
        assert!(message.contains("rule 'url'"), "{message}");
    }

    #[test]
    fn test_validate_normalizes_email() {
        let validator = PatternValidator::web().unwrap();
        assert_eq!(
            validator.validate("email", " Ops@Example.com").unwrap(),
            "ops@example.com"
        );
    }

    #[test]
    fn test_custom_predicate() {
        let validator = PatternValidator::new()
            .with_rule("env", Rule::custom("environment", |v| matches!(v, "dev" | "prod")))
            .unwrap();

        assert_eq!(validator.validate("env", "dev").unwrap(), "dev");
        let err = validator.validate("env", "qa").unwrap_err();
        assert!(err.to_string().contains("failed rule 'environment'"));
    }

    #[test]
    fn test_add_validation_replaces_rule() {
        let mut validator = PatternValidator::new();
        validator.add_validation("id", PatternKind::Integer).unwrap();
        validator.add_validation("id", PatternKind::Uuid).unwrap();

        assert_eq!(validator.fields().collect::<Vec<_>>(), vec!["id"]);
        assert!(validator.validate("id", "42").is_err());
        assert!(validator
            .validate("id", "67e55044-10b1-426f-9247-bb680e5fe0c8")
            .is_ok());
    }

    #[test]
    fn test_existence_check_only_for_paths() {
        let mut validator = PatternValidator::new();
        assert!(validator
            .add_validation("config", Rule::existing(PatternKind::File))
            .is_ok());

        let err = validator
            .add_validation("email", Rule::existing(PatternKind::Email))
            .unwrap_err();
        assert!(err.to_string().contains("existence checks"));
    }

    #[test]
    fn test_from_named_rejects_unknown_pattern() {
        let err = PatternValidator::from_named([("zip", "zipcode")]).unwrap_err();
        assert!(err.to_string().contains("unknown pattern 'zipcode'"));
    }

    #[test]
    fn test_validate_dict_aggregates_every_failure() {
        let validator = PatternValidator::web()
            .unwrap()
            .with_required(["name"]);
        let input = record(&[("email", "nope"), ("url", "nope"), ("note", "free text")]);

        let message = validator.validate_dict(&input).unwrap_err().to_string();

        assert!(message.contains("field 'name' required"), "{message}");
        assert!(message.contains("field 'email' failed rule 'email'"), "{message}");
        assert!(message.contains("field 'url' failed rule 'url'"), "{message}");
        assert_eq!(message.matches("; ").count(), 2);
    }

    #[test]
    fn test_validate_dict_blank_required_field() {
        let validator = PatternValidator::new().with_required(["name"]);
        let err = validator
            .validate_dict(&record(&[("name", "   ")]))
            .unwrap_err();
        assert!(err.to_string().contains("field 'name' required"));
    }

    #[test]
    fn test_validate_dict_keeps_order_and_unknown_fields() {
        let validator = PatternValidator::security().unwrap();
        let input = record(&[
            ("password", "Secr3tPass"),
            ("shell", "/bin/zsh"),
            ("username", "deploy"),
        ]);

        assert_eq!(validator.validate_dict(&input).unwrap(), input);
    }
}
