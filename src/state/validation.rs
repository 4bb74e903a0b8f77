//! Declarative field validation
//!
//! A [`Ruleset`] maps field names to ordered lists of [`ValidationRule`]s.
//! Every rule sees its own field's value and the whole document, so rules
//! can depend on sibling fields. All rules run; nothing short-circuits.

use super::forms::{FieldValue, FormDocument};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

type RuleFn = dyn Fn(&FieldValue, &FormDocument) -> Option<String> + Send + Sync;

/// A pure check producing an error message when the value is unacceptable
#[derive(Clone)]
pub struct ValidationRule(Arc<RuleFn>);

impl ValidationRule {
    pub fn new(
        check: impl Fn(&FieldValue, &FormDocument) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(check))
    }

    /// Fails with `message` when the value is empty text or an empty list
    pub fn required(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |value, _| value.is_empty().then(|| message.clone()))
    }

    pub fn check(&self, value: &FieldValue, document: &FormDocument) -> Option<String> {
        (self.0)(value, document)
    }
}

impl fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValidationRule(..)")
    }
}

/// Rules grouped by field, in declaration order
#[derive(Debug, Clone, Default)]
pub struct Ruleset {
    fields: Vec<(String, Vec<ValidationRule>)>,
}

impl Ruleset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule to `field`, after any rules already declared for it
    pub fn rule(mut self, field: &str, rule: ValidationRule) -> Self {
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, rules)) => rules.push(rule),
            None => self.fields.push((field.to_string(), vec![rule])),
        }
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn validate(&self, document: &FormDocument) -> ValidationReport {
        validate(document, self)
    }
}

/// Run every rule of `ruleset` against `document`
pub fn validate(document: &FormDocument, ruleset: &Ruleset) -> ValidationReport {
    let mut report = ValidationReport::default();
    for (field, rules) in &ruleset.fields {
        let value = document.value_or_empty(field);
        let messages: Vec<String> = rules
            .iter()
            .filter_map(|rule| rule.check(value, document))
            .collect();
        if !messages.is_empty() {
            report.per_field.insert(field.clone(), messages);
        }
    }
    report
}

/// Outcome of validation, plus the submission-level error once one occurs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Only fields with at least one message are stored
    per_field: BTreeMap<String, Vec<String>>,
    top_level_error: Option<String>,
}

impl ValidationReport {
    /// True iff some field has a message. The top-level error does not count.
    pub fn has_errors(&self) -> bool {
        self.per_field.values().any(|messages| !messages.is_empty())
    }

    pub fn field_errors(&self, field: &str) -> &[String] {
        self.per_field.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All messages for a field joined for display next to its control
    pub fn field_message(&self, field: &str) -> Option<String> {
        self.per_field.get(field).map(|messages| messages.join(" "))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.per_field
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }

    pub fn top_level_error(&self) -> Option<&str> {
        self.top_level_error.as_deref()
    }

    pub fn set_top_level_error(&mut self, message: impl Into<String>) {
        self.top_level_error = Some(message.into());
    }
}
