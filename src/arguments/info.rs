//! Declarative argument descriptors

use super::types::Validation;
use super::value::ArgValue;
use crate::core::config::DEFAULT_PROMPT_WAIT_SECS;
use crate::core::error::RegistrationError;
use anyhow::Result;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub type Validator = Arc<dyn Fn(&str, &ArgumentInfo) -> Validation + Send + Sync>;
pub type Parser = Arc<dyn Fn(&str, &ArgumentInfo) -> Result<ArgValue> + Send + Sync>;
pub type EmptyChecker = Arc<dyn Fn(&str, &ArgumentInfo) -> bool + Send + Sync>;

/// Definition of one named command argument
///
/// Built with [`ArgumentInfo::new`] and the chained setters:
///
/// ```ignore
/// ArgumentInfo::new("n", "How many?")
///     .of_type("integer")
///     .min(1.0)
///     .max(10.0)
/// ```
#[derive(Clone)]
pub struct ArgumentInfo {
    pub key: String,
    pub label: String,
    pub prompt: String,
    /// Replaces the generic "invalid" prompt when validation fails without a message
    pub error: Option<String>,
    /// Registered type id, `a|b` for a union
    pub type_id: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Accepted values, compared lowercase
    pub one_of: Option<Vec<String>>,
    /// `None` means the argument is required
    pub default: Option<ArgValue>,
    pub infinite: bool,
    /// Seconds to wait for each reply; 0 disables the timeout and `None` takes
    /// the registry default
    pub wait: Option<u64>,
    pub validator: Option<Validator>,
    pub parser: Option<Parser>,
    pub empty_checker: Option<EmptyChecker>,
}

impl ArgumentInfo {
    pub fn new(key: impl Into<String>, prompt: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            prompt: prompt.into(),
            error: None,
            type_id: None,
            min: None,
            max: None,
            one_of: None,
            default: None,
            infinite: false,
            wait: None,
            validator: None,
            parser: None,
            empty_checker: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn of_type(mut self, type_id: impl Into<String>) -> Self {
        self.type_id = Some(type_id.into());
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.one_of = Some(
            values
                .into_iter()
                .map(|v| v.into().to_lowercase())
                .collect(),
        );
        self
    }

    pub fn default(mut self, value: impl Into<ArgValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn infinite(mut self) -> Self {
        self.infinite = true;
        self
    }

    pub fn wait(mut self, secs: u64) -> Self {
        self.wait = Some(secs);
        self
    }

    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &ArgumentInfo) -> Validation + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(f));
        self
    }

    pub fn parser<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &ArgumentInfo) -> Result<ArgValue> + Send + Sync + 'static,
    {
        self.parser = Some(Arc::new(f));
        self
    }

    pub fn empty_checker<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &ArgumentInfo) -> bool + Send + Sync + 'static,
    {
        self.empty_checker = Some(Arc::new(f));
        self
    }

    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }

    /// Reply window, `None` when the argument waits forever
    pub fn wait_duration(&self) -> Option<Duration> {
        match self.wait.unwrap_or(DEFAULT_PROMPT_WAIT_SECS) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Usage fragment for the command format line
    pub fn usage(&self) -> String {
        let dots = if self.infinite { "..." } else { "" };
        if self.is_optional() {
            format!("[{}{dots}]", self.label)
        } else {
            format!("<{}{dots}>", self.label)
        }
    }

    pub(crate) fn check(&self) -> Result<(), RegistrationError> {
        let invalid = |reason: &str| RegistrationError::InvalidArgument {
            key: self.key.clone(),
            reason: reason.to_string(),
        };

        if self.key.trim().is_empty() {
            return Err(invalid("key must not be empty"));
        }
        if self.prompt.trim().is_empty() {
            return Err(invalid("prompt must not be empty"));
        }
        if self.type_id.is_none() && (self.validator.is_none() || self.parser.is_none()) {
            return Err(invalid(
                "a type is required unless both a validator and a parser are provided",
            ));
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(invalid("min must not be greater than max"));
            }
        }
        if matches!(self.one_of.as_deref(), Some([])) {
            return Err(invalid("one_of must not be empty"));
        }
        Ok(())
    }
}

impl fmt::Debug for ArgumentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentInfo")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("type_id", &self.type_id)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("one_of", &self.one_of)
            .field("default", &self.default)
            .field("infinite", &self.infinite)
            .field("wait", &self.wait)
            .field("custom_validator", &self.validator.is_some())
            .field("custom_parser", &self.parser.is_some())
            .finish()
    }
}
