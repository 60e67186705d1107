//! Argument types: named validator/parser pairs
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.2.0: Union types (`user|role`)
//! - 1.1.0: Command and group types resolving against the registry
//! - 1.0.0: Scalar and mention types

use super::info::ArgumentInfo;
use super::value::ArgValue;
use crate::commands::context::CommandMessage;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use regex::Regex;
use serenity::model::id::{ChannelId, RoleId, UserId};
use std::sync::{Arc, OnceLock};

/// Maximum number of candidates listed in a disambiguation message
const MAX_DISAMBIGUATION: usize = 15;

const TRUTHY: &[&str] = &["true", "t", "yes", "y", "on", "enable", "enabled", "1", "+"];
const FALSY: &[&str] = &["false", "f", "no", "n", "off", "disable", "disabled", "0", "-"];

/// Outcome of validating one raw value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    /// Invalid; the generic (or argument-specific) message is used
    Invalid,
    /// Invalid with a message to show the user
    Rejected(String),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }
}

impl From<bool> for Validation {
    fn from(valid: bool) -> Self {
        if valid {
            Validation::Valid
        } else {
            Validation::Invalid
        }
    }
}

/// A registered argument type
///
/// Types are looked up by [`id`](ArgumentType::id) when a command's arguments
/// are built. Add new types by registering an implementation with the
/// [`Registry`](crate::commands::Registry).
#[async_trait]
pub trait ArgumentType: Send + Sync {
    fn id(&self) -> &str;

    async fn validate(&self, value: &str, msg: &CommandMessage, arg: &ArgumentInfo) -> Validation;

    async fn parse(&self, value: &str, msg: &CommandMessage, arg: &ArgumentInfo) -> Result<ArgValue>;

    fn is_empty(&self, value: &str, _msg: &CommandMessage, _arg: &ArgumentInfo) -> bool {
        value.trim().is_empty()
    }
}

/// All built-in types
pub fn builtin_types() -> Vec<Arc<dyn ArgumentType>> {
    vec![
        Arc::new(StringType),
        Arc::new(IntegerType),
        Arc::new(FloatType),
        Arc::new(BooleanType),
        Arc::new(UserType),
        Arc::new(ChannelType),
        Arc::new(RoleType),
        Arc::new(CommandType),
        Arc::new(GroupType),
    ]
}

fn one_of_message(options: &[String]) -> String {
    format!(
        "Please enter one of the following options: {}",
        options.join(" | ")
    )
}

fn check_one_of(value: &str, arg: &ArgumentInfo) -> Option<Validation> {
    match &arg.one_of {
        Some(options) if !options.contains(&value.to_lowercase()) => {
            Some(Validation::Rejected(one_of_message(options)))
        }
        _ => None,
    }
}

fn check_number_bounds(number: f64, arg: &ArgumentInfo) -> Validation {
    if let Some(min) = arg.min {
        if number < min {
            return Validation::Rejected(format!("Please enter a number above or exactly {min}."));
        }
    }
    if let Some(max) = arg.max {
        if number > max {
            return Validation::Rejected(format!("Please enter a number below or exactly {max}."));
        }
    }
    Validation::Valid
}

pub struct StringType;

#[async_trait]
impl ArgumentType for StringType {
    fn id(&self) -> &str {
        "string"
    }

    async fn validate(&self, value: &str, _msg: &CommandMessage, arg: &ArgumentInfo) -> Validation {
        if let Some(rejected) = check_one_of(value, arg) {
            return rejected;
        }
        let length = value.chars().count() as f64;
        if let Some(min) = arg.min {
            if length < min {
                return Validation::Rejected(format!(
                    "Please keep the {} above or exactly {min} characters.",
                    arg.label
                ));
            }
        }
        if let Some(max) = arg.max {
            if length > max {
                return Validation::Rejected(format!(
                    "Please keep the {} below or exactly {max} characters.",
                    arg.label
                ));
            }
        }
        Validation::Valid
    }

    async fn parse(&self, value: &str, _msg: &CommandMessage, _arg: &ArgumentInfo) -> Result<ArgValue> {
        Ok(ArgValue::String(value.to_string()))
    }
}

pub struct IntegerType;

#[async_trait]
impl ArgumentType for IntegerType {
    fn id(&self) -> &str {
        "integer"
    }

    async fn validate(&self, value: &str, _msg: &CommandMessage, arg: &ArgumentInfo) -> Validation {
        let Ok(number) = value.trim().parse::<i64>() else {
            return Validation::Invalid;
        };
        if let Some(rejected) = check_one_of(value.trim(), arg) {
            return rejected;
        }
        check_number_bounds(number as f64, arg)
    }

    async fn parse(&self, value: &str, _msg: &CommandMessage, _arg: &ArgumentInfo) -> Result<ArgValue> {
        Ok(ArgValue::Integer(value.trim().parse()?))
    }
}

pub struct FloatType;

#[async_trait]
impl ArgumentType for FloatType {
    fn id(&self) -> &str {
        "float"
    }

    async fn validate(&self, value: &str, _msg: &CommandMessage, arg: &ArgumentInfo) -> Validation {
        let number = match value.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => n,
            _ => return Validation::Invalid,
        };
        if let Some(rejected) = check_one_of(value.trim(), arg) {
            return rejected;
        }
        check_number_bounds(number, arg)
    }

    async fn parse(&self, value: &str, _msg: &CommandMessage, _arg: &ArgumentInfo) -> Result<ArgValue> {
        Ok(ArgValue::Float(value.trim().parse()?))
    }
}

pub struct BooleanType;

#[async_trait]
impl ArgumentType for BooleanType {
    fn id(&self) -> &str {
        "boolean"
    }

    async fn validate(&self, value: &str, _msg: &CommandMessage, _arg: &ArgumentInfo) -> Validation {
        let lc = value.trim().to_lowercase();
        (TRUTHY.contains(&lc.as_str()) || FALSY.contains(&lc.as_str())).into()
    }

    async fn parse(&self, value: &str, _msg: &CommandMessage, _arg: &ArgumentInfo) -> Result<ArgValue> {
        let lc = value.trim().to_lowercase();
        if TRUTHY.contains(&lc.as_str()) {
            Ok(ArgValue::Boolean(true))
        } else if FALSY.contains(&lc.as_str()) {
            Ok(ArgValue::Boolean(false))
        } else {
            Err(anyhow!("Unknown boolean value: {value}"))
        }
    }
}

fn user_mention() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:<@!?)?(\d+)>?$").expect("user mention regex"))
}

fn channel_mention() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:<#)?(\d+)>?$").expect("channel mention regex"))
}

fn role_mention() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:<@&)?(\d+)>?$").expect("role mention regex"))
}

/// Extract the snowflake from a mention or bare id
fn mention_id(re: &Regex, value: &str) -> Option<u64> {
    re.captures(value.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub struct UserType;

#[async_trait]
impl ArgumentType for UserType {
    fn id(&self) -> &str {
        "user"
    }

    async fn validate(&self, value: &str, _msg: &CommandMessage, _arg: &ArgumentInfo) -> Validation {
        mention_id(user_mention(), value).is_some().into()
    }

    async fn parse(&self, value: &str, _msg: &CommandMessage, _arg: &ArgumentInfo) -> Result<ArgValue> {
        mention_id(user_mention(), value)
            .map(|id| ArgValue::User(UserId(id)))
            .ok_or_else(|| anyhow!("Not a user mention: {value}"))
    }
}

pub struct ChannelType;

#[async_trait]
impl ArgumentType for ChannelType {
    fn id(&self) -> &str {
        "channel"
    }

    async fn validate(&self, value: &str, _msg: &CommandMessage, _arg: &ArgumentInfo) -> Validation {
        mention_id(channel_mention(), value).is_some().into()
    }

    async fn parse(&self, value: &str, _msg: &CommandMessage, _arg: &ArgumentInfo) -> Result<ArgValue> {
        mention_id(channel_mention(), value)
            .map(|id| ArgValue::Channel(ChannelId(id)))
            .ok_or_else(|| anyhow!("Not a channel mention: {value}"))
    }
}

pub struct RoleType;

#[async_trait]
impl ArgumentType for RoleType {
    fn id(&self) -> &str {
        "role"
    }

    async fn validate(&self, value: &str, _msg: &CommandMessage, _arg: &ArgumentInfo) -> Validation {
        mention_id(role_mention(), value).is_some().into()
    }

    async fn parse(&self, value: &str, _msg: &CommandMessage, _arg: &ArgumentInfo) -> Result<ArgValue> {
        mention_id(role_mention(), value)
            .map(|id| ArgValue::Role(RoleId(id)))
            .ok_or_else(|| anyhow!("Not a role mention: {value}"))
    }
}

pub(crate) fn disambiguation(kind: &str, names: &[String]) -> String {
    let mut listed: Vec<&str> = names.iter().take(MAX_DISAMBIGUATION).map(String::as_str).collect();
    if names.len() > MAX_DISAMBIGUATION {
        listed.push("...");
    }
    format!(
        "Multiple {kind} found, please be more specific: {}",
        listed.join(", ")
    )
}

/// Resolves to a registered command by name, alias, or `group:member`
pub struct CommandType;

#[async_trait]
impl ArgumentType for CommandType {
    fn id(&self) -> &str {
        "command"
    }

    async fn validate(&self, value: &str, msg: &CommandMessage, _arg: &ArgumentInfo) -> Validation {
        let found = msg.framework().registry().find_commands(Some(value), false, None);
        match found.len() {
            0 => Validation::Invalid,
            1 => Validation::Valid,
            _ => {
                let names: Vec<String> = found.iter().map(|c| c.name().to_string()).collect();
                Validation::Rejected(disambiguation("commands", &names))
            }
        }
    }

    async fn parse(&self, value: &str, msg: &CommandMessage, _arg: &ArgumentInfo) -> Result<ArgValue> {
        msg.framework()
            .registry()
            .find_commands(Some(value), false, None)
            .first()
            .map(|c| ArgValue::Command(c.name().to_string()))
            .ok_or_else(|| anyhow!("No command matches \"{value}\""))
    }
}

/// Resolves to a registered group by id or display name
pub struct GroupType;

#[async_trait]
impl ArgumentType for GroupType {
    fn id(&self) -> &str {
        "group"
    }

    async fn validate(&self, value: &str, msg: &CommandMessage, _arg: &ArgumentInfo) -> Validation {
        let found = msg.framework().registry().find_groups(Some(value), false);
        match found.len() {
            0 => Validation::Invalid,
            1 => Validation::Valid,
            _ => {
                let names: Vec<String> = found.iter().map(|g| g.id().to_string()).collect();
                Validation::Rejected(disambiguation("groups", &names))
            }
        }
    }

    async fn parse(&self, value: &str, msg: &CommandMessage, _arg: &ArgumentInfo) -> Result<ArgValue> {
        msg.framework()
            .registry()
            .find_groups(Some(value), false)
            .first()
            .map(|g| ArgValue::Group(g.id().to_string()))
            .ok_or_else(|| anyhow!("No group matches \"{value}\""))
    }
}

/// A value accepted by any one of several types, written `a|b`
pub struct UnionType {
    id: String,
    types: Vec<Arc<dyn ArgumentType>>,
}

impl UnionType {
    pub fn new(types: Vec<Arc<dyn ArgumentType>>) -> Self {
        let id = types.iter().map(|t| t.id()).collect::<Vec<_>>().join("|");
        Self { id, types }
    }
}

#[async_trait]
impl ArgumentType for UnionType {
    fn id(&self) -> &str {
        &self.id
    }

    async fn validate(&self, value: &str, msg: &CommandMessage, arg: &ArgumentInfo) -> Validation {
        let mut messages = Vec::new();
        for kind in &self.types {
            match kind.validate(value, msg, arg).await {
                Validation::Valid => return Validation::Valid,
                Validation::Rejected(message) => messages.push(message),
                Validation::Invalid => {}
            }
        }
        if messages.is_empty() {
            Validation::Invalid
        } else {
            Validation::Rejected(messages.join("\n"))
        }
    }

    async fn parse(&self, value: &str, msg: &CommandMessage, arg: &ArgumentInfo) -> Result<ArgValue> {
        for kind in &self.types {
            if kind.validate(value, msg, arg).await.is_valid() {
                return kind.parse(value, msg, arg).await;
            }
        }
        Err(anyhow!(
            "Couldn't parse value \"{value}\" with union type {}",
            self.id
        ))
    }

    fn is_empty(&self, value: &str, msg: &CommandMessage, arg: &ArgumentInfo) -> bool {
        self.types.iter().all(|kind| kind.is_empty(value, msg, arg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestBed;

    #[tokio::test]
    async fn test_integer_in_bounds() {
        let bed = TestBed::new();
        let msg = bed.message("!n 5");
        let arg = ArgumentInfo::new("n", "?").of_type("integer").min(1.0).max(10.0);

        assert_eq!(IntegerType.validate("5", &msg, &arg).await, Validation::Valid);
        assert_eq!(
            IntegerType.parse("5", &msg, &arg).await.unwrap(),
            ArgValue::Integer(5)
        );
    }

    #[tokio::test]
    async fn test_integer_out_of_bounds_is_rejected_with_message() {
        let bed = TestBed::new();
        let msg = bed.message("!n 50");
        let arg = ArgumentInfo::new("n", "?").of_type("integer").min(1.0).max(10.0);

        assert_eq!(
            IntegerType.validate("50", &msg, &arg).await,
            Validation::Rejected("Please enter a number below or exactly 10.".into())
        );
        assert_eq!(IntegerType.validate("abc", &msg, &arg).await, Validation::Invalid);
    }

    #[tokio::test]
    async fn test_accepted_numbers_parse_within_bounds() {
        let bed = TestBed::new();
        let msg = bed.message("!x");
        let int_arg = ArgumentInfo::new("i", "?").of_type("integer").min(-3.0).max(7.0);
        let float_arg = ArgumentInfo::new("f", "?").of_type("float").min(0.5).max(2.5);

        for candidate in ["-4", "-3", "0", "7", "8", "x", "3.5"] {
            if IntegerType.validate(candidate, &msg, &int_arg).await.is_valid() {
                let n = IntegerType.parse(candidate, &msg, &int_arg).await.unwrap();
                let n = n.as_i64().unwrap();
                assert!((-3..=7).contains(&n), "{candidate} parsed out of bounds");
            }
        }
        for candidate in ["0.4", "0.5", "1", "2.5", "2.51", "nan", "inf"] {
            if FloatType.validate(candidate, &msg, &float_arg).await.is_valid() {
                let n = FloatType.parse(candidate, &msg, &float_arg).await.unwrap();
                let n = n.as_f64().unwrap();
                assert!((0.5..=2.5).contains(&n), "{candidate} parsed out of bounds");
            }
        }
    }

    #[tokio::test]
    async fn test_string_length_bounds() {
        let bed = TestBed::new();
        let msg = bed.message("!x");
        let arg = ArgumentInfo::new("name", "?").of_type("string").min(2.0).max(4.0);

        assert!(StringType.validate("abc", &msg, &arg).await.is_valid());
        assert_eq!(
            StringType.validate("a", &msg, &arg).await,
            Validation::Rejected("Please keep the name above or exactly 2 characters.".into())
        );
        assert!(!StringType.validate("abcde", &msg, &arg).await.is_valid());
    }

    #[tokio::test]
    async fn test_one_of_is_case_insensitive() {
        let bed = TestBed::new();
        let msg = bed.message("!x");
        let arg = ArgumentInfo::new("colour", "?")
            .of_type("string")
            .one_of(["Red", "blue"]);

        assert!(StringType.validate("RED", &msg, &arg).await.is_valid());
        assert_eq!(
            StringType.validate("green", &msg, &arg).await,
            Validation::Rejected("Please enter one of the following options: red | blue".into())
        );
    }

    #[tokio::test]
    async fn test_boolean_words() {
        let bed = TestBed::new();
        let msg = bed.message("!x");
        let arg = ArgumentInfo::new("b", "?").of_type("boolean");

        assert_eq!(
            BooleanType.parse("Yes", &msg, &arg).await.unwrap(),
            ArgValue::Boolean(true)
        );
        assert_eq!(
            BooleanType.parse("off", &msg, &arg).await.unwrap(),
            ArgValue::Boolean(false)
        );
        assert!(!BooleanType.validate("perhaps", &msg, &arg).await.is_valid());
    }

    #[tokio::test]
    async fn test_mentions() {
        let bed = TestBed::new();
        let msg = bed.message("!x");
        let arg = ArgumentInfo::new("who", "?").of_type("user");

        assert_eq!(
            UserType.parse("<@!42>", &msg, &arg).await.unwrap(),
            ArgValue::User(UserId(42))
        );
        assert_eq!(
            UserType.parse("42", &msg, &arg).await.unwrap(),
            ArgValue::User(UserId(42))
        );
        assert_eq!(
            ChannelType.parse("<#7>", &msg, &arg).await.unwrap(),
            ArgValue::Channel(ChannelId(7))
        );
        assert!(!RoleType.validate("<#7>", &msg, &arg).await.is_valid());
    }

    #[tokio::test]
    async fn test_union_takes_first_valid_type() {
        let bed = TestBed::new();
        let msg = bed.message("!x");
        let union = UnionType::new(vec![Arc::new(IntegerType), Arc::new(BooleanType)]);
        let arg = ArgumentInfo::new("v", "?").of_type("integer|boolean");

        assert_eq!(union.id(), "integer|boolean");
        assert_eq!(union.parse("3", &msg, &arg).await.unwrap(), ArgValue::Integer(3));
        assert_eq!(
            union.parse("yes", &msg, &arg).await.unwrap(),
            ArgValue::Boolean(true)
        );
        assert_eq!(union.validate("what", &msg, &arg).await, Validation::Invalid);
    }

    #[tokio::test]
    async fn test_command_type_disambiguates() {
        let bed = TestBed::new();
        let msg = bed.message("!x");
        let arg = ArgumentInfo::new("cmd", "?").of_type("command");

        assert!(CommandType.validate("ping", &msg, &arg).await.is_valid());
        assert!(matches!(
            CommandType.validate("e", &msg, &arg).await,
            Validation::Rejected(_)
        ));
        assert_eq!(
            CommandType.validate("nonexistent", &msg, &arg).await,
            Validation::Invalid
        );
    }
}
