//! Parsed argument values

use anyhow::{anyhow, Result};
use serenity::model::id::{ChannelId, RoleId, UserId};
use std::collections::HashMap;
use std::fmt;

/// A fully parsed argument value
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    User(UserId),
    Channel(ChannelId),
    Role(RoleId),
    /// Name of a registered command
    Command(String),
    /// Id of a registered group
    Group(String),
    /// Values of an infinite argument, in the order given
    List(Vec<ArgValue>),
}

impl ArgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(s) | ArgValue::Command(s) | ArgValue::Group(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ArgValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgValue::Float(n) => Some(*n),
            ArgValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<UserId> {
        match self {
            ArgValue::User(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<ChannelId> {
        match self {
            ArgValue::Channel(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_role(&self) -> Option<RoleId> {
        match self {
            ArgValue::Role(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ArgValue]> {
        match self {
            ArgValue::List(values) => Some(values),
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::String(s) | ArgValue::Command(s) | ArgValue::Group(s) => f.write_str(s),
            ArgValue::Integer(n) => write!(f, "{n}"),
            ArgValue::Float(n) => write!(f, "{n}"),
            ArgValue::Boolean(b) => write!(f, "{b}"),
            ArgValue::User(id) => write!(f, "<@{}>", id.0),
            ArgValue::Channel(id) => write!(f, "<#{}>", id.0),
            ArgValue::Role(id) => write!(f, "<@&{}>", id.0),
            ArgValue::List(values) => {
                let parts: Vec<String> = values.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(", "))
            }
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::String(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::String(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Integer(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Float(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Boolean(value)
    }
}

/// Collected arguments keyed by argument key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgMap(HashMap<String, ArgValue>);

impl ArgMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ArgValue) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ArgValue)> {
        self.0.iter()
    }

    fn require(&self, key: &str) -> Result<&ArgValue> {
        self.0
            .get(key)
            .ok_or_else(|| anyhow!("Argument \"{key}\" was not collected"))
    }

    pub fn string(&self, key: &str) -> Result<&str> {
        self.require(key)?
            .as_str()
            .ok_or_else(|| anyhow!("Argument \"{key}\" is not text"))
    }

    pub fn integer(&self, key: &str) -> Result<i64> {
        self.require(key)?
            .as_i64()
            .ok_or_else(|| anyhow!("Argument \"{key}\" is not an integer"))
    }

    pub fn float(&self, key: &str) -> Result<f64> {
        self.require(key)?
            .as_f64()
            .ok_or_else(|| anyhow!("Argument \"{key}\" is not a number"))
    }

    pub fn boolean(&self, key: &str) -> Result<bool> {
        self.require(key)?
            .as_bool()
            .ok_or_else(|| anyhow!("Argument \"{key}\" is not a boolean"))
    }

    pub fn list(&self, key: &str) -> Result<&[ArgValue]> {
        self.require(key)?
            .as_list()
            .ok_or_else(|| anyhow!("Argument \"{key}\" is not a list"))
    }
}
