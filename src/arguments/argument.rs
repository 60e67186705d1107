//! Runtime argument: the obtain/validate/prompt state machine

use super::info::ArgumentInfo;
use super::types::{ArgumentType, Validation};
use super::value::ArgValue;
use super::{CancelReason, Collected};
use crate::commands::context::CommandMessage;
use crate::commands::registry::Registry;
use crate::core::error::RegistrationError;
use crate::core::response::escape_markdown;
use anyhow::{anyhow, Result};
use log::debug;
use std::sync::Arc;

const CANCEL_WORD: &str = "cancel";
const FINISH_WORD: &str = "finish";

pub struct Argument {
    info: ArgumentInfo,
    kind: Option<Arc<dyn ArgumentType>>,
}

impl Argument {
    /// Build an argument, resolving its type against the registry
    pub fn new(mut info: ArgumentInfo, registry: &Registry) -> Result<Self, RegistrationError> {
        info.check()?;
        info.wait.get_or_insert(registry.default_wait());
        let kind = match &info.type_id {
            Some(type_id) => Some(registry.argument_type(type_id).ok_or_else(|| {
                RegistrationError::UnknownType {
                    key: info.key.clone(),
                    type_id: type_id.clone(),
                }
            })?),
            None => None,
        };
        Ok(Self { info, kind })
    }

    pub fn info(&self) -> &ArgumentInfo {
        &self.info
    }

    pub fn key(&self) -> &str {
        &self.info.key
    }

    pub fn is_infinite(&self) -> bool {
        self.info.infinite
    }

    /// Obtain a value, prompting the author until it is valid or collection is cancelled
    pub async fn obtain(
        &self,
        msg: &CommandMessage,
        value: Option<&str>,
        prompt_limit: Option<usize>,
    ) -> Result<Collected<ArgValue>> {
        let mut empty = value.map_or(true, |v| self.is_empty(v, msg));
        if empty {
            if let Some(default) = &self.info.default {
                return Ok(Collected::obtained(default.clone(), Vec::new(), Vec::new()));
            }
        }

        if self.info.infinite {
            let values: Vec<String> = value.map(str::to_string).into_iter().collect();
            return self.obtain_infinite(msg, &values, prompt_limit).await;
        }

        let wait = self.info.wait_duration();
        let mut prompts = Vec::new();
        let mut answers = Vec::new();
        let mut current = value.unwrap_or_default().to_string();
        let mut validation = if empty {
            Validation::Invalid
        } else {
            self.validate(&current, msg).await
        };

        while !validation.is_valid() {
            if prompt_limit.is_some_and(|limit| prompts.len() >= limit) {
                return Ok(Collected::cancelled(CancelReason::PromptLimit, prompts, answers));
            }

            let head = if empty {
                self.info.prompt.clone()
            } else {
                self.invalid_message(&validation, None)
            };
            let text = format!(
                "{head}\nRespond with `{CANCEL_WORD}` to cancel the command.{}",
                self.wait_notice()
            );
            let reply = msg.ask(Some(&text), wait).await?;
            prompts.push(text);

            let Some(reply) = reply else {
                return Ok(Collected::cancelled(CancelReason::Time, prompts, answers));
            };
            answers.push(reply.clone());
            if reply.trim().eq_ignore_ascii_case(CANCEL_WORD) {
                return Ok(Collected::cancelled(CancelReason::User, prompts, answers));
            }

            current = reply;
            empty = self.is_empty(&current, msg);
            validation = if empty {
                Validation::Invalid
            } else {
                self.validate(&current, msg).await
            };
        }

        let parsed = self.parse(&current, msg).await?;
        Ok(Collected::obtained(parsed, prompts, answers))
    }

    /// Obtain a list of values for an infinite argument
    ///
    /// Pre-supplied values are each validated (and re-prompted when invalid).
    /// Without pre-supplied values the author is prompted once and then every
    /// reply adds a value until `finish` or `cancel`.
    ///
    /// During a collection, a reply sent before the previous one was read is
    /// held for the next read; any further early reply is dropped.
    pub async fn obtain_infinite(
        &self,
        msg: &CommandMessage,
        values: &[String],
        prompt_limit: Option<usize>,
    ) -> Result<Collected<ArgValue>> {
        if values.is_empty() {
            if let Some(default) = &self.info.default {
                return Ok(Collected::obtained(default.clone(), Vec::new(), Vec::new()));
            }
        }

        // each value gets the full wait window
        let wait = self.info.wait_duration();
        let mut results = Vec::new();
        let mut prompts = Vec::new();
        let mut answers = Vec::new();
        let mut index = 0;

        loop {
            let mut current = values.get(index).cloned();
            let mut validation = match &current {
                Some(value) => self.validate(value, msg).await,
                None => Validation::Invalid,
            };
            let mut attempts = 0;

            while !validation.is_valid() {
                attempts += 1;
                if prompt_limit.is_some_and(|limit| attempts > limit) {
                    return Ok(Collected::cancelled(CancelReason::PromptLimit, prompts, answers));
                }

                let text = match &current {
                    Some(value) => Some(format!(
                        "{}\nRespond with `{CANCEL_WORD}` to cancel the command, or `{FINISH_WORD}` to finish entry up to this point.{}",
                        self.invalid_message(&validation, Some(value)),
                        self.wait_notice()
                    )),
                    None if results.is_empty() => Some(format!(
                        "{}\nRespond with `{CANCEL_WORD}` to cancel the command, or `{FINISH_WORD}` to finish entry.{}",
                        self.info.prompt,
                        self.wait_notice()
                    )),
                    None => None,
                };

                let reply = msg.ask(text.as_deref(), wait).await?;
                prompts.extend(text);

                let Some(reply) = reply else {
                    return Ok(Collected::cancelled(CancelReason::Time, prompts, answers));
                };
                answers.push(reply.clone());

                let word = reply.trim().to_lowercase();
                if word == FINISH_WORD {
                    debug!(
                        "Finished infinite argument {} with {} value(s)",
                        self.info.key,
                        results.len()
                    );
                    if !results.is_empty() {
                        return Ok(Collected::obtained(ArgValue::List(results), prompts, answers));
                    }
                    return Ok(match &self.info.default {
                        Some(default) => Collected::obtained(default.clone(), prompts, answers),
                        None => Collected::cancelled(CancelReason::User, prompts, answers),
                    });
                }
                if word == CANCEL_WORD {
                    return Ok(Collected::cancelled(CancelReason::User, prompts, answers));
                }

                validation = self.validate(&reply, msg).await;
                current = Some(reply);
            }

            // the loop only exits once `current` holds a valid value
            let value = current.ok_or_else(|| anyhow!("no value to parse"))?;
            results.push(self.parse(&value, msg).await?);

            if !values.is_empty() {
                index += 1;
                if index == values.len() {
                    return Ok(Collected::obtained(ArgValue::List(results), prompts, answers));
                }
            }
        }
    }

    pub async fn validate(&self, value: &str, msg: &CommandMessage) -> Validation {
        if let Some(validator) = &self.info.validator {
            return validator(value, &self.info);
        }
        match &self.kind {
            Some(kind) => kind.validate(value, msg, &self.info).await,
            None => Validation::Invalid,
        }
    }

    pub async fn parse(&self, value: &str, msg: &CommandMessage) -> Result<ArgValue> {
        if let Some(parser) = &self.info.parser {
            return parser(value, &self.info);
        }
        match &self.kind {
            Some(kind) => kind.parse(value, msg, &self.info).await,
            None => Err(anyhow!(
                "Argument \"{}\" has no type or parser",
                self.info.key
            )),
        }
    }

    pub fn is_empty(&self, value: &str, msg: &CommandMessage) -> bool {
        if let Some(checker) = &self.info.empty_checker {
            return checker(value, &self.info);
        }
        match &self.kind {
            Some(kind) => kind.is_empty(value, msg, &self.info),
            None => value.trim().is_empty(),
        }
    }

    fn invalid_message(&self, validation: &Validation, value: Option<&str>) -> String {
        if let Validation::Rejected(message) = validation {
            return message.clone();
        }
        if let Some(error) = &self.info.error {
            return error.clone();
        }
        match value {
            Some(value) => format!(
                "You provided an invalid {}, \"{}\". Please try again.",
                self.info.label,
                escape_markdown(value)
            ),
            None => format!(
                "You provided an invalid {}. Please try again.",
                self.info.label
            ),
        }
    }

    fn wait_notice(&self) -> String {
        match self.info.wait_duration() {
            Some(wait) => format!(
                " The command will automatically be cancelled in {} seconds.",
                wait.as_secs()
            ),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::Outcome;
    use crate::test_support::TestBed;

    fn argument(bed: &TestBed, info: ArgumentInfo) -> Argument {
        Argument::new(info, bed.framework.registry()).unwrap()
    }

    fn bounded_n() -> ArgumentInfo {
        ArgumentInfo::new("n", "Pick a number.")
            .of_type("integer")
            .min(1.0)
            .max(10.0)
    }

    #[tokio::test]
    async fn test_default_returned_without_prompting() {
        let bed = TestBed::new();
        let msg = bed.message("!cmd");
        let arg = argument(&bed, ArgumentInfo::new("flag", "?").of_type("boolean").default(false));

        let result = arg.obtain(&msg, None, None).await.unwrap();
        assert_eq!(result.outcome, Outcome::Obtained(ArgValue::Boolean(false)));
        assert!(result.prompts.is_empty());
        assert!(bed.transport.sent().is_empty());

        let result = arg.obtain(&msg, Some("   "), None).await.unwrap();
        assert_eq!(result.value(), Some(&ArgValue::Boolean(false)));
    }

    #[tokio::test]
    async fn test_valid_supplied_value_parses() {
        let bed = TestBed::new();
        let msg = bed.message("!cmd 5");
        let arg = argument(&bed, bounded_n());

        let result = arg.obtain(&msg, Some("5"), None).await.unwrap();
        assert_eq!(result.value(), Some(&ArgValue::Integer(5)));
        assert!(result.prompts.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_value_then_cancel() {
        let bed = TestBed::new();
        bed.transport.script(["cancel"]);
        let msg = bed.message("!cmd 50");
        let arg = argument(&bed, bounded_n());

        let result = arg.obtain(&msg, Some("50"), None).await.unwrap();
        assert_eq!(result.cancel_reason(), Some(CancelReason::User));
        assert_eq!(result.prompts.len(), 1);
        assert!(result.prompts[0].starts_with("Please enter a number below or exactly 10."));
        assert_eq!(result.answers, vec!["cancel"]);
    }

    #[tokio::test]
    async fn test_reprompts_until_valid() {
        let bed = TestBed::new();
        bed.transport.script(["eleven", "11", "7"]);
        let msg = bed.message("!cmd");
        let arg = argument(&bed, bounded_n());

        let result = arg.obtain(&msg, None, None).await.unwrap();
        assert_eq!(result.value(), Some(&ArgValue::Integer(7)));
        assert_eq!(result.prompts.len(), 3);
        assert!(result.prompts[0].starts_with("Pick a number."));
        assert!(result.prompts[1].starts_with("You provided an invalid n. Please try again."));
        assert!(result.prompts[2].starts_with("Please enter a number below or exactly 10."));
    }

    #[tokio::test]
    async fn test_prompt_limit() {
        let bed = TestBed::new();
        bed.transport.script(["nope"]);
        let msg = bed.message("!cmd");
        let arg = argument(&bed, bounded_n());

        let result = arg.obtain(&msg, None, Some(1)).await.unwrap();
        assert_eq!(result.cancel_reason(), Some(CancelReason::PromptLimit));
        assert_eq!(result.prompts.len(), 1);

        let result = arg.obtain(&msg, Some("0"), Some(0)).await.unwrap();
        assert_eq!(result.cancel_reason(), Some(CancelReason::PromptLimit));
        assert!(result.prompts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_cancels() {
        let bed = TestBed::new();
        let msg = bed.message("!cmd");
        let arg = argument(&bed, bounded_n().wait(5));

        let result = arg.obtain(&msg, None, None).await.unwrap();
        assert_eq!(result.cancel_reason(), Some(CancelReason::Time));
        assert_eq!(result.prompts.len(), 1);
        assert!(result.prompts[0].contains("automatically be cancelled in 5 seconds"));
        assert!(result.answers.is_empty());
    }

    #[tokio::test]
    async fn test_custom_error_message() {
        let bed = TestBed::new();
        bed.transport.script(["cancel"]);
        let msg = bed.message("!cmd");
        let arg = argument(
            &bed,
            ArgumentInfo::new("b", "?").of_type("boolean").error("Say yes or no."),
        );

        let result = arg.obtain(&msg, Some("maybe"), None).await.unwrap();
        assert!(result.prompts[0].starts_with("Say yes or no."));
    }

    #[tokio::test]
    async fn test_custom_validator_and_parser() {
        let bed = TestBed::new();
        let msg = bed.message("!cmd");
        let arg = argument(
            &bed,
            ArgumentInfo::new("even", "An even number?")
                .validator(|v, _| match v.parse::<i64>() {
                    Ok(n) if n % 2 == 0 => Validation::Valid,
                    Ok(_) => Validation::Rejected("That number is odd.".into()),
                    Err(_) => Validation::Invalid,
                })
                .parser(|v, _| Ok(ArgValue::Integer(v.parse::<i64>()? / 2))),
        );

        let result = arg.obtain(&msg, Some("8"), None).await.unwrap();
        assert_eq!(result.value(), Some(&ArgValue::Integer(4)));

        bed.transport.script(["cancel"]);
        let result = arg.obtain(&msg, Some("3"), None).await.unwrap();
        assert!(result.prompts[0].starts_with("That number is odd."));
    }

    #[tokio::test]
    async fn test_infinite_with_supplied_values() {
        let bed = TestBed::new();
        let msg = bed.message("!cmd 1 2 3");
        let arg = argument(&bed, ArgumentInfo::new("nums", "Numbers?").of_type("integer").infinite());

        let values = vec!["1".to_string(), "2".to_string(), "3".to_string()];
        let result = arg.obtain_infinite(&msg, &values, None).await.unwrap();
        assert_eq!(
            result.value(),
            Some(&ArgValue::List(vec![
                ArgValue::Integer(1),
                ArgValue::Integer(2),
                ArgValue::Integer(3)
            ]))
        );
        assert!(result.prompts.is_empty());
    }

    #[tokio::test]
    async fn test_infinite_reprompts_invalid_supplied_value() {
        let bed = TestBed::new();
        bed.transport.script(["2"]);
        let msg = bed.message("!cmd 1 x");
        let arg = argument(&bed, ArgumentInfo::new("nums", "Numbers?").of_type("integer").infinite());

        let values = vec!["1".to_string(), "x".to_string()];
        let result = arg.obtain_infinite(&msg, &values, None).await.unwrap();
        assert_eq!(
            result.value(),
            Some(&ArgValue::List(vec![ArgValue::Integer(1), ArgValue::Integer(2)]))
        );
        assert_eq!(result.prompts.len(), 1);
        assert!(result.prompts[0].contains("You provided an invalid nums, \"x\"."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_infinite_interactive_until_finish() {
        let bed = TestBed::new();
        bed.transport.script(["4"]);
        bed.deliver_later(["5", "finish"]);
        let msg = bed.message("!cmd");
        let arg = argument(&bed, ArgumentInfo::new("nums", "Numbers?").of_type("integer").infinite());

        let result = arg.obtain_infinite(&msg, &[], None).await.unwrap();
        assert_eq!(
            result.value(),
            Some(&ArgValue::List(vec![ArgValue::Integer(4), ArgValue::Integer(5)]))
        );
        // only the opening prompt is sent; later values are read silently
        assert_eq!(result.prompts.len(), 1);
        assert_eq!(result.answers, vec!["4", "5", "finish"]);
    }

    #[tokio::test]
    async fn test_infinite_reads_reply_sent_early() {
        let bed = TestBed::new();
        let msg = bed.message("!cmd");
        let prompts = bed.framework.prompts();
        let _awaiting = prompts.mark_awaiting(msg.input_key());
        assert!(prompts.deliver(msg.input_key(), "4"));
        bed.deliver_later(["finish"]);
        let arg = argument(&bed, ArgumentInfo::new("nums", "Numbers?").of_type("integer").infinite());

        let result = arg.obtain_infinite(&msg, &[], None).await.unwrap();
        assert_eq!(result.value(), Some(&ArgValue::List(vec![ArgValue::Integer(4)])));
        assert_eq!(result.answers, vec!["4", "finish"]);
    }

    #[tokio::test]
    async fn test_infinite_finish_with_nothing_cancels() {
        let bed = TestBed::new();
        bed.transport.script(["finish"]);
        let msg = bed.message("!cmd");
        let arg = argument(&bed, ArgumentInfo::new("nums", "Numbers?").of_type("integer").infinite());

        let result = arg.obtain_infinite(&msg, &[], None).await.unwrap();
        assert_eq!(result.cancel_reason(), Some(CancelReason::User));
    }

    #[test]
    fn test_unknown_type_is_registration_error() {
        let bed = TestBed::new();
        let err = Argument::new(
            ArgumentInfo::new("x", "?").of_type("colour"),
            bed.framework.registry(),
        )
        .err()
        .unwrap();
        assert_eq!(
            err,
            RegistrationError::UnknownType {
                key: "x".into(),
                type_id: "colour".into()
            }
        );
    }
}
