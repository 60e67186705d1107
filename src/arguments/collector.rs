//! Obtains a whole argument list for one command invocation

use super::argument::Argument;
use super::info::ArgumentInfo;
use super::value::ArgMap;
use super::{Collected, Outcome};
use crate::commands::context::CommandMessage;
use crate::commands::registry::Registry;
use crate::core::error::RegistrationError;
use anyhow::Result;
use log::debug;
use std::collections::HashSet;

pub struct ArgumentCollector {
    args: Vec<Argument>,
    prompt_limit: Option<usize>,
}

impl ArgumentCollector {
    /// Validate the ordering rules and build every argument
    pub fn new(
        infos: Vec<ArgumentInfo>,
        prompt_limit: Option<usize>,
        registry: &Registry,
    ) -> Result<Self, RegistrationError> {
        if infos.is_empty() {
            return Err(RegistrationError::InvalidArgumentList(
                "Collector args must not be empty.".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut has_infinite = false;
        let mut has_optional = false;
        let mut args = Vec::with_capacity(infos.len());

        for info in infos {
            if has_infinite {
                return Err(RegistrationError::InvalidArgumentList(
                    "No other argument may come after an infinite argument.".to_string(),
                ));
            }
            if info.is_optional() {
                has_optional = true;
            } else if has_optional {
                return Err(RegistrationError::InvalidArgumentList(
                    "Required arguments may not come after optional arguments.".to_string(),
                ));
            }
            if !seen.insert(info.key.clone()) {
                return Err(RegistrationError::InvalidArgumentList(format!(
                    "Argument key \"{}\" is used more than once.",
                    info.key
                )));
            }
            has_infinite = info.infinite;
            args.push(Argument::new(info, registry)?);
        }

        Ok(Self { args, prompt_limit })
    }

    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    pub fn prompt_limit(&self) -> Option<usize> {
        self.prompt_limit
    }

    /// Usage string built from the argument labels, e.g. `<user> [reason]`
    pub fn usage(&self) -> String {
        self.args
            .iter()
            .map(|arg| arg.info().usage())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Obtain every argument in order
    ///
    /// `provided` holds the already-split values from the invoking message; the
    /// infinite argument (if any) takes all remaining values. The author is marked
    /// as awaiting input for the whole collection, so their replies are not
    /// dispatched as new commands. `prompt_limit` overrides the collector's own.
    pub async fn obtain(
        &self,
        msg: &CommandMessage,
        provided: &[String],
        prompt_limit: Option<usize>,
    ) -> Result<Collected<ArgMap>> {
        let limit = prompt_limit.or(self.prompt_limit);
        let _awaiting = msg.framework().prompts().mark_awaiting(msg.input_key());

        let mut values = ArgMap::new();
        let mut prompts = Vec::new();
        let mut answers = Vec::new();

        for (index, arg) in self.args.iter().enumerate() {
            let result = if arg.is_infinite() {
                let rest = provided.get(index..).unwrap_or_default();
                if rest.is_empty() {
                    arg.obtain(msg, None, limit).await?
                } else {
                    arg.obtain_infinite(msg, rest, limit).await?
                }
            } else {
                arg.obtain(msg, provided.get(index).map(String::as_str), limit)
                    .await?
            };

            prompts.extend(result.prompts);
            answers.extend(result.answers);
            match result.outcome {
                Outcome::Obtained(value) => values.insert(arg.key(), value),
                Outcome::Cancelled(reason) => {
                    debug!(
                        "Argument collection cancelled at \"{}\" ({reason})",
                        arg.key()
                    );
                    return Ok(Collected::cancelled(reason, prompts, answers));
                }
            }
        }

        Ok(Collected::obtained(values, prompts, answers))
    }
}
