//! Command-line parsing: prefix patterns, argument splitting, usage strings

use anyhow::Result;
use regex::{Regex, RegexBuilder};
use serenity::model::id::UserId;
use std::sync::OnceLock;

const NBSP: &str = "\u{a0}";

fn quoted_or_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\s*(?:"([^"]*)"|'([^']*)'|(\S+))\s*"#).expect("argument regex is valid")
    })
}

fn double_quoted_or_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\s*(?:"([^"]*)"|(\S+))\s*"#).expect("argument regex is valid"))
}

/// First word of a message, for prefixless commands in DMs
pub fn first_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\S+)").expect("first word regex is valid"))
}

/// Pattern matching `<mention> [prefix]name` or `prefix name`
///
/// Group 1 is everything before the command name, group 2 the name. Returns
/// `None` when there is neither a prefix nor a known bot user to mention.
pub fn build_command_pattern(prefix: Option<&str>, bot: Option<UserId>) -> Result<Option<Regex>> {
    let prefix = prefix.filter(|p| !p.is_empty()).map(regex::escape);
    let mention = bot.map(|id| format!(r"<@!?{}>\s+", id.0));

    let head = match (mention, prefix) {
        (Some(mention), Some(prefix)) => format!(r"{mention}(?:{prefix}\s*)?|{prefix}\s*"),
        (Some(mention), None) => mention,
        (None, Some(prefix)) => format!(r"{prefix}\s*"),
        (None, None) => return Ok(None),
    };

    let pattern = RegexBuilder::new(&format!(r"^({head})(\S+)"))
        .case_insensitive(true)
        .build()?;
    Ok(Some(pattern))
}

/// Split an argument string into values
///
/// `"double"` (and, when allowed, `'single'`) quoted values may contain spaces.
/// With a non-zero `count`, at most `count` values are returned and the last
/// one holds the unsplit remainder with one pair of wrapping quotes removed.
pub fn parse_args(arg_string: &str, count: usize, allow_single_quote: bool) -> Vec<String> {
    let text = normalize_quotes(arg_string, allow_single_quote);
    let re = if allow_single_quote {
        quoted_or_word()
    } else {
        double_quoted_or_word()
    };

    // values split off before the remainder
    let limit = count.checked_sub(1).unwrap_or(usize::MAX);
    let mut values = Vec::new();
    let mut end = 0;

    for caps in re.captures_iter(&text).take(limit) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        end = whole.end();
        let value = (1..caps.len())
            .find_map(|i| caps.get(i))
            .map_or("", |m| m.as_str());
        values.push(value.to_string());
    }

    if values.len() == limit && end < text.len() {
        values.push(strip_wrapping_quotes(&text[end..], allow_single_quote).to_string());
    }
    values
}

fn normalize_quotes(text: &str, allow_single_quote: bool) -> String {
    let text = text.replace(['\u{201c}', '\u{201d}'], "\"");
    if allow_single_quote {
        text.replace(['\u{2018}', '\u{2019}'], "'")
    } else {
        text
    }
}

fn strip_wrapping_quotes(text: &str, allow_single_quote: bool) -> &str {
    for quote in ['"', '\''] {
        if quote == '\'' && !allow_single_quote {
            continue;
        }
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// Render how to invoke `command`: `` `!cmd` or `@Bot cmd` ``
pub fn usage(command: &str, prefix: Option<&str>, bot_name: Option<&str>) -> String {
    let command = command.replace(' ', NBSP);
    let prefix_part = prefix.filter(|p| !p.is_empty()).map(|prefix| {
        let mut prefix = prefix.to_string();
        if prefix.chars().count() > 1 && !prefix.ends_with(' ') {
            prefix.push(' ');
        }
        format!("`{}{command}`", prefix.replace(' ', NBSP))
    });
    let mention_part = bot_name.map(|name| format!("`@{}{NBSP}{command}`", name.replace(' ', NBSP)));

    match (prefix_part, mention_part) {
        (Some(p), Some(m)) => format!("{p} or {m}"),
        (Some(p), None) => p,
        (None, Some(m)) => m,
        (None, None) => format!("`{command}`"),
    }
}
