//! `eos_naming`: block and local names
//!
//! Four independent checks per name, each with its own toggle: length, shouting, snake case and echoing the block's
//! type.
use super::{CheckError, Rule};
use crate::config::{load_rule_config, RuleConfig};
use crate::rule_config;
use crate::runner::{Reporter, Runner};
use crate::visit::{walk_blocks, Definition, LINTABLE_BLOCKS};
use serde::Deserialize;
use std::collections::HashMap;

const DEFAULT_LENGTH: i64 = 16;

#[derive(Deserialize, Default, Debug)]
struct NamingConfig {
    enabled: Option<bool>,
    level: Option<String>,
    /// `<= 0` disables the length check
    length: Option<i64>,
    shout: Option<bool>,
    snake: Option<bool>,
    type_echo: Option<TypeEchoConfig>,
}
rule_config!(NamingConfig);

#[derive(Deserialize, Default, Debug)]
struct TypeEchoConfig {
    enabled: Option<bool>,
    /// type part to the words that count as echoing it
    #[serde(default)]
    synonyms: HashMap<String, Vec<String>>,
}

impl NamingConfig {
    fn length(&self) -> Option<usize> {
        let length = self.length.unwrap_or(DEFAULT_LENGTH);
        (length > 0).then_some(length as usize)
    }

    fn type_echo(&self) -> bool {
        self.type_echo
            .as_ref()
            .and_then(|type_echo| type_echo.enabled)
            .unwrap_or(true)
    }

    fn synonyms(&self, part: &str) -> &[String] {
        self.type_echo
            .as_ref()
            .and_then(|type_echo| type_echo.synonyms.get(part))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn check(&self, runner: &mut dyn Runner, reporter: &Reporter, definition: &Definition) {
        let name = definition.name.as_str();
        let mut report =
            |message: String| reporter.report(runner, message, definition.range.clone());

        if let Some(limit) = self.length() {
            let length = name.chars().count();
            if length > limit {
                report(format!("Avoid names longer than {limit} ('{name}' is {length})."));
            }
        }

        if self.shout.unwrap_or(true) && is_shouted(name) {
            report(format!("Avoid SHOUTED names ({name})"));
        }

        if self.snake.unwrap_or(true) && !is_snake_case(name) {
            report(format!("Names should be snake_case ({name})."));
        }

        if self.type_echo() {
            if let Some(echo) = self.type_echo_of(definition) {
                let via = match echo {
                    Echo::Direct => String::new(),
                    Echo::Synonym(synonym) => format!(" (via synonym '{synonym}')"),
                };
                report(format!(
                    "Avoid echoing type \"{}\"{via} in label \"{name}\".",
                    definition.type_name
                ));
            }
        }
    }

    /// Whether the name repeats a part of the type
    ///
    /// Parts match anywhere in the name, synonyms only as a whole `_` or `-` separated word.
    fn type_echo_of<'a>(&'a self, definition: &'a Definition) -> Option<Echo<'a>> {
        let type_name = definition.type_name.to_lowercase();
        let name = definition.name.to_lowercase();
        let words: Vec<_> = name.split(['_', '-']).collect();

        for part in type_name.split('_').filter(|part| !part.is_empty()) {
            if name.contains(part) {
                return Some(Echo::Direct);
            }

            let derived = Some(definition.synonym.as_str()).filter(|synonym| !synonym.is_empty());
            let synonym = self
                .synonyms(part)
                .iter()
                .map(String::as_str)
                .chain(derived)
                .find(|synonym| words.contains(synonym));
            if let Some(synonym) = synonym {
                return Some(Echo::Synonym(synonym));
            }
        }

        None
    }
}

enum Echo<'a> {
    Direct,
    Synonym(&'a str),
}

fn is_shouted(name: &str) -> bool {
    let mut letters = name.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(char::is_uppercase)
}

fn is_snake_case(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

pub struct NamingRule;

impl Rule for NamingRule {
    fn name(&self) -> &'static str {
        "eos_naming"
    }

    fn check(&self, runner: &mut dyn Runner) -> Result<(), CheckError> {
        let config: NamingConfig = load_rule_config(runner, self.name())?;
        if !config.is_enabled() {
            return Ok(());
        }
        tracing::debug!(?config, "naming config");
        let reporter = Reporter::new(self.name(), config.severity());

        let mut visit = |runner: &mut dyn Runner, definition: &Definition| {
            config.check(runner, &reporter, definition)
        };
        walk_blocks(runner, LINTABLE_BLOCKS, &mut [&mut visit]);

        Ok(())
    }
}
