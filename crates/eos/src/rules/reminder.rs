//! `eos_reminder`: TODO-style comments
use super::{CheckError, Rule};
use crate::config::{load_rule_config, RuleConfig};
use crate::rule_config;
use crate::runner::{Reporter, Runner};
use crate::syntax::{Token, TokenKind};
use crate::visit::walk_tokens;
use serde::Deserialize;

const DEFAULT_TAGS: &[&str] = &["BUG", "FIXME", "HACK", "TODO"];

#[derive(Deserialize, Default, Debug)]
struct ReminderConfig {
    enabled: Option<bool>,
    level: Option<String>,
    /// replaces the default tags
    tags: Option<Vec<String>>,
}
rule_config!(ReminderConfig);

impl ReminderConfig {
    fn tags(&self) -> Vec<String> {
        match &self.tags {
            Some(tags) => tags.iter().map(|tag| tag.to_uppercase()).collect(),
            None => DEFAULT_TAGS.iter().map(|tag| tag.to_string()).collect(),
        }
    }
}

/// Whether the comment's first word ends with a tag or its second word starts with one
fn has_reminder(comment: &str, tags: &[String]) -> bool {
    let upper = comment.to_uppercase();
    let Some((head, rest)) = upper.split_once(' ') else {
        return false;
    };
    let head = head.trim();

    tags.iter()
        .any(|tag| head.ends_with(tag.as_str()) || rest.starts_with(tag.as_str()))
}

pub struct ReminderRule;

impl Rule for ReminderRule {
    fn name(&self) -> &'static str {
        "eos_reminder"
    }

    fn check(&self, runner: &mut dyn Runner) -> Result<(), CheckError> {
        let config: ReminderConfig = load_rule_config(runner, self.name())?;
        if !config.is_enabled() {
            return Ok(());
        }
        let reporter = Reporter::new(self.name(), config.severity());
        let tags = config.tags();

        let mut visit = |runner: &mut dyn Runner, token: &Token| {
            if token.is(TokenKind::Comment) && has_reminder(&token.text, &tags) {
                reporter.report(
                    runner,
                    format!("Resolve reminder: '{}'.", token.text.trim()),
                    token.range.clone(),
                );
            }
        };
        walk_tokens(runner, &mut [&mut visit])?;

        Ok(())
    }
}
