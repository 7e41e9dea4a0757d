//! `eos_hungarian`: type tags in names
use super::{CheckError, Rule};
use crate::config::{load_rule_config, RuleConfig};
use crate::rule_config;
use crate::runner::{Reporter, Runner};
use crate::visit::{walk_blocks, Definition, LINTABLE_BLOCKS};
use serde::Deserialize;

const DEFAULT_TAGS: &[&str] = &[
    "str", "int", "num", "bool", "list", "lst", "set", "map", "arr", "array",
];

#[derive(Deserialize, Default, Debug)]
struct HungarianConfig {
    enabled: Option<bool>,
    level: Option<String>,
    /// added to the default tags
    #[serde(default)]
    tags: Vec<String>,
}
rule_config!(HungarianConfig);

impl HungarianConfig {
    fn tags(&self) -> impl Iterator<Item = &str> {
        DEFAULT_TAGS
            .iter()
            .copied()
            .chain(self.tags.iter().map(String::as_str))
    }

    /// The first tag `name` starts with, ends with or contains after an underscore
    fn find_tag(&self, name: &str) -> Option<&str> {
        self.tags().find(|tag| {
            name.starts_with(tag) || name.ends_with(tag) || name.contains(&format!("_{tag}"))
        })
    }
}

pub struct HungarianRule;

impl Rule for HungarianRule {
    fn name(&self) -> &'static str {
        "eos_hungarian"
    }

    fn check(&self, runner: &mut dyn Runner) -> Result<(), CheckError> {
        let config: HungarianConfig = load_rule_config(runner, self.name())?;
        if !config.is_enabled() {
            return Ok(());
        }
        let reporter = Reporter::new(self.name(), config.severity());

        let mut visit = |runner: &mut dyn Runner, definition: &Definition| {
            if let Some(tag) = config.find_tag(&definition.name) {
                reporter.report(
                    runner,
                    format!("Avoid Hungarian notation '{tag}' in '{}'.", definition.name),
                    definition.range.clone(),
                );
            }
        };
        walk_blocks(runner, LINTABLE_BLOCKS, &mut [&mut visit]);

        Ok(())
    }
}
