//! The ruleset
//!
//! Each rule reads its own `rule "<name>"` block from the configuration, walks the files of the [Runner] and reports
//! [crate::runner::Issue]s. Rules share nothing with each other and hold no state between checks.
mod comments;
mod death_mask;
mod dry;
mod heredoc;
mod hungarian;
mod meta;
mod naming;
mod reminder;

pub use comments::CommentsRule;
pub use death_mask::DeathMaskRule;
pub use dry::DryRule;
pub use heredoc::HeredocRule;
pub use hungarian::HungarianRule;
pub use meta::MetaRule;
pub use naming::NamingRule;
pub use reminder::ReminderRule;

use crate::config::ConfigError;
use crate::runner::Runner;
use crate::syntax::LexError;

const DOCS: &str = "https://github.com/staranto/tflint-ruleset-elements-of-style/blob/main/docs/rules";

pub trait Rule {
    fn name(&self) -> &'static str;

    fn link(&self) -> String {
        format!("{DOCS}/{}.md", self.name())
    }

    fn enabled_by_default(&self) -> bool {
        true
    }

    /// Check all files of the runner, reporting issues through it
    fn check(&self, runner: &mut dyn Runner) -> Result<(), CheckError>;
}

/// Fatal for one rule's check pass
#[derive(thiserror::Error, Debug)]
pub enum CheckError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unable to tokenize source")]
    Lex(#[from] LexError),
}

/// All rules, in a fixed order
pub fn all_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(CommentsRule),
        Box::new(DeathMaskRule),
        Box::new(DryRule),
        Box::new(HeredocRule),
        Box::new(HungarianRule),
        Box::new(MetaRule),
        Box::new(NamingRule),
        Box::new(ReminderRule),
    ]
}
