//! `eos_heredoc`: heredoc openers
use super::{CheckError, Rule};
use crate::config::{load_rule_config, RuleConfig};
use crate::rule_config;
use crate::runner::{Reporter, Runner};
use crate::syntax::{Token, TokenKind};
use crate::visit::walk_tokens;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

static HEREDOC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<<(-?)([a-zA-Z0-9]+)\s*$").expect("heredoc pattern must compile")
});

#[derive(Deserialize, Default, Debug)]
struct HeredocConfig {
    enabled: Option<bool>,
    level: Option<String>,
    /// flag `EOF` as the delimiter
    #[serde(alias = "EOF")]
    eof: Option<bool>,
}
rule_config!(HeredocConfig);

pub struct HeredocRule;

impl Rule for HeredocRule {
    fn name(&self) -> &'static str {
        "eos_heredoc"
    }

    fn check(&self, runner: &mut dyn Runner) -> Result<(), CheckError> {
        let config: HeredocConfig = load_rule_config(runner, self.name())?;
        if !config.is_enabled() {
            return Ok(());
        }
        let reporter = Reporter::new(self.name(), config.severity());
        let check_eof = config.eof.unwrap_or(true);

        let mut visit = |runner: &mut dyn Runner, token: &Token| {
            if !token.is(TokenKind::HeredocOpen) {
                return;
            }
            let Some(captures) = HEREDOC.captures(&token.text) else {
                return;
            };

            if captures[1].is_empty() {
                reporter.report(
                    runner,
                    "Avoid standard heredoc (<<). Use indented (<<-) instead.",
                    token.range.clone(),
                );
            }
            if check_eof && &captures[2] == "EOF" {
                reporter.report(
                    runner,
                    "Avoid using 'EOF' as the heredoc delimiter.",
                    token.range.clone(),
                );
            }
        };
        walk_tokens(runner, &mut [&mut visit])?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::ConfigFile;
    use crate::source::Workspace;
    use crate::workspace;
    use pretty_assertions::assert_eq;

    fn check(mut workspace: Workspace) -> Workspace {
        HeredocRule.check(&mut workspace).unwrap();
        workspace
    }

    #[test]
    fn standard_eof() {
        let workspace = check(workspace!("a = <<EOF\nhello\nEOF\n"));
        assert_eq!(
            workspace.messages(),
            vec![
                "Avoid standard heredoc (<<). Use indented (<<-) instead.",
                "Avoid using 'EOF' as the heredoc delimiter.",
            ]
        );
        let range = &workspace.issues()[0].range;
        assert_eq!((range.start.line, range.start.column), (1, 5));
    }

    #[test]
    fn indented() {
        let workspace = check(workspace!("a = <<-EOF\n  hello\n  EOF\n"));
        assert_eq!(
            workspace.messages(),
            vec!["Avoid using 'EOF' as the heredoc delimiter."]
        );

        let workspace = check(workspace!("a = <<-END\n  hello\n  END\n"));
        assert_eq!(workspace.messages(), Vec::<&str>::new());
    }

    #[test]
    fn strip_markers_and_trailing_blanks() {
        let workspace = check(workspace!(
            "a = <<-EOT\n  %{ for x in var.l ~}${x}%{ endfor ~}\n  EOT  \nb = \"${~ c ~}\"\n"
        ));
        assert_eq!(workspace.messages(), Vec::<&str>::new());
    }

    #[test]
    fn eof_check_can_be_disabled() {
        let config =
            ConfigFile::parse(".tflint.hcl", "rule \"eos_heredoc\" {\n  EOF = false\n}\n")
                .unwrap();
        let workspace =
            check(workspace!("a = <<-EOF\n  hello\n  EOF\n").with_config(Some(config)));
        assert_eq!(workspace.messages(), Vec::<&str>::new());
    }
}
