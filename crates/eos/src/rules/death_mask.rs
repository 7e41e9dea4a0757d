//! `eos_death_mask`: commented-out code
//!
//! Adjacent comments are gathered into runs. Each run is stripped of its comment markers and parsed again, dropping
//! leading lines until something parses into at least one attribute or block.
use super::{CheckError, Rule};
use crate::config::{load_rule_config, RuleConfig};
use crate::rule_config;
use crate::runner::{Reporter, Runner};
use crate::syntax::{Token, TokenKind};
use crate::visit::{walk_tokens, Visit};
use serde::Deserialize;

#[derive(Deserialize, Default, Debug)]
struct DeathMaskConfig {
    enabled: Option<bool>,
    level: Option<String>,
}
rule_config!(DeathMaskConfig);

/// Groups comment tokens into runs without blank lines or code between them
#[derive(Debug)]
struct CommentRuns {
    reporter: Reporter,
    run: Vec<Token>,
}

impl CommentRuns {
    fn new(reporter: Reporter) -> Self {
        Self {
            reporter,
            run: Vec::new(),
        }
    }

    fn flush(&mut self, runner: &mut dyn Runner) {
        let run = std::mem::take(&mut self.run);
        let (Some(first), Some(last)) = (run.first(), run.last()) else {
            return;
        };

        if contains_code(&comment_lines(&run)) {
            self.reporter.report(
                runner,
                "Avoid commented-out code.",
                first.range.to(&last.range),
            );
        }
    }
}

impl Visit<Token> for CommentRuns {
    fn visit(&mut self, runner: &mut dyn Runner, token: &Token) {
        match token.kind {
            TokenKind::Comment => {
                let gap = self
                    .run
                    .last()
                    .is_some_and(|last| token.range.start.line > last.range.end.line);
                if gap {
                    tracing::trace!(line = token.range.start.line, "comment run interrupted");
                    self.flush(runner);
                }
                self.run.push(token.clone());
            }
            TokenKind::Newline => {}
            // code ends a run, and so does the end of a file
            _ => self.flush(runner),
        }
    }
}

/// Comment text without markers, one entry per line
fn comment_lines(run: &[Token]) -> Vec<String> {
    let mut lines = Vec::new();
    for token in run {
        let text = token.text.as_str();
        if let Some(line) = text.strip_prefix("//").or_else(|| text.strip_prefix('#')) {
            let line = line.strip_prefix(' ').unwrap_or(line);
            lines.push(line.trim_end_matches(['\r', '\n']).to_string());
        } else if let Some(block) = text.strip_prefix("/*") {
            let block = block.strip_suffix("*/").unwrap_or(block);
            lines.extend(block.split('\n').map(str::to_string));
        }
    }
    lines
}

/// Whether any suffix of `lines`, longest first, parses into a non-empty body
fn contains_code(lines: &[String]) -> bool {
    (0..lines.len()).any(|start| {
        let candidate = lines[start..].join("\n");
        match hcl_edit::parser::parse_body(&candidate) {
            Ok(body) => {
                let found = body.attributes().next().is_some() || body.blocks().next().is_some();
                if found {
                    tracing::trace!(start, "comment parses as code");
                }
                found
            }
            Err(_) => false,
        }
    })
}

pub struct DeathMaskRule;

impl Rule for DeathMaskRule {
    fn name(&self) -> &'static str {
        "eos_death_mask"
    }

    fn check(&self, runner: &mut dyn Runner) -> Result<(), CheckError> {
        let config: DeathMaskConfig = load_rule_config(runner, self.name())?;
        if !config.is_enabled() {
            return Ok(());
        }

        let mut runs = CommentRuns::new(Reporter::new(self.name(), config.severity()));
        walk_tokens(runner, &mut [&mut runs])?;
        runs.flush(runner);

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::workspace;
    use pretty_assertions::assert_eq;

    #[test]
    fn prose_is_not_code() {
        let mut workspace = workspace!("# This bucket stores the logs.\n# Keep it private\nx = 1\n");
        DeathMaskRule.check(&mut workspace).unwrap();
        assert_eq!(workspace.messages(), Vec::<&str>::new());
    }

    #[test]
    fn commented_attribute() {
        let source = "# instance_type = \"t2.micro\"\nx = 1\n";
        let mut workspace = workspace!(source);
        DeathMaskRule.check(&mut workspace).unwrap();

        assert_eq!(workspace.messages(), vec!["Avoid commented-out code."]);
        let range = &workspace.issues()[0].range;
        assert_eq!(range.start.line, 1);
        assert_eq!(range.start.column, 1);
    }

    #[test]
    fn prose_header_before_code() {
        let source = r#"
// Old configuration, kept for reference:
// resource "aws_instance" "web" {
//   ami = "abc"
// }

/*
locals {
  name = "x"
}
*/

# one
# two
"#;
        let mut workspace = workspace!(source);
        DeathMaskRule.check(&mut workspace).unwrap();

        assert_eq!(
            workspace.messages(),
            vec!["Avoid commented-out code.", "Avoid commented-out code."]
        );
        let first = &workspace.issues()[0].range;
        assert_eq!(first.start.line, 2);
        // the run covers all four comment lines
        assert_eq!(first.end.line, 6);
    }

    #[test]
    fn runs_end_with_the_file() {
        let mut workspace = workspace! {
            "a.tf" => "# a = 1\n",
            "b.tf" => "# b = 2\n",
        };
        DeathMaskRule.check(&mut workspace).unwrap();

        assert_eq!(
            workspace.messages(),
            vec!["Avoid commented-out code.", "Avoid commented-out code."]
        );
        assert_eq!(workspace.issues()[0].range.filename, "a.tf");
        assert_eq!(workspace.issues()[1].range.filename, "b.tf");
    }

    #[test]
    fn code_interrupts_runs() {
        let source = "# enabled =\nx = 1\n# true\n";
        let mut workspace = workspace!(source);
        DeathMaskRule.check(&mut workspace).unwrap();
        assert_eq!(workspace.messages(), Vec::<&str>::new());
    }

    #[test]
    fn strip_markers() {
        let run = crate::syntax::lex("// a = 1\n#b = 2\n/* c = 3\nd = 4 */", "test.tf")
            .unwrap()
            .into_iter()
            .filter(|token| token.is(TokenKind::Comment))
            .collect::<Vec<_>>();
        assert_eq!(
            comment_lines(&run),
            vec!["a = 1", "b = 2", " c = 3", "d = 4 "]
        );
    }
}
