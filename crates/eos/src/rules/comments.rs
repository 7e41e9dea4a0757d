//! `eos_comments`: comment style
//!
//! Per comment: block comments, end-of-line comments, comments jammed against their marker and comments running past
//! a column limit. Per file: the share of lines carrying a comment.
use super::{CheckError, Rule};
use crate::config::{load_rule_config, RuleConfig};
use crate::rule_config;
use crate::runner::{Reporter, Runner};
use crate::syntax::{Pos, Range, Token, TokenKind};
use crate::visit::{walk_tokens, Visit};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Marker runs (`##`, `///`, `/**`) count as the marker
static JAMMED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(///*|##*|/\*\**)([^\s/#])").expect("jammed pattern must compile")
});
static JAMMED_STRICT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(//|#|/\*)\S").expect("jammed pattern must compile"));

#[derive(Deserialize, Default, Debug)]
struct CommentsConfig {
    enabled: Option<bool>,
    level: Option<String>,
    block: Option<bool>,
    eol: Option<bool>,
    jammed: Option<JammedConfig>,
    length: Option<LengthConfig>,
    /// minimum ratio of comment lines to content lines per file
    threshold: Option<f64>,
}
rule_config!(CommentsConfig);

#[derive(Deserialize, Default, Debug)]
struct JammedConfig {
    enabled: Option<bool>,
    tails: Option<bool>,
}

#[derive(Deserialize, Default, Debug)]
struct LengthConfig {
    column: Option<i64>,
    allow_url: Option<bool>,
}

impl CommentsConfig {
    fn jammed_pattern(&self) -> Option<&'static Regex> {
        let jammed = self.jammed.as_ref();
        if !jammed.and_then(|j| j.enabled).unwrap_or(true) {
            return None;
        }

        match jammed.and_then(|j| j.tails).unwrap_or(true) {
            true => Some(&*JAMMED),
            false => Some(&*JAMMED_STRICT),
        }
    }

    fn column(&self) -> i64 {
        self.length.as_ref().and_then(|l| l.column).unwrap_or(80)
    }

    fn allow_url(&self) -> bool {
        self.length.as_ref().and_then(|l| l.allow_url).unwrap_or(true)
    }

    /// `previous` is the closest non-comment token before `comment` in the same file
    fn classify(
        &self,
        runner: &mut dyn Runner,
        reporter: &Reporter,
        comment: &Token,
        previous: Option<&Token>,
    ) {
        let text = comment.text.as_str();
        let range = &comment.range;

        if self.block.unwrap_or(true) && text.starts_with("/*") {
            reporter.report(runner, "Avoid block comments.", range.clone());
        }

        if self.eol.unwrap_or(true) {
            if let Some(previous) = previous {
                if !previous.is(TokenKind::Newline) && previous.range.end.line == range.start.line
                {
                    reporter.report(runner, "Avoid EOL comments.", range.clone());
                }
            }
        }

        if let Some(pattern) = self.jammed_pattern() {
            if pattern.is_match(text) {
                let snippet: String = text.trim().chars().take(5).collect();
                reporter.report(
                    runner,
                    format!("Avoid jammed comment ('{snippet} ...')."),
                    range.clone(),
                );
            }
        }

        let column = self.column();
        if column > 0 {
            let trimmed = text.trim_end_matches(['\r', '\n']);
            let end = (range.start.column + trimmed.chars().count()) as i64 - 1;
            let has_url = trimmed.contains("http://") || trimmed.contains("https://");
            if end > column && !(has_url && self.allow_url()) {
                reporter.report(
                    runner,
                    format!("Wrap comment at column {column} (currently {end})."),
                    range.clone(),
                );
            }
        }
    }
}

/// Counts content and comment lines, reports when a file ends
struct Threshold {
    minimum: f64,
    reporter: Reporter,
    content_lines: BTreeSet<usize>,
    comment_lines: BTreeSet<usize>,
}

impl Threshold {
    fn new(minimum: f64, reporter: Reporter) -> Self {
        Self {
            minimum,
            reporter,
            content_lines: BTreeSet::new(),
            comment_lines: BTreeSet::new(),
        }
    }

    fn finish_file(&mut self, runner: &mut dyn Runner, filename: &str) {
        let content = std::mem::take(&mut self.content_lines).len();
        let comments = std::mem::take(&mut self.comment_lines).len();
        if content == 0 {
            return;
        }

        let ratio = comments as f64 / content as f64;
        tracing::trace!(filename, comments, content, ratio, "comment ratio");
        if ratio < self.minimum {
            let range = Range {
                filename: filename.to_string(),
                start: Pos::INITIAL,
                end: Pos::INITIAL,
            };
            self.reporter.report(
                runner,
                format!(
                    "Comments ratio is {:.0} percent (minimum threshold {:.0} percent)",
                    ratio * 100.0,
                    self.minimum * 100.0
                ),
                range,
            );
        }
    }
}

impl Visit<Token> for Threshold {
    fn visit(&mut self, runner: &mut dyn Runner, token: &Token) {
        match token.kind {
            TokenKind::Newline => {}
            TokenKind::Eof => self.finish_file(runner, &token.range.filename),
            kind => {
                let start = token.range.start.line;
                let mut end = token.range.end.line;
                // line comments end on column 1 of the following line
                if token.range.end.column == 1 && end > start {
                    end -= 1;
                }

                self.content_lines.extend(start..=end);
                if kind == TokenKind::Comment {
                    self.comment_lines.extend(start..=end);
                }
            }
        }
    }
}

pub struct CommentsRule;

impl Rule for CommentsRule {
    fn name(&self) -> &'static str {
        "eos_comments"
    }

    fn check(&self, runner: &mut dyn Runner) -> Result<(), CheckError> {
        let config: CommentsConfig = load_rule_config(runner, self.name())?;
        if !config.is_enabled() {
            return Ok(());
        }
        let reporter = Reporter::new(self.name(), config.severity());

        if let Some(minimum) = config.threshold {
            let mut threshold = Threshold::new(minimum, reporter);
            walk_tokens(runner, &mut [&mut threshold])?;
        }

        let mut previous: Option<Token> = None;
        let mut classify = |runner: &mut dyn Runner, token: &Token| match token.kind {
            TokenKind::Comment => config.classify(runner, &reporter, token, previous.as_ref()),
            TokenKind::Eof => previous = None,
            _ => previous = Some(token.clone()),
        };
        walk_tokens(runner, &mut [&mut classify])?;

        Ok(())
    }
}
