//! `eos_dry`: repeated values and duplicate blocks
//!
//! Templates, lists, maps and `for` expressions are fingerprinted by their exact source text. Resource and data blocks
//! are fingerprinted by a hash over their sorted, whitespace-free attributes.
use super::{CheckError, Rule};
use crate::config::{load_rule_config, RuleConfig};
use crate::rule_config;
use crate::runner::{Reporter, Runner};
use crate::syntax::{Block, Body, Expr, ExprKind, Range};
use indexmap::IndexMap;
use serde::Deserialize;
use sha2::{Digest, Sha256};

const MINIMUM_THRESHOLD: i64 = 2;

#[derive(Deserialize, Default, Debug)]
struct DryConfig {
    enabled: Option<bool>,
    level: Option<String>,
    threshold: Option<i64>,
}
rule_config!(DryConfig);

impl DryConfig {
    fn threshold(&self) -> usize {
        self.threshold
            .unwrap_or(MINIMUM_THRESHOLD)
            .max(MINIMUM_THRESHOLD) as usize
    }
}

/// Occurrences per fingerprint, in order of first sighting
type Occurrences = IndexMap<String, Vec<Range>>;

fn collect_values(body: &Body, source: &str, in_module: bool, values: &mut Occurrences) {
    for attribute in &body.attributes {
        if in_module && attribute.name == "source" {
            continue;
        }
        collect_expr(&attribute.expr, source, values);
    }

    for block in &body.blocks {
        collect_values(&block.body, source, block.kind == "module", values);
    }
}

fn collect_expr(expr: &Expr, source: &str, values: &mut Occurrences) {
    let candidate = matches!(
        expr.kind,
        ExprKind::Template(_) | ExprKind::Tuple(_) | ExprKind::Object(_) | ExprKind::For { .. }
    );
    if candidate && !expr.references("count") && !expr.references("each") {
        let text = expr.text(source);
        if !text.is_empty() {
            values
                .entry(text.to_string())
                .or_default()
                .push(expr.range.clone());
        }
    }

    match &expr.kind {
        // items are part of their collection's fingerprint
        ExprKind::Tuple(_) | ExprKind::Object(_) => {}
        _ => {
            for child in expr.children() {
                collect_expr(child, source, values);
            }
        }
    }
}

fn value_message(text: &str, count: usize) -> String {
    if text.starts_with('[') {
        format!("Avoid repeating list {count} times.")
    } else if text.starts_with('{') {
        format!("Avoid repeating map {count} times.")
    } else {
        format!("Avoid repeating value '{text}' {count} times.")
    }
}

fn collect_blocks(body: &Body, source: &str, blocks: &mut Occurrences) {
    for block in &body.blocks {
        if block.kind == "resource" || block.kind == "data" {
            blocks
                .entry(block_fingerprint(block, source))
                .or_default()
                .push(block.range.clone());
        }
        collect_blocks(&block.body, source, blocks);
    }
}

/// Hash of `kind {name=text;...}` with attributes sorted by name and whitespace removed
fn block_fingerprint(block: &Block, source: &str) -> String {
    let mut attributes: Vec<_> = block.body.attributes.iter().collect();
    attributes.sort_by(|a, b| a.name.cmp(&b.name));

    let mut normalized = format!("{} {{", block.kind);
    for attribute in attributes {
        let text = attribute.range.slice(source).unwrap_or_default();
        normalized.push_str(&attribute.name);
        normalized.push('=');
        normalized.extend(text.chars().filter(|c| !matches!(c, ' ' | '\t' | '\n' | '\r')));
        normalized.push(';');
    }
    normalized.push('}');

    Sha256::digest(normalized.as_bytes())
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Earliest range of every fingerprint seen at least `threshold` times
fn repeated(
    occurrences: Occurrences,
    threshold: usize,
    runner: &dyn Runner,
) -> Vec<(String, usize, Range)> {
    occurrences
        .into_iter()
        .filter(|(_, ranges)| ranges.len() >= threshold)
        .filter_map(|(fingerprint, ranges)| {
            let count = ranges.len();
            let first = ranges
                .into_iter()
                .min_by_key(|range| (runner.file_order(&range.filename), range.start.byte))?;
            Some((fingerprint, count, first))
        })
        .collect()
}

pub struct DryRule;

impl Rule for DryRule {
    fn name(&self) -> &'static str {
        "eos_dry"
    }

    fn check(&self, runner: &mut dyn Runner) -> Result<(), CheckError> {
        let config: DryConfig = load_rule_config(runner, self.name())?;
        if !config.is_enabled() {
            return Ok(());
        }
        let reporter = Reporter::new(self.name(), config.severity());
        let threshold = config.threshold();

        let mut values = Occurrences::new();
        let mut blocks = Occurrences::new();
        for file in runner.files() {
            collect_values(&file.body, &file.text, false, &mut values);
            collect_blocks(&file.body, &file.text, &mut blocks);
        }
        tracing::trace!(
            values = values.len(),
            blocks = blocks.len(),
            "collected fingerprints"
        );

        let values = repeated(values, threshold, runner);
        let blocks = repeated(blocks, threshold, runner);
        for (text, count, range) in values {
            reporter.report(runner, value_message(&text, count), range);
        }
        for (_, count, range) in blocks {
            reporter.report(runner, format!("Duplicate block found {count} times."), range);
        }

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
        DryRule.check(&mut workspace).unwrap();
        workspace
    }

    fn with_threshold(workspace: Workspace, threshold: i64) -> Workspace {
        let config = format!("rule \"eos_dry\" {{\n  threshold = {threshold}\n}}\n");
        check(workspace.with_config(Some(ConfigFile::parse(".tflint.hcl", &config).unwrap())))
    }

    #[test]
    fn repeated_list() {
        let workspace = check(workspace!(
            r#"resource "a" "x" {
  tags = ["a","b"]
}

resource "a" "y" {
  names = ["a","b"]
}
"#
        ));

        assert_eq!(workspace.messages(), vec!["Avoid repeating list 2 times."]);
        let range = &workspace.issues()[0].range;
        assert_eq!((range.start.line, range.start.column), (2, 10));
    }

    #[test]
    fn repeated_value_and_map() {
        let workspace = check(workspace!(
            r#"
a = "hello"
b = { x = 1 }
c = "hello"
d = { x = 1 }
e = "single"
"#
        ));

        assert_eq!(
            workspace.messages(),
            vec![
                "Avoid repeating value '\"hello\"' 2 times.",
                "Avoid repeating map 2 times."
            ]
        );
    }

    #[test]
    fn nested_candidates() {
        let workspace = check(workspace!(
            r#"
a = upper("prefix")
b = var.x ? "prefix" : "other"
"#
        ));

        assert_eq!(
            workspace.messages(),
            vec!["Avoid repeating value '\"prefix\"' 2 times."]
        );
    }

    #[test]
    fn for_expressions() {
        let workspace = check(workspace!(
            r#"
a = [for s in var.list : upper(s)]
b = [for s in var.list : upper(s)]
c = {for k, v in var.map : k => v}
d = {for k, v in var.map : k => v}
"#
        ));

        assert_eq!(
            workspace.messages(),
            vec!["Avoid repeating list 2 times.", "Avoid repeating map 2 times."]
        );
    }

    #[test]
    fn heredoc_templates() {
        let workspace = check(workspace!(
            "a = <<-EOT\n  hello ${var.name}\n  EOT\nb = <<-EOT\n  hello ${var.name}\n  EOT\n"
        ));

        assert_eq!(workspace.issues().len(), 1);
        assert!(workspace.messages()[0].starts_with("Avoid repeating value '<<-EOT"));
        assert!(workspace.messages()[0].ends_with("' 2 times."));
        assert_eq!(workspace.issues()[0].range.start.line, 1);
    }

    #[test]
    fn skips_iteration_and_module_sources() {
        let workspace = check(workspace!(
            r#"
resource "a" "x" {
  count = 2
  name  = "web-${count.index}"
}

resource "a" "y" {
  for_each = var.m
  name     = "web-${count.index}"
  key      = "k-${each.key}"
}

resource "a" "z" {
  key = "k-${each.key}"
}

module "one" {
  source = "./modules/thing"
}

module "two" {
  source = "./modules/thing"
}
"#
        ));

        assert_eq!(workspace.messages(), Vec::<&str>::new());
    }

    #[test]
    fn threshold_is_monotonic() {
        let source = "a = [1]\nb = [1]\nc = [1]\nd = [2]\ne = [2]\n";

        let counts: Vec<_> = [1, 2, 3, 4]
            .into_iter()
            .map(|threshold| with_threshold(workspace!(source), threshold).issues().len())
            .collect();
        // below 2 counts as 2
        assert_eq!(counts, vec![2, 2, 1, 0]);
        assert!(counts.windows(2).all(|pair| pair[1] <= pair[0]));
    }

    #[test]
    fn first_occurrence_across_files() {
        let workspace = check(workspace! {
            "a.tf" => "\n\n\nx = [1]\n",
            "b.tf" => "y = [1]\n",
        });

        assert_eq!(workspace.messages(), vec!["Avoid repeating list 2 times."]);
        assert_eq!(workspace.issues()[0].range.filename, "a.tf");
        assert_eq!(workspace.issues()[0].range.start.line, 4);
    }

    #[test]
    fn duplicate_blocks() {
        let workspace = check(workspace!(
            r#"resource "aws_instance" "a" {
  ami  = "x"
  type = "t2"
}

resource "aws_instance" "b" {
  type = "t2"
  ami = "x"
}

data "aws_instance" "c" {
  ami  = "x"
  type = "t2"
}
"#
        ));

        assert_eq!(
            workspace.messages(),
            vec![
                "Avoid repeating value '\"x\"' 3 times.",
                "Avoid repeating value '\"t2\"' 3 times.",
                "Duplicate block found 2 times.",
            ]
        );
        let range = &workspace.issues()[2].range;
        assert_eq!(range.start.line, 1);
        assert!(range.end.line >= 4);
    }
}
