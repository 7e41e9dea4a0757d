//! `eos_meta`: meta-arguments
//!
//! `count` is only for guarding (`condition ? 1 : 0`), module sources pin a version and meta-arguments keep a
//! configured order.
use super::{CheckError, Rule};
use crate::config::{load_rule_config, RuleConfig};
use crate::rule_config;
use crate::runner::{Reporter, Runner};
use crate::syntax::{Attribute, Block, Expr, ExprKind, Range};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

const ONLY_DYNAMIC_GUARD: &str =
    "Avoid using count for anything other than dynamic guarding (condition ? 1 : 0).";
const GUARD_MUST_RETURN: &str = "Count guard must return 1 or 0.";
const MISORDERED: &str = "Meta arguments should be ordered consistently";

const ARCHIVE_EXTENSIONS: &[&str] = &[
    ".zip", ".bz2", ".tar.bz2", ".tar.tbz2", ".tbz2", ".gz", ".tar.gz", ".tgz", ".xz", ".tar.xz",
    ".txz",
];

static ARCHIVE_QUERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://.*\?.*archive=\..*&?").expect("archive pattern must compile")
});
/// `[host/]namespace/name/provider`
static REGISTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([a-zA-Z0-9.-]+)/)?([^/]+)/([^/]+)/([^/]+)$")
        .expect("registry pattern must compile")
});

#[derive(Deserialize, Default, Debug)]
struct MetaConfig {
    enabled: Option<bool>,
    level: Option<String>,
    source_version: Option<bool>,
    order: Option<OrderConfig>,
}
rule_config!(MetaConfig);

/// Arguments listed in `first` come before all others, those in `last` after all others
#[derive(Deserialize, Default, Debug)]
struct OrderConfig {
    #[serde(default)]
    first: Vec<String>,
    #[serde(default)]
    last: Vec<String>,
}

fn is_guard_value(expr: &Expr) -> bool {
    matches!(expr.as_number(), Some(n) if n == 0.0 || n == 1.0)
}

fn count_problem(count: &Expr) -> Option<&'static str> {
    match &count.kind {
        ExprKind::Conditional {
            true_expr,
            false_expr,
            ..
        } => {
            let guarded = is_guard_value(true_expr) && is_guard_value(false_expr);
            (!guarded).then_some(GUARD_MUST_RETURN)
        }
        _ => (!is_guard_value(count)).then_some(ONLY_DYNAMIC_GUARD),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ModuleSource {
    Local,
    Git,
    Https,
    Mercurial,
    Registry,
    Unknown,
}

impl ModuleSource {
    fn classify(source: &str) -> Self {
        let starts = |prefixes: &[&str]| prefixes.iter().any(|prefix| source.starts_with(prefix));
        if starts(&["./", "../", "/"]) {
            Self::Local
        } else if starts(&["git::", "git@", "github.com", "bitbucket.org"]) {
            Self::Git
        } else if starts(&["https://"]) {
            Self::Https
        } else if starts(&["hg::"]) {
            Self::Mercurial
        } else if REGISTRY.is_match(source) {
            Self::Registry
        } else {
            Self::Unknown
        }
    }
}

/// The problem with a registry version constraint list, if any
fn version_problem(version: &str) -> Option<&'static str> {
    for constraint in version.split(',').map(str::trim) {
        if let Some(pessimistic) = constraint.strip_prefix("~>") {
            if !pessimistic.trim().contains('.') {
                return Some(
                    "Pessimistic version constraint should specify at least major and minor version.",
                );
            }
            continue;
        }
        if constraint.starts_with('>') {
            return Some("Version constraint > or >= should not be used. Use ~> or exact version.");
        }
    }
    None
}

fn source_problem(module: &Block) -> Option<&'static str> {
    let source = module.body.attribute("source")?.as_string()?;
    let kind = ModuleSource::classify(&source);
    tracing::trace!(%source, ?kind, "module source");

    match kind {
        ModuleSource::Local | ModuleSource::Unknown => None,
        ModuleSource::Git => {
            (!source.contains("ref=")).then_some("Git module source should specify ref parameter.")
        }
        ModuleSource::Https => {
            let archive = ARCHIVE_EXTENSIONS.iter().any(|ext| source.ends_with(ext))
                || ARCHIVE_QUERY.is_match(&source);
            (!archive).then_some("https module source should specify a valid archive extension.")
        }
        ModuleSource::Mercurial => {
            (!source.contains('#')).then_some("Mercurial module source should specify #revision.")
        }
        ModuleSource::Registry => match module.body.attribute("version") {
            None => Some("Module from registry should specify version."),
            Some(version) => version_problem(&version.as_string()?),
        },
    }
}

impl OrderConfig {
    /// The first attribute out of order, by source line
    fn misplaced<'a>(&self, block: &'a Block) -> Option<&'a Attribute> {
        let mut attributes: Vec<_> = block.body.attributes.iter().collect();
        attributes.sort_by_key(|attribute| attribute.range.start.line);

        let is_first = |attribute: &Attribute| self.first.contains(&attribute.name);
        let is_last = |attribute: &Attribute| self.last.contains(&attribute.name);

        let mut seen_other = false;
        for &attribute in &attributes {
            if !is_first(attribute) {
                seen_other = true;
            } else if seen_other {
                return Some(attribute);
            }
        }

        let mut seen_last = false;
        for &attribute in &attributes {
            if is_last(attribute) {
                seen_last = true;
            } else if seen_last {
                return Some(attribute);
            }
        }

        None
    }
}

pub struct MetaRule;

impl Rule for MetaRule {
    fn name(&self) -> &'static str {
        "eos_meta"
    }

    fn check(&self, runner: &mut dyn Runner) -> Result<(), CheckError> {
        let config: MetaConfig = load_rule_config(runner, self.name())?;
        if !config.is_enabled() {
            return Ok(());
        }
        let reporter = Reporter::new(self.name(), config.severity());
        let source_version = config.source_version.unwrap_or(true);
        let order = config
            .order
            .as_ref()
            .filter(|order| !order.first.is_empty() || !order.last.is_empty());

        let mut issues: Vec<(&'static str, Range)> = Vec::new();
        for file in runner.files() {
            for block in &file.body.blocks {
                if let Some(count) = block.body.attribute("count") {
                    if let Some(message) = count_problem(&count.expr) {
                        issues.push((message, count.range.clone()));
                    }
                }
                if source_version && block.kind == "module" {
                    if let Some(message) = source_problem(block) {
                        issues.push((message, block.range.clone()));
                    }
                }
                if let Some(attribute) = order.and_then(|order| order.misplaced(block)) {
                    issues.push((MISORDERED, attribute.range.clone()));
                }
            }
        }

        for (message, range) in issues {
            reporter.report(runner, message, range);
        }

        Ok(())
    }
}
