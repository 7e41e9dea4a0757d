mod cli;

use anyhow::Context;
use eos::config::{ConfigFile, Severity};
use eos::rules::{all_rules, Rule};
use eos::runner::Issue;
use eos::source::Workspace;
use serde::Serialize;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("EOS_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(2);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err);
                    std::process::exit(2);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Lint(lint_cli) => lint(lint_cli),
        cli::Command::Rules(rules_cli) => rules(rules_cli).map(|()| true),
    };

    match command_result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            for error in e.chain() {
                eprintln!("{error}")
            }
            std::process::exit(2);
        }
    }
}

/// Lint a module, `false` if any issue has severity error
pub fn lint(cli: cli::LintCommand) -> anyhow::Result<bool> {
    let config = ConfigFile::discover(cli.config.as_deref())?;
    let module = match cli.module {
        Some(module) => module,
        None => std::env::current_dir()?,
    };

    let mut workspace = Workspace::default()
        .with_config(config)
        .with_root_module(!cli.not_root);
    workspace
        .load_directory(&module)
        .with_context(|| format!("Failed to load module {}", module.display()))?;

    for rule in selected_rules(&cli.rules)? {
        tracing::debug!(rule = rule.name(), "checking");
        rule.check(&mut workspace)
            .with_context(|| format!("Rule {} failed", rule.name()))?;
    }

    let issues = workspace.take_issues();
    output(cli.output.format, &issues, |issue: &Issue| {
        format!(
            "{}:{}:{}: {}: {} ({})",
            issue.range.filename,
            issue.range.start.line,
            issue.range.start.column,
            issue.severity,
            issue.message,
            issue.rule
        )
    })?;

    Ok(!issues.iter().any(|issue| issue.severity == Severity::Error))
}

fn selected_rules(names: &[String]) -> anyhow::Result<Vec<Box<dyn Rule>>> {
    let rules = all_rules();
    for name in names {
        anyhow::ensure!(
            rules.iter().any(|rule| rule.name() == name),
            "Unknown rule {name}"
        );
    }

    Ok(rules
        .into_iter()
        .filter(|rule| names.is_empty() || names.iter().any(|name| name == rule.name()))
        .collect())
}

#[derive(Serialize)]
struct RuleInfo {
    name: &'static str,
    enabled: bool,
    link: String,
}

/// Print the registry
pub fn rules(cli: cli::RulesCommand) -> anyhow::Result<()> {
    let rules: Vec<_> = all_rules()
        .iter()
        .map(|rule| RuleInfo {
            name: rule.name(),
            enabled: rule.enabled_by_default(),
            link: rule.link(),
        })
        .collect();

    output(cli.output.format, &rules, |rule: &RuleInfo| {
        format!("{}\t{}", rule.name, rule.link)
    })
}

fn output<T: Serialize>(
    format: cli::OutputFormat,
    items: &[T],
    text: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    match format {
        cli::OutputFormat::Text => items.iter().for_each(|item| println!("{}", text(item))),
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), items)?,
        cli::OutputFormat::Json => {
            serde_json::to_writer_pretty(std::io::stdout(), items)?;
            println!();
        }
    };

    Ok(())
}
