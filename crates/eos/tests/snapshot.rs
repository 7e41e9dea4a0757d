//! Snapshot tests
//!
//! Runs every rule over the files in /tests/fixtures/ and compares the issues they report.
use eos::rules::all_rules;
use eos::runner::Runner;
use eos::source::{SourceFile, Workspace};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("EOS_LOG"))
        .with_writer(std::io::stderr)
        .try_init();
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// `line:column [rule] message` per issue
fn lint(path: &Path) -> String {
    init_logging();

    let text = std::fs::read_to_string(path).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    let mut workspace = Workspace::default();
    workspace.insert(SourceFile::parse(name, text).unwrap());

    for rule in all_rules() {
        rule.check(&mut workspace).unwrap();
    }

    workspace
        .issues()
        .iter()
        .map(|issue| {
            format!(
                "{}:{} [{}] {}",
                issue.range.start.line, issue.range.start.column, issue.rule, issue.message
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn naming() {
    insta::assert_snapshot!(lint(&fixture("naming.tf")), @r###"
    3:1 [eos_hungarian] Avoid Hungarian notation 'str' in 'str_region'.
    1:1 [eos_naming] Avoid SHOUTED names (REGION)
    1:1 [eos_naming] Names should be snake_case (REGION).
    5:1 [eos_naming] Avoid echoing type "aws_s3_bucket" in label "log_bucket".
    "###);
}

#[test]
fn comments() {
    insta::assert_snapshot!(lint(&fixture("comments.tf")), @r###"
    1:1 [eos_comments] Avoid jammed comment ('#Jamm ...').
    2:33 [eos_comments] Avoid EOL comments.
    7:1 [eos_comments] Avoid block comments.
    6:1 [eos_reminder] Resolve reminder: '// TODO: rotate keys'.
    "###);
}

#[test]
fn meta() {
    insta::assert_snapshot!(lint(&fixture("meta.tf")), @r###"
    3:11 [eos_dry] Avoid repeating value '"ami-123"' 2 times.
    16:12 [eos_heredoc] Avoid standard heredoc (<<). Use indented (<<-) instead.
    16:12 [eos_heredoc] Avoid using 'EOF' as the heredoc delimiter.
    7:3 [eos_meta] Avoid using count for anything other than dynamic guarding (condition ? 1 : 0).
    11:1 [eos_meta] Module from registry should specify version.
    "###);
}

#[test]
fn dead_code() {
    insta::assert_snapshot!(
        lint(&fixture("dead_code.tf")),
        @"1:1 [eos_death_mask] Avoid commented-out code."
    );
}

#[test]
fn idempotent() {
    insta::glob!("fixtures/*.tf", |path| {
        assert_eq!(lint(path), lint(path));
    });
}

#[test]
fn whole_module() {
    init_logging();

    let mut workspace = Workspace::default();
    workspace.load_directory(&fixture("")).unwrap();
    assert_eq!(workspace.files().len(), 4);

    for rule in all_rules() {
        rule.check(&mut workspace).unwrap();
    }
    // in comments.tf, dead_code.tf and twice in meta.tf
    assert!(workspace
        .messages()
        .contains(&"Avoid repeating value '\"ami-123\"' 4 times."));
}
