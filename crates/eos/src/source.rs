//! Files of the module being linted
//!
//! A [SourceFile] is parsed once with [hcl_edit] and lowered into the crate's own [Body]. The token stream is not
//! kept, token walkers lex the text again when they run.
//!
//! [Workspace] is the in-process [Runner]: it holds the files, the configuration and collects issues in the order
//! they are emitted.
use crate::config::ConfigFile;
use crate::runner::{EmitError, Issue, Runner};
use crate::syntax::{Body, LineIndex, Lowering};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
    pub body: Body,
    pub index: LineIndex,
}

impl SourceFile {
    pub fn parse(name: impl Into<String>, text: impl Into<String>) -> Result<Self, LoadError> {
        let name = name.into();
        let text = text.into();
        let parsed = hcl_edit::parser::parse_body(&text).map_err(|source| LoadError::HclParseFailed {
            name: name.clone(),
            source,
        })?;

        let index = LineIndex::new(name.clone(), &text);
        let body = Lowering {
            source: &text,
            index: &index,
        }
        .body(&parsed);

        Ok(Self {
            name,
            text,
            body,
            index,
        })
    }
}

#[derive(Debug)]
pub struct Workspace {
    files: Vec<SourceFile>,
    root_module: bool,
    config: Option<ConfigFile>,
    issues: Vec<Issue>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Workspace {
    pub fn new(files: Vec<SourceFile>) -> Self {
        Self {
            files,
            root_module: true,
            config: None,
            issues: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: Option<ConfigFile>) -> Self {
        self.config = config;
        self
    }

    pub fn with_root_module(mut self, root_module: bool) -> Self {
        self.root_module = root_module;
        self
    }

    pub fn insert(&mut self, file: SourceFile) {
        self.files.push(file);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn take_issues(&mut self) -> Vec<Issue> {
        std::mem::take(&mut self.issues)
    }

    /// Messages of all collected issues, in emission order
    pub fn messages(&self) -> Vec<&str> {
        self.issues
            .iter()
            .map(|issue| issue.message.as_str())
            .collect()
    }

    pub fn load_file(&mut self, file_path: &Path) -> Result<(), LoadError> {
        tracing::info!(path = %file_path.display(), "loading file");

        let text = std::fs::read_to_string(file_path)?;
        let name = file_path.display().to_string();
        self.insert(SourceFile::parse(name, text)?);
        Ok(())
    }

    /// Load all `*.tf` files of a directory, sorted by name
    pub fn load_directory(&mut self, dir_path: &Path) -> Result<(), LoadError> {
        let mut paths = Vec::new();
        for dir_entry in std::fs::read_dir(dir_path)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }

            let is_tf_file = dir_entry.file_name().to_string_lossy().ends_with(".tf");
            if is_tf_file {
                paths.push(dir_entry.path());
            }
        }

        if paths.is_empty() {
            return Err(LoadError::NoFilesFound(dir_path.display().to_string()));
        }

        paths.sort();
        for path in paths {
            self.load_file(&path)?;
        }
        Ok(())
    }
}

impl Runner for Workspace {
    fn files(&self) -> &[SourceFile] {
        &self.files
    }

    fn is_root_module(&self) -> bool {
        self.root_module
    }

    fn config(&self) -> Option<&ConfigFile> {
        self.config.as_ref()
    }

    fn emit_issue(&mut self, issue: Issue) -> Result<(), EmitError> {
        if !self.files.iter().any(|file| file.name == issue.range.filename) {
            return Err(EmitError::UnknownFile(issue.range));
        }
        self.issues.push(issue);
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("No .tf files found in directory {0}")]
    NoFilesFound(String),
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse {name}")]
    HclParseFailed {
        name: String,
        #[source]
        source: hcl_edit::parser::Error,
    },
}

/// Utility macro to create a [Workspace]
///
/// Create from a single file (named `main.tf`)
/// ```
/// # use eos::workspace;
/// workspace!("attribute = 42");
/// ```
///
/// Create from multiple files
/// ```
/// # use eos::workspace;
/// workspace! {
///   "one.tf" => "attribute_one = 1",
///   "two.tf" => "attribute_two = 2"
/// };
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use eos::workspace;
/// workspace!("not = valid = hcl");
/// ```
#[macro_export]
macro_rules! workspace {
    // single file
    { $expr:expr } => {
        $crate::workspace! { "main.tf" => $expr }
    };
    // multiple files
    { $($name:expr => $expr:expr),+ $(,)? } => {{
        let mut workspace = $crate::source::Workspace::default();
        $(
            workspace.insert($crate::source::SourceFile::parse($name, $expr).expect("file must parse"));
        )+
        workspace
    }};
}
