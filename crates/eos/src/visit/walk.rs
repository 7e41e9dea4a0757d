use super::Visit;
use crate::runner::Runner;
use crate::syntax::{lex, Block, LexError, Range, Token};

/// A block keyword that is linted, with the role of its labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDef {
    pub kind: &'static str,
    pub labels: &'static [&'static str],
    pub synonym: Option<&'static str>,
}

impl BlockDef {
    pub const fn new(kind: &'static str, labels: &'static [&'static str]) -> Self {
        Self {
            kind,
            labels,
            synonym: None,
        }
    }
}

/// Every top-level block keyword with a name worth linting
///
/// `locals` is absent on purpose, [walk_blocks] visits its attributes instead.
pub const LINTABLE_BLOCKS: &[BlockDef] = &[
    BlockDef::new("variable", &["name"]),
    BlockDef::new("check", &["name"]),
    BlockDef::new("data", &["type", "name"]),
    BlockDef::new("ephemeral", &["type", "name"]),
    BlockDef::new("module", &["name"]),
    BlockDef::new("output", &["name"]),
    BlockDef::new("resource", &["type", "name"]),
];

/// A visited block (or local value) reduced to what naming rules look at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// first label of two-label blocks, the keyword otherwise, `local` for local values
    pub type_name: String,
    pub name: String,
    /// empty if no synonym is defined for the type
    pub synonym: String,
    /// the block header (keyword through last label) or the whole local attribute
    pub range: Range,
}

impl Definition {
    fn from_block(block: &Block, defs: &[BlockDef]) -> Self {
        let (type_name, name) = match block.labels.as_slice() {
            [kind, name] => (kind.value.clone(), name.value.clone()),
            [name] => (block.kind.clone(), name.value.clone()),
            _ => (block.kind.clone(), String::new()),
        };

        let synonym = defs
            .iter()
            .find(|def| def.kind == type_name && def.synonym.is_some())
            .and_then(|def| def.synonym)
            .unwrap_or_default()
            .to_string();

        Self {
            type_name,
            name,
            synonym,
            range: block.header_range(),
        }
    }
}

/// Visit every top-level block whose keyword is in `defs` and every local value
pub fn walk_blocks(
    runner: &mut dyn Runner,
    defs: &[BlockDef],
    visitors: &mut [&mut dyn Visit<Definition>],
) {
    let mut definitions = Vec::new();
    for file in runner.files() {
        for block in &file.body.blocks {
            if block.kind == "locals" {
                definitions.extend(block.body.attributes.iter().map(|attribute| Definition {
                    type_name: "local".to_string(),
                    name: attribute.name.clone(),
                    synonym: String::new(),
                    range: attribute.range.clone(),
                }));
                continue;
            }

            let Some(def) = defs.iter().find(|def| def.kind == block.kind) else {
                continue;
            };
            if def.labels.len() != block.labels.len() {
                tracing::trace!(
                    kind = block.kind,
                    expected = def.labels.len(),
                    found = block.labels.len(),
                    "unexpected label count"
                );
            }

            definitions.push(Definition::from_block(block, defs));
        }
    }

    for definition in &definitions {
        for visitor in visitors.iter_mut() {
            visitor.visit(runner, definition);
        }
    }
}

/// Lex every file of the root module and visit every token
///
/// Does nothing outside the root module.
pub fn walk_tokens(
    runner: &mut dyn Runner,
    visitors: &mut [&mut dyn Visit<Token>],
) -> Result<(), LexError> {
    if !runner.is_root_module() {
        tracing::trace!("not the root module, skipping token walk");
        return Ok(());
    }

    for file_index in 0..runner.files().len() {
        let file = &runner.files()[file_index];
        let tokens = lex(&file.text, &file.name)?;

        for token in &tokens {
            for visitor in visitors.iter_mut() {
                visitor.visit(runner, token);
            }
        }
    }

    Ok(())
}
