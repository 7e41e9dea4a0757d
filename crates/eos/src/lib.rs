//! # eos - elements of style
//!
//! A style ruleset for terraform configuration. The rules and their options are documented at
//! <https://github.com/staranto/tflint-ruleset-elements-of-style>
//!
//! ## Introduction for developers
//!
//! Read this to understand how `eos` works internally.
//!
//! ### Loading files
//!
//! Every `*.tf` file of a module is parsed with [hcl_edit] and lowered into a [syntax::Body] (see
//! [source::SourceFile::parse]). Lowering keeps what style rules look at: block keywords, labels, attributes and an
//! expression tree ([syntax::Expr]), with a [syntax::Range] (file, line, column, byte) on every node.
//!
//! Files that are not valid HCL are rejected before any rule runs.
//!
//! ### Runner
//!
//! Rules never touch the file system. They get a [runner::Runner] which hands out the parsed files and the
//! configuration and accepts [runner::Issue]s. [source::Workspace] is the runner used by the CLI and by tests:
//!
//! ```
//! use eos::rules::{NamingRule, Rule};
//!
//! let mut workspace = eos::workspace!("variable \"REGION\" {}");
//! NamingRule.check(&mut workspace).unwrap();
//!
//! assert_eq!(
//!     workspace.messages(),
//!     vec!["Avoid SHOUTED names (REGION)", "Names should be snake_case (REGION)."]
//! );
//! ```
//!
//! ### Walking
//!
//! Most rules are written as visitors ([visit::Visit]) over one of two walks:
//!
//! - [visit::walk_blocks] visits top-level blocks reduced to `(type, name, synonym, range)` and every local value.
//!   The range of a block is its header, from the keyword to the last label.
//! - [visit::walk_tokens] lexes each file again ([syntax::lex]) and visits every token, comments included. It only
//!   runs for the root module.
//!
//! `eos_dry` and `eos_meta` walk the lowered bodies themselves.
//!
//! ### Configuration
//!
//! Rule options live in `.tflint.hcl` as `rule "<name>" { ... }` blocks (see [config::ConfigFile]). Each rule
//! deserializes its block into its own config struct. Every option is optional and falls back to a default.
//!
//! ```hcl
//! rule "eos_naming" {
//!   length = 24
//!   type_echo {
//!     synonyms = {
//!       bucket = ["bkt"]
//!     }
//!   }
//! }
//! ```
pub mod config;
pub mod rules;
pub mod runner;
pub mod source;
pub mod syntax;
pub mod visit;
