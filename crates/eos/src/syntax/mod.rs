//! Syntax model shared by all rules
//!
//! A file is looked at in two ways: as a stream of [lexer::Token]s (comments, heredoc markers) and as a tree of
//! [tree::Block]s and [tree::Attribute]s with lowered [expr::Expr]essions. Both carry [position::Range]s.
pub mod expr;
pub mod lexer;
pub mod position;
pub mod tree;

pub(crate) use expr::Lowering;
pub use expr::{Expr, ExprKind, Literal};
pub use lexer::{lex, LexError, Token, TokenKind};
pub use position::{LineIndex, Pos, Range};
pub use tree::{Attribute, Block, Body, Label};
