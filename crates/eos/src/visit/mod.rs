//! visitor pattern helpers
//!
//! Rules do not walk files themselves. They hand one or more [Visit]ors to [walk_blocks] or [walk_tokens], which call
//! each visitor in registration order for every visited element.
mod walk;
pub use walk::{walk_blocks, walk_tokens, BlockDef, Definition, LINTABLE_BLOCKS};

use crate::runner::Runner;

/// Visitor that is handed the runner alongside each subject
pub trait Visit<T> {
    fn visit(&mut self, runner: &mut dyn Runner, value: &T);
}

// blanket impl for FnMut
impl<T, F> Visit<T> for F
where
    F: FnMut(&mut dyn Runner, &T),
{
    fn visit(&mut self, runner: &mut dyn Runner, value: &T) {
        self(runner, value)
    }
}
