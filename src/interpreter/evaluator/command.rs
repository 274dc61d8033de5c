use std::collections::HashMap;

use crate::interpreter::{
    evaluator::core::{EvalResult, Evaluator},
    value::core::Value,
};

/// A command-word implementation: a string-vararg function over the
/// evaluator.
pub type CommandFn = fn(&mut Evaluator, &[String], usize) -> EvalResult<Option<Value>>;

/// `clear` — removes the named bindings, or performs the full reset
/// (restore the native table, drop every user definition including `ans`)
/// when called with no arguments. Clearing a shadowed native restores it.
fn clear_command(evaluator: &mut Evaluator,
                 words: &[String],
                 _line: usize)
                 -> EvalResult<Option<Value>> {
    if words.is_empty() {
        evaluator.reset_names();
        return Ok(None);
    }
    for word in words {
        evaluator.clear_name(word);
    }
    Ok(None)
}

/// The built-in command-word table.
#[must_use]
pub fn default_command_table() -> HashMap<String, CommandFn> {
    let mut table: HashMap<String, CommandFn> = HashMap::new();
    table.insert("clear".to_string(), clear_command);
    table
}
