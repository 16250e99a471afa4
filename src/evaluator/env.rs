//! Scope environment for the jsonmap evaluator
//!
//! An [`Env`] holds the three scope roles a reference can start from:
//!
//! - `current` - the object that unprefixed `&name` paths read from
//! - `anon` - the value `&?` returns: the element under iteration (`map`)
//!   or the positional tuple (`zip`)
//! - `global` - the original top-level input, reachable via `&!`
//!
//! Environments are cheap borrowed handles; each scope construct builds a
//! fresh child environment over values owned by its stack frame.

use super::value::Value;

/// The three scope roles visible to a reference expression
#[derive(Debug, Clone, Copy)]
pub struct Env<'a> {
    /// Scope that unprefixed `&name` paths read from
    pub current: &'a Value,
    /// Value `&?` returns
    pub anon: &'a Value,
    /// The original top-level input
    pub global: &'a Value,
}

impl<'a> Env<'a> {
    /// The initial environment: all three roles are the input document
    pub fn new(input: &'a Value) -> Self {
        Self {
            current: input,
            anon: input,
            global: input,
        }
    }

    /// Child environment for `bind`: narrows `current` only.
    /// The anonymous scope is untouched, so `&?` still sees the
    /// enclosing iteration element.
    pub fn with_current(self, current: &'a Value) -> Self {
        Self { current, ..self }
    }

    /// Child environment for one `map` iteration: the element is both
    /// the current and the anonymous scope
    pub fn with_element(self, element: &'a Value) -> Self {
        Self {
            current: element,
            anon: element,
            ..self
        }
    }

    /// Child environment for one `zip` iteration: `anon` is the positional
    /// tuple, `current` the merged namespace of its object members
    pub fn with_tuple(self, merged: &'a Value, tuple: &'a Value) -> Self {
        Self {
            current: merged,
            anon: tuple,
            ..self
        }
    }
}
