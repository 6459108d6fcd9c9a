//! Deterministic / non-deterministic classification of validated automata.

use crate::types::Automaton;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two kinds of finite automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// No ε-moves and at most one target per state and symbol.
    #[serde(rename = "DFA")]
    Dfa,
    /// Anything else.
    #[serde(rename = "NFA")]
    Nfa,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Dfa => write!(f, "DFA"),
            Kind::Nfa => write!(f, "NFA"),
        }
    }
}

/// Classifies a validated automaton.
///
/// Missing transitions do not make an automaton non-deterministic; only ε-moves with targets
/// and `(state, symbol)` pairs with two or more targets do.
pub fn classify(automaton: &Automaton) -> Kind {
    if automaton.is_deterministic() {
        Kind::Dfa
    } else {
        Kind::Nfa
    }
}
