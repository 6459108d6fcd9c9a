//! Shared builders for unit tests.

use crate::types::{Automaton, AutomatonDefinition, Symbol};
use crate::validator::validate;

/// Builds a raw definition; each edge is `(source, symbol, target)` and repeated
/// `(source, symbol)` pairs accumulate targets.
pub(crate) fn definition(
    states: &[&str],
    symbols: &[&str],
    start: &str,
    accepting: &[&str],
    edges: &[(&str, &str, &str)],
) -> AutomatonDefinition {
    let mut definition = AutomatonDefinition {
        name: None,
        states: states.iter().map(|s| s.to_string()).collect(),
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
        start_state: start.to_string(),
        end_states: accepting.iter().map(|s| s.to_string()).collect(),
        transitions: Default::default(),
    };

    for (source, symbol, target) in edges {
        definition
            .transitions
            .entry(source.to_string())
            .or_default()
            .entry(symbol.to_string())
            .or_default()
            .push(target.to_string());
    }

    definition
}

pub(crate) fn automaton(
    states: &[&str],
    symbols: &[&str],
    start: &str,
    accepting: &[&str],
    edges: &[(&str, &str, &str)],
) -> Automaton {
    validate(&definition(states, symbols, start, accepting, edges)).unwrap()
}

/// Two-state DFA over {0, 1} accepting strings that end in 0.
pub(crate) fn ends_in_zero() -> Automaton {
    automaton(
        &["q0", "q1"],
        &["0", "1"],
        "q0",
        &["q1"],
        &[
            ("q0", "0", "q1"),
            ("q0", "1", "q0"),
            ("q1", "0", "q1"),
            ("q1", "1", "q0"),
        ],
    )
}

/// p0 -ε-> p1 -a-> p2, accepting exactly "a".
pub(crate) fn epsilon_chain() -> Automaton {
    automaton(
        &["p0", "p1", "p2"],
        &["a"],
        "p0",
        &["p2"],
        &[("p0", "ε", "p1"), ("p1", "a", "p2")],
    )
}

/// NFA over {0, 1} accepting strings that end in 01.
pub(crate) fn ends_in_01() -> Automaton {
    automaton(
        &["s", "m", "f"],
        &["0", "1"],
        "s",
        &["f"],
        &[
            ("s", "0", "s"),
            ("s", "1", "s"),
            ("s", "0", "m"),
            ("m", "1", "f"),
        ],
    )
}

/// NFA with an ε-cycle and branching: accepts strings over {a, b} containing "ab".
pub(crate) fn contains_ab() -> Automaton {
    automaton(
        &["0", "1", "2", "3"],
        &["a", "b"],
        "0",
        &["3"],
        &[
            ("0", "a", "0"),
            ("0", "b", "0"),
            ("0", "a", "1"),
            ("1", "b", "2"),
            ("2", "ε", "3"),
            ("3", "ε", "2"),
            ("2", "a", "2"),
            ("2", "b", "2"),
        ],
    )
}

/// Every string over `alphabet` of length at most `max_len`, shortest first.
pub(crate) fn strings(alphabet: &[Symbol], max_len: usize) -> Vec<Vec<Symbol>> {
    let mut all = vec![Vec::new()];
    let mut frontier = vec![Vec::new()];

    for _ in 0..max_len {
        let mut next = Vec::new();
        for prefix in &frontier {
            for symbol in alphabet {
                let mut word: Vec<Symbol> = prefix.clone();
                word.push(symbol.clone());
                next.push(word);
            }
        }
        all.extend(next.iter().cloned());
        frontier = next;
    }

    all
}
