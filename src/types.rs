//! This module defines the core data structures used throughout the automaton engine: the raw
//! `AutomatonDefinition` record, the validated `Automaton` value, the canonical `StateSet`, and
//! the error taxonomy shared by every operation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::validator::Violation;
use crate::Rule;

/// A state label, unique within one automaton.
pub type State = String;
/// A symbol label from a finite alphabet.
pub type Symbol = String;
/// Index of a state in an automaton's sorted state list.
pub type StateId = usize;
/// Index of a symbol in an automaton's sorted alphabet.
pub type SymbolId = usize;

/// Raw transition table: `state -> symbol -> targets`.
pub type TransitionTable = BTreeMap<State, BTreeMap<Symbol, Vec<State>>>;

/// The reserved empty-string symbol, used for spontaneous transitions.
pub const EPSILON: &str = "ε";
/// Every spelling accepted for the empty-string symbol on input.
pub const EPSILON_ALIASES: [&str; 2] = ["ε", "ɛ"];

/// Returns `true` if `symbol` denotes the empty-string symbol.
pub fn is_epsilon(symbol: &str) -> bool {
    EPSILON_ALIASES.contains(&symbol)
}

/// Raw structural description of an automaton, as supplied by callers.
///
/// Field names follow the request/response contract. Nothing here is checked; use
/// [`validate`](crate::validator::validate) to obtain an [`Automaton`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatonDefinition {
    /// Optional display name, used by the text format and the built-in catalogue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub states: Vec<State>,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    pub start_state: State,
    #[serde(default)]
    pub end_states: Vec<State>,
    #[serde(default)]
    pub transitions: TransitionTable,
}

impl AutomatonDefinition {
    /// Total number of `(source, symbol, target)` edges in the table.
    pub fn transition_count(&self) -> usize {
        self.transitions
            .values()
            .flat_map(|row| row.values())
            .map(|targets| targets.len())
            .sum()
    }
}

/// A canonical set of states: sorted, without duplicates.
///
/// Because state ids follow the lexicographic order of state names, iterating a `StateSet` visits
/// states in name order, and two sets are equal exactly when they hold the same states.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateSet(Vec<StateId>);

impl StateSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn singleton(state: StateId) -> Self {
        Self(vec![state])
    }

    pub fn insert(&mut self, state: StateId) -> bool {
        match self.0.binary_search(&state) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, state);
                true
            }
        }
    }

    pub fn contains(&self, state: StateId) -> bool {
        self.0.binary_search(&state).is_ok()
    }

    /// Position of `state` within the set, if present.
    pub fn index_of(&self, state: StateId) -> Option<usize> {
        self.0.binary_search(&state).ok()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = StateId> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[StateId] {
        &self.0
    }

    /// Adds every state of `other` to this set.
    pub fn union_with(&mut self, other: &StateSet) {
        if other.is_empty() {
            return;
        }
        let mut merged = Vec::with_capacity(self.0.len() + other.0.len());
        let (mut i, mut j) = (0, 0);
        while i < self.0.len() && j < other.0.len() {
            let (a, b) = (self.0[i], other.0[j]);
            if a <= b {
                merged.push(a);
                i += 1;
                if a == b {
                    j += 1;
                }
            } else {
                merged.push(b);
                j += 1;
            }
        }
        merged.extend_from_slice(&self.0[i..]);
        merged.extend_from_slice(&other.0[j..]);
        self.0 = merged;
    }

    /// Returns `true` if the two sets share at least one state.
    pub fn intersects(&self, other: &StateSet) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.0.len() && j < other.0.len() {
            match self.0[i].cmp(&other.0[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => return true,
            }
        }
        false
    }
}

impl FromIterator<StateId> for StateSet {
    fn from_iter<I: IntoIterator<Item = StateId>>(iter: I) -> Self {
        let mut states: Vec<StateId> = iter.into_iter().collect();
        states.sort_unstable();
        states.dedup();
        Self(states)
    }
}

/// A validated, immutable finite automaton.
///
/// Instances are produced by [`validate`](crate::validator::validate) only, so every invariant
/// (known start state, accepting states and transition endpoints inside `states`, transition
/// symbols inside the alphabet) holds for the lifetime of the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Automaton {
    pub(crate) states: Vec<State>,
    pub(crate) alphabet: Vec<Symbol>,
    pub(crate) start: StateId,
    pub(crate) accepting: StateSet,
    /// Dense table indexed by `[state][symbol]`.
    pub(crate) transitions: Vec<Vec<StateSet>>,
    /// ε-targets per state.
    pub(crate) epsilon: Vec<StateSet>,
}

impl Automaton {
    /// All states, sorted by name.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// The alphabet, sorted, never containing ε.
    pub fn alphabet(&self) -> &[Symbol] {
        &self.alphabet
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn start_state(&self) -> &str {
        &self.states[self.start]
    }

    pub fn accepting(&self) -> &StateSet {
        &self.accepting
    }

    pub fn is_accepting(&self, state: StateId) -> bool {
        self.accepting.contains(state)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn state_name(&self, state: StateId) -> &str {
        &self.states[state]
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.states.binary_search_by(|s| s.as_str().cmp(name)).ok()
    }

    pub fn symbol_id(&self, symbol: &str) -> Option<SymbolId> {
        self.alphabet
            .binary_search_by(|s| s.as_str().cmp(symbol))
            .ok()
    }

    /// Targets of `state` on `symbol`; an absent entry is the empty set.
    pub fn targets(&self, state: StateId, symbol: SymbolId) -> &StateSet {
        &self.transitions[state][symbol]
    }

    pub fn epsilon_targets(&self, state: StateId) -> &StateSet {
        &self.epsilon[state]
    }

    /// Returns `true` if any ε-entry has a non-empty target set.
    pub fn has_epsilon_moves(&self) -> bool {
        self.epsilon.iter().any(|targets| !targets.is_empty())
    }

    /// No effective ε-moves and at most one target per `(state, symbol)`.
    pub fn is_deterministic(&self) -> bool {
        !self.has_epsilon_moves()
            && self
                .transitions
                .iter()
                .flatten()
                .all(|targets| targets.len() <= 1)
    }

    /// Every `(state, symbol)` pair has at least one target.
    pub fn is_total(&self) -> bool {
        self.transitions
            .iter()
            .flatten()
            .all(|targets| !targets.is_empty())
    }

    /// The names of the states in `set`, in set order.
    pub fn names(&self, set: &StateSet) -> Vec<State> {
        set.iter().map(|s| self.states[s].clone()).collect()
    }

    /// Renders the automaton back into its canonical raw form.
    ///
    /// States, symbols and accepting states come out sorted; only non-empty transition entries are
    /// listed, with ε-moves under [`EPSILON`].
    pub fn to_definition(&self) -> AutomatonDefinition {
        let mut transitions = TransitionTable::new();
        for (state, row) in self.transitions.iter().enumerate() {
            let mut entries = BTreeMap::new();
            for (symbol, targets) in row.iter().enumerate() {
                if !targets.is_empty() {
                    entries.insert(self.alphabet[symbol].clone(), self.names(targets));
                }
            }
            if !self.epsilon[state].is_empty() {
                entries.insert(EPSILON.to_string(), self.names(&self.epsilon[state]));
            }
            if !entries.is_empty() {
                transitions.insert(self.states[state].clone(), entries);
            }
        }

        AutomatonDefinition {
            name: None,
            states: self.states.clone(),
            symbols: self.alphabet.clone(),
            start_state: self.start_state().to_string(),
            end_states: self.names(&self.accepting),
            transitions,
        }
    }
}

/// Represents every error the engine can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AutomatonError {
    /// The raw definition violates one or more structural invariants; all of them are listed.
    #[error("Malformed automaton: {}", format_violations(.0))]
    Malformed(Vec<Violation>),
    /// An input string uses a symbol outside the alphabet.
    #[error("Invalid symbol '{symbol}' at position {position}")]
    InvalidSymbol { symbol: Symbol, position: usize },
    /// Minimization was requested for a non-deterministic automaton.
    #[error("Only DFAs can be minimized. This automaton is: NFA")]
    NotADfa,
    /// Subset construction discovered more states than allowed.
    #[error("Subset construction exceeded the limit of {limit} states")]
    ResourceExceeded { limit: usize },
    /// The caller's interrupt fired before the operation finished.
    #[error("Operation interrupted")]
    Interrupted,
    #[error("Internal error: {0}")]
    Internal(String),
    /// A wire request could not be decoded.
    #[error("Invalid request: {0}")]
    Request(String),
    #[error("Parsing error: {0}")]
    Parse(#[from] Box<pest::error::Error<Rule>>),
    #[error("File error: {0}")]
    File(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
