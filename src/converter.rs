//! Subset construction: converts any validated automaton into an equivalent total DFA.

use crate::classifier::{classify, Kind};
use crate::closure::{epsilon_closure, step};
use crate::config::EngineConfig;
use crate::interrupt::{check, Interrupt, Never};
use crate::types::{Automaton, AutomatonDefinition, AutomatonError, State, StateSet};
use crate::validator::validate;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the shared non-accepting state that absorbs every missing transition.
pub const TRAP_STATE: &str = "∅";

/// Summary numbers reported alongside a converted automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionInfo {
    pub original_nfa_states: usize,
    pub resulting_dfa_states: usize,
    /// Whether the input had at least one ε-move with a target.
    pub epsilon_transitions_removed: bool,
}

/// The result of subset construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub dfa: Automaton,
    pub info: ConversionInfo,
    /// For every state of `dfa`, the original states it stands for. The trap maps to an empty list.
    pub subsets: BTreeMap<State, Vec<State>>,
}

/// Converts `automaton` into an equivalent total DFA using the default interrupt.
pub fn convert(automaton: &Automaton, config: &EngineConfig) -> Result<Conversion, AutomatonError> {
    convert_with(automaton, config, &Never)
}

/// Converts `automaton` into an equivalent total DFA.
///
/// New states are named `q0, q1, …` in the order subset construction discovers them, starting
/// with the ε-closure of the start state. Every empty move goes to one shared [`TRAP_STATE`],
/// created on first use. An input that is already a total DFA is returned unchanged.
///
/// # Returns
///
/// * `Ok(Conversion)` with the DFA and conversion metadata.
/// * `Err(AutomatonError::ResourceExceeded)` if more than `config.max_dfa_states` states are needed.
/// * `Err(AutomatonError::Interrupted)` if `interrupt` fires.
pub fn convert_with(
    automaton: &Automaton,
    config: &EngineConfig,
    interrupt: &dyn Interrupt,
) -> Result<Conversion, AutomatonError> {
    let epsilon_transitions_removed = automaton.has_epsilon_moves();

    if classify(automaton) == Kind::Dfa && automaton.is_total() {
        debug!("input is already a total DFA, skipping subset construction");
        let subsets = automaton
            .states()
            .iter()
            .map(|state| (state.clone(), vec![state.clone()]))
            .collect();
        return Ok(Conversion {
            dfa: automaton.clone(),
            info: ConversionInfo {
                original_nfa_states: automaton.state_count(),
                resulting_dfa_states: automaton.state_count(),
                epsilon_transitions_removed,
            },
            subsets,
        });
    }

    let limit = config.max_dfa_states;
    let start = epsilon_closure(automaton, &StateSet::singleton(automaton.start()));

    // Insertion order of `discovered` is the canonical naming order.
    let mut discovered: IndexMap<StateSet, usize> = IndexMap::new();
    ensure_capacity(1, limit)?;
    discovered.insert(start, 0);

    // rows[i][a] is the target of discovered set i on symbol a; `None` is the trap.
    let mut rows: Vec<Vec<Option<usize>>> = Vec::new();
    let mut needs_trap = false;
    let mut next = 0;

    while next < discovered.len() {
        check(interrupt)?;

        let current = match discovered.get_index(next) {
            Some((set, _)) => set.clone(),
            None => break,
        };
        next += 1;

        let mut row = Vec::with_capacity(automaton.alphabet().len());
        for symbol in 0..automaton.alphabet().len() {
            let target = step(automaton, &current, symbol);

            if target.is_empty() {
                if !needs_trap {
                    needs_trap = true;
                    ensure_capacity(discovered.len() + 1, limit)?;
                }
                row.push(None);
                continue;
            }

            let index = match discovered.get(&target) {
                Some(&index) => index,
                None => {
                    let index = discovered.len();
                    ensure_capacity(index + 1 + usize::from(needs_trap), limit)?;
                    debug!(
                        "discovered q{} = {:?}",
                        index,
                        automaton.names(&target)
                    );
                    discovered.insert(target, index);
                    index
                }
            };
            row.push(Some(index));
        }
        rows.push(row);
    }

    let definition = build_definition(automaton, &discovered, &rows, needs_trap);
    let dfa = validate(&definition).map_err(|e| {
        AutomatonError::Internal(format!("subset construction produced an invalid DFA: {}", e))
    })?;

    let mut subsets: BTreeMap<State, Vec<State>> = discovered
        .iter()
        .map(|(set, &index)| (subset_name(index), automaton.names(set)))
        .collect();
    if needs_trap {
        subsets.insert(TRAP_STATE.to_string(), Vec::new());
    }

    debug!(
        "subset construction: {} states -> {} states",
        automaton.state_count(),
        dfa.state_count()
    );

    Ok(Conversion {
        info: ConversionInfo {
            original_nfa_states: automaton.state_count(),
            resulting_dfa_states: dfa.state_count(),
            epsilon_transitions_removed,
        },
        dfa,
        subsets,
    })
}

fn subset_name(index: usize) -> State {
    format!("q{}", index)
}

fn ensure_capacity(required: usize, limit: usize) -> Result<(), AutomatonError> {
    if required > limit {
        return Err(AutomatonError::ResourceExceeded { limit });
    }

    Ok(())
}

/// Lays out the discovered subsets as a raw definition over the original alphabet.
fn build_definition(
    automaton: &Automaton,
    discovered: &IndexMap<StateSet, usize>,
    rows: &[Vec<Option<usize>>],
    needs_trap: bool,
) -> AutomatonDefinition {
    let alphabet = automaton.alphabet();
    let target_name = |target: &Option<usize>| match target {
        Some(index) => subset_name(*index),
        None => TRAP_STATE.to_string(),
    };

    let mut definition = AutomatonDefinition {
        name: None,
        states: (0..discovered.len()).map(subset_name).collect(),
        symbols: alphabet.to_vec(),
        start_state: subset_name(0),
        end_states: discovered
            .iter()
            .filter(|(set, _)| set.intersects(automaton.accepting()))
            .map(|(_, &index)| subset_name(index))
            .collect(),
        transitions: Default::default(),
    };

    for (index, row) in rows.iter().enumerate() {
        let entries = row
            .iter()
            .enumerate()
            .map(|(symbol, target)| (alphabet[symbol].clone(), vec![target_name(target)]))
            .collect();
        definition.transitions.insert(subset_name(index), entries);
    }

    if needs_trap {
        definition.states.push(TRAP_STATE.to_string());
        let entries = alphabet
            .iter()
            .map(|symbol| (symbol.clone(), vec![TRAP_STATE.to_string()]))
            .collect();
        definition
            .transitions
            .insert(TRAP_STATE.to_string(), entries);
    }

    definition
}
