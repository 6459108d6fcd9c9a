//! DFA minimization by reachability pruning followed by Moore partition refinement.

use crate::classifier::{classify, Kind};
use crate::interrupt::{check, Interrupt, Never};
use crate::types::{Automaton, AutomatonDefinition, AutomatonError, StateId};
use crate::validator::validate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// State counts before and after minimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimizationInfo {
    pub original_states: usize,
    pub minimized_states: usize,
}

/// The result of minimizing a DFA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Minimization {
    pub automaton: Automaton,
    pub info: MinimizationInfo,
}

/// Minimizes a DFA using the default interrupt.
pub fn minimize(automaton: &Automaton) -> Result<Minimization, AutomatonError> {
    minimize_with(automaton, &Never)
}

/// Reduces a deterministic automaton to its minimal equivalent.
///
/// Unreachable states are dropped, then states that can never reach acceptance. If the reachable
/// part was total, those dead states collapse into a single trap named after the smallest of them
/// so the result stays total. Moore refinement then merges equivalent states; each merged block is
/// named after its lexicographically smallest member.
///
/// # Returns
///
/// * `Ok(Minimization)` with the minimal DFA and state counts.
/// * `Err(AutomatonError::NotADfa)` if `automaton` is non-deterministic.
/// * `Err(AutomatonError::Interrupted)` if `interrupt` fires.
pub fn minimize_with(
    automaton: &Automaton,
    interrupt: &dyn Interrupt,
) -> Result<Minimization, AutomatonError> {
    if classify(automaton) != Kind::Dfa {
        return Err(AutomatonError::NotADfa);
    }

    let symbols = automaton.alphabet().len();
    let delta = |state: StateId, symbol: usize| automaton.targets(state, symbol).iter().next();

    let reachable = reachable_states(automaton, interrupt)?;
    let live = live_states(automaton, &reachable, interrupt)?;

    let was_total = (0..automaton.state_count())
        .filter(|&state| reachable[state])
        .all(|state| (0..symbols).all(|symbol| delta(state, symbol).is_some()));
    let dead: Vec<StateId> = (0..automaton.state_count())
        .filter(|&state| reachable[state] && !live[state])
        .collect();
    let trap = if was_total { dead.first().copied() } else { None };

    // Where each original state ends up after pruning.
    let mut remap: Vec<Option<StateId>> = (0..automaton.state_count())
        .map(|state| {
            if !reachable[state] {
                None
            } else if live[state] {
                Some(state)
            } else {
                trap
            }
        })
        .collect();
    if remap[automaton.start()].is_none() {
        remap[automaton.start()] = Some(automaton.start());
    }

    let kept: Vec<StateId> = (0..automaton.state_count())
        .filter(|&state| remap[state] == Some(state))
        .collect();
    debug!(
        "pruned {} unreachable and {} dead state(s), trap: {:?}",
        reachable.iter().filter(|&&r| !r).count(),
        dead.len(),
        trap.map(|state| automaton.state_name(state))
    );

    let mut position = vec![None; automaton.state_count()];
    for (index, &state) in kept.iter().enumerate() {
        position[state] = Some(index);
    }

    // next[i][a] is the kept index reached from kept[i] on symbol a.
    let next: Vec<Vec<Option<usize>>> = kept
        .iter()
        .map(|&state| {
            (0..symbols)
                .map(|symbol| {
                    if Some(state) == trap {
                        return position[state];
                    }
                    delta(state, symbol)
                        .and_then(|target| remap[target])
                        .and_then(|target| position[target])
                })
                .collect()
        })
        .collect();

    let start = remap[automaton.start()]
        .and_then(|state| position[state])
        .ok_or_else(|| AutomatonError::Internal("start state was pruned".to_string()))?;

    let block = refine(automaton, &kept, &next, interrupt)?;
    let definition = quotient(automaton, &kept, &next, &block, start);

    let minimized = validate(&definition).map_err(|e| {
        AutomatonError::Internal(format!("minimization produced an invalid DFA: {}", e))
    })?;

    Ok(Minimization {
        info: MinimizationInfo {
            original_states: automaton.state_count(),
            minimized_states: minimized.state_count(),
        },
        automaton: minimized,
    })
}

/// Breadth-first search from the start state.
fn reachable_states(
    automaton: &Automaton,
    interrupt: &dyn Interrupt,
) -> Result<Vec<bool>, AutomatonError> {
    let mut reachable = vec![false; automaton.state_count()];
    let mut queue = VecDeque::from([automaton.start()]);
    reachable[automaton.start()] = true;

    while let Some(state) = queue.pop_front() {
        check(interrupt)?;

        for symbol in 0..automaton.alphabet().len() {
            for next in automaton.targets(state, symbol).iter() {
                if !reachable[next] {
                    reachable[next] = true;
                    queue.push_back(next);
                }
            }
        }
    }

    Ok(reachable)
}

/// Reachable states from which some accepting state can be reached.
fn live_states(
    automaton: &Automaton,
    reachable: &[bool],
    interrupt: &dyn Interrupt,
) -> Result<Vec<bool>, AutomatonError> {
    let mut predecessors: Vec<Vec<StateId>> = vec![Vec::new(); automaton.state_count()];
    for state in (0..automaton.state_count()).filter(|&state| reachable[state]) {
        for symbol in 0..automaton.alphabet().len() {
            for target in automaton.targets(state, symbol).iter() {
                predecessors[target].push(state);
            }
        }
    }

    let mut live = vec![false; automaton.state_count()];
    let mut queue = VecDeque::new();
    for state in automaton.accepting().iter().filter(|&state| reachable[state]) {
        live[state] = true;
        queue.push_back(state);
    }

    while let Some(state) = queue.pop_front() {
        check(interrupt)?;

        for &previous in &predecessors[state] {
            if !live[previous] {
                live[previous] = true;
                queue.push_back(previous);
            }
        }
    }

    Ok(live)
}

/// Moore's algorithm over the kept states; returns the final block of each kept index.
fn refine(
    automaton: &Automaton,
    kept: &[StateId],
    next: &[Vec<Option<usize>>],
    interrupt: &dyn Interrupt,
) -> Result<Vec<usize>, AutomatonError> {
    let accepting: Vec<bool> = kept
        .iter()
        .map(|&state| automaton.is_accepting(state))
        .collect();
    let (mut block, mut count) = number_by_first_appearance(&accepting);
    let mut round = 0;

    loop {
        check(interrupt)?;
        round += 1;

        let signatures: Vec<(usize, Vec<Option<usize>>)> = next
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let targets = row.iter().map(|target| target.map(|t| block[t])).collect();
                (block[index], targets)
            })
            .collect();
        let (refined, refined_count) = number_by_first_appearance(&signatures);

        debug!("refinement round {}: {} -> {} block(s)", round, count, refined_count);
        block = refined;
        if refined_count == count {
            return Ok(block);
        }
        count = refined_count;
    }
}

/// Numbers distinct keys 0, 1, … in order of first appearance.
fn number_by_first_appearance<K: Hash + Eq>(keys: &[K]) -> (Vec<usize>, usize) {
    let mut ids: HashMap<&K, usize> = HashMap::new();
    let numbered = keys
        .iter()
        .map(|key| {
            let fresh = ids.len();
            *ids.entry(key).or_insert(fresh)
        })
        .collect();

    (numbered, ids.len())
}

/// Builds the quotient automaton, one state per block named after its first (smallest) member.
fn quotient(
    automaton: &Automaton,
    kept: &[StateId],
    next: &[Vec<Option<usize>>],
    block: &[usize],
    start: usize,
) -> AutomatonDefinition {
    let mut representatives: Vec<usize> = Vec::new();
    for (index, &b) in block.iter().enumerate() {
        if b == representatives.len() {
            representatives.push(index);
        }
    }

    let name = |index: usize| automaton.state_name(kept[representatives[block[index]]]).to_string();
    let alphabet = automaton.alphabet();

    let mut definition = AutomatonDefinition {
        name: None,
        states: representatives.iter().map(|&index| name(index)).collect(),
        symbols: alphabet.to_vec(),
        start_state: name(start),
        end_states: representatives
            .iter()
            .filter(|&&index| automaton.is_accepting(kept[index]))
            .map(|&index| name(index))
            .collect(),
        transitions: Default::default(),
    };

    for &index in &representatives {
        let entries: std::collections::BTreeMap<_, _> = next[index]
            .iter()
            .enumerate()
            .filter_map(|(symbol, target)| {
                target.map(|target| (alphabet[symbol].clone(), vec![name(target)]))
            })
            .collect();
        if !entries.is_empty() {
            definition.transitions.insert(name(index), entries);
        }
    }

    definition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::converter::convert;
    use crate::fixtures::{automaton, contains_ab, ends_in_01, ends_in_zero, strings};
    use crate::simulator::test_string;
    use std::sync::atomic::AtomicBool;

    /// q1 and q2 are equivalent; q3 is the accepting sink.
    fn redundant() -> Automaton {
        automaton(
            &["q0", "q1", "q2", "q3"],
            &["a", "b"],
            "q0",
            &["q3"],
            &[
                ("q0", "a", "q1"),
                ("q0", "b", "q2"),
                ("q1", "a", "q3"),
                ("q1", "b", "q3"),
                ("q2", "a", "q3"),
                ("q2", "b", "q3"),
                ("q3", "a", "q3"),
                ("q3", "b", "q3"),
            ],
        )
    }

    fn assert_same_language(a: &Automaton, b: &Automaton, max_len: usize) {
        for word in strings(a.alphabet(), max_len) {
            assert_eq!(
                test_string(a, &word).unwrap().accepted,
                test_string(b, &word).unwrap().accepted,
                "languages differ on {:?}",
                word
            );
        }
    }

    #[test]
    fn test_equivalent_states_collapse() {
        let dfa = redundant();

        let result = minimize(&dfa).unwrap();
        let minimized = &result.automaton;

        assert_eq!(minimized.states(), &["q0", "q1", "q3"]);
        assert_eq!(minimized.start_state(), "q0");
        assert_eq!(minimized.names(minimized.accepting()), vec!["q3"]);

        let q0 = minimized.state_id("q0").unwrap();
        let q1 = minimized.state_id("q1").unwrap();
        let b = minimized.symbol_id("b").unwrap();
        assert_eq!(minimized.targets(q0, b).as_slice(), &[q1]);

        assert_eq!(
            result.info,
            MinimizationInfo {
                original_states: 4,
                minimized_states: 3,
            }
        );
        assert_same_language(&dfa, minimized, 5);
    }

    #[test]
    fn test_nfa_is_rejected() {
        assert_eq!(minimize(&ends_in_01()), Err(AutomatonError::NotADfa));
    }

    #[test]
    fn test_unreachable_states_are_dropped() {
        let dfa = automaton(
            &["a", "b", "z"],
            &["x"],
            "a",
            &["b"],
            &[("a", "x", "b"), ("b", "x", "a"), ("z", "x", "b")],
        );

        let result = minimize(&dfa).unwrap();

        assert_eq!(result.automaton.states(), &["a", "b"]);
    }

    #[test]
    fn test_dead_states_collapse_into_a_trap() {
        let dfa = automaton(
            &["a", "b", "d1", "d2"],
            &["x", "y"],
            "a",
            &["b"],
            &[
                ("a", "x", "b"),
                ("a", "y", "d1"),
                ("b", "x", "d2"),
                ("b", "y", "d2"),
                ("d1", "x", "d2"),
                ("d1", "y", "d2"),
                ("d2", "x", "d2"),
                ("d2", "y", "d2"),
            ],
        );

        let result = minimize(&dfa).unwrap();
        let minimized = &result.automaton;

        assert_eq!(minimized.states(), &["a", "b", "d1"]);
        assert!(minimized.is_total());
        let b = minimized.state_id("b").unwrap();
        let trap = minimized.state_id("d1").unwrap();
        let y = minimized.symbol_id("y").unwrap();
        assert_eq!(minimized.targets(b, y).as_slice(), &[trap]);
        assert_eq!(minimized.targets(trap, y).as_slice(), &[trap]);
        assert_same_language(&dfa, minimized, 4);
    }

    #[test]
    fn test_dead_states_are_removed_from_partial_dfa() {
        let dfa = automaton(
            &["a", "b", "d"],
            &["x", "y"],
            "a",
            &["b"],
            &[("a", "x", "b"), ("a", "y", "d"), ("d", "x", "d")],
        );

        let result = minimize(&dfa).unwrap();
        let minimized = &result.automaton;

        assert_eq!(minimized.states(), &["a", "b"]);
        let a = minimized.state_id("a").unwrap();
        let y = minimized.symbol_id("y").unwrap();
        assert!(minimized.targets(a, y).is_empty());
        assert_same_language(&dfa, minimized, 4);
    }

    #[test]
    fn test_empty_language_total() {
        let dfa = automaton(
            &["a", "b"],
            &["x"],
            "b",
            &[],
            &[("a", "x", "a"), ("b", "x", "a")],
        );

        let result = minimize(&dfa).unwrap();
        let minimized = &result.automaton;

        // Both states are dead; they collapse into a trap named "a" which is also the start.
        assert_eq!(minimized.states(), &["a"]);
        assert_eq!(minimized.start_state(), "a");
        assert!(minimized.is_total());
        assert!(minimized.accepting().is_empty());
    }

    #[test]
    fn test_empty_language_partial() {
        let dfa = automaton(&["a", "c"], &["x"], "a", &[], &[("a", "x", "c")]);

        let result = minimize(&dfa).unwrap();
        let minimized = &result.automaton;

        assert_eq!(minimized.states(), &["a"]);
        assert!(minimized.targets(0, 0).is_empty());
    }

    #[test]
    fn test_minimization_is_idempotent() {
        for dfa in [redundant(), ends_in_zero()] {
            let once = minimize(&dfa).unwrap().automaton;
            let twice = minimize(&once).unwrap().automaton;

            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_converted_nfa_minimizes_to_the_same_language() {
        for nfa in [ends_in_01(), contains_ab()] {
            let dfa = convert(&nfa, &EngineConfig::default()).unwrap().dfa;
            let minimized = minimize(&dfa).unwrap();

            assert!(minimized.info.minimized_states <= minimized.info.original_states);
            assert_same_language(&nfa, &minimized.automaton, 6);
        }
    }

    #[test]
    fn test_interrupted_minimization() {
        let cancelled = AtomicBool::new(true);

        let result = minimize_with(&redundant(), &cancelled);

        assert_eq!(result, Err(AutomatonError::Interrupted));
    }

    #[test]
    fn test_contains_ab_has_three_states() {
        let dfa = convert(&contains_ab(), &EngineConfig::default())
            .unwrap()
            .dfa;

        let minimized = minimize(&dfa).unwrap();

        assert_eq!(minimized.info.minimized_states, 3);
    }
}
