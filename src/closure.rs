//! Epsilon-closure and symbol moves over state sets.
//!
//! These are pure functions of an immutable `Automaton`; they hold no state between calls.

use crate::types::{Automaton, StateSet, SymbolId};

/// Computes the smallest superset of `seed` closed under ε-transitions.
///
/// Each state is visited at most once, so ε-cycles terminate.
pub fn epsilon_closure(automaton: &Automaton, seed: &StateSet) -> StateSet {
    let mut visited = vec![false; automaton.state_count()];
    let mut stack: Vec<_> = seed.iter().collect();

    while let Some(state) = stack.pop() {
        if visited[state] {
            continue;
        }
        visited[state] = true;

        for next in automaton.epsilon_targets(state).iter() {
            if !visited[next] {
                stack.push(next);
            }
        }
    }

    visited
        .iter()
        .enumerate()
        .filter_map(|(state, &seen)| seen.then_some(state))
        .collect()
}

/// Union of the `symbol`-targets of every state in `states`, without closing over ε.
pub fn move_on_symbol(automaton: &Automaton, states: &StateSet, symbol: SymbolId) -> StateSet {
    let mut reached = StateSet::new();

    for state in states.iter() {
        reached.union_with(automaton.targets(state, symbol));
    }

    reached
}

/// One simulation step: the ε-closure of the `symbol`-move from `states`.
pub fn step(automaton: &Automaton, states: &StateSet, symbol: SymbolId) -> StateSet {
    epsilon_closure(automaton, &move_on_symbol(automaton, states, symbol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{automaton, contains_ab, epsilon_chain};

    #[test]
    fn test_closure_follows_epsilon_chain() {
        let automaton = epsilon_chain();

        let closure = epsilon_closure(&automaton, &StateSet::singleton(automaton.start()));

        assert_eq!(automaton.names(&closure), vec!["p0", "p1"]);
    }

    #[test]
    fn test_closure_terminates_on_cycles() {
        let automaton = automaton(
            &["a", "b", "c"],
            &["x"],
            "a",
            &[],
            &[("a", "ε", "b"), ("b", "ε", "c"), ("c", "ε", "a")],
        );

        let closure = epsilon_closure(&automaton, &StateSet::singleton(1));

        assert_eq!(closure.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_closure_of_empty_set_is_empty() {
        let automaton = epsilon_chain();

        assert!(epsilon_closure(&automaton, &StateSet::new()).is_empty());
    }

    #[test]
    fn test_step_closes_after_moving() {
        let automaton = contains_ab();
        let a = automaton.symbol_id("a").unwrap();
        let b = automaton.symbol_id("b").unwrap();

        let start = epsilon_closure(&automaton, &StateSet::singleton(automaton.start()));
        let after_a = step(&automaton, &start, a);
        let after_ab = step(&automaton, &after_a, b);

        assert_eq!(automaton.names(&after_a), vec!["0", "1"]);
        assert_eq!(automaton.names(&after_ab), vec!["0", "2", "3"]);
    }

    #[test]
    fn test_move_ignores_missing_entries() {
        let automaton = epsilon_chain();
        let a = automaton.symbol_id("a").unwrap();

        let moved = move_on_symbol(&automaton, &StateSet::singleton(0), a);

        assert!(moved.is_empty());
    }
}
