//! This module defines the `Simulator`, which runs an input string against any validated
//! automaton, deterministic or not. It tracks the set of active states one symbol at a time and,
//! once the run is over, reports acceptance together with a witness path.

use crate::closure::{epsilon_closure, step};
use crate::interrupt::{check, Interrupt, Never};
use crate::types::{Automaton, AutomatonError, State, StateId, StateSet, Symbol, SymbolId};

/// The outcome of consuming one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// At least one state is still active.
    Continue,
    /// No state can consume the symbol; the run is over and rejects.
    Stuck,
}

/// The result of simulating an input string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simulation {
    pub accepted: bool,
    /// One state per consumed symbol plus the initial step.
    ///
    /// For runs that never branch this is the run itself. Otherwise it is a single witness
    /// execution, preferring paths that still reach acceptance.
    pub path: Vec<State>,
    /// Every active state after the last symbol; empty when the run got stuck.
    pub final_states: Vec<State>,
    /// Whether more than one state was ever active at once.
    pub branched: bool,
    /// Number of symbols consumed before the run ended.
    pub consumed: usize,
    /// Position of the symbol no active state could consume.
    pub stuck_at: Option<usize>,
}

impl Simulation {
    /// The state the witness path ends in, or `None` when the run got stuck.
    pub fn final_state(&self) -> Option<&str> {
        if self.stuck_at.is_some() {
            return None;
        }
        self.path.last().map(String::as_str)
    }
}

/// A stepping simulator over a borrowed automaton.
pub struct Simulator<'a> {
    automaton: &'a Automaton,
    /// Active states after each consumed symbol; `trace[0]` is the initial closure.
    trace: Vec<StateSet>,
    consumed: Vec<SymbolId>,
    stuck: bool,
}

/// Ranking of a state at some step of the run, compared field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Score {
    accepts: bool,
    reaches: usize,
}

impl<'a> Simulator<'a> {
    /// Creates a simulator positioned before the first symbol, with the ε-closure of the start
    /// state active.
    pub fn new(automaton: &'a Automaton) -> Self {
        let initial = epsilon_closure(automaton, &StateSet::singleton(automaton.start()));
        Self {
            automaton,
            trace: vec![initial],
            consumed: Vec::new(),
            stuck: false,
        }
    }

    /// Consumes a single symbol.
    ///
    /// # Returns
    ///
    /// * `Ok(Step::Continue)` if some state is still active.
    /// * `Ok(Step::Stuck)` if no active state can consume `symbol`, or the run was already stuck.
    /// * `Err(AutomatonError::InvalidSymbol)` if `symbol` is not in the alphabet.
    pub fn step(&mut self, symbol: &str) -> Result<Step, AutomatonError> {
        if self.stuck {
            return Ok(Step::Stuck);
        }

        let symbol_id =
            self.automaton
                .symbol_id(symbol)
                .ok_or_else(|| AutomatonError::InvalidSymbol {
                    symbol: symbol.to_string(),
                    position: self.position(),
                })?;

        let next = step(self.automaton, self.active(), symbol_id);
        if next.is_empty() {
            self.stuck = true;
            return Ok(Step::Stuck);
        }

        self.trace.push(next);
        self.consumed.push(symbol_id);

        Ok(Step::Continue)
    }

    /// Consumes `input` until it is exhausted or the run gets stuck.
    pub fn run(
        &mut self,
        input: &[Symbol],
        interrupt: &dyn Interrupt,
    ) -> Result<Step, AutomatonError> {
        for symbol in input {
            check(interrupt)?;
            if self.step(symbol)? == Step::Stuck {
                return Ok(Step::Stuck);
            }
        }

        Ok(Step::Continue)
    }

    /// Returns the simulator to its initial configuration.
    pub fn reset(&mut self) {
        self.trace.truncate(1);
        self.consumed.clear();
        self.stuck = false;
    }

    /// The states active after the last consumed symbol.
    pub fn active(&self) -> &StateSet {
        &self.trace[self.trace.len() - 1]
    }

    /// Number of symbols consumed so far.
    pub fn position(&self) -> usize {
        self.consumed.len()
    }

    pub fn is_stuck(&self) -> bool {
        self.stuck
    }

    /// Whether the current configuration accepts the input consumed so far.
    pub fn is_accepting(&self) -> bool {
        !self.stuck && self.active().intersects(self.automaton.accepting())
    }

    pub fn has_branched(&self) -> bool {
        self.trace.iter().any(|active| active.len() > 1)
    }

    /// Summarises the run so far.
    pub fn outcome(&self) -> Simulation {
        let branched = self.has_branched();
        let path = if branched {
            self.witness()
        } else {
            self.trace.iter().flat_map(|active| active.iter()).collect()
        };

        Simulation {
            accepted: self.is_accepting(),
            path: path
                .into_iter()
                .map(|state| self.automaton.state_name(state).to_string())
                .collect(),
            final_states: if self.stuck {
                Vec::new()
            } else {
                self.automaton.names(self.active())
            },
            branched,
            consumed: self.position(),
            stuck_at: self.stuck.then_some(self.position()),
        }
    }

    /// States reachable from `state` by consuming the symbol at `position`.
    fn successors(&self, state: StateId, position: usize) -> StateSet {
        step(
            self.automaton,
            &StateSet::singleton(state),
            self.consumed[position],
        )
    }

    /// Picks one execution through the step-indexed product of positions and states.
    ///
    /// A backward pass scores each `(step, state)` by whether acceptance is still reachable and
    /// how far the run can get from there. The forward pass then follows the best score,
    /// breaking ties by the smallest state name.
    fn witness(&self) -> Vec<StateId> {
        let last = self.trace.len() - 1;
        let accepting = self.automaton.accepting();
        let mut scores: Vec<Vec<Score>> = vec![Vec::new(); self.trace.len()];

        scores[last] = self.trace[last]
            .iter()
            .map(|state| Score {
                accepts: !self.stuck && accepting.contains(state),
                reaches: last,
            })
            .collect();

        for position in (0..last).rev() {
            let row: Vec<Score> = self.trace[position]
                .iter()
                .map(|state| {
                    self.successors(state, position)
                        .iter()
                        .filter_map(|next| {
                            self.trace[position + 1]
                                .index_of(next)
                                .map(|index| scores[position + 1][index])
                        })
                        .max()
                        .unwrap_or(Score {
                            accepts: false,
                            reaches: position,
                        })
                })
                .collect();
            scores[position] = row;
        }

        let mut path = Vec::with_capacity(self.trace.len());
        let mut candidates = self.trace[0].clone();

        for position in 0..=last {
            let mut best: Option<(StateId, Score)> = None;
            for state in candidates.iter() {
                let Some(index) = self.trace[position].index_of(state) else {
                    continue;
                };
                let score = scores[position][index];
                if best.map_or(true, |(_, current)| score > current) {
                    best = Some((state, score));
                }
            }

            let Some((state, _)) = best else {
                break;
            };
            path.push(state);

            if position < last {
                candidates = self.successors(state, position);
            }
        }

        path
    }
}

/// Runs `input` against `automaton` and reports acceptance and a witness path.
pub fn test_string(automaton: &Automaton, input: &[Symbol]) -> Result<Simulation, AutomatonError> {
    test_string_with(automaton, input, &Never)
}

/// Like [`test_string`], polling `interrupt` before every symbol.
pub fn test_string_with(
    automaton: &Automaton,
    input: &[Symbol],
    interrupt: &dyn Interrupt,
) -> Result<Simulation, AutomatonError> {
    let mut simulator = Simulator::new(automaton);
    simulator.run(input, interrupt)?;
    Ok(simulator.outcome())
}
