//! This crate provides a finite-automaton engine.
//! It validates automaton definitions, classifies them as DFA or NFA, simulates input strings,
//! converts NFAs (with ε-moves) into total DFAs and minimizes DFAs. Definitions can be read from
//! the `.fa` text format or JSON, and every operation is also exposed through a JSON wire layer.

pub mod classifier;
pub mod closure;
pub mod config;
pub mod converter;
pub mod interrupt;
pub mod library;
pub mod loader;
pub mod minimizer;
pub mod parser;
pub mod simulator;
pub mod types;
pub mod validator;
pub mod wire;

#[cfg(test)]
mod fixtures;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `classify` function and the `Kind` enum from the classifier module.
pub use classifier::{classify, Kind};
/// Re-exports the closure helpers.
pub use closure::{epsilon_closure, move_on_symbol};
pub use config::{EngineConfig, DEFAULT_MAX_DFA_STATES};
/// Re-exports subset construction and its results from the converter module.
pub use converter::{convert, convert_with, Conversion, ConversionInfo, TRAP_STATE};
pub use interrupt::{Deadline, Interrupt, Never};
/// Re-exports `AutomatonInfo`, `AutomatonLibrary`, and `DEFINITIONS` from the library module.
pub use library::{AutomatonInfo, AutomatonLibrary, DEFINITIONS};
/// Re-exports the `AutomatonLoader` struct from the loader module.
pub use loader::AutomatonLoader;
pub use minimizer::{minimize, minimize_with, Minimization, MinimizationInfo};
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports the `Simulator` and its results from the simulator module.
pub use simulator::{test_string, test_string_with, Simulation, Simulator, Step};
/// Re-exports the core data types and the error enum from the types module.
pub use types::{
    Automaton, AutomatonDefinition, AutomatonError, State, StateId, StateSet, Symbol, SymbolId,
    EPSILON,
};
pub use validator::{validate, Violation};
/// Re-exports the wire entry point and operation names.
pub use wire::{respond, Envelope, Operation};
