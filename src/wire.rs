//! JSON request and response bodies for the four engine operations.
//!
//! Every response is wrapped in an [`Envelope`], which serializes to `{"success": true, ...body}`
//! on success and `{"success": false, "error": "<message>"}` on failure.

use crate::classifier::{classify, Kind};
use crate::config::EngineConfig;
use crate::converter::{convert, ConversionInfo};
use crate::minimizer::{minimize, MinimizationInfo};
use crate::simulator::{test_string, Simulation};
use crate::types::{AutomatonDefinition, AutomatonError, State, Symbol};
use crate::validator::validate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// The input string of a test request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Input {
    /// A plain string; every character is one symbol.
    Text(String),
    /// An explicit symbol sequence, for alphabets with multi-character symbols.
    Symbols(Vec<Symbol>),
}

impl Input {
    pub fn symbols(&self) -> Vec<Symbol> {
        match self {
            Input::Text(text) => text.chars().map(String::from).collect(),
            Input::Symbols(symbols) => symbols.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStringRequest {
    #[serde(flatten)]
    pub automaton: AutomatonDefinition,
    pub input: Input,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyResponse {
    #[serde(rename = "type")]
    pub kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStringResponse {
    pub accepted: bool,
    pub path: Vec<State>,
    /// `null` when the run got stuck.
    pub final_state: Option<State>,
    pub final_states: Vec<State>,
    pub input_length: usize,
    pub path_length: usize,
}

impl TestStringResponse {
    pub fn from_simulation(simulation: &Simulation, input_length: usize) -> Self {
        Self {
            accepted: simulation.accepted,
            final_state: simulation.final_state().map(String::from),
            final_states: simulation.final_states.clone(),
            input_length,
            path_length: simulation.path.len(),
            path: simulation.path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertResponse {
    pub dfa: AutomatonDefinition,
    pub conversion_info: ConversionInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimizeResponse {
    #[serde(flatten)]
    pub automaton: AutomatonDefinition,
    pub minimization_info: MinimizationInfo,
}

/// A response body together with its success flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(body: T) -> Self {
        Self {
            success: true,
            body: Some(body),
            error: None,
        }
    }

    pub fn err(error: &AutomatonError) -> Self {
        Self {
            success: false,
            body: None,
            error: Some(error.to_string()),
        }
    }
}

impl<T> From<Result<T, AutomatonError>> for Envelope<T> {
    fn from(result: Result<T, AutomatonError>) -> Self {
        match result {
            Ok(body) => Envelope::ok(body),
            Err(e) => Envelope::err(&e),
        }
    }
}

/// The operations exposed over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Classify,
    Test,
    Convert,
    Minimize,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Classify,
        Operation::Test,
        Operation::Convert,
        Operation::Minimize,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Classify => "classify",
            Operation::Test => "test",
            Operation::Convert => "convert",
            Operation::Minimize => "minimize",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classify" => Ok(Operation::Classify),
            "test" | "testString" | "test-string" => Ok(Operation::Test),
            "convert" => Ok(Operation::Convert),
            "minimize" => Ok(Operation::Minimize),
            _ => Err(format!(
                "Unknown operation '{}'. Expected one of: classify, test, convert, minimize",
                s
            )),
        }
    }
}

pub fn classify_definition(
    definition: &AutomatonDefinition,
) -> Result<ClassifyResponse, AutomatonError> {
    let automaton = validate(definition)?;

    Ok(ClassifyResponse {
        kind: classify(&automaton),
    })
}

pub fn test_definition(request: &TestStringRequest) -> Result<TestStringResponse, AutomatonError> {
    let automaton = validate(&request.automaton)?;
    let input = request.input.symbols();
    let simulation = test_string(&automaton, &input)?;

    Ok(TestStringResponse::from_simulation(&simulation, input.len()))
}

pub fn convert_definition(
    definition: &AutomatonDefinition,
    config: &EngineConfig,
) -> Result<ConvertResponse, AutomatonError> {
    let automaton = validate(definition)?;
    let conversion = convert(&automaton, config)?;

    Ok(ConvertResponse {
        dfa: conversion.dfa.to_definition(),
        conversion_info: conversion.info,
    })
}

pub fn minimize_definition(
    definition: &AutomatonDefinition,
) -> Result<MinimizeResponse, AutomatonError> {
    let automaton = validate(definition)?;
    let minimization = minimize(&automaton)?;

    Ok(MinimizeResponse {
        automaton: minimization.automaton.to_definition(),
        minimization_info: minimization.info,
    })
}

/// Decodes a JSON request for `operation`, runs it and returns the enveloped response.
///
/// # Arguments
///
/// * `operation` - The operation to run.
/// * `request` - The JSON request body.
/// * `config` - Engine limits for the operation.
///
/// # Returns
///
/// The response envelope as a JSON value. Every failure, including an undecodable request, is
/// reported inside the envelope.
pub fn respond(operation: Operation, request: &str, config: &EngineConfig) -> Value {
    let envelope = match operation {
        Operation::Classify => to_value(decode(request).and_then(|d| classify_definition(&d))),
        Operation::Test => to_value(decode(request).and_then(|r| test_definition(&r))),
        Operation::Convert => to_value(decode(request).and_then(|d| convert_definition(&d, config))),
        Operation::Minimize => to_value(decode(request).and_then(|d| minimize_definition(&d))),
    };

    envelope.unwrap_or_else(|e| json!({ "success": false, "error": e.to_string() }))
}

fn decode<T: for<'de> Deserialize<'de>>(request: &str) -> Result<T, AutomatonError> {
    serde_json::from_str(request).map_err(|e| AutomatonError::Request(e.to_string()))
}

fn to_value<T: Serialize>(result: Result<T, AutomatonError>) -> serde_json::Result<Value> {
    serde_json::to_value(Envelope::from(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDS_IN_ZERO: &str = r#"{
        "states": ["q0", "q1"],
        "symbols": ["0", "1"],
        "start_state": "q0",
        "end_states": ["q1"],
        "transitions": {
            "q0": {"0": ["q1"], "1": ["q0"]},
            "q1": {"0": ["q1"], "1": ["q0"]}
        }
    }"#;

    const EPSILON_CHAIN: &str = r#"{
        "states": ["p0", "p1", "p2"],
        "symbols": ["a"],
        "start_state": "p0",
        "end_states": ["p2"],
        "transitions": {"p0": {"ε": ["p1"]}, "p1": {"a": ["p2"]}}
    }"#;

    fn with_input(automaton: &str, input: Value) -> String {
        let mut request: Value = serde_json::from_str(automaton).unwrap();
        request["input"] = input;
        request.to_string()
    }

    #[test]
    fn test_classify_request() {
        let response = respond(Operation::Classify, ENDS_IN_ZERO, &EngineConfig::default());

        assert_eq!(response, json!({"success": true, "type": "DFA"}));
    }

    #[test]
    fn test_string_request() {
        let config = EngineConfig::default();

        let accepted = respond(Operation::Test, &with_input(ENDS_IN_ZERO, json!("0")), &config);
        assert_eq!(accepted["success"], json!(true));
        assert_eq!(accepted["accepted"], json!(true));
        assert_eq!(accepted["path"], json!(["q0", "q1"]));
        assert_eq!(accepted["final_state"], json!("q1"));
        assert_eq!(accepted["input_length"], json!(1));
        assert_eq!(accepted["path_length"], json!(2));

        let rejected = respond(Operation::Test, &with_input(ENDS_IN_ZERO, json!("01")), &config);
        assert_eq!(rejected["accepted"], json!(false));
        assert_eq!(rejected["final_state"], json!("q0"));
    }

    #[test]
    fn test_string_request_with_symbol_array() {
        let request = with_input(ENDS_IN_ZERO, json!(["1", "0"]));

        let response = respond(Operation::Test, &request, &EngineConfig::default());

        assert_eq!(response["accepted"], json!(true));
        assert_eq!(response["path"], json!(["q0", "q0", "q1"]));
    }

    #[test]
    fn test_string_request_with_invalid_symbol() {
        let request = with_input(ENDS_IN_ZERO, json!("02"));

        let response = respond(Operation::Test, &request, &EngineConfig::default());

        assert_eq!(response["success"], json!(false));
        assert_eq!(response["error"], json!("Invalid symbol '2' at position 1"));
    }

    #[test]
    fn test_convert_request() {
        let response = respond(Operation::Convert, EPSILON_CHAIN, &EngineConfig::default());

        assert_eq!(
            response,
            json!({
                "success": true,
                "dfa": {
                    "states": ["q0", "q1", "∅"],
                    "symbols": ["a"],
                    "start_state": "q0",
                    "end_states": ["q1"],
                    "transitions": {
                        "q0": {"a": ["q1"]},
                        "q1": {"a": ["∅"]},
                        "∅": {"a": ["∅"]}
                    }
                },
                "conversion_info": {
                    "original_nfa_states": 3,
                    "resulting_dfa_states": 3,
                    "epsilon_transitions_removed": true
                }
            })
        );
    }

    #[test]
    fn test_convert_respects_limit() {
        let config = EngineConfig::default().with_max_dfa_states(2);

        let response = respond(Operation::Convert, EPSILON_CHAIN, &config);

        assert_eq!(response["success"], json!(false));
        assert!(response["error"].as_str().unwrap().contains("limit of 2"));
    }

    #[test]
    fn test_minimize_request() {
        let request = r#"{
            "states": ["q0", "q1", "q2", "q3"],
            "symbols": ["a", "b"],
            "start_state": "q0",
            "end_states": ["q3"],
            "transitions": {
                "q0": {"a": ["q1"], "b": ["q2"]},
                "q1": {"a": ["q3"], "b": ["q3"]},
                "q2": {"a": ["q3"], "b": ["q3"]},
                "q3": {"a": ["q3"], "b": ["q3"]}
            }
        }"#;

        let response = respond(Operation::Minimize, request, &EngineConfig::default());

        assert_eq!(response["success"], json!(true));
        assert_eq!(response["states"], json!(["q0", "q1", "q3"]));
        assert_eq!(response["transitions"]["q0"]["b"], json!(["q1"]));
        assert_eq!(
            response["minimization_info"],
            json!({"original_states": 4, "minimized_states": 3})
        );
    }

    #[test]
    fn test_minimize_rejects_nfa() {
        let response = respond(Operation::Minimize, EPSILON_CHAIN, &EngineConfig::default());

        assert_eq!(
            response,
            json!({
                "success": false,
                "error": "Only DFAs can be minimized. This automaton is: NFA"
            })
        );
    }

    #[test]
    fn test_malformed_request_lists_every_violation() {
        let request = r#"{
            "states": ["q0"],
            "symbols": ["a"],
            "start_state": "q9",
            "end_states": ["q7"],
            "transitions": {}
        }"#;

        let response = respond(Operation::Classify, request, &EngineConfig::default());
        let error = response["error"].as_str().unwrap();

        assert_eq!(response["success"], json!(false));
        assert!(error.starts_with("Malformed automaton"));
        assert!(error.contains("q9"));
        assert!(error.contains("q7"));
    }

    #[test]
    fn test_undecodable_request() {
        let response = respond(Operation::Classify, "{not json", &EngineConfig::default());

        assert_eq!(response["success"], json!(false));
        assert!(response["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request"));
    }

    #[test]
    fn test_missing_input_is_a_request_error() {
        let response = respond(Operation::Test, ENDS_IN_ZERO, &EngineConfig::default());

        assert!(response["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request"));
    }

    #[test]
    fn test_operation_names() {
        for operation in Operation::ALL {
            assert_eq!(operation.name().parse::<Operation>(), Ok(operation));
        }
        assert_eq!("testString".parse::<Operation>(), Ok(Operation::Test));
        assert!("reverse".parse::<Operation>().is_err());
    }
}
