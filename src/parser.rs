//! This module provides the parser for the `.fa` automaton text format, utilizing the `pest`
//! crate. The grammar lives in `grammar.pest`; this module turns the parse tree into an
//! `AutomatonDefinition`.

use crate::types::{is_epsilon, AutomatonDefinition, AutomatonError, State, Symbol, EPSILON};
use crate::validator::validate;
use indexmap::IndexSet;
use pest::{
    error::{Error, ErrorVariant},
    iterators::{Pair, Pairs},
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::HashSet;

/// Derives a `PestParser` for the automaton grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct AutomatonParser;

/// Parses the given input string into an `AutomatonDefinition`.
///
/// When the `states:` section is omitted, states are collected in order of first appearance
/// from the start state, the rule blocks, their targets and the accepting list. When `symbols:`
/// is omitted, the alphabet is every non-ε edge label. The result is validated before it is
/// returned.
///
/// # Arguments
///
/// * `input` - A string slice containing the automaton definition.
///
/// # Returns
///
/// * `Ok(AutomatonDefinition)` if the input is successfully parsed and validated.
/// * `Err(AutomatonError::Parse)` if there are any syntax errors or duplicate sections.
/// * `Err(AutomatonError::Malformed)` if the definition fails validation.
pub fn parse(input: &str) -> Result<AutomatonDefinition, AutomatonError> {
    let root = AutomatonParser::parse(Rule::program, input.trim())
        .map_err(|e| AutomatonError::Parse(Box::new(e)))?
        .next()
        .ok_or_else(|| AutomatonError::Internal("empty parse tree".to_string()))?;

    let definition = parse_program(root)?;

    validate(&definition)?;

    Ok(definition)
}

/// Parses the top-level sections of a definition from a `Pair<Rule::program>`.
fn parse_program(pair: Pair<Rule>) -> Result<AutomatonDefinition, AutomatonError> {
    let program_span = pair.as_span();
    let mut name: Option<String> = None;
    let mut states: Option<Vec<State>> = None;
    let mut symbols: Option<Vec<Symbol>> = None;
    let mut start: Option<State> = None;
    let mut accept: Option<Vec<State>> = None;
    let mut rules: Option<Vec<ParsedBlock>> = None;
    let mut seen = HashSet::new();

    for p in pair.into_inner() {
        let span = p.as_span();
        let rule = p.as_rule();

        check_unique_rule(rule, span, &mut seen)?;

        match rule {
            Rule::name => name = Some(parse_label(p)?.trim().to_string()),
            Rule::states => states = Some(parse_labels(p)),
            Rule::symbols => symbols = Some(parse_labels(p)),
            Rule::start => start = Some(parse_label(p)?),
            Rule::accept => accept = Some(parse_labels(p)),
            Rule::rules => rules = Some(parse_rules(p)?),
            _ => {} // EOI
        }
    }

    let start = check_required_rule(start, "start", program_span)?;
    let rules = check_required_rule(rules, "rules", program_span)?;
    let accept = accept.unwrap_or_default();

    let states = states.unwrap_or_else(|| derive_states(&start, &rules, &accept));
    let symbols = symbols.unwrap_or_else(|| derive_symbols(&rules));

    let mut definition = AutomatonDefinition {
        name,
        states,
        symbols,
        start_state: start,
        end_states: accept,
        transitions: Default::default(),
    };

    for block in rules {
        let row = definition.transitions.entry(block.state).or_default();
        for (symbol, targets) in block.edges {
            row.insert(symbol, targets);
        }
    }

    Ok(definition)
}

/// Parses the `rules:` section, rejecting a state that has more than one block.
fn parse_rules(pair: Pair<Rule>) -> Result<Vec<ParsedBlock>, AutomatonError> {
    let mut blocks: Vec<ParsedBlock> = Vec::new();

    for block_pair in pair.into_inner() {
        if block_pair.as_rule() != Rule::block {
            continue;
        }

        let span = block_pair.as_span();
        let block = parse_block(block_pair)?;

        if blocks.iter().any(|b| b.state == block.state) {
            return Err(parse_error(
                &format!("Duplicate rule block for state: {}", block.state),
                span,
            ));
        }

        blocks.push(block);
    }

    Ok(blocks)
}

/// Parses one state block and its edges. ε may be written as `ε` or `ɛ`.
fn parse_block(pair: Pair<Rule>) -> Result<ParsedBlock, AutomatonError> {
    let mut pairs = pair.into_inner();
    let state = parse_string(&mut pairs)?;
    let mut edges: Vec<(Symbol, Vec<State>)> = Vec::new();

    for edge in pairs.filter(|p| p.as_rule() == Rule::edge) {
        let span = edge.as_span();
        let mut inner = edge.into_inner();
        let symbol = normalize_symbol(parse_string(&mut inner)?);
        let targets = inner
            .find(|p| p.as_rule() == Rule::targets)
            .map(parse_labels)
            .unwrap_or_default();

        if edges.iter().any(|(s, _)| *s == symbol) {
            return Err(parse_error(
                &format!("Duplicate edge on '{}' in state: {}", symbol, state),
                span,
            ));
        }

        edges.push((symbol, targets));
    }

    Ok(ParsedBlock { state, edges })
}

fn derive_states(start: &str, rules: &[ParsedBlock], accept: &[State]) -> Vec<State> {
    let mut states: IndexSet<State> = IndexSet::new();
    states.insert(start.to_string());

    for block in rules {
        states.insert(block.state.clone());
    }
    for block in rules {
        for (_, targets) in &block.edges {
            states.extend(targets.iter().cloned());
        }
    }
    states.extend(accept.iter().cloned());

    states.into_iter().collect()
}

fn derive_symbols(rules: &[ParsedBlock]) -> Vec<Symbol> {
    rules
        .iter()
        .flat_map(|block| block.edges.iter().map(|(symbol, _)| symbol))
        .filter(|symbol| !is_epsilon(symbol))
        .cloned()
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

fn normalize_symbol(symbol: Symbol) -> Symbol {
    if is_epsilon(&symbol) {
        EPSILON.to_string()
    } else {
        symbol
    }
}

/// Creates an `AutomatonError::Parse` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> AutomatonError {
    AutomatonError::Parse(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Extracts the first label (or text) inside a section.
fn parse_label(pair: Pair<Rule>) -> Result<String, AutomatonError> {
    parse_string(&mut pair.into_inner())
}

/// Collects every label inside a section.
fn parse_labels(pair: Pair<Rule>) -> Vec<String> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::label)
        .map(|p| p.as_str().to_string())
        .collect()
}

/// Extracts the string content from the current `Pair` in a `Pairs` iterator.
fn parse_string(pairs: &mut Pairs<Rule>) -> Result<String, AutomatonError> {
    pairs
        .next()
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| AutomatonError::Internal("unexpected end of parse tree".to_string()))
}

/// Checks if a given section has already been declared.
fn check_unique_rule(
    rule: Rule,
    span: Span,
    seen: &mut HashSet<Rule>,
) -> Result<(), AutomatonError> {
    if !matches!(
        rule,
        Rule::name | Rule::states | Rule::symbols | Rule::start | Rule::accept | Rule::rules
    ) {
        return Ok(());
    };

    if !seen.insert(rule) {
        return Err(parse_error(
            &format!("Duplicate \"{rule:?}:\" declaration"),
            span,
        ));
    }

    Ok(())
}

/// Checks if a required section is present, returning an `Err` if it's missing.
fn check_required_rule<T>(value: Option<T>, name: &str, span: Span) -> Result<T, AutomatonError> {
    value.ok_or_else(|| parse_error(&format!("Missing '{}' section", name), span))
}

/// A helper struct to temporarily hold one parsed state block.
struct ParsedBlock {
    state: State,
    edges: Vec<(Symbol, Vec<State>)>,
}
