use automata::wire::{
    classify_definition, convert_definition, minimize_definition, Envelope, TestStringResponse,
};
use automata::{
    classify, convert, minimize, respond, test_string, validate, AutomatonDefinition,
    AutomatonError, AutomatonLibrary, AutomatonLoader, EngineConfig, Operation, Symbol,
};
use clap::{ArgAction, Parser, Subcommand};
use log::{debug, LevelFilter};
use serde::Serialize;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
#[clap(after_help = "EXAMPLES:
  automata-cli list
  automata-cli --builtin \"Ends with 01\" test 1001 110
  automata-cli --file demos/contains-ab.fa convert
  cat dfa.json | automata-cli minimize --json
  cat request.json | automata-cli request test")]
struct Cli {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON file with engine settings
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum number of states subset construction may create
    #[clap(long, global = true)]
    max_states: Option<usize>,

    /// Print wire-format JSON responses
    #[clap(long, global = true)]
    json: bool,

    /// Automaton definition file (.fa or .json)
    #[clap(short, long, global = true, conflicts_with = "builtin")]
    file: Option<PathBuf>,

    /// Built-in automaton, by name or index (see `list`)
    #[clap(short, long, global = true)]
    builtin: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report whether the automaton is a DFA or an NFA
    Classify,
    /// Run one or more input strings through the automaton
    Test {
        /// Input strings; every character is one symbol
        #[clap(required = true)]
        inputs: Vec<String>,

        /// Treat each input as a space-separated list of symbols
        #[clap(long)]
        symbols: bool,
    },
    /// Convert the automaton into an equivalent total DFA
    Convert,
    /// Minimize a DFA
    Minimize,
    /// List the built-in automata
    List,
    /// Read a wire request from stdin and print the wire response
    Request {
        /// One of: classify, test, convert, minimize
        operation: Operation,
    },
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Installs `env_logger`. `-v` flags override `RUST_LOG`; without either only warnings show.
fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_default_env();

    match verbose {
        0 if std::env::var_os("RUST_LOG").is_some() => {}
        0 => {
            builder.filter_level(LevelFilter::Warn);
        }
        1 => {
            builder.filter_level(LevelFilter::Info);
        }
        2 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }

    builder.init();
}

/// Runs the selected command. Returns `Ok(false)` when a JSON response reported a failure.
fn run(cli: &Cli) -> Result<bool, AutomatonError> {
    let config = load_config(cli)?;

    match &cli.command {
        Command::List => {
            list(cli.json)?;
            Ok(true)
        }
        Command::Request { operation } => request(*operation, &config),
        Command::Classify => {
            let definition = load_definition(cli)?;
            if cli.json {
                return Ok(print_envelope(classify_definition(&definition)));
            }

            println!("{}", classify(&validate(&definition)?));
            Ok(true)
        }
        Command::Test { inputs, symbols } => {
            let definition = load_definition(cli)?;
            test(&definition, inputs, *symbols, cli.json)
        }
        Command::Convert => {
            let definition = load_definition(cli)?;
            if cli.json {
                return Ok(print_envelope(convert_definition(&definition, &config)));
            }

            let conversion = convert(&validate(&definition)?, &config)?;
            print!("{}", render(&conversion.dfa.to_definition()));
            println!();
            for (state, subset) in &conversion.subsets {
                println!("# {} = {{{}}}", state, subset.join(", "));
            }
            println!(
                "# {} -> {} states, epsilon moves removed: {}",
                conversion.info.original_nfa_states,
                conversion.info.resulting_dfa_states,
                conversion.info.epsilon_transitions_removed
            );
            Ok(true)
        }
        Command::Minimize => {
            let definition = load_definition(cli)?;
            if cli.json {
                return Ok(print_envelope(minimize_definition(&definition)));
            }

            let minimization = minimize(&validate(&definition)?)?;
            print!("{}", render(&minimization.automaton.to_definition()));
            println!();
            println!(
                "# {} -> {} states",
                minimization.info.original_states, minimization.info.minimized_states
            );
            Ok(true)
        }
    }
}

fn load_config(cli: &Cli) -> Result<EngineConfig, AutomatonError> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.max_states {
        Some(0) => Err(AutomatonError::Config(
            "--max-states must be at least 1".to_string(),
        )),
        Some(limit) => Ok(config.with_max_dfa_states(limit)),
        None => Ok(config),
    }
}

/// Loads the automaton named on the command line.
///
/// It tries a file path, then a built-in name or index, and finally a definition piped on stdin
/// (JSON, or `.fa` text when it does not start with `{`).
fn load_definition(cli: &Cli) -> Result<AutomatonDefinition, AutomatonError> {
    if let Some(path) = &cli.file {
        debug!("loading automaton from {}", path.display());
        AutomatonLoader::load(path)
    } else if let Some(name) = &cli.builtin {
        match name.parse::<usize>() {
            Ok(index) => AutomatonLibrary::get_by_index(index),
            Err(_) => AutomatonLibrary::get_by_name(name),
        }
    } else if atty::isnt(atty::Stream::Stdin) {
        let buffer = read_stdin()?;
        if buffer.trim_start().starts_with('{') {
            AutomatonLoader::load_from_json(&buffer)
        } else {
            AutomatonLoader::load_from_string(&buffer)
        }
    } else {
        Err(AutomatonError::Request(
            "No automaton given. Use --file, --builtin, or pipe a definition on stdin".to_string(),
        ))
    }
}

fn read_stdin() -> Result<String, AutomatonError> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| AutomatonError::File(format!("Failed to read from stdin: {}", e)))?;

    Ok(buffer)
}

fn list(json: bool) -> Result<(), AutomatonError> {
    let infos = (0..AutomatonLibrary::count())
        .map(AutomatonLibrary::info)
        .collect::<Result<Vec<_>, _>>()?;

    if json {
        print_json(&infos);
        return Ok(());
    }

    for info in infos {
        println!(
            "{:>2}  {:<20} {}  {} states, {} symbols, {} transitions",
            info.index,
            info.name,
            info.kind,
            info.state_count,
            info.symbol_count,
            info.transition_count
        );
    }

    Ok(())
}

fn test(
    definition: &AutomatonDefinition,
    inputs: &[String],
    symbols: bool,
    json: bool,
) -> Result<bool, AutomatonError> {
    let automaton = validate(definition)?;
    let mut success = true;

    for input in inputs {
        let word: Vec<Symbol> = if symbols {
            input.split_whitespace().map(String::from).collect()
        } else {
            input.chars().map(String::from).collect()
        };

        let result = test_string(&automaton, &word);

        if json {
            let response = result.map(|s| TestStringResponse::from_simulation(&s, word.len()));
            success &= print_envelope(response);
            continue;
        }

        let simulation = result?;
        let verdict = if simulation.accepted { "accepted" } else { "rejected" };
        let ending = match (simulation.final_state(), simulation.stuck_at) {
            (_, Some(position)) => format!("stuck at position {}", position),
            (Some(state), None) => format!("final state {}", state),
            (None, None) => String::new(),
        };

        println!(
            "{:?}: {}  path: {}  {}",
            input,
            verdict,
            simulation.path.join(" -> "),
            ending
        );
    }

    Ok(success)
}

fn request(operation: Operation, config: &EngineConfig) -> Result<bool, AutomatonError> {
    let buffer = read_stdin()?;
    let response = respond(operation, &buffer, config);

    print_json(&response);

    Ok(response["success"] == serde_json::Value::Bool(true))
}

/// Prints a wire envelope and returns whether it reported success.
fn print_envelope<T: Serialize>(result: Result<T, AutomatonError>) -> bool {
    let envelope = Envelope::from(result);
    print_json(&envelope);
    envelope.success
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: failed to encode response: {}", e),
    }
}

/// Renders a definition in the `.fa` text format.
fn render(definition: &AutomatonDefinition) -> String {
    let mut out = String::new();

    if let Some(name) = &definition.name {
        out.push_str(&format!("name: {}\n", name));
    }
    out.push_str(&format!("states: [{}]\n", definition.states.join(", ")));
    out.push_str(&format!("symbols: [{}]\n", definition.symbols.join(", ")));
    out.push_str(&format!("start: {}\n", definition.start_state));
    out.push_str(&format!("accept: [{}]\n", definition.end_states.join(", ")));
    out.push_str("rules:\n");

    for state in &definition.states {
        out.push_str(&format!("  {}:\n", state));
        if let Some(row) = definition.transitions.get(state) {
            for (symbol, targets) in row {
                out.push_str(&format!("    {} -> {}\n", symbol, targets.join(", ")));
            }
        }
    }

    out
}
