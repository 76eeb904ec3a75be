use std::{
    fs,
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use fa2_ledger::{
    config::{ConfigError, GenesisConfig},
    contract::SnapshotError,
    ledger::SupplyBook,
    ContractState, Entrypoint, Invocation, LedgerError, OutboundMessage,
};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about = "FA2 multi-asset ledger driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the initial state from a genesis file
    Init {
        #[arg(long, value_name = "FILE")]
        genesis: PathBuf,
        #[arg(long, value_name = "FILE")]
        state: PathBuf,
    },

    /// Run one invocation against a state file; the file is only rewritten on success
    Invoke {
        #[arg(long, value_name = "FILE")]
        state: PathBuf,
        /// Caller identity
        #[arg(long)]
        sender: String,
        /// Entrypoint call as JSON, e.g. {"mint":[...]}
        #[arg(long, value_name = "FILE")]
        call: PathBuf,
    },

    /// Replay a scenario: one {"sender", "call", "expect_error"?} object per line
    Replay {
        #[arg(long, value_name = "FILE")]
        genesis: PathBuf,
        #[arg(long, value_name = "FILE")]
        script: PathBuf,
        /// Where to write the final state
        #[arg(long, value_name = "FILE")]
        state: Option<PathBuf>,
    },

    /// Print balances, supplies, administrators and the state root
    Show {
        #[arg(long, value_name = "FILE")]
        state: PathBuf,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("invocation aborted with {}: {0}", .0.code())]
    Aborted(LedgerError),
    #[error("{0} scenario step(s) did not match their expectation")]
    ScenarioFailed(usize),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Aborted(_) | CliError::ScenarioFailed(_) => 1,
            _ => 2,
        }
    }
}

#[derive(Deserialize)]
struct ScriptStep {
    #[serde(flatten)]
    invocation: Invocation,
    #[serde(default)]
    expect_error: Option<String>,
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = match cli.command {
        Commands::Init { genesis, state } => init_cmd(&genesis, &state, &mut out),
        Commands::Invoke {
            state,
            sender,
            call,
        } => invoke_cmd(&state, sender, &call, &mut out),
        Commands::Replay {
            genesis,
            script,
            state,
        } => replay_cmd(&genesis, &script, state.as_deref(), &mut out),
        Commands::Show { state } => show_cmd(&state, &mut out),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

fn init_cmd(genesis: &Path, state_path: &Path, out: &mut impl Write) -> Result<(), CliError> {
    let state = GenesisConfig::load(genesis)?.build()?;
    state.write_snapshot(state_path)?;
    writeln!(
        out,
        "Initialized {} (root {})",
        state_path.display(),
        hex::encode(state.state_root())
    )?;
    Ok(())
}

fn invoke_cmd(
    state_path: &Path,
    sender: String,
    call_path: &Path,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut state = ContractState::read_snapshot(state_path)?;
    let call: Entrypoint = read_json(call_path)?;
    let mut outbox = Vec::new();
    state
        .invoke(&sender, &call, &mut outbox)
        .map_err(CliError::Aborted)?;
    state.write_snapshot(state_path)?;
    print_messages(&outbox, out)?;
    info!(entrypoint = call.name(), height = state.height(), "state updated");
    Ok(())
}

fn replay_cmd(
    genesis: &Path,
    script: &Path,
    state_path: Option<&Path>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut state = GenesisConfig::load(genesis)?.build()?;
    let reader = BufReader::new(fs::File::open(script)?);
    let mut mismatches = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let step: ScriptStep = serde_json::from_str(&line).map_err(|source| CliError::Parse {
            path: format!("{}:{}", script.display(), idx + 1),
            source,
        })?;
        let mut outbox = Vec::new();
        let Invocation { sender, call } = step.invocation;
        let outcome = state.invoke(&sender, &call, &mut outbox);
        let observed = outcome.as_ref().err().map(LedgerError::code);
        let verdict = if observed == step.expect_error {
            "ok"
        } else {
            mismatches += 1;
            "UNEXPECTED"
        };
        writeln!(
            out,
            "step {:>3} {:<22} by {:<12} -> {:<26} [{verdict}]",
            idx + 1,
            call.name(),
            sender,
            observed.as_deref().unwrap_or("committed"),
        )?;
        print_messages(&outbox, out)?;
    }

    if let Some(path) = state_path {
        state.write_snapshot(path)?;
    }
    writeln!(
        out,
        "height {} root {}",
        state.height(),
        hex::encode(state.state_root())
    )?;
    if mismatches > 0 {
        return Err(CliError::ScenarioFailed(mismatches));
    }
    Ok(())
}

fn show_cmd(state_path: &Path, out: &mut impl Write) -> Result<(), CliError> {
    let state = ContractState::read_snapshot(state_path)?;
    writeln!(out, "profile: {:?}", state.profile())?;
    writeln!(out, "height:  {}", state.height())?;
    writeln!(out, "root:    {}", hex::encode(state.state_root()))?;
    if let Some(access) = state.access() {
        writeln!(out, "administrator:          {}", access.administrator)?;
        writeln!(out, "proposed administrator: {}", access.proposed_administrator)?;
    }
    if let Some(redeem) = state.redeem_address() {
        writeln!(out, "redeem address:         {redeem}")?;
    }
    for token_id in state.registry().token_ids() {
        match state.supply() {
            Some(supply) => writeln!(
                out,
                "token {token_id}: supply {}",
                supply.total_supply(token_id)
            )?,
            None => writeln!(out, "token {token_id}")?,
        }
        for (key, balance) in state.ledger().iter().filter(|(key, _)| key.token_id == token_id) {
            writeln!(out, "  {:<40} {balance}", key.owner)?;
        }
    }
    Ok(())
}

fn print_messages(messages: &[OutboundMessage], out: &mut impl Write) -> Result<(), CliError> {
    for message in messages {
        writeln!(out, "{}", serde_json::to_string(message)?)?;
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|source| CliError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS: &str = r#"{
        "profile": "burnable_mintable",
        "administrator": "admin",
        "redeem_address": "dan",
        "tokens": [{"token_id": 0, "info": {"symbol": "544b30"}}],
        "balances": [{"owner": "alice", "token_id": 0, "amount": 100}]
    }"#;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn invoke_persists_only_committed_calls() {
        let dir = tempfile::tempdir().unwrap();
        let genesis = write(dir.path(), "genesis.json", GENESIS);
        let state_path = dir.path().join("state.json");
        init_cmd(&genesis, &state_path, &mut Vec::new()).unwrap();

        let good = write(
            dir.path(),
            "good.json",
            r#"{"transfer":[{"from":"alice","txs":[{"to":"bob","token_id":0,"amount":40}]}]}"#,
        );
        invoke_cmd(&state_path, "alice".into(), &good, &mut Vec::new()).unwrap();

        let before = fs::read(&state_path).unwrap();
        let err = invoke_cmd(&state_path, "bob".into(), &good, &mut Vec::new()).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("FA2_NOT_OWNER"));
        assert_eq!(fs::read(&state_path).unwrap(), before);

        let state = ContractState::read_snapshot(&state_path).unwrap();
        assert_eq!(state.balance(0, "alice"), 60);
        assert_eq!(state.balance(0, "bob"), 40);
    }

    #[test]
    fn balance_of_prints_callback_message() {
        let dir = tempfile::tempdir().unwrap();
        let genesis = write(dir.path(), "genesis.json", GENESIS);
        let state_path = dir.path().join("state.json");
        init_cmd(&genesis, &state_path, &mut Vec::new()).unwrap();

        let query = write(
            dir.path(),
            "query.json",
            r#"{"balance_of":{"requests":[{"token_id":0,"owner":"alice"},{"token_id":0,"owner":"carol"}],"destination":"viewer"}}"#,
        );
        let mut out = Vec::new();
        invoke_cmd(&state_path, "carol".into(), &query, &mut out).unwrap();
        let printed = String::from_utf8(out).unwrap();
        let message: OutboundMessage = serde_json::from_str(printed.trim()).unwrap();
        match message {
            OutboundMessage::BalanceOf {
                destination,
                responses,
            } => {
                assert_eq!(destination, "viewer");
                assert_eq!(responses[0].balance, 100);
                assert_eq!(responses[1].balance, 0);
            }
        }
    }

    #[test]
    fn replay_checks_expected_errors() {
        let dir = tempfile::tempdir().unwrap();
        let genesis = write(dir.path(), "genesis.json", GENESIS);
        let script = write(
            dir.path(),
            "scenario.jsonl",
            r#"# token 0 registered, alice holds 100
{"sender":"alice","call":{"transfer":[{"from":"alice","txs":[{"to":"bob","token_id":0,"amount":40}]}]}}
{"sender":"bob","call":{"transfer":[{"from":"alice","txs":[{"to":"bob","token_id":0,"amount":1}]}]},"expect_error":"FA2_NOT_OWNER"}
{"sender":"admin","call":{"mint":[{"to":"dan","token_id":1,"amount":50}]},"expect_error":"FA2_TOKEN_UNDEFINED"}
{"sender":"admin","call":{"mint":[{"to":"dan","token_id":0,"amount":10}]}}
{"sender":"admin","call":{"burn":[{"token_id":0,"amount":30}]},"expect_error":"FA2_INSUFFICIENT_BALANCE"}
{"sender":"admin","call":{"burn":[{"token_id":0,"amount":10}]}}
"#,
        );
        let state_path = dir.path().join("final.json");
        let mut out = Vec::new();
        replay_cmd(&genesis, &script, Some(&state_path), &mut out).unwrap();

        let state = ContractState::read_snapshot(&state_path).unwrap();
        assert_eq!(state.height(), 3);
        assert_eq!(state.total_supply(0), Some(100));
        assert_eq!(state.balance(0, "dan"), 0);
        assert!(!String::from_utf8(out).unwrap().contains("UNEXPECTED"));
    }

    #[test]
    fn replay_reports_mismatched_expectations() {
        let dir = tempfile::tempdir().unwrap();
        let genesis = write(dir.path(), "genesis.json", GENESIS);
        let script = write(
            dir.path(),
            "scenario.jsonl",
            r#"{"sender":"alice","call":{"propose_administrator":"alice"}}"#,
        );
        let err = replay_cmd(&genesis, &script, None, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, CliError::ScenarioFailed(1)));
    }

    #[test]
    fn show_lists_holders() {
        let dir = tempfile::tempdir().unwrap();
        let genesis = write(dir.path(), "genesis.json", GENESIS);
        let state_path = dir.path().join("state.json");
        init_cmd(&genesis, &state_path, &mut Vec::new()).unwrap();

        let mut out = Vec::new();
        show_cmd(&state_path, &mut out).unwrap();
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("token 0: supply 100"));
        assert!(printed.contains("alice"));
        assert!(printed.contains("redeem address:         dan"));
    }
}
