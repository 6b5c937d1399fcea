//! Walletgate CLI - inspect and exercise the persisted wallet session
//!
//!   walletgate status                       → stored session record (or null)
//!   walletgate clear                        → remove the stored record
//!   walletgate networks                     → supported networks
//!   walletgate simulate --address <a> --chain <id> [--reject]
//!                                           → one reconciliation pass against a scripted wallet
//!   walletgate watch --address <a> --chain <id>
//!                                           → run the engine, print events until Ctrl+C;
//!                                             stdin lines drive the wallet (see below)
//!
//! Configuration:
//!   --app <name> or WALLETGATE_APP selects the data directory under
//!   WALLETGATE_ROOT (default: platform local data dir).
//!
//! Watch input (one per line):
//!   chain <id> | account <0x..> | connect <0x..> <id> | drop | disconnect | approve | reject
//!
//! Output format:
//!   --json     Output raw JSON (default for non-tty)
//!   --pretty   Pretty-print JSON (default for tty)

use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use walletgate::core::keys::env as keys;
use walletgate::logging::init_logging;
use walletgate::{
    install_signal_handlers, EngineEvent, FileKv, NavigationLog, ScriptedWallet, SessionConfig, SessionEngine,
    SessionStore, SignBehavior,
};

fn main() {
    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);
    init_logging(opts.app.as_deref().unwrap_or("walletgate"));

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("walletgate {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        _ if !opts.errors.is_empty() => Err(opts.errors.join("; ")),
        Some("status") => cmd_status(&opts),
        Some("clear") => cmd_clear(&opts),
        Some("networks") => cmd_networks(&opts),
        Some("simulate") => cmd_simulate(&opts),
        Some("watch") => cmd_watch(&opts),
        Some(cmd) => Err(format!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = opts.pretty || (!opts.json && std::io::stdout().is_terminal());
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({"error": e}), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let out = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    out.unwrap_or_else(|e| format!("{{\"error\":\"render: {}\"}}", e))
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    app: Option<String>,
    address: Option<String>,
    chain: Option<u64>,
    sign_timeout_secs: Option<u64>,
    reject: bool,
    errors: Vec<String>,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        // Load .env file if present
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let value = value.trim().trim_matches('"');
                    if !value.is_empty() && env::var(key.trim()).is_err() {
                        env::set_var(key.trim(), value);
                    }
                }
            }
        }

        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            let next = args.get(i + 1);
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--reject" => opts.reject = true,
                "--app" | "-a" => {
                    if let Some(v) = next {
                        opts.app = Some(v.clone());
                        i += 1;
                    }
                }
                "--address" => {
                    if let Some(v) = next {
                        opts.address = Some(v.clone());
                        i += 1;
                    }
                }
                "--chain" | "-c" => {
                    if let Some(v) = next {
                        match v.parse() {
                            Ok(chain) => opts.chain = Some(chain),
                            Err(_) => opts.errors.push(format!("invalid --chain value: {:?}", v)),
                        }
                        i += 1;
                    }
                }
                "--sign-timeout" => {
                    if let Some(v) = next {
                        match v.parse() {
                            Ok(secs) => opts.sign_timeout_secs = Some(secs),
                            Err(_) => opts.errors.push(format!("invalid --sign-timeout value: {:?}", v)),
                        }
                        i += 1;
                    }
                }
                _ if !arg.starts_with('-') => positional.push(arg.clone()),
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }

        // Apply environment variables (lower priority than CLI args)
        if opts.app.is_none() {
            opts.app = env::var(keys::APP).ok().filter(|s| !s.is_empty());
        }
        if opts.sign_timeout_secs.is_none() {
            opts.sign_timeout_secs = env::var(keys::SIGN_TIMEOUT_SECS).ok().and_then(|s| s.parse().ok());
        }

        opts
    }

    fn config(&self) -> SessionConfig {
        let mut config = SessionConfig::new(self.app.clone().unwrap_or_else(|| "walletgate".into()));
        if let Some(secs) = self.sign_timeout_secs {
            config = config.with_sign_timeout(Duration::from_secs(secs));
        }
        config
    }

    fn connection(&self) -> Result<(String, u64), String> {
        let address = self.address.clone().ok_or("--address is required")?;
        let chain = self.chain.ok_or("--chain is required")?;
        Ok((address, chain))
    }
}

fn print_usage() {
    println!(
        r#"walletgate - wallet session reconciliation

USAGE:
    walletgate <command> [options]

COMMANDS:
    status                  Print the stored session record
    clear                   Remove the stored session record
    networks                List supported networks
    simulate                One reconciliation pass against a scripted wallet
    watch                   Run the engine and print events until Ctrl+C
                            (stdin: chain <id> | account <0x..> | connect <0x..> <id>
                             | drop | disconnect | approve | reject)

OPTIONS:
    --app, -a <name>        Application name (env: WALLETGATE_APP)
    --address <0x..>        Wallet account (simulate, watch)
    --chain, -c <id>        Chain id (simulate, watch)
    --reject                Decline the signature prompt (simulate)
    --sign-timeout <secs>   Signature prompt bound (env: WALLETGATE_SIGN_TIMEOUT_SECS)

OUTPUT OPTIONS:
    --json                  Raw JSON output
    --pretty                Pretty-print JSON
    --version, -V           Print version

EXAMPLES:
    walletgate simulate --address 0x12D79D457E935110a5fD52351490063Eff3bcD22 --chain 97
    walletgate status --json | jq .shortAddress
    walletgate simulate --address 0x12D79D457E935110a5fD52351490063Eff3bcD22 --chain 1 --reject
"#
    );
}

fn store_for(config: &SessionConfig) -> SessionStore {
    SessionStore::new(Box::new(FileKv::for_app(&config.app)))
        .with_key(config.storage_key.clone())
        .with_networks(config.networks.clone())
}

fn cmd_status(opts: &ParsedArgs) -> Result<Value, String> {
    let config = opts.config();
    let store = store_for(&config);
    match store.try_load() {
        Ok(record) => serde_json::to_value(record).map_err(|e| e.to_string()),
        Err(e) => Ok(json!({"record": null, "rejected": e.to_string()})),
    }
}

fn cmd_clear(opts: &ParsedArgs) -> Result<Value, String> {
    let config = opts.config();
    store_for(&config).clear().map_err(|e| e.to_string())?;
    Ok(json!({"cleared": true}))
}

fn cmd_networks(opts: &ParsedArgs) -> Result<Value, String> {
    let networks: Vec<Value> = opts
        .config()
        .networks
        .iter()
        .map(|n| json!({"chainId": n.chain_id, "caip": n.caip_id(), "name": n.name, "currency": n.currency, "explorer": n.explorer}))
        .collect();
    Ok(Value::Array(networks))
}

fn engine_for(opts: &ParsedArgs, wallet: ScriptedWallet) -> (SessionEngine, NavigationLog) {
    let config = opts.config();
    let backend = FileKv::for_app(&config.app);
    debug!(dir = %backend.dir().display(), "session store");
    let nav = NavigationLog::new();
    let engine = SessionEngine::new(config, Arc::new(wallet), Box::new(backend), Arc::new(nav.clone()));
    (engine, nav)
}

fn cmd_simulate(opts: &ParsedArgs) -> Result<Value, String> {
    let (address, chain) = opts.connection()?;
    let wallet = ScriptedWallet::connected(&address, chain);
    if opts.reject {
        wallet.set_sign_behavior(SignBehavior::Reject);
    }
    let (engine, nav) = engine_for(opts, wallet.clone());

    let rt = tokio::runtime::Runtime::new().map_err(|e| format!("runtime: {}", e))?;
    let transition = rt.block_on(engine.reconcile()).map_err(|e| e.to_string())?;
    Ok(json!({
        "transition": transition,
        "signatureRequests": wallet.sign_requests(),
        "redirects": nav.routes().iter().map(|r| r.path()).collect::<Vec<_>>(),
        "session": engine.view().user_info(),
    }))
}

fn cmd_watch(opts: &ParsedArgs) -> Result<Value, String> {
    let (address, chain) = opts.connection()?;
    let wallet = ScriptedWallet::connected(&address, chain);
    let (engine, nav) = engine_for(opts, wallet.clone());
    let engine = Arc::new(engine);

    let rt = tokio::runtime::Runtime::new().map_err(|e| format!("runtime: {}", e))?;
    rt.block_on(async move {
        let shutdown = install_signal_handlers();
        let mut events = engine.events();
        let runner = {
            let engine = engine.clone();
            let stop = shutdown.subscribe();
            tokio::spawn(async move { engine.run(stop).await })
        };
        let mut stop = shutdown.subscribe();
        let mut input = BufReader::new(tokio::io::stdin()).lines();
        let mut input_open = true;
        let mut seen = 0usize;
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => {
                        seen += 1;
                        println!("{}", render(&event_json(&event), false));
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => debug!(skipped = n, "event stream lagged"),
                    Err(_) => break,
                },
                line = input.next_line(), if input_open => match line {
                    Ok(Some(line)) => match WalletCommand::parse(&line) {
                        Ok(Some(WalletCommand::Disconnect)) => {
                            engine.disconnect().await;
                        }
                        Ok(Some(command)) => command.apply(&wallet),
                        Ok(None) => {}
                        Err(e) => warn!("{}", e),
                    },
                    Ok(None) => input_open = false,
                    Err(e) => {
                        warn!("stdin: {}", e);
                        input_open = false;
                    }
                },
                _ = stop.recv() => break,
            }
        }
        match runner.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(format!("engine: {}", e)),
            Err(e) => return Err(format!("engine task: {}", e)),
        }
        Ok(json!({"events": seen, "redirects": nav.count()}))
    })
}

/// Wallet-side events typed into `watch`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WalletCommand {
    Chain(u64),
    Account(String),
    Connect(String, u64),
    Drop,
    /// Exit button: goes through the engine, not the wallet.
    Disconnect,
    Sign(SignBehavior),
}

impl WalletCommand {
    /// `Ok(None)` for blank lines and `#` comments.
    fn parse(line: &str) -> Result<Option<Self>, String> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let chain = |v: &str| v.parse::<u64>().map_err(|_| format!("invalid chain id: {:?}", v));
        let command = match words.as_slice() {
            [] => return Ok(None),
            [first, ..] if first.starts_with('#') => return Ok(None),
            ["chain", id] => WalletCommand::Chain(chain(id)?),
            ["account", address] => WalletCommand::Account(address.to_string()),
            ["connect", address, id] => WalletCommand::Connect(address.to_string(), chain(id)?),
            ["drop"] => WalletCommand::Drop,
            ["disconnect"] => WalletCommand::Disconnect,
            ["approve"] => WalletCommand::Sign(SignBehavior::Approve),
            ["reject"] => WalletCommand::Sign(SignBehavior::Reject),
            _ => return Err(format!("unknown input: {:?}", line.trim())),
        };
        Ok(Some(command))
    }

    fn apply(&self, wallet: &ScriptedWallet) {
        match self {
            WalletCommand::Chain(id) => wallet.switch_chain(*id),
            WalletCommand::Account(address) => wallet.switch_account(address),
            WalletCommand::Connect(address, id) => wallet.connect(address, *id),
            WalletCommand::Drop => wallet.drop_connection(),
            WalletCommand::Sign(behavior) => wallet.set_sign_behavior(*behavior),
            WalletCommand::Disconnect => {}
        }
    }
}

fn event_json(event: &EngineEvent) -> Value {
    match event {
        EngineEvent::Transition { transition, at } => json!({"at": at.to_rfc3339(), "transition": transition}),
        EngineEvent::Failed { error, at } => json!({"at": at.to_rfc3339(), "error": error.to_string()}),
    }
}
