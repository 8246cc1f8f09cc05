use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use compound_vault_sdk::{
    client::DEFAULT_PROGRAM_ID,
    instructions::{DeployArgs, ParamsArgs},
    math::MAX_FEE_BPS,
    PositionInfo, VaultClient, VaultInfo,
};
use serde::Serialize;
use serde_json::json;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signer},
};
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Default compounding cadence for new vaults (one hour).
const DEFAULT_AUTOMATION_INTERVAL: i64 = 3_600;

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Expand `~/` to `$HOME/` in keypair paths.
fn expand_home(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        format!("{}/{}", std::env::var("HOME").unwrap_or_default(), rest)
    } else {
        path.to_string()
    }
}

fn load_keypair(path: &str) -> Result<Keypair> {
    let expanded = expand_home(path);
    read_keypair_file(&expanded).map_err(|e| {
        anyhow!(
            "Cannot load keypair from '{}': {}\n  \
             Set COMPOUND_VAULT_KEYPAIR or pass --keypair to specify a different path.",
            expanded,
            e
        )
    })
}

fn parse_pubkey(value: &str, what: &str) -> Result<Pubkey> {
    Pubkey::from_str(value).map_err(|_| anyhow!("{what} '{value}' is not a base-58 public key"))
}

fn parse_pubkeys(values: &[String], what: &str) -> Result<Vec<Pubkey>> {
    values.iter().map(|v| parse_pubkey(v, what)).collect()
}

fn check_fee_bps(fee_bps: u16) -> Result<()> {
    if fee_bps > MAX_FEE_BPS {
        return Err(anyhow!(
            "--fee-bps {} is above the cap of {} ({:.2}%).",
            fee_bps,
            MAX_FEE_BPS,
            MAX_FEE_BPS as f64 / 100.0
        ));
    }
    Ok(())
}

fn fee_label(enabled: bool, bps: u16) -> String {
    if enabled && bps > 0 {
        format!("{bps} bps  ({:.2}% of compounded LP)", bps as f64 / 100.0)
    } else {
        "disabled".to_string()
    }
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

fn print_vault(v: &VaultInfo) {
    println!("  Vault            {}  [{}]", v.address, v.symbol);
    println!("  Index            {}", v.index);
    println!("  LP mint          {}", v.lp_mint);
    println!("  Reward A         {}  (balance {})", v.reward_a_mint, v.reward_a_balance);
    println!("  Reward B         {}  (balance {})", v.reward_b_mint, v.reward_b_balance);
    println!("  Router pool      {}", v.router_pool);
    println!("  LP held          {:>20}", v.lp_balance);
    println!("  Units issued     {:>20}", v.total_supply);
    println!("  Redemption rate  {:.9} LP / unit", v.redemption_rate);
    println!("  Fee              {}", fee_label(v.fee_enabled, v.fee_rate_bps));
    println!("  Fee recipient    {}", v.fee_recipient);
    println!("  Interval         {}s  (last compounded at {})", v.automation_interval, v.last_compounded_at);
    if v.initialized {
        println!("  Initializer      {}  (locked until {})", v.initializer, v.unlock_at);
    } else {
        println!("  Initializer      {}  (not bootstrapped)", v.initializer);
    }
    println!("  Needs compound   {}", if v.needs_compounding { "yes" } else { "no" });
}

fn print_position(p: &PositionInfo) {
    println!("  Position         {}", p.address);
    println!("  Vault            {}", p.vault);
    println!("  LP mint          {}", p.lp_mint);
    println!("  Units            {:>20}", p.units);
    println!("  Redeemable LP    {:>20}", p.redeemable_lp);
    if p.locked {
        println!("  Status           locked (initializer lock-up)");
    }
}

// ─── Version banner ───────────────────────────────────────────────────────────

fn print_banner() {
    let ver = env!("CARGO_PKG_VERSION");
    println!();
    println!("  Compound Vault  v{ver}  ·  pooled LP vaults that compound rewards");
    println!("  {}", "─".repeat(62));
    println!("  Program   {DEFAULT_PROGRAM_ID}");
    println!("  Fees      0%–{:.2}% of compounded LP (per vault)", MAX_FEE_BPS as f64 / 100.0);
    println!("  Keeper    compound-vault keeper --poll-secs 60");
    println!();
}

// ─── CLI definition ───────────────────────────────────────────────────────────

/// Compound Vault: pooled LP vaults on Solana with keeper-driven compounding.
///
/// Every command supports --json for machine-readable output.
#[derive(Parser)]
#[command(
    name    = "compound-vault",
    version = env!("CARGO_PKG_VERSION"),
    about   = "Pooled LP vaults that harvest rewards back into LP; stake, withdraw, and run the keeper.",
    after_help = "\
ENVIRONMENT:
  COMPOUND_VAULT_RPC_URL     Solana JSON-RPC endpoint  [default: https://api.mainnet-beta.solana.com]
  COMPOUND_VAULT_KEYPAIR     Path to Ed25519 keypair JSON  [default: ~/.config/solana/id.json]
  COMPOUND_VAULT_PROGRAM_ID  Program ID override (local validators, devnet deployments)

QUICK START:
  compound-vault vault-info
  compound-vault stake      --lp-mint <MINT> --amount 1000000
  compound-vault withdraw   --lp-mint <MINT> --units 500000
  compound-vault check-work --start 0 --end 50
  compound-vault keeper     --poll-secs 60"
)]
struct Cli {
    /// Solana JSON-RPC endpoint
    #[arg(
        long,
        global        = true,
        value_name    = "URL",
        default_value = DEFAULT_RPC_URL,
        env           = "COMPOUND_VAULT_RPC_URL"
    )]
    rpc_url: String,

    /// Path to the signer's Ed25519 keypair JSON file
    #[arg(
        long,
        global        = true,
        value_name    = "PATH",
        default_value = "~/.config/solana/id.json",
        env           = "COMPOUND_VAULT_KEYPAIR"
    )]
    keypair: String,

    /// Program ID of the vault program
    #[arg(long, global = true, value_name = "PUBKEY", env = "COMPOUND_VAULT_PROGRAM_ID")]
    program_id: Option<String>,

    /// Output machine-readable JSON instead of human-readable text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the registry and name its governor (once per deployment)
    InitRegistry {
        /// Governor wallet [default: the --keypair wallet]
        #[arg(long, value_name = "PUBKEY")]
        governor: Option<String>,
    },

    /// Hand governance to another wallet (governor only)
    SetGovernor {
        #[arg(long, value_name = "PUBKEY")]
        new_governor: String,
    },

    /// Deploy and bootstrap the vault for a router pool's LP token (governor only)
    ///
    /// The initializer's LP seeds the vault and its units stay locked for
    /// seven days. The two reward mints are read from the router pool.
    #[command(
        after_help = "\
EXAMPLES:
  # 2% fee to the treasury, compound at most hourly, bootstrap with 1_000_000 LP
  compound-vault deploy --router-program <ROUTER> --router-pool <POOL> \\
    --amount 1000000 --symbol cvSOL-USDC --fee-bps 200 --fee-recipient <TREASURY>

  # Separate initializer wallet (must co-sign)
  compound-vault deploy --router-program <ROUTER> --router-pool <POOL> \\
    --amount 1000000 --symbol cvLP --initializer ~/keys/seed.json

NOTES:
  --amount must be at least 1000 LP atomic units.
  Fee cap: 1000 bps (10%). --fee-bps 0 disables the fee."
    )]
    Deploy {
        #[arg(long, value_name = "PUBKEY")]
        router_program: String,

        #[arg(long, value_name = "PUBKEY")]
        router_pool: String,

        /// LP (atomic units) the initializer bootstraps the vault with
        #[arg(long, value_name = "AMOUNT")]
        amount: u64,

        /// Display symbol, up to 16 bytes
        #[arg(long)]
        symbol: String,

        /// Initializer keypair [default: the --keypair wallet]
        #[arg(long, value_name = "PATH")]
        initializer: Option<String>,

        /// Wallet receiving the compounding fee [default: the governor]
        #[arg(long, value_name = "PUBKEY")]
        fee_recipient: Option<String>,

        /// Fee taken from each compounding, in basis points
        #[arg(long, value_name = "BPS", default_value_t = 0)]
        fee_bps: u16,

        /// Minimum seconds between automated compoundings
        #[arg(long, value_name = "SECS", default_value_t = DEFAULT_AUTOMATION_INTERVAL)]
        interval: i64,
    },

    /// Update fee and interval parameters for several vaults (governor only)
    #[command(
        after_help = "\
EXAMPLES:
  # Same parameters for every registered vault
  compound-vault set-params --fee-recipient <TREASURY> --fee-bps 100 --interval 1800

  # Two specific vaults
  compound-vault set-params --lp-mint <MINT1> --lp-mint <MINT2> \\
    --fee-recipient <TREASURY> --fee-bps 0 --interval 3600"
    )]
    SetParams {
        /// LP mint of a target vault; repeat for more. Omit for all vaults.
        #[arg(long = "lp-mint", value_name = "MINT")]
        lp_mints: Vec<String>,

        #[arg(long, value_name = "PUBKEY")]
        fee_recipient: String,

        #[arg(long, value_name = "BPS", default_value_t = 0)]
        fee_bps: u16,

        #[arg(long, value_name = "SECS")]
        interval: i64,
    },

    /// Stake LP into a vault and receive units
    ///
    /// The vault compounds pending rewards first, so the deposit is priced
    /// at the post-compound rate.
    Stake {
        #[arg(long, value_name = "MINT")]
        lp_mint: String,

        /// LP amount (atomic units)
        #[arg(long, value_name = "AMOUNT")]
        amount: u64,
    },

    /// Burn units and receive the proportional LP
    Withdraw {
        #[arg(long, value_name = "MINT")]
        lp_mint: String,

        #[arg(long, value_name = "UNITS")]
        units: u64,
    },

    /// Compound, then withdraw the whole position
    Exit {
        #[arg(long, value_name = "MINT")]
        lp_mint: String,
    },

    /// Harvest a vault's rewards into LP now (anyone may call)
    Compound {
        #[arg(long, value_name = "MINT")]
        lp_mint: String,
    },

    /// Send units to another wallet
    Transfer {
        #[arg(long, value_name = "MINT")]
        lp_mint: String,

        /// Recipient wallet
        #[arg(long, value_name = "PUBKEY")]
        to: String,

        #[arg(long, value_name = "UNITS")]
        units: u64,
    },

    /// Show vault state and balances; all vaults when no selector is given
    VaultInfo {
        #[arg(long, value_name = "MINT", conflicts_with = "index")]
        lp_mint: Option<String>,

        #[arg(long, value_name = "N")]
        index: Option<u64>,
    },

    /// Show one position
    Position {
        #[arg(long, value_name = "MINT")]
        lp_mint: String,

        /// Holder wallet [default: the --keypair wallet]
        #[arg(long, value_name = "PUBKEY")]
        owner: Option<String>,
    },

    /// List every position held by the --keypair wallet
    MyPositions,

    /// Report the first vault in [start, end) that needs compounding
    CheckWork {
        #[arg(long, default_value_t = 0)]
        start: u64,

        /// Exclusive; clamped to the registry's vault count
        #[arg(long, default_value_t = u64::MAX)]
        end: u64,
    },

    /// Compound the vault named by a check-work result
    PerformWork {
        /// LP mint reported by check-work (its perform data)
        #[arg(long, value_name = "MINT")]
        lp_mint: String,
    },

    /// Poll a vault range and compound every vault that needs it
    ///
    /// Runs until Ctrl-C. Failed dispatches are logged and retried on the
    /// next poll. Split a large registry across keepers with --start/--end.
    #[command(
        after_help = "\
EXAMPLES:
  # Whole registry every minute
  compound-vault keeper --poll-secs 60

  # Two keepers sharing the work
  compound-vault keeper --start 0  --end 50
  compound-vault keeper --start 50 --end 100

  # Single pass, e.g. from cron
  compound-vault keeper --once --json"
    )]
    Keeper {
        #[arg(long, default_value_t = 0)]
        start: u64,

        #[arg(long, default_value_t = u64::MAX)]
        end: u64,

        #[arg(long, value_name = "SECS", default_value_t = 60)]
        poll_secs: u64,

        /// Run one poll and exit
        #[arg(long, default_value_t = false)]
        once: bool,
    },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::args().len() == 1 {
        print_banner();
        Cli::command().print_long_help().ok();
        println!();
        return Ok(());
    }

    let cli = Cli::parse();
    let client = vault_client(&cli)?;

    match &cli.command {
        Commands::InitRegistry { governor } => {
            cmd_init_registry(&client, &cli, governor.as_deref()).await?;
        }
        Commands::SetGovernor { new_governor } => {
            cmd_set_governor(&client, &cli, new_governor).await?;
        }
        Commands::Deploy {
            router_program, router_pool, amount, symbol,
            initializer, fee_recipient, fee_bps, interval,
        } => {
            cmd_deploy(
                &client, &cli,
                router_program, router_pool, *amount, symbol,
                initializer.as_deref(), fee_recipient.as_deref(), *fee_bps, *interval,
            )
            .await?;
        }
        Commands::SetParams { lp_mints, fee_recipient, fee_bps, interval } => {
            cmd_set_params(&client, &cli, lp_mints, fee_recipient, *fee_bps, *interval).await?;
        }
        Commands::Stake { lp_mint, amount } => {
            cmd_stake(&client, &cli, lp_mint, *amount).await?;
        }
        Commands::Withdraw { lp_mint, units } => {
            cmd_withdraw(&client, &cli, lp_mint, *units).await?;
        }
        Commands::Exit { lp_mint } => {
            cmd_exit(&client, &cli, lp_mint).await?;
        }
        Commands::Compound { lp_mint } => {
            cmd_compound(&client, &cli, lp_mint).await?;
        }
        Commands::Transfer { lp_mint, to, units } => {
            cmd_transfer(&client, &cli, lp_mint, to, *units).await?;
        }
        Commands::VaultInfo { lp_mint, index } => {
            cmd_vault_info(&client, &cli, lp_mint.as_deref(), *index).await?;
        }
        Commands::Position { lp_mint, owner } => {
            cmd_position(&client, &cli, lp_mint, owner.as_deref()).await?;
        }
        Commands::MyPositions => {
            cmd_my_positions(&client, &cli).await?;
        }
        Commands::CheckWork { start, end } => {
            cmd_check_work(&client, &cli, *start, *end).await?;
        }
        Commands::PerformWork { lp_mint } => {
            cmd_perform_work(&client, &cli, lp_mint).await?;
        }
        Commands::Keeper { start, end, poll_secs, once } => {
            cmd_keeper(&client, &cli, *start, *end, *poll_secs, *once).await?;
        }
    }

    Ok(())
}

fn vault_client(cli: &Cli) -> Result<VaultClient> {
    let client = VaultClient::new(cli.rpc_url.clone());
    Ok(match &cli.program_id {
        Some(id) => client.with_program_id(parse_pubkey(id, "--program-id")?),
        None => client,
    })
}

// ─── Governance ───────────────────────────────────────────────────────────────

async fn cmd_init_registry(client: &VaultClient, cli: &Cli, governor: Option<&str>) -> Result<()> {
    let payer = load_keypair(&cli.keypair)?;
    let governor = match governor {
        Some(g) => parse_pubkey(g, "--governor")?,
        None => payer.pubkey(),
    };
    let sig = client
        .initialize_registry(&payer, governor)
        .await
        .context("initialize_registry transaction failed")?;
    let registry = client.registry_info().await?;

    if cli.json {
        println!("{}", json!({
            "status":   "ok",
            "command":  "init-registry",
            "registry": registry.address.to_string(),
            "governor": governor.to_string(),
            "tx":       sig,
        }));
    } else {
        println!("─── Registry Created ─────────────────────────────────────────────");
        println!("  Registry         {}", registry.address);
        println!("  Governor         {governor}");
        println!("  Transaction      {sig}");
    }
    Ok(())
}

async fn cmd_set_governor(client: &VaultClient, cli: &Cli, new_governor: &str) -> Result<()> {
    let governor = load_keypair(&cli.keypair)?;
    let new_governor = parse_pubkey(new_governor, "--new-governor")?;
    let sig = client
        .set_governor(&governor, new_governor)
        .await
        .context("set_governor transaction failed (is --keypair the current governor?)")?;

    if cli.json {
        println!("{}", json!({
            "status":       "ok",
            "command":      "set-governor",
            "old_governor": governor.pubkey().to_string(),
            "new_governor": new_governor.to_string(),
            "tx":           sig,
        }));
    } else {
        println!("─── Governor Updated ─────────────────────────────────────────────");
        println!("  Previous         {}", governor.pubkey());
        println!("  New              {new_governor}");
        println!("  Transaction      {sig}");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_deploy(
    client:         &VaultClient,
    cli:            &Cli,
    router_program: &str,
    router_pool:    &str,
    amount:         u64,
    symbol:         &str,
    initializer:    Option<&str>,
    fee_recipient:  Option<&str>,
    fee_bps:        u16,
    interval:       i64,
) -> Result<()> {
    check_fee_bps(fee_bps)?;
    if interval < 0 {
        return Err(anyhow!("--interval must be zero or positive seconds."));
    }
    let governor = load_keypair(&cli.keypair)?;
    let initializer = match initializer {
        Some(path) => load_keypair(path)?,
        None => load_keypair(&cli.keypair)?,
    };
    let fee_recipient = match fee_recipient {
        Some(f) => parse_pubkey(f, "--fee-recipient")?,
        None => governor.pubkey(),
    };

    let args = DeployArgs {
        fee_recipient,
        fee_enabled:           fee_bps > 0,
        fee_rate_bps:          fee_bps,
        automation_interval:   interval,
        initialization_amount: amount,
        symbol:                symbol.to_string(),
    };
    let result = client
        .deploy_vault(
            &governor,
            &initializer,
            parse_pubkey(router_program, "--router-program")?,
            parse_pubkey(router_pool, "--router-pool")?,
            args,
        )
        .await
        .context("deploy_vault transaction failed")?;

    if cli.json {
        let mut v = serde_json::to_value(&result)?;
        v["status"] = json!("ok");
        v["command"] = json!("deploy");
        println!("{v}");
    } else {
        println!("─── Vault Deployed ───────────────────────────────────────────────");
        println!("  Vault            {}  [{symbol}]", result.vault);
        println!("  Index            {}", result.index);
        println!("  LP mint          {}", result.lp_mint);
        println!("  Bootstrap        {amount} LP  →  {amount} units (locked 7 days)");
        println!("  Fee              {}", fee_label(fee_bps > 0, fee_bps));
        println!("  Transaction      {}", result.signature);
    }
    Ok(())
}

async fn cmd_set_params(
    client:        &VaultClient,
    cli:           &Cli,
    lp_mints:      &[String],
    fee_recipient: &str,
    fee_bps:       u16,
    interval:      i64,
) -> Result<()> {
    check_fee_bps(fee_bps)?;
    let governor = load_keypair(&cli.keypair)?;
    let lp_mints = parse_pubkeys(lp_mints, "--lp-mint")?;
    let params = ParamsArgs {
        fee_recipient:       parse_pubkey(fee_recipient, "--fee-recipient")?,
        fee_enabled:         fee_bps > 0,
        fee_rate_bps:        fee_bps,
        automation_interval: interval,
    };
    let sig = client
        .set_params(&governor, &lp_mints, params)
        .await
        .context("set_vaults_params transaction failed")?;

    let scope = if lp_mints.is_empty() {
        "all vaults".to_string()
    } else {
        format!("{} vault(s)", lp_mints.len())
    };
    if cli.json {
        println!("{}", json!({
            "status":              "ok",
            "command":             "set-params",
            "lp_mints":            lp_mints.iter().map(|m| m.to_string()).collect::<Vec<_>>(),
            "fee_recipient":       params.fee_recipient.to_string(),
            "fee_enabled":         params.fee_enabled,
            "fee_rate_bps":        fee_bps,
            "automation_interval": interval,
            "tx":                  sig,
        }));
    } else {
        println!("─── Parameters Updated ───────────────────────────────────────────");
        println!("  Scope            {scope}");
        println!("  Fee              {}", fee_label(params.fee_enabled, fee_bps));
        println!("  Fee recipient    {}", params.fee_recipient);
        println!("  Interval         {interval}s");
        println!("  Transaction      {sig}");
    }
    Ok(())
}

// ─── Holder commands ──────────────────────────────────────────────────────────

async fn cmd_stake(client: &VaultClient, cli: &Cli, lp_mint: &str, amount: u64) -> Result<()> {
    if amount == 0 {
        return Err(anyhow!("--amount must be greater than zero."));
    }
    let owner = load_keypair(&cli.keypair)?;
    let lp_mint = parse_pubkey(lp_mint, "--lp-mint")?;
    let result = client.stake(&owner, lp_mint, amount).await.context("stake transaction failed")?;

    if cli.json {
        let mut v = serde_json::to_value(&result)?;
        v["status"] = json!("ok");
        v["command"] = json!("stake");
        println!("{v}");
    } else {
        println!("─── Staked ───────────────────────────────────────────────────────");
        println!("  Vault            {}", result.vault);
        println!("  LP deposited     {:>20}", result.amount);
        println!("  Units (est.)     {:>20}", result.estimated_units);
        println!("  Transaction      {}", result.signature);
    }
    Ok(())
}

async fn cmd_withdraw(client: &VaultClient, cli: &Cli, lp_mint: &str, units: u64) -> Result<()> {
    if units == 0 {
        return Err(anyhow!("--units must be greater than zero."));
    }
    let owner = load_keypair(&cli.keypair)?;
    let lp_mint = parse_pubkey(lp_mint, "--lp-mint")?;
    let result = client.withdraw(&owner, lp_mint, units).await.context("withdraw transaction failed")?;

    if cli.json {
        let mut v = serde_json::to_value(&result)?;
        v["status"] = json!("ok");
        v["command"] = json!("withdraw");
        println!("{v}");
    } else {
        println!("─── Withdrawn ────────────────────────────────────────────────────");
        println!("  Vault            {}", result.vault);
        println!("  Units burned     {:>20}", result.units);
        println!("  LP received      {:>20}", result.estimated_amount);
        println!("  Transaction      {}", result.signature);
    }
    Ok(())
}

async fn cmd_exit(client: &VaultClient, cli: &Cli, lp_mint: &str) -> Result<()> {
    let owner = load_keypair(&cli.keypair)?;
    let lp_mint = parse_pubkey(lp_mint, "--lp-mint")?;
    let result = client.exit(&owner, lp_mint).await.context("exit transaction failed")?;

    if cli.json {
        let mut v = serde_json::to_value(&result)?;
        v["status"] = json!("ok");
        v["command"] = json!("exit");
        println!("{v}");
    } else {
        println!("─── Exited ───────────────────────────────────────────────────────");
        println!("  Vault            {}", result.vault);
        println!("  Units burned     {:>20}", result.units);
        println!("  LP received      {:>20}  (pre-compound estimate)", result.estimated_amount);
        println!("  Transaction      {}", result.signature);
    }
    Ok(())
}

async fn cmd_compound(client: &VaultClient, cli: &Cli, lp_mint: &str) -> Result<()> {
    let payer = load_keypair(&cli.keypair)?;
    let lp_mint = parse_pubkey(lp_mint, "--lp-mint")?;
    let result = client.compound(&payer, lp_mint).await.context("compound transaction failed")?;

    if cli.json {
        println!("{}", json!({
            "status":  "ok",
            "command": "compound",
            "vault":   result.vault.to_string(),
            "tx":      result.signature,
        }));
    } else {
        println!("─── Compounded ───────────────────────────────────────────────────");
        println!("  Vault            {}", result.vault);
        println!("  Transaction      {}", result.signature);
    }
    Ok(())
}

async fn cmd_transfer(client: &VaultClient, cli: &Cli, lp_mint: &str, to: &str, units: u64) -> Result<()> {
    let sender = load_keypair(&cli.keypair)?;
    let lp_mint = parse_pubkey(lp_mint, "--lp-mint")?;
    let to = parse_pubkey(to, "--to")?;
    let result = client
        .transfer_units(&sender, lp_mint, to, units)
        .await
        .context("transfer_units transaction failed")?;

    if cli.json {
        println!("{}", json!({
            "status":  "ok",
            "command": "transfer",
            "vault":   result.vault.to_string(),
            "from":    sender.pubkey().to_string(),
            "to":      to.to_string(),
            "units":   units,
            "tx":      result.signature,
        }));
    } else {
        println!("─── Units Transferred ────────────────────────────────────────────");
        println!("  Vault            {}", result.vault);
        println!("  From             {}", sender.pubkey());
        println!("  To               {to}");
        println!("  Units            {units:>20}");
        println!("  Transaction      {}", result.signature);
    }
    Ok(())
}

// ─── Read commands ────────────────────────────────────────────────────────────

async fn cmd_vault_info(
    client:  &VaultClient,
    cli:     &Cli,
    lp_mint: Option<&str>,
    index:   Option<u64>,
) -> Result<()> {
    let vaults = match (lp_mint, index) {
        (Some(m), _) => vec![client.vault_info(parse_pubkey(m, "--lp-mint")?).await?],
        (None, Some(i)) => vec![client.vault_info_by_index(i).await?],
        (None, None) => client.vault_infos(0, u64::MAX).await?,
    };

    if cli.json {
        println!("{}", json!({ "status": "ok", "command": "vault-info", "vaults": vaults }));
        return Ok(());
    }
    println!("─── Vaults ───────────────────────────────────────────────────────");
    if vaults.is_empty() {
        println!("  No vaults deployed yet.");
        println!("  Run `compound-vault deploy --router-program <P> --router-pool <POOL> ...` to add one.");
        return Ok(());
    }
    for (i, v) in vaults.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_vault(v);
    }
    Ok(())
}

async fn cmd_position(client: &VaultClient, cli: &Cli, lp_mint: &str, owner: Option<&str>) -> Result<()> {
    let owner = match owner {
        Some(o) => parse_pubkey(o, "--owner")?,
        None => load_keypair(&cli.keypair)?.pubkey(),
    };
    let position = client.position(parse_pubkey(lp_mint, "--lp-mint")?, owner).await?;

    if cli.json {
        println!("{}", json!({ "status": "ok", "command": "position", "position": position }));
    } else {
        println!("─── Position ─────────────────────────────────────────────────────");
        println!("  Owner            {owner}");
        print_position(&position);
    }
    Ok(())
}

async fn cmd_my_positions(client: &VaultClient, cli: &Cli) -> Result<()> {
    let owner = load_keypair(&cli.keypair)?.pubkey();
    let positions = client.my_positions(&owner).await?;

    if cli.json {
        println!("{}", json!({
            "status": "ok", "command": "my-positions",
            "owner": owner.to_string(), "positions": positions,
        }));
        return Ok(());
    }
    println!("─── My Positions ─────────────────────────────────────────────────");
    println!("  Owner   {owner}");
    println!();
    if positions.is_empty() {
        println!("  No vault units found.");
        println!("  Run `compound-vault stake --lp-mint <MINT> --amount <AMT>` to open one.");
        return Ok(());
    }
    for (i, p) in positions.iter().enumerate() {
        println!("  [{i:>2}]  LP mint    {}", p.lp_mint);
        println!("        Vault      {}", p.vault);
        println!("        Units      {:>20}", p.units);
        println!("        Redeemable {:>20} LP{}", p.redeemable_lp, if p.locked { "  (locked)" } else { "" });
        println!();
    }
    println!("  Total: {} position(s)", positions.len());
    Ok(())
}

// ─── Keeper commands ──────────────────────────────────────────────────────────

async fn cmd_check_work(client: &VaultClient, cli: &Cli, start: u64, end: u64) -> Result<()> {
    let payer = load_keypair(&cli.keypair)?;
    let outcome = client
        .check_work(&payer.pubkey(), start, end)
        .await
        .context("check_work simulation failed")?;

    if cli.json {
        let mut v = serde_json::to_value(&outcome)?;
        v["status"] = json!("ok");
        v["command"] = json!("check-work");
        println!("{v}");
    } else {
        println!("─── Check Work ───────────────────────────────────────────────────");
        println!("  Range            [{start}, {})", if end == u64::MAX { "end".to_string() } else { end.to_string() });
        match outcome.lp_mint {
            Some(mint) => {
                println!("  Upkeep needed    yes");
                println!("  LP mint          {mint}");
                if let Some(index) = outcome.index {
                    println!("  Index            {index}");
                }
                println!();
                println!("  Run `compound-vault perform-work --lp-mint {mint}` to dispatch.");
            }
            None => println!("  Upkeep needed    no"),
        }
    }
    Ok(())
}

async fn cmd_perform_work(client: &VaultClient, cli: &Cli, lp_mint: &str) -> Result<()> {
    let payer = load_keypair(&cli.keypair)?;
    let lp_mint = parse_pubkey(lp_mint, "--lp-mint")?;
    let result = client
        .perform_work(&payer, &lp_mint.to_bytes())
        .await
        .context("perform_work transaction failed")?;

    if cli.json {
        println!("{}", json!({
            "status":  "ok",
            "command": "perform-work",
            "vault":   result.vault.to_string(),
            "lp_mint": lp_mint.to_string(),
            "tx":      result.signature,
        }));
    } else {
        println!("─── Work Performed ───────────────────────────────────────────────");
        println!("  Vault            {}", result.vault);
        println!("  LP mint          {lp_mint}");
        println!("  Transaction      {}", result.signature);
    }
    Ok(())
}

/// One keeper log record; `--json` prints one per line.
#[derive(Serialize)]
struct KeeperEvent {
    ts:      u64,
    event:   &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    lp_mint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail:  Option<String>,
}

impl KeeperEvent {
    fn new(event: &'static str) -> Self {
        Self { ts: unix_now(), event, lp_mint: None, detail: None }
    }

    fn mint(mut self, mint: &Pubkey) -> Self {
        self.lp_mint = Some(mint.to_string());
        self
    }

    fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    fn log(&self, json_output: bool) {
        if json_output {
            match serde_json::to_string(self) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("[keeper] cannot encode log record: {e}"),
            }
            return;
        }
        let mint = self.lp_mint.as_deref().map(|m| format!("  {m}")).unwrap_or_default();
        let detail = self.detail.as_deref().map(|d| format!("  {d}")).unwrap_or_default();
        let line = format!("[keeper] {}  {:<10}{mint}{detail}", self.ts, self.event);
        if self.event == "failed" || self.event == "error" {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }
}

/// Walk `[start, end)` with the program's `check_work`, dispatching
/// `perform_work` for each match and resuming after it. Returns the number of
/// successful dispatches; individual failures are logged only.
async fn keeper_tick(
    client:      &VaultClient,
    payer:       &Keypair,
    start:       u64,
    end:         u64,
    json_output: bool,
) -> Result<usize> {
    let mut cursor = start;
    let mut found = 0;
    let mut dispatched = 0;
    while cursor < end {
        let outcome = client
            .check_work(&payer.pubkey(), cursor, end)
            .await
            .context("check_work simulation failed")?;
        if !outcome.upkeep_needed {
            break;
        }
        found += 1;

        let event = match outcome.lp_mint {
            Some(mint) => KeeperEvent::new("compounded").mint(&mint),
            None => KeeperEvent::new("compounded"),
        };
        match client.perform_work(payer, &outcome.perform_data).await {
            Ok(result) => {
                dispatched += 1;
                event.detail(format!("tx {}", result.signature)).log(json_output);
            }
            Err(e) => {
                KeeperEvent { event: "failed", ..event }.detail(e.to_string()).log(json_output);
            }
        }

        match next_cursor(outcome.index) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    if found == 0 {
        KeeperEvent::new("idle").log(json_output);
    }
    Ok(dispatched)
}

/// Where the next `check_work` starts after a match at `index`. `None` ends
/// the tick when the match has no known index or sits at the last index.
fn next_cursor(index: Option<u64>) -> Option<u64> {
    index.and_then(|i| i.checked_add(1))
}

async fn cmd_keeper(
    client:    &VaultClient,
    cli:       &Cli,
    start:     u64,
    end:       u64,
    poll_secs: u64,
    once:      bool,
) -> Result<()> {
    let payer = load_keypair(&cli.keypair)?;
    let version = RpcClient::new(cli.rpc_url.clone())
        .get_version()
        .await
        .with_context(|| format!("RPC endpoint {} is unreachable", cli.rpc_url))?;

    KeeperEvent::new("start")
        .detail(format!(
            "range [{start}, {end})  poll {poll_secs}s  payer {}  cluster {}",
            payer.pubkey(),
            version.solana_core
        ))
        .log(cli.json);

    let mut ticker = tokio::time::interval(Duration::from_secs(poll_secs.max(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                match keeper_tick(client, &payer, start, end, cli.json).await {
                    Ok(0) => {}
                    Ok(n) => KeeperEvent::new("tick").detail(format!("{n} dispatched")).log(cli.json),
                    Err(e) => KeeperEvent::new("error").detail(format!("{e:#}")).log(cli.json),
                }
                if once {
                    break;
                }
            }
        }
    }

    KeeperEvent::new("stop").log(cli.json);
    Ok(())
}
