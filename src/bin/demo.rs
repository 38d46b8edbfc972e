//! Proof cache demo
//!
//! Runs the proof reuse flow in-process against the mock proving engine:
//! prove, validate and populate with gas details, reject changed parameters,
//! refuse a blocked destination, and show that each base-token proof is bound
//! to fresh relay adapt parameters.
//!
//! Run with: `cargo run --bin demo [-- --config networks.toml]`

use std::path::PathBuf;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use clap::Parser;
use tracing::info;

use shielded_proof_cache::adapters::address::Bech32AddressValidator;
use shielded_proof_cache::adapters::mock_prover::MockProver;
use shielded_proof_cache::adapters::relay_adapt::LocalRelayAdapt;
use shielded_proof_cache::assembler::{AssembleError, ProofAssembler, ProveOutcome};
use shielded_proof_cache::cache::{PopulateError, ProofCache};
use shielded_proof_cache::config::{AssemblerConfig, ConfigError};
use shielded_proof_cache::domain::gas::{EvmGasType, TransactionGasDetails};
use shielded_proof_cache::domain::request::{ProofContext, ProofRequest};
use shielded_proof_cache::domain::token::TokenAmount;
use shielded_proof_cache::domain::wallet::EncryptionKey;
use shielded_proof_cache::ports::ProofMode;

/// Used when no `--config` is given.
const BUILTIN_CONFIG: &str = r#"
blocked_addresses = ["0xbabababababababababababababababababababa"]

[[networks]]
name = "hardhat"
proxy_contract = "0x1111111111111111111111111111111111111111"
relay_adapt_contract = "0x2222222222222222222222222222222222222222"
"#;

const RECIPIENT: &str = "0zk1qyqqqqdl645pcpreh6dga7xa3w4dm9c3tzv6ntesk0fy2k";
const TOKEN: Address = Address::repeat_byte(0xAA);
const WRAPPED_BASE_TOKEN: Address = Address::repeat_byte(0xEE);

#[derive(clap::Parser)]
#[command(name = "demo", about = "Proof cache and two-phase assembly demo")]
struct Args {
    /// Path to a TOML configuration file. Defaults to a single local network.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("assembler setup error: {0}")]
    Assemble(#[from] AssembleError),

    #[error("populate error: {0}")]
    Populate(#[from] PopulateError),

    #[error("scenario failed: {0}")]
    Scenario(String),
}

type Assembler = ProofAssembler<MockProver, LocalRelayAdapt, Bech32AddressValidator>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), DemoError> {
    tracing_subscriber::fmt()
        .without_time()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => {
            info!("Loading config from {}", path.display());
            AssemblerConfig::load(path)?
        }
        None => AssemblerConfig::from_toml_str(BUILTIN_CONFIG)?,
    };

    let mut assembler = ProofAssembler::new(
        Arc::new(ProofCache::new()),
        MockProver::new(),
        Bech32AddressValidator::default(),
    )
    .with_blocked_addresses(config.blocked_addresses.iter().copied());
    for network in config.network_configs() {
        let relay = LocalRelayAdapt::new(network.relay_adapt_contract);
        assembler = assembler.with_network(network, relay)?;
    }
    let network = config
        .network_configs()
        .into_iter()
        .next()
        .ok_or_else(|| DemoError::Scenario("no network configured".into()))?;
    let blocked = config.blocked_addresses.first().copied();
    let ctx = ProofContext::new(network.name, "demo-wallet", EncryptionKey::new("demo-key"));
    let gas = gas_details(network.gas_type_for(ctx.send_with_public_wallet));

    scenario_prove_and_populate(&assembler, &ctx, &gas).await?;
    scenario_changed_amount(&assembler, &ctx, &gas)?;
    match blocked {
        Some(blocked) => scenario_blocked_destination(&assembler, &ctx, blocked).await?,
        None => info!("No blocked addresses configured, skipping blocked destination scenario"),
    }
    scenario_fresh_adapt_params(&assembler, &ctx).await?;

    info!("");
    info!("All scenarios completed");
    Ok(())
}

fn transfer(amount: u64) -> ProofRequest {
    ProofRequest::Transfer {
        token_amount_recipients: vec![TokenAmount::new(TOKEN, U256::from(amount))
            .with_recipient(RECIPIENT)],
        nft_amount_recipients: vec![],
        memo_text: Some("demo".into()),
        show_sender_address_to_recipient: false,
    }
}

fn gas_details(gas_type: EvmGasType) -> TransactionGasDetails {
    let gas_estimate = 250_000;
    match gas_type {
        EvmGasType::Type0 => TransactionGasDetails::Type0 {
            gas_estimate,
            gas_price: 5_000_000_000,
        },
        EvmGasType::Type1 => TransactionGasDetails::Type1 {
            gas_estimate,
            gas_price: 5_000_000_000,
        },
        EvmGasType::Type2 => TransactionGasDetails::Type2 {
            gas_estimate,
            max_fee_per_gas: 30_000_000_000,
            max_priority_fee_per_gas: 1_000_000_000,
        },
    }
}

fn report(outcome: ProveOutcome) -> Result<(), DemoError> {
    let body = serde_json::to_string(&outcome.into_response())
        .map_err(|e| DemoError::Scenario(format!("response encoding: {e}")))?;
    info!("  response: {body}");
    Ok(())
}

async fn scenario_prove_and_populate(
    assembler: &Assembler,
    ctx: &ProofContext,
    gas: &TransactionGasDetails,
) -> Result<(), DemoError> {
    info!("");
    info!("--- Scenario 1: prove a transfer, populate with gas details ---");
    let progress = |value: f64| info!("  proving: {:.0}%", value * 100.0);
    let outcome = assembler.generate_proof(ctx, transfer(10), &progress).await;
    if !outcome.is_proved() {
        report(outcome)?;
        return Err(DemoError::Scenario("transfer proof failed".into()));
    }
    report(outcome)?;

    let params = transfer(10).proof_params(ctx);
    let tx = assembler.populate_proved_transaction(ctx.network, &params, gas)?;
    info!(
        "  populated: type={:?} gas={:?} from={:?}",
        tx.transaction_type, tx.gas, tx.from
    );
    Ok(())
}

fn scenario_changed_amount(
    assembler: &Assembler,
    ctx: &ProofContext,
    gas: &TransactionGasDetails,
) -> Result<(), DemoError> {
    info!("");
    info!("--- Scenario 2: populate after changing the amount ---");
    let params = transfer(11).proof_params(ctx);
    match assembler.populate_proved_transaction(ctx.network, &params, gas) {
        Err(err) => {
            info!("  rejected: {err}");
            Ok(())
        }
        Ok(_) => Err(DemoError::Scenario(
            "changed amount reused the cached proof".into(),
        )),
    }
}

async fn scenario_blocked_destination(
    assembler: &Assembler,
    ctx: &ProofContext,
    blocked: Address,
) -> Result<(), DemoError> {
    info!("");
    info!("--- Scenario 3: base-token withdraw to a blocked address ---");
    let before = assembler.prover().calls().await.len();
    let outcome = assembler
        .generate_withdraw_base_token_proof(
            ctx,
            blocked.to_string(),
            TokenAmount::new(WRAPPED_BASE_TOKEN, U256::from(1)),
            &|_| {},
        )
        .await;
    let proved = outcome.is_proved();
    report(outcome)?;
    if proved || assembler.prover().calls().await.len() != before {
        return Err(DemoError::Scenario(
            "blocked destination reached the prover".into(),
        ));
    }
    Ok(())
}

async fn scenario_fresh_adapt_params(
    assembler: &Assembler,
    ctx: &ProofContext,
) -> Result<(), DemoError> {
    info!("");
    info!("--- Scenario 4: two base-token withdraws, same inputs ---");
    let destination = Address::repeat_byte(0x44).to_string();
    for attempt in 1..=2 {
        let outcome = assembler
            .generate_withdraw_base_token_proof(
                ctx,
                destination.as_str(),
                TokenAmount::new(WRAPPED_BASE_TOKEN, U256::from(1)),
                &|_| {},
            )
            .await;
        info!("  attempt {attempt}:");
        report(outcome)?;
    }

    let adapt_ids: Vec<_> = assembler
        .prover()
        .calls()
        .await
        .into_iter()
        .filter(|call| call.mode == ProofMode::Full)
        .filter_map(|call| call.request.adapt_id)
        .collect();
    let [.., first, second] = adapt_ids.as_slice() else {
        return Err(DemoError::Scenario("expected two bound proofs".into()));
    };
    info!("  adapt params 1: {}", first.parameters);
    info!("  adapt params 2: {}", second.parameters);
    if first.parameters == second.parameters {
        return Err(DemoError::Scenario("adapt params were reused".into()));
    }
    Ok(())
}
