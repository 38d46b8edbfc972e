//! Two-phase proof assembly.
//!
//! Direct proof types are proved once. Relay-adapt proof types are proved
//! twice: a dummy proof with the relay contract as recipient fixes the
//! transaction shape, the relay contract derives parameters from it plus a
//! fresh random, and the final proof is bound to those parameters through an
//! [`AdaptId`]. The result is written to the shared [`ProofCache`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use alloy::primitives::Address;
use alloy::rpc::types::TransactionRequest;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::cache::{CacheError, PopulateError, ProofCache};
use crate::domain::gas::TransactionGasDetails;
use crate::domain::network::{NetworkConfig, NetworkName};
use crate::domain::proved::{ProofParams, ProvedTransaction};
use crate::domain::relay_adapt::{AdaptId, RelayAdaptAction, RelayAdaptRandom};
use crate::domain::request::{ProofContext, ProofRequest};
use crate::domain::token::{NftAmountRecipient, TokenAmount, TokenAmountRecipient};
use crate::ports::address::RailgunAddressValidator;
use crate::ports::prover::{ProgressCallback, ProverError, TransactionProver};
use crate::ports::relay_adapt::{RelayAdaptContract, RelayAdaptError};
use crate::ports::{ProofMode, ProveRequest};

/// Message returned in place of engine-internal failure detail.
const PROOF_FAILED_MESSAGE: &str = "Could not generate proof.";
const RELAY_ADAPT_FAILED_MESSAGE: &str = "Could not derive relay adapt parameters.";

/// Step of a proof attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofPhase {
    /// Inputs validated, cache cleared.
    Start,
    DummyProving,
    ParamsDerived,
    FinalProving,
    Cached,
}

impl fmt::Display for ProofPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProofPhase::Start => "start",
            ProofPhase::DummyProving => "dummy proving",
            ProofPhase::ParamsDerived => "params derived",
            ProofPhase::FinalProving => "final proving",
            ProofPhase::Cached => "cached",
        };
        f.write_str(name)
    }
}

/// Internal failure of a proof attempt, with full detail.
#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error("network {0} is not configured")]
    UnknownNetwork(NetworkName),

    #[error("no relay adapt contract configured for {0}")]
    MissingRelayAdapt(NetworkName),

    #[error("relay adapt for {network} is at {contract}, but the network is configured with {configured}")]
    RelayAdaptMismatch {
        network: NetworkName,
        configured: Address,
        contract: Address,
    },

    #[error("Blocked address: {0}")]
    BlockedAddress(Address),

    #[error("Invalid public address: {0}")]
    InvalidEthAddress(String),

    #[error("Invalid shielded address: {0}")]
    InvalidRailgunAddress(String),

    #[error("A relayer fee requires a relayer address.")]
    MissingRelayerAddress,

    #[error("{phase} failed: {source}")]
    Prover {
        phase: ProofPhase,
        source: ProverError,
    },

    #[error("relay adapt error: {0}")]
    RelayAdapt(#[from] RelayAdaptError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Category of a failure surfaced to the application layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Programmer error, such as caching a signed transaction.
    Usage,
    ProvingFailure,
    /// Bad or disallowed input.
    UnsupportedInput,
}

/// Sanitized failure, safe to hand to untrusted callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PublicError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AssembleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssembleError::Cache(_) | AssembleError::RelayAdaptMismatch { .. } => {
                ErrorKind::Usage
            }
            AssembleError::Prover { .. } | AssembleError::RelayAdapt(_) => {
                ErrorKind::ProvingFailure
            }
            AssembleError::UnknownNetwork(_)
            | AssembleError::MissingRelayAdapt(_)
            | AssembleError::BlockedAddress(_)
            | AssembleError::InvalidEthAddress(_)
            | AssembleError::InvalidRailgunAddress(_)
            | AssembleError::MissingRelayerAddress => ErrorKind::UnsupportedInput,
        }
    }

    /// Strip engine internals. Balance and wallet errors are actionable and kept.
    pub fn sanitize(&self) -> PublicError {
        let message = match self {
            AssembleError::Prover { source, .. } => match source {
                ProverError::InsufficientBalance(_) | ProverError::WalletNotFound(_) => {
                    source.to_string()
                }
                ProverError::ProofFailed(_) | ProverError::Populate(_) => {
                    PROOF_FAILED_MESSAGE.to_string()
                }
            },
            AssembleError::RelayAdapt(_) => RELAY_ADAPT_FAILED_MESSAGE.to_string(),
            other => other.to_string(),
        };
        PublicError {
            kind: self.kind(),
            message,
        }
    }
}

/// Result of a proof entry point. Never an `Err`: failures are values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProveOutcome {
    /// The proof is cached and ready for `populate_proved_transaction`.
    Proved,
    Failed(PublicError),
}

/// JSON body of a proof response: `{}` on success, `{"error": "..."}` on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProveResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProveOutcome {
    pub fn is_proved(&self) -> bool {
        matches!(self, ProveOutcome::Proved)
    }

    pub fn error(&self) -> Option<&PublicError> {
        match self {
            ProveOutcome::Proved => None,
            ProveOutcome::Failed(err) => Some(err),
        }
    }

    pub fn into_response(self) -> ProveResponse {
        match self {
            ProveOutcome::Proved => ProveResponse { error: None },
            ProveOutcome::Failed(err) => ProveResponse {
                error: Some(err.message),
            },
        }
    }
}

/// What the prover is asked to prove, after input validation.
struct ProvingPlan<'a, R> {
    network: &'a NetworkConfig,
    token_amount_recipients: Vec<TokenAmountRecipient>,
    nft_amount_recipients: Vec<NftAmountRecipient>,
    /// Present for relay-adapt proof types.
    relay: Option<(&'a R, RelayAdaptAction)>,
}

/// Builds proofs and caches the result.
///
/// Generic over `TransactionProver` (the proving engine), `RelayAdaptContract`
/// (one per network) and `RailgunAddressValidator`. Callers are expected to run
/// one proof at a time: a second concurrent attempt clears the cache under the
/// first and the last one to finish wins.
pub struct ProofAssembler<P: TransactionProver, R: RelayAdaptContract, V: RailgunAddressValidator> {
    cache: Arc<ProofCache>,
    prover: P,
    address_validator: V,
    networks: HashMap<NetworkName, NetworkConfig>,
    /// network → relay adapt contract
    relay_adapts: HashMap<NetworkName, R>,
    blocked_addresses: HashSet<Address>,
}

impl<P: TransactionProver, R: RelayAdaptContract, V: RailgunAddressValidator>
    ProofAssembler<P, R, V>
{
    pub fn new(cache: Arc<ProofCache>, prover: P, address_validator: V) -> Self {
        Self {
            cache,
            prover,
            address_validator,
            networks: HashMap::new(),
            relay_adapts: HashMap::new(),
            blocked_addresses: HashSet::new(),
        }
    }

    /// Register a network and its relay adapt contract.
    ///
    /// The contract must live at the network's `relay_adapt_contract`, since
    /// the final proof binds to one address and the populated call targets
    /// the other.
    pub fn with_network(
        mut self,
        network: NetworkConfig,
        relay_adapt: R,
    ) -> Result<Self, AssembleError> {
        if relay_adapt.address() != network.relay_adapt_contract {
            return Err(AssembleError::RelayAdaptMismatch {
                network: network.name,
                configured: network.relay_adapt_contract,
                contract: relay_adapt.address(),
            });
        }
        self.relay_adapts.insert(network.name, relay_adapt);
        self.networks.insert(network.name, network);
        Ok(self)
    }

    pub fn with_blocked_addresses(mut self, addresses: impl IntoIterator<Item = Address>) -> Self {
        self.blocked_addresses.extend(addresses);
        self
    }

    pub fn cache(&self) -> &Arc<ProofCache> {
        &self.cache
    }

    pub fn prover(&self) -> &P {
        &self.prover
    }

    /// Prove `request` and cache the populated transaction.
    ///
    /// The cache is cleared once inputs are validated, so on failure it is
    /// left empty even if it held a valid proof before.
    pub async fn generate_proof(
        &self,
        ctx: &ProofContext,
        request: ProofRequest,
        progress: ProgressCallback<'_>,
    ) -> ProveOutcome {
        let proof_type = request.proof_type();
        match self.assemble(ctx, &request, progress).await {
            Ok(()) => {
                info!(%proof_type, network = %ctx.network, "proof generated");
                ProveOutcome::Proved
            }
            Err(err) => {
                error!(%proof_type, network = %ctx.network, error = %err, "proof generation failed");
                ProveOutcome::Failed(err.sanitize())
            }
        }
    }

    /// Prove a withdrawal of `token_amounts` to a public address.
    pub async fn generate_withdraw_proof(
        &self,
        ctx: &ProofContext,
        to_wallet_address: impl Into<String>,
        token_amounts: Vec<TokenAmount>,
        progress: ProgressCallback<'_>,
    ) -> ProveOutcome {
        let request = ProofRequest::Withdraw {
            to_wallet_address: to_wallet_address.into(),
            token_amounts,
        };
        self.generate_proof(ctx, request, progress).await
    }

    /// Prove a withdrawal of the wrapped base token, unwrapped to a public address
    /// through the relay adapt contract.
    pub async fn generate_withdraw_base_token_proof(
        &self,
        ctx: &ProofContext,
        to_wallet_address: impl Into<String>,
        wrapped_token_amount: TokenAmount,
        progress: ProgressCallback<'_>,
    ) -> ProveOutcome {
        let request = ProofRequest::WithdrawBaseToken {
            to_wallet_address: to_wallet_address.into(),
            wrapped_token_amount,
        };
        self.generate_proof(ctx, request, progress).await
    }

    /// Validate `params` against the cached proof and merge `gas_details` into its transaction.
    pub fn populate_proved_transaction(
        &self,
        network: NetworkName,
        params: &ProofParams,
        gas_details: &TransactionGasDetails,
    ) -> Result<TransactionRequest, PopulateError> {
        let network = self
            .networks
            .get(&network)
            .ok_or(PopulateError::UnknownNetwork)?;
        self.cache
            .populate_proved_transaction(network, params, gas_details)
    }

    async fn assemble(
        &self,
        ctx: &ProofContext,
        request: &ProofRequest,
        progress: ProgressCallback<'_>,
    ) -> Result<(), AssembleError> {
        let plan = self.plan(ctx, request)?;
        let params = request.proof_params(ctx);

        debug!(
            phase = %ProofPhase::Start,
            proof_type = %params.proof_type,
            pipeline = ?params.proof_type.pipeline(),
        );
        self.cache.clear();

        let mut prove_request = ProveRequest {
            proof_type: params.proof_type,
            network: ctx.network,
            railgun_wallet_id: ctx.railgun_wallet_id.clone(),
            encryption_key: ctx.encryption_key.clone(),
            memo_text: params.memo_text.clone(),
            show_sender_address_to_recipient: params.show_sender_address_to_recipient,
            token_amount_recipients: plan.token_amount_recipients,
            nft_amount_recipients: plan.nft_amount_recipients,
            relayer_fee: ctx.relayer_fee(),
            send_with_public_wallet: ctx.send_with_public_wallet,
            overall_batch_min_gas_price: ctx.overall_batch_min_gas_price,
            adapt_id: None,
        };

        let populated_transaction = match plan.relay {
            None => {
                debug!(phase = %ProofPhase::FinalProving);
                let batch = self
                    .prover
                    .prove_transactions(&prove_request, ProofMode::Full, progress)
                    .await
                    .map_err(in_phase(ProofPhase::FinalProving))?;
                self.prover
                    .populate_transact(&batch, plan.network)
                    .await
                    .map_err(in_phase(ProofPhase::FinalProving))?
            }
            Some((relay, action)) => {
                debug!(phase = %ProofPhase::DummyProving);
                let silent = |_: f64| {};
                let dummy = self
                    .prover
                    .prove_transactions(&prove_request, ProofMode::Dummy, &silent)
                    .await
                    .map_err(in_phase(ProofPhase::DummyProving))?;

                let random = RelayAdaptRandom::generate();
                let parameters = relay.derive_params(&dummy, &action, random).await?;
                prove_request.adapt_id = Some(AdaptId {
                    contract: relay.address(),
                    parameters,
                });
                debug!(phase = %ProofPhase::ParamsDerived, %parameters);

                debug!(phase = %ProofPhase::FinalProving);
                let batch = self
                    .prover
                    .prove_transactions(&prove_request, ProofMode::Full, progress)
                    .await
                    .map_err(in_phase(ProofPhase::FinalProving))?;
                self.prover
                    .populate_relay_adapt(&batch, plan.network, &action, random)
                    .await
                    .map_err(in_phase(ProofPhase::FinalProving))?
            }
        };

        self.cache.store(ProvedTransaction {
            params,
            populated_transaction,
        })?;
        debug!(phase = %ProofPhase::Cached);
        Ok(())
    }

    /// Validate inputs and decide what the prover sees. Runs before the cache is touched.
    fn plan(
        &self,
        ctx: &ProofContext,
        request: &ProofRequest,
    ) -> Result<ProvingPlan<'_, R>, AssembleError> {
        if ctx.relayer_fee_token_amount.is_some() && ctx.relayer_railgun_address.is_none() {
            return Err(AssembleError::MissingRelayerAddress);
        }
        if let Some(relayer) = &ctx.relayer_railgun_address {
            self.check_railgun_address(relayer)?;
        }
        let network = self
            .networks
            .get(&ctx.network)
            .ok_or(AssembleError::UnknownNetwork(ctx.network))?;

        let plan = match request {
            ProofRequest::Transfer {
                token_amount_recipients,
                nft_amount_recipients,
                ..
            } => {
                for recipient in token_amount_recipients {
                    self.check_railgun_address(&recipient.recipient_address)?;
                }
                for recipient in nft_amount_recipients {
                    self.check_railgun_address(&recipient.recipient_address)?;
                }
                ProvingPlan {
                    network,
                    token_amount_recipients: token_amount_recipients.clone(),
                    nft_amount_recipients: nft_amount_recipients.clone(),
                    relay: None,
                }
            }
            ProofRequest::Unshield {
                token_amount_recipients,
                nft_amount_recipients,
            } => {
                let token_amount_recipients = token_amount_recipients
                    .iter()
                    .map(|recipient| {
                        Ok::<_, AssembleError>(TokenAmountRecipient {
                            recipient_address: self
                                .check_public_address(&recipient.recipient_address)?
                                .to_string(),
                            ..recipient.clone()
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let nft_amount_recipients = nft_amount_recipients
                    .iter()
                    .map(|recipient| {
                        Ok::<_, AssembleError>(NftAmountRecipient {
                            recipient_address: self
                                .check_public_address(&recipient.recipient_address)?
                                .to_string(),
                            ..recipient.clone()
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                ProvingPlan {
                    network,
                    token_amount_recipients,
                    nft_amount_recipients,
                    relay: None,
                }
            }
            ProofRequest::Withdraw {
                to_wallet_address,
                token_amounts,
            } => {
                let destination = self.check_public_address(to_wallet_address)?.to_string();
                ProvingPlan {
                    network,
                    token_amount_recipients: token_amounts
                        .iter()
                        .map(|amount| amount.with_recipient(destination.as_str()))
                        .collect(),
                    nft_amount_recipients: Vec::new(),
                    relay: None,
                }
            }
            ProofRequest::UnshieldBaseToken {
                public_wallet_address: destination,
                wrapped_token_amount,
            }
            | ProofRequest::WithdrawBaseToken {
                to_wallet_address: destination,
                wrapped_token_amount,
            } => {
                let destination = self.check_public_address(destination)?;
                let relay = self.relay_adapt(ctx.network)?;
                // The relay contract receives the unshield and forwards to the destination.
                ProvingPlan {
                    network,
                    token_amount_recipients: vec![
                        wrapped_token_amount.with_recipient(relay.address().to_string())
                    ],
                    nft_amount_recipients: Vec::new(),
                    relay: Some((relay, RelayAdaptAction::UnwrapBaseToken { destination })),
                }
            }
            ProofRequest::CrossContractCalls {
                relay_adapt_unshield_token_amounts,
                relay_adapt_shield_token_addresses,
                cross_contract_calls_serialized,
            } => {
                let relay = self.relay_adapt(ctx.network)?;
                let relay_address = relay.address().to_string();
                ProvingPlan {
                    network,
                    token_amount_recipients: relay_adapt_unshield_token_amounts
                        .iter()
                        .map(|amount| amount.with_recipient(relay_address.as_str()))
                        .collect(),
                    nft_amount_recipients: Vec::new(),
                    relay: Some((
                        relay,
                        RelayAdaptAction::CrossContractCalls {
                            shield_token_addresses: relay_adapt_shield_token_addresses.clone(),
                            calls: cross_contract_calls_serialized.clone(),
                        },
                    )),
                }
            }
        };
        Ok(plan)
    }

    fn relay_adapt(&self, network: NetworkName) -> Result<&R, AssembleError> {
        self.relay_adapts
            .get(&network)
            .ok_or(AssembleError::MissingRelayAdapt(network))
    }

    fn check_public_address(&self, address: &str) -> Result<Address, AssembleError> {
        let parsed: Address = address
            .parse()
            .map_err(|_| AssembleError::InvalidEthAddress(address.to_string()))?;
        if self.blocked_addresses.contains(&parsed) {
            return Err(AssembleError::BlockedAddress(parsed));
        }
        Ok(parsed)
    }

    fn check_railgun_address(&self, address: &str) -> Result<(), AssembleError> {
        if !self.address_validator.is_valid(address) {
            return Err(AssembleError::InvalidRailgunAddress(address.to_string()));
        }
        Ok(())
    }
}

fn in_phase(phase: ProofPhase) -> impl Fn(ProverError) -> AssembleError {
    move |source| AssembleError::Prover { phase, source }
}
