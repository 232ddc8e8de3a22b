//! centralizes all error conditions
//!
//! Every error rejects the whole attempted state change. [StakingPoolError::code] returns the
//! stable error code that operator tooling matches on.

use crate::interface::AgentError;
use near_sdk::AccountId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StakingPoolError {
    #[error("deposit amount must not be zero")]
    ZeroPayment,

    #[error("amount must not be zero")]
    ZeroAmount,

    #[error("LST balance is insufficient to fulfill request: balance={balance} requested={requested}")]
    InsufficientBalance { balance: u128, requested: u128 },

    #[error("minting {minted} LST would exceed the max LST supply: supply={supply} max={max}")]
    MaxSupply { supply: u128, minted: u128, max: u128 },

    #[error("deposit amount exceeds the max deposit: amount={amount} max={max}")]
    MaxDelegation { amount: u128, max: u128 },

    #[error("ledger balance is insufficient: balance={balance} requested={requested}")]
    InsufficientLedgerBalance { balance: u128, requested: u128 },

    #[error("delegation to {agent} would exceed the max delegation per agent: delegated={delegated} max={max}")]
    MaxDelegationExceeded {
        agent: AccountId,
        delegated: u128,
        max: u128,
    },

    #[error("pending delegation is insufficient: available={available} requested={requested}")]
    InsufficientPendingDelegation { available: u128, requested: u128 },

    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    #[error("there is no pending delegation request")]
    NoPendingRequest,

    #[error("there is nothing to net")]
    NothingToNet,

    #[error("there is nothing to claim")]
    NothingToClaim,

    #[error("ledger must not hold any funds or delegations in order to be removed")]
    LedgerNotEmpty,

    #[error("operation is only permitted while the pool is in liquidation")]
    NotInLiquidation,

    #[error("{caller} is not authorized to perform the operation")]
    NotAuthorized { caller: AccountId },

    #[error("ledger does not exist at index {0}")]
    InvalidLedger(usize),

    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),

    #[error("percent must be between 0 and 100: {0}")]
    InvalidPercent(u8),

    #[error("direct transfers into the pool are rejected")]
    DirectTransferRejected,

    #[error("queue entry #{ticket} could not be processed after {attempts} attempts")]
    UndelegationStalled { ticket: u64, attempts: u32 },

    #[error("staking agent call failed: {0}")]
    StakingAgent(#[from] AgentError),

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("ILLEGAL STATE : {0}")]
    InvariantViolated(&'static str),
}

impl StakingPoolError {
    pub fn code(&self) -> &'static str {
        use StakingPoolError::*;
        match self {
            ZeroPayment => "ZERO_PAYMENT",
            ZeroAmount => "ZERO_AMOUNT",
            InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            MaxSupply { .. } => "MAX_SUPPLY",
            MaxDelegation { .. } => "MAX_DELEGATION",
            InsufficientLedgerBalance { .. } => "INSUFFICIENT_LEDGER_BALANCE",
            MaxDelegationExceeded { .. } => "MAX_DELEGATION_EXCEEDED",
            InsufficientPendingDelegation { .. } => "INSUFFICIENT_PENDING_DELEGATION",
            InvalidState(_) => "INVALID_STATE",
            NoPendingRequest => "NO_PENDING_REQUEST",
            NothingToNet => "NOTHING_TO_NET",
            NothingToClaim => "NOTHING_TO_CLAIM",
            LedgerNotEmpty => "LEDGER_NOT_EMPTY",
            NotInLiquidation => "NOT_IN_LIQUIDATION",
            NotAuthorized { .. } => "NOT_AUTHORIZED",
            InvalidLedger(_) => "INVALID_LEDGER",
            InvalidConfig(_) => "INVALID_CONFIG",
            InvalidPercent(_) => "INVALID_PERCENT",
            DirectTransferRejected => "DIRECT_TRANSFER_REJECTED",
            UndelegationStalled { .. } => "UNDELEGATION_STALLED",
            StakingAgent(_) => "STAKING_AGENT_FAILURE",
            ArithmeticOverflow => "ARITHMETIC_OVERFLOW",
            InvariantViolated(_) => "INVARIANT_VIOLATED",
        }
    }
}

pub mod illegal_state {
    pub const PENDING_REQUEST_EXISTS: &str =
        "a delegation request is already pending for the ledger and agent";

    pub const DELEGATION_EXISTS: &str =
        "ledger already delegates to the agent - use bond more instead";

    pub const DELEGATION_DOES_NOT_EXIST: &str = "ledger does not delegate to the agent";

    pub const REQUEST_OWNED_BY_WITHDRAWAL: &str =
        "pending request was issued on behalf of a withdrawal batch";

    pub const LEDGER_HAS_PENDING_REQUESTS: &str =
        "ledger funds are locked while delegation requests are pending";

    pub const BATCH_SHOULD_EXIST: &str = "withdrawal batch should exist";

    pub const LEDGER_SHOULD_EXIST: &str = "ledger referenced by a queue entry should exist";

    pub const UNDELEGATION_EXCEEDS_PENDING: &str = "amount exceeds the pending undelegation";

    pub const LST_NOT_BACKED: &str = "outstanding LST is not backed by any underlying";

    pub const WITHDRAWAL_WINDOW_EXCEEDED: &str =
        "amount exceeds what the withdrawal batches within the iteration limit can absorb";
}

pub mod invariants {
    pub const UNDERLYING_BALANCE: &str =
        "underlying balance != pending delegation + queued delegation + withdrawal reserve + to claim";

    pub const TO_CLAIM: &str = "to claim != sum of delegator claims";

    pub const PENDING_UNDELEGATION: &str =
        "pending undelegation != sum of unassigned withdrawal batch amounts";

    pub const QUEUED_DELEGATION: &str = "queued delegation != sum of delegation queue entries";

    pub const IN_UNDELEGATION: &str = "in undelegation != sum of undistributed withdrawal claims";
}
