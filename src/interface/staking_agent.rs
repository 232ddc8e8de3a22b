use crate::domain::{LedgerId, Percent, UnderlyingAmount};
use near_sdk::AccountId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// the request's delay has not yet elapsed
    #[error("delegation request is not yet executable")]
    NotExecutable,
    #[error("staking agent rejected the call: {0}")]
    Rejected(String),
}

/// Capability to delegate funds with the external staking system.
///
/// Ledgers are identified towards the agent by their [LedgerId]. The pool trusts the values the agent
/// returns and does not verify the agent's own consensus.
pub trait StakingAgent {
    /// starts a new delegation
    /// - `auto_compound` sets the share of rewards that is compounded into the delegation
    fn delegate(
        &mut self,
        ledger: LedgerId,
        agent: &AccountId,
        amount: UnderlyingAmount,
        auto_compound: Option<Percent>,
    ) -> Result<(), AgentError>;

    fn bond_more(
        &mut self,
        ledger: LedgerId,
        agent: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<(), AgentError>;

    fn schedule_bond_less(
        &mut self,
        ledger: LedgerId,
        agent: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<(), AgentError>;

    fn schedule_revoke(&mut self, ledger: LedgerId, agent: &AccountId) -> Result<(), AgentError>;

    fn cancel_request(&mut self, ledger: LedgerId, agent: &AccountId) -> Result<(), AgentError>;

    /// returns the amount released back to the ledger
    ///
    /// fails with [AgentError::NotExecutable] if the request's delay has not yet elapsed
    fn execute_request(
        &mut self,
        ledger: LedgerId,
        agent: &AccountId,
    ) -> Result<UnderlyingAmount, AgentError>;

    fn delegation_amount(&self, ledger: LedgerId, agent: &AccountId) -> UnderlyingAmount;

    fn request_is_pending(&self, ledger: LedgerId, agent: &AccountId) -> bool;
}
