use crate::access::OperatorAccessList;
use crate::config::Config;
use crate::domain::{LedgerId, Percent, UnderlyingAmount};
use crate::interface::{AgentError, StakingAgent};
use crate::token::LiquidStakingToken;
use crate::StakingPool;
use near_sdk::test_utils::VMContextBuilder;
use near_sdk::{testing_env, AccountId, VMContext};
use staking_agent_mock::{MockError, StakingAgentMock};

pub type TestPool = StakingPool<StakingAgentMock, LiquidStakingToken, OperatorAccessList>;

/// number of rounds before a bond-less / revoke request becomes executable
pub const DELAY_ROUNDS: u64 = 2;

pub fn account(id: &str) -> AccountId {
    id.parse().unwrap()
}

pub fn operator() -> AccountId {
    account("operator.near")
}

pub fn treasury() -> AccountId {
    account("treasury.near")
}

pub fn alice() -> AccountId {
    account("alice.near")
}

pub fn bob() -> AccountId {
    account("bob.near")
}

pub fn collator() -> AccountId {
    account("collator.near")
}

pub fn new_context(predecessor_account_id: AccountId) -> VMContext {
    VMContextBuilder::new()
        .predecessor_account_id(predecessor_account_id)
        .build()
}

/// Starts the next transaction. Every pool entry point runs as its own transaction, so per call
/// runtime limits such as the total log length start over.
pub fn new_transaction() {
    testing_env!(new_context(operator()));
}

pub fn new_pool() -> TestPool {
    new_pool_with_config(Config::default())
}

pub fn new_pool_with_config(config: Config) -> TestPool {
    new_transaction();
    StakingPool::new(
        config,
        StakingAgentMock::new(DELAY_ROUNDS),
        LiquidStakingToken::default(),
        OperatorAccessList::new(operator(), treasury()),
    )
    .unwrap()
}

fn agent_error(err: MockError) -> AgentError {
    match err {
        MockError::NotYetExecutable { .. } => AgentError::NotExecutable,
        err => AgentError::Rejected(err.to_string()),
    }
}

impl StakingAgent for StakingAgentMock {
    fn delegate(
        &mut self,
        ledger: LedgerId,
        agent: &AccountId,
        amount: UnderlyingAmount,
        auto_compound: Option<Percent>,
    ) -> Result<(), AgentError> {
        StakingAgentMock::delegate(
            self,
            ledger.value(),
            agent,
            amount.value(),
            auto_compound.map_or(0, |percent| percent.value()),
        )
        .map_err(agent_error)
    }

    fn bond_more(
        &mut self,
        ledger: LedgerId,
        agent: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<(), AgentError> {
        self.delegator_bond_more(ledger.value(), agent, amount.value())
            .map_err(agent_error)
    }

    fn schedule_bond_less(
        &mut self,
        ledger: LedgerId,
        agent: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<(), AgentError> {
        self.schedule_delegator_bond_less(ledger.value(), agent, amount.value())
            .map_err(agent_error)
    }

    fn schedule_revoke(&mut self, ledger: LedgerId, agent: &AccountId) -> Result<(), AgentError> {
        self.schedule_revoke_delegation(ledger.value(), agent)
            .map_err(agent_error)
    }

    fn cancel_request(&mut self, ledger: LedgerId, agent: &AccountId) -> Result<(), AgentError> {
        self.cancel_delegation_request(ledger.value(), agent)
            .map_err(agent_error)
    }

    fn execute_request(
        &mut self,
        ledger: LedgerId,
        agent: &AccountId,
    ) -> Result<UnderlyingAmount, AgentError> {
        self.execute_delegation_request(ledger.value(), agent)
            .map(UnderlyingAmount)
            .map_err(agent_error)
    }

    fn delegation_amount(&self, ledger: LedgerId, agent: &AccountId) -> UnderlyingAmount {
        StakingAgentMock::delegation_amount(self, ledger.value(), agent).into()
    }

    fn request_is_pending(&self, ledger: LedgerId, agent: &AccountId) -> bool {
        self.delegation_request_is_pending(ledger.value(), agent)
    }
}
