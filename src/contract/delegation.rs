use crate::domain::{
    BlockTimeHeight, DelegationRequest, Disposition, LedgerId, QueueRun, UnderlyingAmount,
};
use crate::errors::StakingPoolError;
use crate::interface::StakingAgent;
use crate::StakingPool;
use near_sdk::AccountId;

impl<A, T, Z> StakingPool<A, T, Z> {
    /// reserves the amount from the pending delegation and enqueues it for delegation
    pub(crate) fn reserve_delegation(
        &mut self,
        ledger_index: usize,
        agent: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<(LedgerId, u64), StakingPoolError> {
        if amount.is_zero() {
            return Err(StakingPoolError::ZeroAmount);
        }
        let ledger_id = self.ledger_at(ledger_index)?.id();
        if amount > self.pending_delegation {
            return Err(StakingPoolError::InsufficientPendingDelegation {
                available: self.pending_delegation.value(),
                requested: amount.value(),
            });
        }
        self.pending_delegation -= amount;
        self.queued_delegation += amount;
        let ticket = self.delegation_queue.enqueue(
            DelegationRequest {
                ledger_id,
                agent: agent.clone(),
                amount,
            },
            BlockTimeHeight::from_env(),
        );
        Ok((ledger_id, ticket))
    }
}

impl<A: StakingAgent, T, Z> StakingPool<A, T, Z> {
    /// Delegates up to `dao_delegation_queue_max_iter` queued delegation requests.
    ///
    /// The funds are moved into the ledger and delegated, as a new delegation or by bonding more.
    /// Entries are requeued when the (ledger, agent) pair has a pending request, when the agent's
    /// delegations would exceed the max delegation per agent, or when the agent refuses the call.
    pub(crate) fn delegate_queued(&mut self) -> Result<QueueRun, StakingPoolError> {
        let max_iterations = self.config.dao_delegation_queue_max_iter();
        let max_retries = self.config.queue_entry_max_retries();
        let max_delegation = self.config.max_delegation_per_agent();

        let mut queue = std::mem::take(&mut self.delegation_queue);
        let run = queue.process_up_to(max_iterations, max_retries, |request| {
            let position = match self
                .ledgers
                .iter()
                .position(|ledger| ledger.id() == request.ledger_id)
            {
                Some(position) => position,
                None => return Disposition::Requeue,
            };
            let agent_delegated: UnderlyingAmount = self
                .ledgers
                .iter()
                .map(|ledger| ledger.delegation(&request.agent))
                .sum();
            match agent_delegated.checked_add(request.amount) {
                Some(total) if total <= max_delegation => (),
                _ => return Disposition::Requeue,
            }

            let mut staged = self.ledgers[position].clone();
            let result = staged.credit(request.amount).and_then(|_| {
                if staged.delegations().contains_key(&request.agent) {
                    staged.bond_more(&request.agent, request.amount)?;
                    self.agent
                        .bond_more(request.ledger_id, &request.agent, request.amount)
                        .map_err(StakingPoolError::from)
                } else {
                    staged.delegate(&request.agent, request.amount)?;
                    self.agent
                        .delegate(request.ledger_id, &request.agent, request.amount, None)
                        .map_err(StakingPoolError::from)
                }
            });
            match result {
                Ok(()) => {
                    self.ledgers[position] = staged;
                    self.queued_delegation -= request.amount;
                    self.underlying_balance -= request.amount;
                    Disposition::Consumed
                }
                Err(_) => Disposition::Requeue,
            }
        });
        self.delegation_queue = queue;
        run.map_err(StakingPoolError::from)
    }
}
