use crate::contract::settlement::log_batch_settled;
use crate::domain::UnderlyingAmount;
use crate::errors::{invariants, StakingPoolError};
use crate::events::Event;
use crate::interface::{
    Authorizer, ConfigUpdate, ConfigView, Operation, Operator, QueueLengths, QueueRunSummary,
    ReceiptToken, StakingAgent, UndelegationRun,
};
use crate::near::log;
use crate::StakingPool;
use near_sdk::AccountId;

impl<A: StakingAgent, T: ReceiptToken, Z: Authorizer> Operator for StakingPool<A, T, Z> {
    fn config(&self) -> ConfigView {
        self.config.into()
    }

    fn queue_lengths(&self) -> QueueLengths {
        QueueLengths {
            undelegation_queue: self.undelegation_queue.len() as u32,
            execution_queue: self.execution_queue.len() as u32,
            delegation_queue: self.delegation_queue.len() as u32,
            withdrawal_claims: self.withdrawal_claims.len() as u32,
            unstake_batches: self.batches.len() as u32,
        }
    }

    fn in_liquidation(&self) -> bool {
        self.in_liquidation
    }

    fn audit(&self) -> Result<(), StakingPoolError> {
        let held = self.pending_delegation
            + self.queued_delegation
            + self.withdrawal_reserve
            + self.to_claim;
        if self.underlying_balance != held {
            return Err(StakingPoolError::InvariantViolated(
                invariants::UNDERLYING_BALANCE,
            ));
        }
        let delegator_to_claim: UnderlyingAmount =
            self.delegator_to_claim.values().copied().sum();
        if delegator_to_claim != self.to_claim {
            return Err(StakingPoolError::InvariantViolated(invariants::TO_CLAIM));
        }
        let unassigned: UnderlyingAmount =
            self.batches.values().map(|batch| batch.unassigned()).sum();
        if unassigned != self.pending_undelegation {
            return Err(StakingPoolError::InvariantViolated(
                invariants::PENDING_UNDELEGATION,
            ));
        }
        let queued: UnderlyingAmount = self
            .delegation_queue
            .items()
            .map(|request| request.amount)
            .sum();
        if queued != self.queued_delegation {
            return Err(StakingPoolError::InvariantViolated(
                invariants::QUEUED_DELEGATION,
            ));
        }
        let undistributed: UnderlyingAmount = self
            .withdrawal_claims
            .items()
            .map(|claim| claim.amount)
            .sum();
        if undistributed != self.in_undelegation {
            return Err(StakingPoolError::InvariantViolated(
                invariants::IN_UNDELEGATION,
            ));
        }
        Ok(())
    }

    fn net_out_pending(&mut self, caller: &AccountId) -> Result<UnderlyingAmount, StakingPoolError> {
        self.authorize(Operation::NetOutPending, caller)?;
        let amount = self
            .pending_delegation
            .min(self.pending_undelegation)
            .min(self.absorbable_undelegation());
        if amount.is_zero() {
            return Err(StakingPoolError::NothingToNet);
        }
        self.net_out(amount)?;
        self.log_netted_out(amount);
        Ok(amount)
    }

    fn net_out_pending_amount(
        &mut self,
        caller: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<UnderlyingAmount, StakingPoolError> {
        self.authorize(Operation::NetOutPending, caller)?;
        self.check_nettable(amount)?;
        self.net_out(amount)?;
        self.log_netted_out(amount);
        Ok(amount)
    }

    fn make_claimable(
        &mut self,
        caller: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<UnderlyingAmount, StakingPoolError> {
        self.authorize(Operation::MakeClaimable, caller)?;
        self.check_nettable(amount)?;
        let claims_credited = self.credit_claims(amount)?;
        log(Event::MadeClaimable {
            amount,
            claims_credited,
        });
        Ok(amount)
    }

    fn schedule_undelegation(
        &mut self,
        caller: &AccountId,
        ledger_index: usize,
        agent: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<Vec<u64>, StakingPoolError> {
        self.authorize(Operation::ScheduleUndelegation, caller)?;
        let (ledger_id, tickets) = self.enqueue_undelegation(ledger_index, agent, amount)?;
        log(Event::UndelegationScheduled {
            ledger_id,
            agent: agent.clone(),
            amount,
            tickets: tickets.clone(),
        });
        Ok(tickets)
    }

    fn process_undelegation_queue(
        &mut self,
        caller: &AccountId,
    ) -> Result<QueueRunSummary, StakingPoolError> {
        self.authorize(Operation::ProcessUndelegationQueue, caller)?;
        let run = self.issue_undelegations()?;
        log(Event::UndelegationQueueProcessed {
            issued: run.consumed,
            requeued: run.requeued,
        });
        Ok(run.into())
    }

    fn execute_undelegations(
        &mut self,
        caller: &AccountId,
        max_iterations: u32,
    ) -> Result<UndelegationRun, StakingPoolError> {
        self.authorize(Operation::ExecuteUndelegations, caller)?;
        if max_iterations == 0 {
            return Err(StakingPoolError::ZeroAmount);
        }
        let max_iterations = max_iterations.min(self.config.undelegation_queue_max_iter());
        let execution = self.execute_issued_undelegations(max_iterations)?;
        for (batch_id, payout) in execution.settled {
            log_batch_settled(batch_id, Some(payout));
        }
        let (distributed, _) = self.distribute_claims(max_iterations)?;
        log(Event::UndelegationsExecuted {
            executed: execution.run.consumed,
            requeued: execution.run.requeued,
            distributed,
            released: execution.released,
        });
        Ok(UndelegationRun {
            executed: execution.run.consumed,
            requeued: execution.run.requeued,
            distributed,
        })
    }

    fn enqueue_delegation(
        &mut self,
        caller: &AccountId,
        ledger_index: usize,
        agent: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<u64, StakingPoolError> {
        self.authorize(Operation::EnqueueDelegation, caller)?;
        let (ledger_id, ticket) = self.reserve_delegation(ledger_index, agent, amount)?;
        log(Event::DelegationEnqueued {
            ledger_id,
            agent: agent.clone(),
            amount,
            ticket,
        });
        Ok(ticket)
    }

    fn process_delegation_queue(
        &mut self,
        caller: &AccountId,
    ) -> Result<QueueRunSummary, StakingPoolError> {
        self.authorize(Operation::ProcessDelegationQueue, caller)?;
        let run = self.delegate_queued()?;
        log(Event::DelegationQueueProcessed {
            delegated: run.consumed,
            requeued: run.requeued,
        });
        Ok(run.into())
    }

    fn activate_in_liquidation(&mut self, caller: &AccountId) -> Result<(), StakingPoolError> {
        self.authorize(Operation::ActivateInLiquidation, caller)?;
        if !self.in_liquidation {
            self.in_liquidation = true;
            log(Event::LiquidationActivated);
        }
        Ok(())
    }

    fn update_config(
        &mut self,
        caller: &AccountId,
        updates: ConfigUpdate,
    ) -> Result<ConfigView, StakingPoolError> {
        self.authorize(Operation::UpdateConfig, caller)?;
        self.config.apply_updates(&updates)?;
        log(Event::ConfigUpdated(self.config));
        Ok(self.config.into())
    }
}

impl<A, T, Z> StakingPool<A, T, Z> {
    /// ## Errors
    /// - ZERO_AMOUNT if the amount is zero
    /// - NOTHING_TO_NET if the amount exceeds the pending delegation or the pending undelegation
    fn check_nettable(&self, amount: UnderlyingAmount) -> Result<(), StakingPoolError> {
        if amount.is_zero() {
            return Err(StakingPoolError::ZeroAmount);
        }
        if amount > self.pending_delegation || amount > self.pending_undelegation {
            return Err(StakingPoolError::NothingToNet);
        }
        Ok(())
    }

    fn log_netted_out(&self, amount: UnderlyingAmount) {
        log(Event::NettedOut {
            amount,
            pending_delegation: self.pending_delegation,
            pending_undelegation: self.pending_undelegation,
        });
    }
}
