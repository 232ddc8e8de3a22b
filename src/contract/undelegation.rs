//! Undelegation on behalf of withdrawal batches runs through two bounded queues:
//!
//! 1. `undelegation_queue` - scheduled undelegation requests that have not yet been issued against
//!    the staking agent. Processing the queue issues bond-less / revoke requests.
//! 2. `execution_queue` - issued requests waiting for the staking agent's delay to elapse. Executing
//!    the queue returns the released funds to the pool and settles the withdrawal batches.

use crate::domain::{
    BatchId, BlockTimeHeight, Disposition, IssuedUndelegation, LedgerId, QueueRun, RequestKind,
    RequestOrigin, StalledEntry, UnderlyingAmount, UndelegationRequest,
};
use crate::errors::{illegal_state, StakingPoolError};
use crate::interface::{AgentError, StakingAgent};
use crate::StakingPool;
use near_sdk::AccountId;

pub(crate) struct ExecutionRun {
    pub run: QueueRun,
    pub released: UnderlyingAmount,
    pub settled: Vec<(BatchId, UnderlyingAmount)>,
}

impl From<StalledEntry> for StakingPoolError {
    fn from(stalled: StalledEntry) -> Self {
        StakingPoolError::UndelegationStalled {
            ticket: stalled.ticket,
            attempts: stalled.attempts,
        }
    }
}

impl<A, T, Z> StakingPool<A, T, Z> {
    /// amount of the (ledger, agent) delegation that is already committed to undelegation, either
    /// queued or pending with the agent
    fn committed_undelegation(&self, ledger_index: usize, agent: &AccountId) -> UnderlyingAmount {
        let ledger = &self.ledgers[ledger_index];
        let queued: UnderlyingAmount = self
            .undelegation_queue
            .items()
            .filter(|request| request.ledger_id == ledger.id() && &request.agent == agent)
            .map(|request| request.amount)
            .sum();
        let pending = match ledger.pending_request(agent).map(|request| request.kind) {
            Some(RequestKind::BondLess(amount)) => amount,
            Some(RequestKind::Revoke) => ledger.delegation(agent),
            None => UnderlyingAmount::ZERO,
        };
        queued + pending
    }

    /// Draws the amount from the pending undelegation and enqueues one undelegation request per
    /// withdrawal batch drawn on.
    pub(crate) fn enqueue_undelegation(
        &mut self,
        ledger_index: usize,
        agent: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<(LedgerId, Vec<u64>), StakingPoolError> {
        if amount.is_zero() {
            return Err(StakingPoolError::ZeroAmount);
        }
        let ledger = self.ledger_at(ledger_index)?;
        let ledger_id = ledger.id();
        let delegated = ledger.delegation(agent);
        if delegated.is_zero() {
            return Err(StakingPoolError::InvalidState(
                illegal_state::DELEGATION_DOES_NOT_EXIST,
            ));
        }
        let available = delegated.saturating_sub(self.committed_undelegation(ledger_index, agent));
        if amount > available {
            return Err(StakingPoolError::InsufficientLedgerBalance {
                balance: available.value(),
                requested: amount.value(),
            });
        }
        if amount > self.pending_undelegation {
            return Err(StakingPoolError::InvalidState(
                illegal_state::UNDELEGATION_EXCEEDS_PENDING,
            ));
        }
        let draws = self.plan_full_batch_draws(amount)?;

        let now = BlockTimeHeight::from_env();
        let mut tickets = Vec::with_capacity(draws.len());
        for (batch_id, draw) in draws {
            let batch = self
                .batches
                .get_mut(&batch_id)
                .ok_or(StakingPoolError::InvariantViolated(
                    illegal_state::BATCH_SHOULD_EXIST,
                ))?;
            batch.schedule(draw);
            tickets.push(self.undelegation_queue.enqueue(
                UndelegationRequest {
                    ledger_id,
                    agent: agent.clone(),
                    amount: draw,
                    batch_id,
                },
                now,
            ));
        }
        self.pending_undelegation -= amount;
        Ok((ledger_id, tickets))
    }
}

impl<A: StakingAgent, T, Z> StakingPool<A, T, Z> {
    /// Issues up to `round_unscheduled_undelegations_max_iter` queued undelegation requests.
    ///
    /// The agent reported delegation amount is synced into the ledger before the request is issued.
    /// A revoke is issued when the requested amount reaches the delegation, otherwise a bond-less.
    /// Entries are requeued when the (ledger, agent) pair already has a pending request, or when
    /// the ledger or the agent refuses the request.
    pub(crate) fn issue_undelegations(&mut self) -> Result<QueueRun, StakingPoolError> {
        let max_iterations = self.config.round_unscheduled_undelegations_max_iter();
        let max_retries = self.config.queue_entry_max_retries();
        let mut queue = std::mem::take(&mut self.undelegation_queue);
        let mut issued = vec![];
        let run = queue.process_up_to(max_iterations, max_retries, |request| {
            let position = match self
                .ledgers
                .iter()
                .position(|ledger| ledger.id() == request.ledger_id)
            {
                Some(position) => position,
                None => return Disposition::Requeue,
            };
            let ledger = &mut self.ledgers[position];
            if ledger.pending_request(&request.agent).is_some()
                || self
                    .agent
                    .request_is_pending(request.ledger_id, &request.agent)
            {
                return Disposition::Requeue;
            }

            let delegated = self
                .agent
                .delegation_amount(request.ledger_id, &request.agent);
            let mut staged = ledger.clone();
            staged.sync_delegation(&request.agent, delegated);
            let origin = RequestOrigin::Withdrawal(request.batch_id);
            let result = if request.amount >= delegated {
                staged
                    .schedule_revoke(&request.agent, origin)
                    .and_then(|_| {
                        self.agent
                            .schedule_revoke(request.ledger_id, &request.agent)
                            .map_err(StakingPoolError::from)
                    })
            } else {
                staged
                    .schedule_bond_less(&request.agent, request.amount, origin)
                    .and_then(|_| {
                        self.agent
                            .schedule_bond_less(request.ledger_id, &request.agent, request.amount)
                            .map_err(StakingPoolError::from)
                    })
            };
            match result {
                Ok(()) => {
                    *ledger = staged;
                    issued.push(IssuedUndelegation {
                        ledger_id: request.ledger_id,
                        agent: request.agent.clone(),
                        batch_id: request.batch_id,
                    });
                    Disposition::Consumed
                }
                Err(_) => Disposition::Requeue,
            }
        });
        self.undelegation_queue = queue;
        let run = run?;

        let now = BlockTimeHeight::from_env();
        for issued in issued {
            self.execution_queue.enqueue(issued, now);
        }
        Ok(run)
    }

    /// Executes up to `max_iterations` issued undelegation requests in FIFO order.
    ///
    /// The run halts at the first request the agent reports as not yet executable. Requests the
    /// agent rejects are requeued. Released funds are moved into the withdrawal reserve and the
    /// withdrawal batches that become complete are settled.
    pub(crate) fn execute_issued_undelegations(
        &mut self,
        max_iterations: u32,
    ) -> Result<ExecutionRun, StakingPoolError> {
        let max_retries = self.config.queue_entry_max_retries();
        let now = BlockTimeHeight::from_env();
        let mut queue = std::mem::take(&mut self.execution_queue);
        let mut released_total = UnderlyingAmount::ZERO;
        let mut settled = vec![];
        let mut error = None;
        let run = queue.process_up_to(max_iterations, max_retries, |issued| {
            let ledger = match self
                .ledgers
                .iter_mut()
                .find(|ledger| ledger.id() == issued.ledger_id)
            {
                Some(ledger) => ledger,
                None => {
                    error = Some(StakingPoolError::InvariantViolated(
                        illegal_state::LEDGER_SHOULD_EXIST,
                    ));
                    return Disposition::Halt;
                }
            };
            match ledger.pending_request(&issued.agent) {
                Some(request) if request.origin == RequestOrigin::Withdrawal(issued.batch_id) => (),
                _ => {
                    error = Some(StakingPoolError::NoPendingRequest);
                    return Disposition::Halt;
                }
            }
            if !self.batches.contains_key(&issued.batch_id) {
                error = Some(StakingPoolError::InvariantViolated(
                    illegal_state::BATCH_SHOULD_EXIST,
                ));
                return Disposition::Halt;
            }

            let released = match self.agent.execute_request(issued.ledger_id, &issued.agent) {
                Ok(released) => released,
                Err(AgentError::NotExecutable) => return Disposition::Halt,
                Err(AgentError::Rejected(_)) => return Disposition::Requeue,
            };
            let remaining = self
                .agent
                .delegation_amount(issued.ledger_id, &issued.agent);
            if let Err(err) = ledger.execute_request(&issued.agent, remaining) {
                error = Some(err);
                return Disposition::Halt;
            }
            self.underlying_balance += released;
            self.withdrawal_reserve += released;
            released_total += released;
            if let Some(batch) = self.batches.get_mut(&issued.batch_id) {
                batch.resolve(released);
                if batch.settle(now) {
                    if let Some(settlement) = batch.settlement() {
                        settled.push((issued.batch_id, settlement.payout()));
                    }
                }
            }
            Disposition::Consumed
        });
        self.execution_queue = queue;
        let run = run?;
        if let Some(error) = error {
            return Err(error);
        }
        Ok(ExecutionRun {
            run,
            released: released_total,
            settled,
        })
    }
}
