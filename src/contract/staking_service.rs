use crate::domain::{
    BlockTimeHeight, ExchangeRate, LstAmount, UnderlyingAmount, UnstakeBatch, WithdrawalClaim,
};
use crate::errors::{invariants, StakingPoolError};
use crate::events::Event;
use crate::interface::{
    self, Authorizer, Operation, PoolBalances, ReceiptToken, StakingAgent, StakingService,
};
use crate::near::log;
use crate::StakingPool;
use near_sdk::{json_types::U128, AccountId};

impl<A: StakingAgent, T: ReceiptToken, Z: Authorizer> StakingService for StakingPool<A, T, Z> {
    fn balances(&self) -> PoolBalances {
        PoolBalances {
            underlying_balance: self.underlying_balance.value().into(),
            pending_delegation: self.pending_delegation.value().into(),
            pending_undelegation: self.pending_undelegation.value().into(),
            queued_delegation: self.queued_delegation.value().into(),
            withdrawal_reserve: self.withdrawal_reserve.value().into(),
            to_claim: self.to_claim.value().into(),
            in_undelegation: self.in_undelegation.value().into(),
            delegated_total: self.delegated_total.value().into(),
            bootstrap_deposits: self.bootstrap_deposits.value().into(),
            total_deposited: self.total_deposited.value().into(),
            total_claimed: self.total_claimed.value().into(),
            ledger_balances: self
                .ledgers
                .iter()
                .map(|ledger| ledger.balance())
                .sum::<UnderlyingAmount>()
                .value()
                .into(),
            ledger_delegations: self
                .ledgers
                .iter()
                .map(|ledger| ledger.total_delegated())
                .sum::<UnderlyingAmount>()
                .value()
                .into(),
            lst_supply: self.token.total_supply().value().into(),
        }
    }

    fn exchange_rate(&self) -> interface::ExchangeRate {
        self.exchange_rate.into()
    }

    fn underlying_per_lst(&self) -> U128 {
        self.exchange_rate.underlying_per_lst().into()
    }

    fn lst_per_underlying(&self) -> U128 {
        self.exchange_rate.lst_per_underlying().into()
    }

    fn pending_delegation(&self) -> U128 {
        self.pending_delegation.value().into()
    }

    fn in_undelegation(&self) -> U128 {
        self.in_undelegation.value().into()
    }

    fn delegated_total(&self) -> U128 {
        self.delegated_total.value().into()
    }

    fn bootstrap_deposits(&self) -> U128 {
        self.bootstrap_deposits.value().into()
    }

    fn claimed(&self) -> U128 {
        self.total_claimed.value().into()
    }

    fn claimable(&self, account: &AccountId) -> U128 {
        self.delegator_to_claim
            .get(account)
            .map_or(0, UnderlyingAmount::value)
            .into()
    }

    fn lst_balance(&self, account: &AccountId) -> U128 {
        self.token.balance_of(account).value().into()
    }

    fn deposit(
        &mut self,
        caller: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<LstAmount, StakingPoolError> {
        let minted = self.mint_deposit(caller, amount)?;
        log(Event::Deposited {
            account: caller.clone(),
            amount,
            minted,
        });
        Ok(minted)
    }

    fn bootstrap(
        &mut self,
        caller: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<LstAmount, StakingPoolError> {
        self.authorize(Operation::Bootstrap, caller)?;
        let bootstrap_deposits = self
            .bootstrap_deposits
            .checked_add(amount)
            .ok_or(StakingPoolError::ArithmeticOverflow)?;
        let minted = self.mint_deposit(caller, amount)?;
        self.bootstrap_deposits = bootstrap_deposits;
        log(Event::Bootstrapped {
            account: caller.clone(),
            amount,
            minted,
        });
        Ok(minted)
    }

    fn schedule_withdraw(
        &mut self,
        caller: &AccountId,
        amount: LstAmount,
    ) -> Result<UnderlyingAmount, StakingPoolError> {
        if amount.is_zero() {
            return Err(StakingPoolError::ZeroAmount);
        }
        let balance = self.token.balance_of(caller);
        if balance < amount {
            return Err(StakingPoolError::InsufficientBalance {
                balance: balance.value(),
                requested: amount.value(),
            });
        }
        let credit = self.exchange_rate.lst_to_underlying(amount)?;
        if credit.is_zero() {
            return Err(StakingPoolError::ZeroAmount);
        }
        let pending_undelegation = self
            .pending_undelegation
            .checked_add(credit)
            .ok_or(StakingPoolError::ArithmeticOverflow)?;
        let in_undelegation = self
            .in_undelegation
            .checked_add(credit)
            .ok_or(StakingPoolError::ArithmeticOverflow)?;

        let now = BlockTimeHeight::from_env();
        let mut batch = match self
            .open_batch
            .and_then(|batch_id| self.batches.get(&batch_id))
            .filter(|batch| !batch.is_sealed())
        {
            Some(batch) => batch.clone(),
            None => UnstakeBatch::new(self.batch_id_sequence.next(), now),
        };
        batch.add_request(credit)?;

        self.token.burn(caller, amount)?;

        let batch_id = batch.id();
        self.batch_id_sequence = self.batch_id_sequence.max(batch_id);
        self.open_batch = Some(batch_id);
        self.batches.insert(batch_id, batch);
        self.pending_undelegation = pending_undelegation;
        self.in_undelegation = in_undelegation;
        self.delegated_total = self.delegated_total.saturating_sub(credit);
        let ticket = self.withdrawal_claims.enqueue(
            WithdrawalClaim {
                delegator: caller.clone(),
                batch_id,
                amount: credit,
            },
            now,
        );
        log(Event::WithdrawScheduled {
            account: caller.clone(),
            burned: amount,
            amount: credit,
            batch_id,
            ticket,
        });
        Ok(credit)
    }

    fn claim(&mut self, caller: &AccountId) -> Result<UnderlyingAmount, StakingPoolError> {
        let amount = self
            .delegator_to_claim
            .get(caller)
            .copied()
            .unwrap_or(UnderlyingAmount::ZERO);
        if amount.is_zero() {
            return Err(StakingPoolError::NothingToClaim);
        }
        let to_claim = self
            .to_claim
            .checked_sub(amount)
            .ok_or(StakingPoolError::InvariantViolated(invariants::TO_CLAIM))?;
        let underlying_balance = self
            .underlying_balance
            .checked_sub(amount)
            .ok_or(StakingPoolError::InvariantViolated(invariants::UNDERLYING_BALANCE))?;

        self.delegator_to_claim.remove(caller);
        self.to_claim = to_claim;
        self.underlying_balance = underlying_balance;
        self.total_claimed += amount;
        log(Event::Claimed {
            account: caller.clone(),
            amount,
        });
        Ok(amount)
    }

    fn rebase(&mut self, caller: &AccountId) -> Result<interface::ExchangeRate, StakingPoolError> {
        self.authorize(Operation::Rebase, caller)?;
        let exchange_rate = ExchangeRate::compute(
            self.total_backing()?,
            self.token.total_supply(),
            BlockTimeHeight::from_env(),
        )?;
        self.exchange_rate = exchange_rate;
        log(Event::Rebased {
            underlying_per_lst: exchange_rate.underlying_per_lst(),
            lst_per_underlying: exchange_rate.lst_per_underlying(),
            total_backing: exchange_rate.total_backing(),
            lst_supply: exchange_rate.lst_supply(),
        });
        Ok(exchange_rate.into())
    }

    fn receive_transfer(
        &mut self,
        from: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<(), StakingPoolError> {
        log(Event::DirectTransferRejected {
            from: from.clone(),
            amount,
        });
        Err(StakingPoolError::DirectTransferRejected)
    }
}

impl<A, T: ReceiptToken, Z> StakingPool<A, T, Z> {
    /// validates the deposit, mints LST at the published exchange rate and adds the deposit to the
    /// pending delegation
    fn mint_deposit(
        &mut self,
        caller: &AccountId,
        amount: UnderlyingAmount,
    ) -> Result<LstAmount, StakingPoolError> {
        if amount.is_zero() {
            return Err(StakingPoolError::ZeroPayment);
        }
        let max_deposit = self.config.max_deposit();
        if amount > max_deposit {
            return Err(StakingPoolError::MaxDelegation {
                amount: amount.value(),
                max: max_deposit.value(),
            });
        }
        let minted = self.exchange_rate.underlying_to_lst(amount)?;
        if minted.is_zero() {
            return Err(StakingPoolError::ZeroAmount);
        }
        let supply = self.token.total_supply();
        let max_supply = self.config.max_lst_supply();
        match supply.checked_add(minted) {
            Some(total_supply) if total_supply <= max_supply => (),
            _ => {
                return Err(StakingPoolError::MaxSupply {
                    supply: supply.value(),
                    minted: minted.value(),
                    max: max_supply.value(),
                })
            }
        }
        let overflow = || StakingPoolError::ArithmeticOverflow;
        let underlying_balance = self.underlying_balance.checked_add(amount).ok_or_else(overflow)?;
        let pending_delegation = self.pending_delegation.checked_add(amount).ok_or_else(overflow)?;
        let total_deposited = self.total_deposited.checked_add(amount).ok_or_else(overflow)?;
        let delegated_total = self.delegated_total.checked_add(amount).ok_or_else(overflow)?;

        self.token.mint(caller, minted)?;

        self.underlying_balance = underlying_balance;
        self.pending_delegation = pending_delegation;
        self.total_deposited = total_deposited;
        self.delegated_total = delegated_total;
        Ok(minted)
    }
}
