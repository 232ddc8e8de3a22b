//! structured events logged after every successful state change

use crate::config::Config;
use crate::domain::{BatchId, LedgerId, LstAmount, UnderlyingAmount};
use near_sdk::AccountId;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Deposited {
        account: AccountId,
        amount: UnderlyingAmount,
        minted: LstAmount,
    },
    Bootstrapped {
        account: AccountId,
        amount: UnderlyingAmount,
        minted: LstAmount,
    },
    WithdrawScheduled {
        account: AccountId,
        burned: LstAmount,
        amount: UnderlyingAmount,
        batch_id: BatchId,
        ticket: u64,
    },
    Claimed {
        account: AccountId,
        amount: UnderlyingAmount,
    },
    Rebased {
        underlying_per_lst: u128,
        lst_per_underlying: u128,
        total_backing: UnderlyingAmount,
        lst_supply: LstAmount,
    },
    DirectTransferRejected {
        from: AccountId,
        amount: UnderlyingAmount,
    },
    NettedOut {
        amount: UnderlyingAmount,
        pending_delegation: UnderlyingAmount,
        pending_undelegation: UnderlyingAmount,
    },
    MadeClaimable {
        amount: UnderlyingAmount,
        claims_credited: u32,
    },
    BatchSettled {
        batch_id: BatchId,
        payout: UnderlyingAmount,
    },
    UndelegationScheduled {
        ledger_id: LedgerId,
        agent: AccountId,
        amount: UnderlyingAmount,
        tickets: Vec<u64>,
    },
    UndelegationQueueProcessed {
        issued: u32,
        requeued: u32,
    },
    UndelegationsExecuted {
        executed: u32,
        requeued: u32,
        distributed: u32,
        released: UnderlyingAmount,
    },
    DelegationEnqueued {
        ledger_id: LedgerId,
        agent: AccountId,
        amount: UnderlyingAmount,
        ticket: u64,
    },
    DelegationQueueProcessed {
        delegated: u32,
        requeued: u32,
    },
    LedgerAdded {
        index: usize,
        ledger_id: LedgerId,
    },
    LedgerRemoved {
        index: usize,
        ledger_id: LedgerId,
        /// ledger that was moved into the removed ledger's index
        moved: Option<LedgerId>,
    },
    LedgerDeposit {
        ledger_id: LedgerId,
        amount: UnderlyingAmount,
    },
    LedgerWithdrawal {
        ledger_id: LedgerId,
        amount: UnderlyingAmount,
        in_liquidation: bool,
    },
    Delegated {
        ledger_id: LedgerId,
        agent: AccountId,
        amount: UnderlyingAmount,
        auto_compound: Option<u8>,
    },
    BondedMore {
        ledger_id: LedgerId,
        agent: AccountId,
        amount: UnderlyingAmount,
    },
    BondLessScheduled {
        ledger_id: LedgerId,
        agent: AccountId,
        amount: UnderlyingAmount,
    },
    RevokeScheduled {
        ledger_id: LedgerId,
        agent: AccountId,
    },
    RequestCancelled {
        ledger_id: LedgerId,
        agent: AccountId,
    },
    RequestExecuted {
        ledger_id: LedgerId,
        agent: AccountId,
        released: UnderlyingAmount,
    },
    LiquidationActivated,
    ConfigUpdated(Config),
}
