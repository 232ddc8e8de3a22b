//! defines the internal domain model used to implement the business logic
//!
//! NOTE: the domain model is separate from the interface model. That being said, the interface model
//! closely mirrors the domain model.

mod batch_id;
mod block_time_height;
mod bounded_queue;
mod delegation_request;
mod exchange_rate;
mod ledger;
mod lst_amount;
mod percent;
mod undelegation_request;
mod underlying_amount;
mod unstake_batch;
mod withdrawal_claim;

pub use batch_id::BatchId;
pub use block_time_height::BlockTimeHeight;
pub use bounded_queue::{BoundedQueue, Disposition, QueueEntry, QueueRun, StalledEntry};
pub use delegation_request::DelegationRequest;
pub use exchange_rate::ExchangeRate;
pub use ledger::{DelegationState, Ledger, LedgerId, PendingRequest, RequestKind, RequestOrigin};
pub use lst_amount::LstAmount;
pub use percent::Percent;
pub use undelegation_request::{IssuedUndelegation, UndelegationRequest};
pub use underlying_amount::UnderlyingAmount;
pub use unstake_batch::{Settlement, UnstakeBatch};
pub use withdrawal_claim::WithdrawalClaim;
