//! defines the interfaces that the pool exposes externally, and the collaborators it depends on

mod authorizer;
mod ledger_management;
mod model;
mod operator;
mod receipt_token;
mod staking_agent;
mod staking_service;

pub use authorizer::*;
pub use ledger_management::*;
pub use model::*;
pub use operator::*;
pub use receipt_token::*;
pub use staking_agent::*;
pub use staking_service::*;
