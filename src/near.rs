use near_sdk::env;
use std::fmt::Debug;

/// fixed point unit used to express exchange rates, i.e., 10^18
pub const UNIT: u128 = 1_000_000_000_000_000_000;

/// wrapper around `near_sdk::env::log_str()` which supports structured logging
///
/// NOTE: the runtime caps the total log length per transaction
pub fn log<T: Debug>(event: T) {
    env::log_str(&format!("{:#?}", event));
}
