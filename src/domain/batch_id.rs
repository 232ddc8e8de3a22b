use near_sdk::borsh::{BorshDeserialize, BorshSerialize};
use std::fmt::{self, Display, Formatter};

/// withdrawal batch sequence number
#[derive(
    BorshSerialize,
    BorshDeserialize,
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Default,
    Hash,
)]
#[borsh(crate = "near_sdk::borsh")]
pub struct BatchId(pub u64);

impl From<u64> for BatchId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl BatchId {
    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for BatchId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn batch_id_sequence() {
        let batch_id = BatchId::default();
        assert_eq!(batch_id.next(), BatchId(1));
        assert_eq!(batch_id.next().next().value(), 2);
    }
}
