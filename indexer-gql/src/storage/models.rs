// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::fmt;
use std::str::FromStr;

use num::BigUint;
use serde::Serialize;
use serde::Serializer;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseHexError {
    #[error("must start with `0x`")]
    MissingPrefix,
    #[error("expected {expected} hex characters, found {found}")]
    InvalidLength { expected: usize, found: usize },
    #[error("must contain only hexadecimal characters")]
    InvalidCharacter,
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], ParseHexError> {
    let digits = s.strip_prefix("0x").ok_or(ParseHexError::MissingPrefix)?;
    if digits.len() != N * 2 {
        return Err(ParseHexError::InvalidLength { expected: N * 2, found: digits.len() });
    }
    let mut bytes = [0u8; N];
    hex::decode_to_slice(digits, &mut bytes).map_err(|_| ParseHexError::InvalidCharacter)?;
    Ok(bytes)
}

macro_rules! fixed_hex {
    ($name:ident, $len:expr) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Big-endian `value` in the low 8 bytes, zeroes elsewhere.
            pub fn from_low_u64(value: u64) -> Self {
                let mut bytes = [0u8; $len];
                bytes[$len - 8..].copy_from_slice(&value.to_be_bytes());
                Self(bytes)
            }
        }

        impl FromStr for $name {
            type Err = ParseHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_fixed::<$len>(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }
    };
}

fixed_hex!(Address, 20);
fixed_hex!(Hash, 32);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub number: u64,
    pub hash: Hash,
    pub parent_hash: Hash,
    /// Unix time in seconds.
    pub timestamp: u64,
    pub miner: Address,
    pub gas_used: u64,
    pub gas_limit: u64,
    pub transaction_count: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub hash: Hash,
    pub block_number: u64,
    pub index: u32,
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: BigUint,
    pub gas_used: u64,
    pub success: bool,
}

impl Transaction {
    pub fn touches(&self, address: &Address) -> bool {
        self.from == *address || self.to.as_ref() == Some(address)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceChange {
    pub address: Address,
    pub block_number: u64,
    pub transaction_hash: Option<Hash>,
    pub previous: BigUint,
    pub current: BigUint,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkStats {
    pub latest_height: u64,
    pub total_transactions: u64,
    pub total_addresses: u64,
    pub average_block_time_ms: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProposalStatus {
    Voting,
    Approved,
    Executed,
    Cancelled,
    Expired,
    Failed,
    Rejected,
    None,
}

impl ProposalStatus {
    pub const ALL: [ProposalStatus; 8] = [
        ProposalStatus::Voting,
        ProposalStatus::Approved,
        ProposalStatus::Executed,
        ProposalStatus::Cancelled,
        ProposalStatus::Expired,
        ProposalStatus::Failed,
        ProposalStatus::Rejected,
        ProposalStatus::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Voting => "VOTING",
            ProposalStatus::Approved => "APPROVED",
            ProposalStatus::Executed => "EXECUTED",
            ProposalStatus::Cancelled => "CANCELLED",
            ProposalStatus::Expired => "EXPIRED",
            ProposalStatus::Failed => "FAILED",
            ProposalStatus::Rejected => "REJECTED",
            ProposalStatus::None => "NONE",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown proposal status: {s}"))
    }
}

impl Serialize for ProposalStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proposal {
    pub id: u64,
    pub proposer: Address,
    pub status: ProposalStatus,
    pub description: String,
    pub created_at_block: u64,
    pub voting_ends_at_block: u64,
    pub votes_for: BigUint,
    pub votes_against: BigUint,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validator {
    pub address: Address,
    pub operator: Address,
    pub stake: BigUint,
    /// Commission in basis points.
    pub commission_bps: u32,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressStats {
    pub address: Address,
    pub transaction_count: u64,
    pub first_seen_block: Option<u64>,
    pub last_seen_block: Option<u64>,
}

/// Delegation record written by a set-code transaction: `authority` lets
/// its account execute the code of `target`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetCodeAuthorization {
    pub transaction_hash: Hash,
    pub block_number: u64,
    pub chain_id: u64,
    pub authority: Address,
    pub target: Address,
    pub nonce: u64,
    pub valid: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenHolder {
    pub token: Address,
    pub holder: Address,
    pub balance: BigUint,
    pub last_updated_block: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchedAddress {
    pub address: Address,
    pub label: Option<String>,
    /// Unix time in seconds.
    pub added_at: u64,
}

/// One page of a storage listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// `None` when the backend cannot count cheaply.
    pub total_count: Option<u64>,
}

impl<T> Page<T> {
    /// Cuts `offset / limit` out of a fully materialized listing.
    pub fn slice(items: Vec<T>, limit: usize, offset: usize) -> Self {
        let total_count = Some(items.len() as u64);
        let items = items.into_iter().skip(offset).take(limit).collect();
        Self { items, total_count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_round_trip_through_display() {
        let s = "0x00000000000000000000000000000000000000ff";
        let address: Address = s.parse().unwrap();
        assert_eq!(address.0[19], 0xff);
        assert_eq!(address.to_string(), s);

        let upper: Address = "0x00000000000000000000000000000000000000FF".parse().unwrap();
        assert_eq!(upper, address);
    }

    #[test]
    fn test_fixed_hex_requires_lowercase_prefix() {
        let digits = "00000000000000000000000000000000000000ff";
        assert_eq!(digits.parse::<Address>(), Err(ParseHexError::MissingPrefix));
        assert_eq!(format!("0X{digits}").parse::<Address>(), Err(ParseHexError::MissingPrefix));
        assert_eq!("ab".repeat(32).parse::<Hash>(), Err(ParseHexError::MissingPrefix));
    }

    #[test]
    fn test_fixed_hex_rejects_malformed_input() {
        assert_eq!(
            "0x1234".parse::<Address>(),
            Err(ParseHexError::InvalidLength { expected: 40, found: 4 })
        );
        assert_eq!(
            format!("0x{}", "zz".repeat(32)).parse::<Hash>(),
            Err(ParseHexError::InvalidCharacter)
        );
        assert!("0x<script>alert(1)</script>".parse::<Hash>().is_err());
    }

    #[test]
    fn test_proposal_status_names() {
        for status in ProposalStatus::ALL {
            assert_eq!(status.as_str().parse::<ProposalStatus>(), Ok(status));
        }
        assert!("voting".parse::<ProposalStatus>().is_err());
    }

    #[test]
    fn test_page_slice() {
        let page = Page::slice((0..10).collect::<Vec<_>>(), 3, 8);
        assert_eq!(page.items, vec![8, 9]);
        assert_eq!(page.total_count, Some(10));
    }
}
