//! Equality predicates over the value sets that define a proved transaction.
//!
//! Lists are compared as multisets: order carries no meaning, duplicates must
//! appear the same number of times on both sides. An absent optional list is
//! equal to an empty one.

use std::collections::HashMap;
use std::hash::Hash;

use super::token::{NftAmountRecipient, TokenAmount, TokenAmountRecipient};

/// Order-independent equality with multiplicity.
pub fn multiset_eq<T: Eq + Hash>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut counts: HashMap<&T, isize> = HashMap::with_capacity(a.len());
    for item in a {
        *counts.entry(item).or_default() += 1;
    }
    for item in b {
        match counts.get_mut(item) {
            Some(count) if *count > 0 => *count -= 1,
            _ => return false,
        }
    }
    true
}

/// Multiset equality where `None` stands for an empty list.
pub fn optional_multiset_eq<T: Eq + Hash>(a: Option<&[T]>, b: Option<&[T]>) -> bool {
    multiset_eq(a.unwrap_or_default(), b.unwrap_or_default())
}

pub fn compare_token_amount_recipients(
    a: &[TokenAmountRecipient],
    b: &[TokenAmountRecipient],
) -> bool {
    multiset_eq(a, b)
}

pub fn compare_nft_amount_recipients(a: &[NftAmountRecipient], b: &[NftAmountRecipient]) -> bool {
    multiset_eq(a, b)
}

pub fn compare_token_amounts(a: Option<&[TokenAmount]>, b: Option<&[TokenAmount]>) -> bool {
    optional_multiset_eq(a, b)
}

pub fn compare_strings(a: Option<&[String]>, b: Option<&[String]>) -> bool {
    optional_multiset_eq(a, b)
}

/// Both absent, or both present and equal.
pub fn compare_token_amount_recipient(
    a: Option<&TokenAmountRecipient>,
    b: Option<&TokenAmountRecipient>,
) -> bool {
    a == b
}
