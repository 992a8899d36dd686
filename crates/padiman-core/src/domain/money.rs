//! Naira amounts.
//!
//! Whole-naira, unsigned. A negative balance is unrepresentable, so the
//! "balance never goes below zero" rule is carried by the type and every
//! subtraction goes through `checked_sub`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Naira(u64);

impl Naira {
    pub const ZERO: Naira = Naira(0);

    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    pub const fn amount(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Naira) -> Option<Naira> {
        self.0.checked_add(rhs.0).map(Naira)
    }

    pub fn checked_sub(self, rhs: Naira) -> Option<Naira> {
        self.0.checked_sub(rhs.0).map(Naira)
    }

    /// `self - rhs`, or zero when `rhs` is larger.
    pub fn saturating_sub(self, rhs: Naira) -> Naira {
        Naira(self.0.saturating_sub(rhs.0))
    }

    /// Signed view used when replaying transaction logs.
    pub fn as_signed(self) -> i128 {
        i128::from(self.0)
    }
}

impl From<u64> for Naira {
    fn from(amount: u64) -> Self {
        Self(amount)
    }
}

impl Add for Naira {
    type Output = Naira;

    fn add(self, rhs: Naira) -> Naira {
        Naira(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Naira {
    fn add_assign(&mut self, rhs: Naira) {
        *self = *self + rhs;
    }
}

impl Sum for Naira {
    fn sum<I: Iterator<Item = Naira>>(iter: I) -> Naira {
        iter.fold(Naira::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Naira> for Naira {
    fn sum<I: Iterator<Item = &'a Naira>>(iter: I) -> Naira {
        iter.copied().sum()
    }
}

/// `₦10,000`
impl fmt::Display for Naira {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        write!(f, "₦{grouped}")
    }
}
