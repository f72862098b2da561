use std::{fmt::Display, ops::Deref};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

/// Whole percentage, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Percentage(u8);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl Percentage {
    pub const ZERO: Percentage = Percentage(0);
    pub const FULL: Percentage = Percentage(100);

    pub fn new_opt(value: u8) -> Option<Percentage> {
        if value > 100 {
            None
        } else {
            Some(Percentage(value))
        }
    }

    /// Rounds `value` half away from zero and clamps it into range. NaN maps to zero.
    pub fn from_f64_clamped(value: f64) -> Percentage {
        if value.is_nan() {
            return Percentage::ZERO;
        }
        Percentage(value.clamp(0., 100.).round() as u8)
    }
}

impl TryFrom<u8> for Percentage {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Percentage::new_opt(value).ok_or_else(|| anyhow!("{value} is not a valid percentage"))
    }
}

impl From<Percentage> for u8 {
    fn from(value: Percentage) -> Self {
        value.0
    }
}

impl Deref for Percentage {
    type Target = u8;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
