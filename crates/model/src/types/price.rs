// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Represents a USD price for one display unit of a currency.

use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

use alloy_primitives::{I256, U256};
use prism_core::correctness::FAILED;
use serde::{Deserialize, Deserializer, Serialize};

use super::fixed::{
    USD_PRECISION, f64_to_fixed_i256, fixed_i256_to_f64, format_fixed_i256, mul_div_i256,
    parse_fixed_i256, pow10_i256,
};

/// Represents a USD price for one display unit of a currency.
///
/// The raw value is scaled by `10^USD_PRECISION`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UsdPrice {
    /// The raw fixed-point price at [`USD_PRECISION`].
    pub raw: I256,
}

impl UsdPrice {
    /// Creates a new [`UsdPrice`] instance with correctness checking.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not finite or is negative.
    pub fn new_checked(value: f64) -> anyhow::Result<Self> {
        let raw = f64_to_fixed_i256(value, USD_PRECISION)?;
        Self::from_raw_checked(raw)
    }

    /// Creates a new [`UsdPrice`] instance.
    ///
    /// # Panics
    ///
    /// Panics if a correctness check fails. See [`UsdPrice::new_checked`] for more details.
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self::new_checked(value).expect(FAILED)
    }

    /// Creates a new [`UsdPrice`] from a raw fixed-point value at [`USD_PRECISION`].
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is negative.
    pub fn from_raw_checked(raw: I256) -> anyhow::Result<Self> {
        if raw.is_negative() {
            anyhow::bail!(
                "invalid `UsdPrice` negative, was {}",
                format_fixed_i256(raw, USD_PRECISION)
            );
        }
        Ok(Self { raw })
    }

    /// Returns a zero price.
    #[must_use]
    pub const fn zero() -> Self {
        Self { raw: I256::ZERO }
    }

    /// Returns a price of exactly one dollar.
    #[must_use]
    pub fn one() -> Self {
        Self {
            raw: I256::from_raw(U256::from(10u64).pow(U256::from(USD_PRECISION))),
        }
    }

    /// Returns true if the price is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// Returns the value of this instance as an `f64`.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        fixed_i256_to_f64(self.raw, USD_PRECISION)
    }

    /// Returns the price multiplied by `factor`, used to derive USD prices from ETH prices.
    ///
    /// Returns `None` on overflow.
    #[must_use]
    pub fn checked_mul(&self, factor: &Self) -> Option<Self> {
        let scale = pow10_i256(USD_PRECISION)?;
        let raw = mul_div_i256(self.raw, factor.raw, scale)?;
        Some(Self { raw })
    }
}

impl Default for UsdPrice {
    fn default() -> Self {
        Self::zero()
    }
}

impl FromStr for UsdPrice {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let raw = parse_fixed_i256(value, USD_PRECISION)?;
        Self::from_raw_checked(raw)
    }
}

impl Debug for UsdPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", stringify!(UsdPrice), self)
    }
}

impl Display for UsdPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_fixed_i256(self.raw, USD_PRECISION))
    }
}

impl Serialize for UsdPrice {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for UsdPrice {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let price_str: String = Deserialize::deserialize(deserializer)?;
        Self::from_str(&price_str).map_err(serde::de::Error::custom)
    }
}
