//! Exact fixed-point slashing rate.

use std::{fmt, str::FromStr};

use bitcoin::Amount;
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::errors::SlashingRateError;

/// Number of decimal places carried by [`SlashingRate`].
pub const PRECISION: usize = 18;

/// `1.0` in the fixed-point representation.
const ONE: u128 = 10u128.pow(PRECISION as u32);

/// Granularity enforced on slashing rates: two decimal places.
const STEP: u128 = 10u128.pow(PRECISION as u32 - 2);

/// Fraction of the staking output that must be slashed.
///
/// The rate is stored as an unsigned integer scaled by `10^18` so that the minimum slashing amount
/// can be computed without any loss of precision. A valid rate lies strictly between `0` and `1`
/// and has at most two decimal places.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct SlashingRate(u128);

impl SlashingRate {
    /// Creates a rate from its scaled representation (`rate * 10^18`).
    pub fn from_scaled(scaled: u128) -> Result<Self, SlashingRateError> {
        if scaled == 0 || scaled >= ONE {
            return Err(SlashingRateError::OutOfRange(format_scaled(scaled)));
        }

        if scaled % STEP != 0 {
            return Err(SlashingRateError::TooManyDecimalPlaces(format_scaled(scaled)));
        }

        Ok(Self(scaled))
    }

    /// Creates a rate from a whole number of percent.
    pub fn from_percent(percent: u8) -> Result<Self, SlashingRateError> {
        Self::from_scaled(percent as u128 * STEP)
    }

    /// Returns the scaled representation (`rate * 10^18`).
    pub const fn scaled(&self) -> u128 {
        self.0
    }

    /// Returns the smallest amount that satisfies `amount >= staking_value * rate`.
    ///
    /// The product is computed exactly and rounded up, so any amount below the returned value
    /// slashes strictly less than the required fraction.
    pub fn min_slashing_amount(&self, staking_value: Amount) -> Amount {
        // cannot overflow: u64::MAX * 10^18 < u128::MAX
        let product = staking_value.to_sat() as u128 * self.0;
        let min = product.div_ceil(ONE);

        // `min <= staking_value` since the rate is below one
        Amount::from_sat(min as u64)
    }
}

fn format_scaled(scaled: u128) -> String {
    let int = scaled / ONE;
    let frac = scaled % ONE;

    if frac == 0 {
        return int.to_string();
    }

    let frac = format!("{frac:0width$}", width = PRECISION);
    format!("{int}.{}", frac.trim_end_matches('0'))
}

impl fmt::Display for SlashingRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_scaled(self.0))
    }
}

impl FromStr for SlashingRate {
    type Err = SlashingRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SlashingRateError::InvalidDecimal(s.to_string());

        let (int_part, frac_part) = match s.split_once('.') {
            Some((_, frac)) if frac.is_empty() => return Err(invalid()),
            Some((int, frac)) => (int, frac),
            None => (s, ""),
        };

        let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty()) || !is_digits(int_part) || !is_digits(frac_part)
        {
            return Err(invalid());
        }

        if frac_part.len() > PRECISION {
            return Err(SlashingRateError::TooPrecise(frac_part.len()));
        }

        let int: u128 = match int_part {
            "" => 0,
            digits => digits.parse().map_err(|_| invalid())?,
        };
        let frac: u128 = match frac_part {
            "" => 0,
            digits => digits.parse().map_err(|_| invalid())?,
        };
        let frac = frac * 10u128.pow((PRECISION - frac_part.len()) as u32);

        let scaled = int
            .checked_mul(ONE)
            .and_then(|int| int.checked_add(frac))
            .ok_or_else(invalid)?;

        Self::from_scaled(scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let rate: SlashingRate = "0.1".parse().unwrap();
        assert_eq!(rate.scaled(), ONE / 10);
        assert_eq!(rate.to_string(), "0.1");

        let rate: SlashingRate = ".25".parse().unwrap();
        assert_eq!(rate, SlashingRate::from_percent(25).unwrap());
        assert_eq!(rate.to_string(), "0.25");

        let rate: SlashingRate = "0.500000".parse().unwrap();
        assert_eq!(rate.to_string(), "0.5");
    }

    #[test]
    fn rejects_invalid_rates() {
        for bad in ["", ".", "1.", "abc", "0.1.2", "-0.1", "0,1"] {
            assert!(
                matches!(
                    bad.parse::<SlashingRate>(),
                    Err(SlashingRateError::InvalidDecimal(_))
                ),
                "{bad:?} must not parse"
            );
        }

        assert!(matches!(
            "0".parse::<SlashingRate>(),
            Err(SlashingRateError::OutOfRange(_))
        ));
        assert!(matches!(
            "1".parse::<SlashingRate>(),
            Err(SlashingRateError::OutOfRange(_))
        ));
        assert!(matches!(
            "1.5".parse::<SlashingRate>(),
            Err(SlashingRateError::OutOfRange(_))
        ));
        assert!(matches!(
            "0.125".parse::<SlashingRate>(),
            Err(SlashingRateError::TooManyDecimalPlaces(_))
        ));
        assert!(matches!(
            "0.1000000000000000001".parse::<SlashingRate>(),
            Err(SlashingRateError::TooPrecise(19))
        ));
    }

    #[test]
    fn min_slashing_amount_rounds_up() {
        let rate = SlashingRate::from_percent(10).unwrap();

        assert_eq!(
            rate.min_slashing_amount(Amount::from_sat(50_000)),
            Amount::from_sat(5_000)
        );
        // 10% of 50_001 is 5_000.1, so 5_000 sats would slash too little
        assert_eq!(
            rate.min_slashing_amount(Amount::from_sat(50_001)),
            Amount::from_sat(5_001)
        );

        let rate = SlashingRate::from_percent(99).unwrap();
        assert_eq!(
            rate.min_slashing_amount(Amount::MAX_MONEY),
            Amount::from_sat(Amount::MAX_MONEY.to_sat() / 100 * 99)
        );
    }

    #[test]
    fn serde_as_string() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Wrapper {
            rate: SlashingRate,
        }

        let wrapper: Wrapper = toml::from_str(r#"rate = "0.1""#).unwrap();
        assert_eq!(wrapper.rate, SlashingRate::from_percent(10).unwrap());

        let serialized = toml::to_string(&wrapper).unwrap();
        assert_eq!(serialized.trim(), r#"rate = "0.1""#);
    }
}
