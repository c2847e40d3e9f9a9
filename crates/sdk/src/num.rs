use alloy::primitives::{I256, U256};
use fastnum::D128;

use crate::error::SdkError;

/// Converter of on-chain fixed-point integers to normalized decimals.
///
/// The vault and its tokens store amounts as integers scaled by a per-token
/// number of decimals; all SDK surfaces expose normalized [`D128`] values.
#[derive(Clone, Copy, Debug)]
pub struct Converter {
    scale: D128,
}

impl Converter {
    pub fn new(decimals: u8) -> Self {
        let mut scale = D128::ONE;
        for _ in 0..decimals {
            scale *= D128::from(10u32);
        }
        Self { scale }
    }

    /// Fails with [`SdkError::InvalidDecimal`] when the raw amount does not
    /// fit a 128-bit decimal.
    pub fn from_unsigned(&self, value: U256) -> Result<D128, SdkError> {
        Ok(to_decimal(value)? / self.scale)
    }

    pub fn from_signed(&self, value: I256) -> Result<D128, SdkError> {
        let abs = to_decimal(value.unsigned_abs())? / self.scale;
        Ok(if value.is_negative() { -abs } else { abs })
    }

    pub fn from_u64(&self, value: u64) -> D128 { D128::from(value) / self.scale }
}

fn to_decimal(value: U256) -> Result<D128, SdkError> {
    let raw = u128::try_from(value).map_err(|_| SdkError::InvalidDecimal(value.to_string()))?;
    D128::try_from(raw).map_err(|_| SdkError::InvalidDecimal(value.to_string()))
}

#[cfg(test)]
mod tests {
    use fastnum::dec128;

    use super::*;

    #[test]
    fn test_unsigned_scaling() {
        let c = Converter::new(6);
        assert_eq!(c.from_unsigned(U256::from(1_500_000u64)).unwrap(), dec128!(1.5));
        assert_eq!(c.from_unsigned(U256::ZERO).unwrap(), D128::ZERO);
    }

    #[test]
    fn test_signed_scaling() {
        let c = Converter::new(2);
        assert_eq!(
            c.from_signed(I256::try_from(-12345i64).unwrap()).unwrap(),
            dec128!(-123.45)
        );
        assert_eq!(c.from_signed(I256::try_from(100i64).unwrap()).unwrap(), dec128!(1));
    }

    #[test]
    fn test_zero_decimals() {
        let c = Converter::new(0);
        assert_eq!(c.from_u64(7), dec128!(7));
    }

    #[test]
    fn test_oversized_amount_is_rejected() {
        let c = Converter::new(18);
        let result = c.from_unsigned(U256::MAX);
        assert!(matches!(result, Err(SdkError::InvalidDecimal(_))));
    }
}
