//! Core Types for lendmirror
//!
//! [`ScaledValue`] pairs an integer with its decimal scale so that a WAD
//! index can never be silently combined with a 6-decimal token amount.
//! The pool and position records below are rebuilt from ledger reads on
//! every refresh and never mutated in between.

use core::fmt;
use core::str::FromStr;
use std::io::{Read, Write};

use borsh::{BorshDeserialize, BorshSerialize};
use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{assets, scale};
use crate::errors::{MirrorError, MirrorResult};

// ============ Scale ============

/// Number of fractional decimal digits of a fixed-point value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Scale(u8);

impl Scale {
    /// 10^18
    pub const WAD: Scale = Scale(scale::WAD_DECIMALS);
    /// Oracle price scale
    pub const PRICE: Scale = Scale(scale::PRICE_DECIMALS);
    /// USD value scale
    pub const USD: Scale = Scale(scale::USD_DECIMALS);
    /// Health factor scale
    pub const HF: Scale = Scale(scale::HF_DECIMALS);

    /// Create a scale, rejecting anything a U256 cannot represent
    pub fn new(decimals: u8) -> MirrorResult<Self> {
        if decimals > scale::MAX_DECIMALS {
            return Err(MirrorError::ScaleOutOfRange { decimals: decimals as i32 });
        }
        Ok(Self(decimals))
    }

    pub(crate) fn from_signed(decimals: i32) -> MirrorResult<Self> {
        if decimals < 0 || decimals > scale::MAX_DECIMALS as i32 {
            return Err(MirrorError::ScaleOutOfRange { decimals });
        }
        Ok(Self(decimals as u8))
    }

    /// Number of decimals
    pub const fn decimals(self) -> u8 {
        self.0
    }

    /// 10^decimals
    pub fn unit(self) -> U256 {
        U256::exp10(self.0 as usize)
    }
}

impl TryFrom<u8> for Scale {
    type Error = MirrorError;

    fn try_from(decimals: u8) -> MirrorResult<Self> {
        Self::new(decimals)
    }
}

impl From<Scale> for u8 {
    fn from(scale: Scale) -> u8 {
        scale.0
    }
}

impl BorshSerialize for Scale {
    fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        BorshSerialize::serialize(&self.0, writer)
    }
}

impl BorshDeserialize for Scale {
    fn deserialize_reader<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let decimals = u8::deserialize_reader(reader)?;
        Scale::new(decimals)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1e{}", self.0)
    }
}

// ============ ScaledValue ============

/// Non-negative fixed-point amount with an explicit decimal scale
///
/// Equality compares both the integer and the scale. There is no
/// `PartialOrd`: ordering is only meaningful within one scale, see
/// [`ScaledValue::checked_cmp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "ScaledValueRepr", from = "ScaledValueRepr")]
pub struct ScaledValue {
    raw: U256,
    scale: Scale,
}

impl ScaledValue {
    /// Wrap a raw integer already expressed at `scale`
    pub const fn new(raw: U256, scale: Scale) -> Self {
        Self { raw, scale }
    }

    /// Wrap a raw `u128`
    pub fn from_raw_u128(raw: u128, scale: Scale) -> Self {
        Self::new(U256::from(raw), scale)
    }

    /// Zero at `scale`
    pub fn zero(scale: Scale) -> Self {
        Self::new(U256::zero(), scale)
    }

    /// 1.0 at `scale`
    pub fn one(scale: Scale) -> Self {
        Self::new(scale.unit(), scale)
    }

    /// `whole` units at `scale` (e.g. `from_whole(100, WAD)` == 100.0)
    pub fn from_whole(whole: u64, scale: Scale) -> MirrorResult<Self> {
        let raw = U256::from(whole)
            .checked_mul(scale.unit())
            .ok_or(MirrorError::Overflow)?;
        Ok(Self::new(raw, scale))
    }

    /// Underlying integer
    pub fn raw(&self) -> U256 {
        self.raw
    }

    /// Decimal scale
    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }
}

impl fmt::Display for ScaledValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::units::format_units(self))
    }
}

impl BorshSerialize for ScaledValue {
    fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut bytes = [0u8; 32];
        self.raw.to_little_endian(&mut bytes);
        writer.write_all(&bytes)?;
        BorshSerialize::serialize(&self.scale, writer)
    }
}

impl BorshDeserialize for ScaledValue {
    fn deserialize_reader<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let mut bytes = [0u8; 32];
        reader.read_exact(&mut bytes)?;
        let scale = Scale::deserialize_reader(reader)?;
        Ok(Self::new(U256::from_little_endian(&bytes), scale))
    }
}

/// Wire form: raw integer as a decimal string plus its scale
#[derive(Serialize, Deserialize)]
struct ScaledValueRepr {
    #[serde(with = "crate::units::dec_u256")]
    raw: U256,
    decimals: Scale,
}

impl From<ScaledValue> for ScaledValueRepr {
    fn from(value: ScaledValue) -> Self {
        Self { raw: value.raw, decimals: value.scale }
    }
}

impl From<ScaledValueRepr> for ScaledValue {
    fn from(repr: ScaledValueRepr) -> Self {
        Self::new(repr.raw, repr.decimals)
    }
}

// ============ Address ============

/// 20-byte account address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, BorshSerialize, BorshDeserialize)]
pub struct Address(pub [u8; 20]);

impl FromStr for Address {
    type Err = MirrorError;

    fn from_str(s: &str) -> MirrorResult<Self> {
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| MirrorError::InvalidAddress { input: s.to_string() })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <String as Deserialize>::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// ============ Pool Layout ============

/// Token decimals of the mirrored pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AssetDecimals {
    /// Collateral (underlying) token
    pub collateral: Scale,
    /// Collateral share token
    pub shares: Scale,
    /// Borrow token
    pub borrow: Scale,
}

impl Default for AssetDecimals {
    fn default() -> Self {
        Self {
            collateral: Scale(assets::COLLATERAL_DECIMALS),
            shares: Scale(assets::SHARE_DECIMALS),
            borrow: Scale(assets::BORROW_DECIMALS),
        }
    }
}

// ============ Ledger State ============

/// Pool-wide state as read from the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolState {
    /// Underlying collateral held by the pool (collateral decimals)
    pub total_collateral_underlying: ScaledValue,
    /// Collateral shares in circulation (share decimals)
    pub total_collateral_shares: ScaledValue,
    /// Outstanding borrows (borrow decimals)
    pub total_borrows: ScaledValue,
    /// Global borrow index (WAD)
    pub borrow_index: ScaledValue,
    /// Borrow-token balance held by the pool (borrow decimals)
    pub cash: ScaledValue,
    /// Liquidation threshold as a WAD fraction (0.8e18 == 80%)
    pub liquidation_threshold: ScaledValue,
}

/// One account's recorded position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct UserPosition {
    /// Collateral shares held (share decimals)
    pub share_balance: ScaledValue,
    /// Principal at the last interaction (borrow decimals)
    pub principal_borrow: ScaledValue,
    /// Borrow index recorded at the last interaction (WAD).
    /// Zero means "never recorded" and reads as the current global index.
    pub user_borrow_index: ScaledValue,
}

impl UserPosition {
    /// Position of an account that never interacted with the pool
    pub fn empty(decimals: &AssetDecimals) -> Self {
        Self {
            share_balance: ScaledValue::zero(decimals.shares),
            principal_borrow: ScaledValue::zero(decimals.borrow),
            user_borrow_index: ScaledValue::zero(Scale::WAD),
        }
    }
}

/// Output of the interest-rate model for the pool's (cash, borrows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct InterestSample {
    /// Borrow rate per second (WAD)
    pub rate_per_second: ScaledValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_bounds() {
        assert!(Scale::new(77).is_ok());
        assert_eq!(
            Scale::new(78),
            Err(MirrorError::ScaleOutOfRange { decimals: 78 })
        );
        assert_eq!(Scale::WAD.unit(), U256::from(1_000_000_000_000_000_000u64));
    }

    #[test]
    fn test_borsh_roundtrip_keeps_scale() {
        let value = ScaledValue::from_raw_u128(u128::MAX, Scale::new(6).unwrap());
        let bytes = borsh::to_vec(&value).unwrap();
        assert_eq!(bytes.len(), 33);
        let restored: ScaledValue = borsh::from_slice(&bytes).unwrap();
        assert_eq!(restored, value);
    }

    #[test]
    fn test_borsh_rejects_wide_scale() {
        let mut bytes = vec![0u8; 32];
        bytes.push(200);
        assert!(borsh::from_slice::<ScaledValue>(&bytes).is_err());
    }

    #[test]
    fn test_serde_carries_scale() {
        let value = ScaledValue::from_raw_u128(1_500_000, Scale::new(6).unwrap());
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"raw":"1500000","decimals":6}"#);
        let restored: ScaledValue = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, value);
    }

    #[test]
    fn test_address_parse_and_display() {
        let text = "0xb2feb95edfcd70cec44c418f91d80483eaa77167";
        let address: Address = text.parse().unwrap();
        assert_eq!(address.to_string(), text);
        assert_eq!("b2feb95edfcd70cec44c418f91d80483eaa77167".parse::<Address>().unwrap(), address);
        assert!("0x1234".parse::<Address>().is_err());
    }

    #[test]
    fn test_address_serde() {
        let address = Address([0xab; 20]);
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(20)));
        assert_eq!(serde_json::from_str::<Address>(&json).unwrap(), address);
        assert!(serde_json::from_str::<Address>("\"0xzz\"").is_err());
    }

    #[test]
    fn test_scale_borsh_is_one_byte() {
        assert_eq!(borsh::to_vec(&Scale::WAD).unwrap(), vec![18]);
        assert_eq!(borsh::from_slice::<Scale>(&[6]).unwrap(), Scale::new(6).unwrap());
        assert!(borsh::from_slice::<Scale>(&[78]).is_err());
    }

    #[test]
    fn test_empty_position() {
        let position = UserPosition::empty(&AssetDecimals::default());
        assert!(position.share_balance.is_zero());
        assert_eq!(position.principal_borrow.scale().decimals(), 6);
    }
}
