//! Fixed-width instruction encoding for settlement legs.
//!
//! Every instruction is a `0x`-prefixed hex string of concatenated 32-byte
//! words: numeric values big-endian and zero-padded, booleans a single
//! trailing bit. Prices, amounts, and fees are packed at a fixed 10^18
//! scale to match the on-chain fixed-point representation.

use perpmatch_types::constants::SETTLEMENT_VALUE_SCALE;
use perpmatch_types::{Order, PerpmatchError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Hex characters per 32-byte instruction word.
pub const WORD_HEX_LEN: usize = 64;

/// Pack a non-negative decimal into one word at the settlement scale.
///
/// # Errors
/// Rejects negative values, values too large for the scaled range, and
/// values carrying more fractional digits than the scale can represent.
/// Silently truncating a price would settle a different trade than the one
/// matched.
pub fn scaled_word(value: Decimal) -> Result<String> {
    if value < Decimal::ZERO {
        return Err(PerpmatchError::Internal(format!(
            "cannot encode negative value {value} as settlement word"
        )));
    }
    let factor = Decimal::from(10u64.pow(SETTLEMENT_VALUE_SCALE));
    let scaled = value.checked_mul(factor).ok_or_else(|| {
        PerpmatchError::Internal(format!("value {value} out of settlement encoding range"))
    })?;
    if !scaled.fract().is_zero() {
        return Err(PerpmatchError::Internal(format!(
            "value {value} is finer than the settlement scale"
        )));
    }
    let units = scaled.to_u128().ok_or_else(|| {
        PerpmatchError::Internal(format!("value {value} out of settlement encoding range"))
    })?;
    Ok(format!("{units:064x}"))
}

fn bool_word(value: bool) -> String {
    format!("{:064x}", u8::from(value))
}

fn combine(words: &[String]) -> String {
    format!("0x{}", words.concat())
}

/// Instruction for the orders module: fill `amount` of `order` at `price`.
///
/// Layout: `orderHash ‖ amount ‖ price ‖ |fee| ‖ flags`, where flags bit 0
/// is the order's buy side, bit 1 the fee sign, bit 2 decrease-only.
///
/// # Errors
/// Propagates [`scaled_word`] range failures.
pub fn encode_fill(order: &Order, amount: Decimal, price: Decimal, fee: Decimal) -> Result<String> {
    let flags = u8::from(order.side.is_buy())
        | u8::from(fee < Decimal::ZERO) << 1
        | u8::from(order.is_decrease_only) << 2;
    Ok(combine(&[
        hex::encode(order.hash().as_bytes()),
        scaled_word(amount)?,
        scaled_word(price)?,
        scaled_word(fee.abs())?,
        format!("{flags:064x}"),
    ]))
}

/// Instruction for the liquidation module.
///
/// # Errors
/// Propagates [`scaled_word`] range failures.
pub fn encode_liquidate(amount: Decimal, is_buy: bool, all_or_nothing: bool) -> Result<String> {
    close_instruction(amount, is_buy, all_or_nothing)
}

/// Instruction for the deleveraging module. Same layout as liquidation;
/// the target module address tells them apart.
///
/// # Errors
/// Propagates [`scaled_word`] range failures.
pub fn encode_deleverage(amount: Decimal, is_buy: bool, all_or_nothing: bool) -> Result<String> {
    close_instruction(amount, is_buy, all_or_nothing)
}

fn close_instruction(amount: Decimal, is_buy: bool, all_or_nothing: bool) -> Result<String> {
    Ok(combine(&[
        scaled_word(amount)?,
        bool_word(is_buy),
        bool_word(all_or_nothing),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use perpmatch_types::Side;

    #[test]
    fn scaled_word_packs_at_fixed_scale() {
        // 2.5 at scale 18 = 2_500_000_000_000_000_000 = 0x22b1c8c1227a0000
        let word = scaled_word(Decimal::new(25, 1)).unwrap();
        assert_eq!(word.len(), WORD_HEX_LEN);
        assert_eq!(word, format!("{:0>64x}", 2_500_000_000_000_000_000u128));
    }

    #[test]
    fn scaled_word_rejects_negative_and_too_fine() {
        assert!(scaled_word(Decimal::new(-1, 0)).is_err());
        // 1e-19 cannot be represented in 10^18 fixed point
        assert!(scaled_word(Decimal::new(1, 19)).is_err());
    }

    #[test]
    fn fill_instruction_layout() {
        let order = Order::dummy_limit(Side::Buy, Decimal::new(100, 0), Decimal::new(3, 0));
        let data = encode_fill(&order, Decimal::new(3, 0), Decimal::new(100, 0), Decimal::ZERO)
            .unwrap();

        assert_eq!(data.len(), 2 + 5 * WORD_HEX_LEN);
        assert!(data.starts_with("0x"));
        let words: Vec<&str> = data[2..]
            .as_bytes()
            .chunks(WORD_HEX_LEN)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect();
        assert_eq!(words[0], hex::encode(order.hash().as_bytes()));
        assert_eq!(words[1], scaled_word(Decimal::new(3, 0)).unwrap());
        assert_eq!(words[2], scaled_word(Decimal::new(100, 0)).unwrap());
        // buy flag only
        assert!(words[4].ends_with('1'));
    }

    #[test]
    fn fill_flags_carry_fee_sign_and_decrease_only() {
        let mut order = Order::dummy_limit(Side::Sell, Decimal::new(100, 0), Decimal::ONE);
        order.is_decrease_only = true;
        let data =
            encode_fill(&order, Decimal::ONE, Decimal::new(100, 0), Decimal::new(-5, 4)).unwrap();
        // sell (bit0=0), negative fee (bit1), decrease-only (bit2) -> 0b110
        assert!(data.ends_with('6'));
        // fee word holds the magnitude
        let fee_word = &data[2 + 3 * WORD_HEX_LEN..2 + 4 * WORD_HEX_LEN];
        assert_eq!(fee_word, scaled_word(Decimal::new(5, 4)).unwrap());
    }

    #[test]
    fn close_instruction_layout() {
        let data = encode_liquidate(Decimal::new(7, 0), true, false).unwrap();
        assert_eq!(data.len(), 2 + 3 * WORD_HEX_LEN);
        let amount_word = &data[2..2 + WORD_HEX_LEN];
        assert_eq!(amount_word, scaled_word(Decimal::new(7, 0)).unwrap());
        let is_buy_word = &data[2 + WORD_HEX_LEN..2 + 2 * WORD_HEX_LEN];
        assert!(is_buy_word.ends_with('1'));
        assert!(data.ends_with('0'));
    }

    #[test]
    fn liquidate_and_deleverage_share_a_layout() {
        let a = encode_liquidate(Decimal::ONE, false, true).unwrap();
        let b = encode_deleverage(Decimal::ONE, false, true).unwrap();
        assert_eq!(a, b);
    }
}
