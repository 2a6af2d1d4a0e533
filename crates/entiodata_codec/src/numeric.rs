//! Numeric promotion.
//!
//! Integral values widen to `i64`, integers meeting decimals widen to
//! [`Decimal`], and anything meeting a float widens to `f64`.

use crate::value::Value;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// A numeric value in its promotion family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    /// Any integral type.
    Integer(i64),
    /// Exact decimal.
    Decimal(Decimal),
    /// Single or double precision float.
    Float(f64),
}

impl Numeric {
    fn rank(&self) -> u8 {
        match self {
            Numeric::Integer(_) => 0,
            Numeric::Decimal(_) => 1,
            Numeric::Float(_) => 2,
        }
    }

    fn widen_to(self, rank: u8) -> Numeric {
        match (self, rank) {
            (Numeric::Integer(n), 1) => Numeric::Decimal(Decimal::from(n)),
            #[allow(clippy::cast_precision_loss)]
            (Numeric::Integer(n), 2) => Numeric::Float(n as f64),
            (Numeric::Decimal(d), 2) => Numeric::Float(d.to_f64().unwrap_or(f64::NAN)),
            (other, _) => other,
        }
    }

    /// Widen both operands to their common family.
    pub fn promote(lhs: Numeric, rhs: Numeric) -> (Numeric, Numeric) {
        let rank = lhs.rank().max(rhs.rank());
        (lhs.widen_to(rank), rhs.widen_to(rank))
    }

    /// Compare after promotion.
    ///
    /// NaN equals NaN and orders after every other float; `-0.0` equals
    /// `0.0`.
    pub fn compare(&self, other: &Numeric) -> Ordering {
        match Numeric::promote(*self, *other) {
            (Numeric::Integer(a), Numeric::Integer(b)) => a.cmp(&b),
            (Numeric::Decimal(a), Numeric::Decimal(b)) => a.cmp(&b),
            (Numeric::Float(a), Numeric::Float(b)) => a
                .partial_cmp(&b)
                .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan())),
            // promote always yields a common family
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    /// Apply a checked binary operation after promotion.
    ///
    /// Returns `None` on overflow or division by zero in the integer and
    /// decimal families; floats follow IEEE semantics.
    pub fn checked_apply(self, other: Numeric, op: ArithmeticOp) -> Option<Numeric> {
        match Numeric::promote(self, other) {
            (Numeric::Integer(a), Numeric::Integer(b)) => (match op {
                ArithmeticOp::Add => a.checked_add(b),
                ArithmeticOp::Sub => a.checked_sub(b),
                ArithmeticOp::Mul => a.checked_mul(b),
                ArithmeticOp::Div => a.checked_div(b),
                ArithmeticOp::Mod => a.checked_rem(b),
            })
            .map(Numeric::Integer),
            (Numeric::Decimal(a), Numeric::Decimal(b)) => (match op {
                ArithmeticOp::Add => a.checked_add(b),
                ArithmeticOp::Sub => a.checked_sub(b),
                ArithmeticOp::Mul => a.checked_mul(b),
                ArithmeticOp::Div => a.checked_div(b),
                ArithmeticOp::Mod => a.checked_rem(b),
            })
            .map(Numeric::Decimal),
            (Numeric::Float(a), Numeric::Float(b)) => Some(Numeric::Float(match op {
                ArithmeticOp::Add => a + b,
                ArithmeticOp::Sub => a - b,
                ArithmeticOp::Mul => a * b,
                ArithmeticOp::Div => a / b,
                ArithmeticOp::Mod => a % b,
            })),
            _ => None,
        }
    }

    /// Negate, checking for overflow.
    pub fn checked_neg(self) -> Option<Numeric> {
        match self {
            Numeric::Integer(n) => n.checked_neg().map(Numeric::Integer),
            Numeric::Decimal(d) => Some(Numeric::Decimal(-d)),
            Numeric::Float(f) => Some(Numeric::Float(-f)),
        }
    }

    /// Convert back to a [`Value`].
    ///
    /// Integers narrow to `Int32` when `narrow` is set and the result fits.
    pub fn into_value(self, narrow: bool) -> Value {
        match self {
            Numeric::Integer(n) if narrow => {
                i32::try_from(n).map_or(Value::Int64(n), Value::Int32)
            }
            Numeric::Integer(n) => Value::Int64(n),
            Numeric::Decimal(d) => Value::Decimal(d),
            Numeric::Float(f) => Value::Double(f),
        }
    }

    /// Build a decimal from a float, if representable.
    pub fn decimal_from_f64(f: f64) -> Option<Decimal> {
        Decimal::from_f64(f)
    }
}

/// Arithmetic operators subject to numeric promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Remainder.
    Mod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_meets_decimal() {
        let (a, b) = Numeric::promote(Numeric::Integer(3), Numeric::Decimal(Decimal::new(15, 1)));
        assert_eq!(a, Numeric::Decimal(Decimal::from(3)));
        assert_eq!(b, Numeric::Decimal(Decimal::new(15, 1)));
    }

    #[test]
    fn nan_orders_last() {
        let nan = Numeric::Float(f64::NAN);
        assert_eq!(nan.compare(&Numeric::Float(1.0)), Ordering::Greater);
        assert_eq!(Numeric::Integer(i64::MAX).compare(&nan), Ordering::Less);
        assert_eq!(nan.compare(&nan), Ordering::Equal);
        assert_eq!(Numeric::Float(-0.0).compare(&Numeric::Float(0.0)), Ordering::Equal);
    }

    #[test]
    fn checked_arithmetic() {
        assert_eq!(
            Numeric::Integer(7).checked_apply(Numeric::Integer(2), ArithmeticOp::Mod),
            Some(Numeric::Integer(1))
        );
        assert_eq!(
            Numeric::Integer(1).checked_apply(Numeric::Integer(0), ArithmeticOp::Div),
            None
        );
        assert_eq!(
            Numeric::Integer(i64::MAX).checked_apply(Numeric::Integer(1), ArithmeticOp::Add),
            None
        );
        assert_eq!(
            Numeric::Decimal(Decimal::new(255, 1))
                .checked_apply(Numeric::Integer(2), ArithmeticOp::Mul),
            Some(Numeric::Decimal(Decimal::new(510, 1)))
        );
    }

    #[test]
    fn narrowing() {
        assert_eq!(Numeric::Integer(5).into_value(true), Value::Int32(5));
        assert_eq!(Numeric::Integer(5).into_value(false), Value::Int64(5));
        assert_eq!(
            Numeric::Integer(i64::from(i32::MAX) + 1).into_value(true),
            Value::Int64(i64::from(i32::MAX) + 1)
        );
    }
}
