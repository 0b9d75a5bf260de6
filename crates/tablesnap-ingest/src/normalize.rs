//! Numeric normalization
//!
//! DynamoDB numbers are arbitrary-precision decimals. Before records are
//! encoded every decimal leaf becomes an integer when its fractional part is
//! zero and a 64-bit float otherwise. Everything else is left as-is.

use bigdecimal::{BigDecimal, ToPrimitive};
use tracing::warn;

use crate::value::{Record, Value};

/// Rewrite every decimal leaf in `value`, recursing through lists and maps
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Decimal(d) => normalize_decimal(&d),
        Value::List(items) => Value::List(items.into_iter().map(normalize).collect()),
        Value::Map(record) => Value::Map(normalize_record(record)),
        other => other,
    }
}

/// Normalize every attribute of a record; attribute names are unchanged
pub fn normalize_record(record: Record) -> Record {
    record
        .into_iter()
        .map(|(name, value)| (name, normalize(value)))
        .collect()
}

/// Integral decimals keep every digit; those outside the `i128` range become
/// [`Value::BigInt`].
pub fn normalize_decimal(d: &BigDecimal) -> Value {
    if d.is_integer() {
        return match d.to_i128() {
            Some(i) => Value::Int(i),
            None => Value::BigInt(d.with_scale(0).into_bigint_and_exponent().0),
        };
    }

    match d.to_f64().or_else(|| d.to_string().parse::<f64>().ok()) {
        Some(float) => Value::Float(float),
        None => {
            warn!(number = %d, "Decimal has no float form, keeping it as text");
            Value::Decimal(d.clone())
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use bigdecimal::num_bigint::BigInt;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Value {
        Value::Decimal(BigDecimal::from_str(s).unwrap())
    }

    #[test]
    fn test_integral_decimals_become_ints() {
        assert_eq!(normalize(dec("1")), Value::Int(1));
        assert_eq!(normalize(dec("1.000")), Value::Int(1));
        assert_eq!(normalize(dec("-42")), Value::Int(-42));
        assert_eq!(normalize(dec("0")), Value::Int(0));
        assert_eq!(normalize(dec("1E+3")), Value::Int(1000));
    }

    #[test]
    fn test_fractional_decimals_become_floats() {
        assert_eq!(normalize(dec("12.5")), Value::Float(12.5));
        assert_eq!(normalize(dec("-0.25")), Value::Float(-0.25));
    }

    #[test]
    fn test_38_digit_integer_stays_exact() {
        let digits = "12345678901234567890123456789012345678";
        assert_eq!(
            normalize(dec(digits)),
            Value::Int(i128::from_str(digits).unwrap())
        );
    }

    #[test]
    fn test_integer_beyond_i128_stays_exact() {
        let expected = BigInt::from_str(&format!("1{}", "0".repeat(40))).unwrap();
        assert_eq!(normalize(dec("1E+40")), Value::BigInt(expected));

        let shifted = "12345678901234567890123456789012345678";
        assert_eq!(
            normalize(dec(&format!("{shifted}E+5"))),
            Value::BigInt(BigInt::from_str(&format!("{shifted}00000")).unwrap())
        );

        assert_eq!(
            normalize(dec("-1E+125")),
            Value::BigInt(BigInt::from_str(&format!("-1{}", "0".repeat(125))).unwrap())
        );
    }

    #[test]
    fn test_i128_boundary() {
        let max = i128::MAX.to_string();
        assert_eq!(normalize(dec(&max)), Value::Int(i128::MAX));

        let past_max = (BigInt::from(i128::MAX) + 1i32).to_string();
        assert_eq!(
            normalize(dec(&past_max)),
            Value::BigInt(BigInt::from_str(&past_max).unwrap())
        );
    }

    #[test]
    fn test_non_decimal_values_pass_through() {
        for value in [
            Value::Null,
            Value::Bool(true),
            Value::from("12.5"),
            Value::Binary(vec![1, 2, 3]),
            Value::Int(7),
            Value::Float(0.1),
        ] {
            assert_eq!(normalize(value.clone()), value);
        }
    }

    #[test]
    fn test_nested_structures_are_rewritten() {
        let mut inner = Record::new();
        inner.insert("cantidad".into(), dec("2"));
        inner.insert("precio".into(), dec("9.90"));

        let mut record = Record::new();
        record.insert("pedido_id".into(), Value::from("PED-1"));
        record.insert("items".into(), Value::List(vec![Value::Map(inner), dec("3")]));

        let normalized = normalize_record(record);

        let Value::List(items) = &normalized["items"] else {
            panic!("expected list");
        };
        let Value::Map(first) = &items[0] else {
            panic!("expected map");
        };
        assert_eq!(first["cantidad"], Value::Int(2));
        assert_eq!(first["precio"], Value::Float(9.9));
        assert_eq!(items[1], Value::Int(3));
        assert_eq!(normalized["pedido_id"], Value::from("PED-1"));
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            "[a-z]{0,6}".prop_map(Value::String),
            (any::<i64>(), 0i64..6).prop_map(|(n, scale)| Value::Decimal(BigDecimal::new(n.into(), scale))),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
                prop::collection::btree_map("[a-z]{1,4}", inner, 0..4).prop_map(Value::Map),
            ]
        })
    }

    /// Same tree shape and keys; decimal leaves replaced by Int/Float only.
    fn same_shape(before: &Value, after: &Value) -> bool {
        match (before, after) {
            (Value::Decimal(_), Value::Int(_) | Value::BigInt(_) | Value::Float(_)) => true,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_shape(x, y))
            },
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|((ka, va), (kb, vb))| ka == kb && same_shape(va, vb))
            },
            (a, b) => a == b,
        }
    }

    proptest! {
        #[test]
        fn prop_normalize_preserves_shape(value in arb_value()) {
            let normalized = normalize(value.clone());
            prop_assert!(same_shape(&value, &normalized));
        }

        #[test]
        fn prop_decimal_values_are_preserved(n in any::<i64>(), scale in 0i64..6) {
            let d = BigDecimal::new(n.into(), scale);
            match normalize_decimal(&d) {
                Value::Int(i) => {
                    prop_assert!(d.is_integer());
                    prop_assert_eq!(BigDecimal::from_str(&i.to_string()).unwrap(), d);
                },
                Value::Float(f) => {
                    prop_assert!(!d.is_integer());
                    let expected = d.to_string().parse::<f64>().unwrap();
                    prop_assert!((f - expected).abs() <= expected.abs() * 1e-12);
                },
                other => prop_assert!(false, "unexpected {:?}", other),
            }
        }
    }
}
