//! Record and value model
//!
//! Store items arrive as DynamoDB [`AttributeValue`] maps. They are converted
//! once into [`Record`]s made of the tagged [`Value`] union so the normalizer
//! and the writer can match on value kinds exhaustively.

use aws_sdk_dynamodb::types::AttributeValue;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bigdecimal::{num_bigint::BigInt, BigDecimal};
use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::value::RawValue;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use tracing::warn;

/// Raw item as returned by a table scan page
pub type Item = HashMap<String, AttributeValue>;

/// Attribute name to value. Keys are ordered so encoded output is deterministic.
pub type Record = BTreeMap<String, Value>;

/// A single attribute value
///
/// `Decimal` only appears in freshly scanned records; after normalization
/// every number is `Int`, `BigInt` or `Float`. `BigInt` holds integers past
/// the `i128` range, which DynamoDB allows up to 126 digits.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i128),
    BigInt(BigInt),
    Float(f64),
    Decimal(BigDecimal),
    String(String),
    Binary(Vec<u8>),
    List(Vec<Value>),
    Map(Record),
}

impl Value {
    /// Convert a store attribute into a value, recursing into containers
    ///
    /// Sets become lists. Attribute kinds unknown to this SDK version map to
    /// `Null`.
    pub fn from_attribute(attribute: AttributeValue) -> Self {
        match attribute {
            AttributeValue::S(s) => Value::String(s),
            AttributeValue::N(n) => parse_number(n),
            AttributeValue::Bool(b) => Value::Bool(b),
            AttributeValue::Null(_) => Value::Null,
            AttributeValue::B(blob) => Value::Binary(blob.into_inner()),
            AttributeValue::L(items) => {
                Value::List(items.into_iter().map(Value::from_attribute).collect())
            },
            AttributeValue::M(map) => Value::Map(record_from_item(map)),
            AttributeValue::Ss(set) => Value::List(set.into_iter().map(Value::String).collect()),
            AttributeValue::Ns(set) => Value::List(set.into_iter().map(parse_number).collect()),
            AttributeValue::Bs(set) => Value::List(
                set.into_iter()
                    .map(|blob| Value::Binary(blob.into_inner()))
                    .collect(),
            ),
            other => {
                warn!(attribute = ?other, "Unsupported attribute kind, storing null");
                Value::Null
            },
        }
    }
}

fn parse_number(raw: String) -> Value {
    match BigDecimal::from_str(&raw) {
        Ok(decimal) => Value::Decimal(decimal),
        Err(e) => {
            warn!(number = %raw, error = %e, "Store returned an unparsable number, keeping text");
            Value::String(raw)
        },
    }
}

/// Convert a raw scanned item into a record
pub fn record_from_item(item: Item) -> Record {
    item.into_iter()
        .map(|(name, attribute)| (name, Value::from_attribute(attribute)))
        .collect()
}

impl Serialize for Value {
    /// Kinds with no native JSON form (decimals, binary) are written as their
    /// string form. Big integers are written as a bare number token.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i128(*i),
            Value::BigInt(n) => RawValue::from_string(n.to_string())
                .map_err(S::Error::custom)?
                .serialize(serializer),
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            // Normalization never yields these; only hand-built values can.
            Value::Float(f) => serializer.serialize_str(&f.to_string()),
            Value::Decimal(d) => serializer.serialize_str(&d.to_string()),
            Value::String(s) => serializer.serialize_str(s),
            Value::Binary(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            },
            Value::Map(record) => {
                let mut map = serializer.serialize_map(Some(record.len()))?;
                for (key, value) in record {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            },
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Value::Decimal(d)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::primitives::Blob;
    use serde_json::json;

    fn item(pairs: Vec<(&str, AttributeValue)>) -> Item {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_scalar_attributes() {
        let record = record_from_item(item(vec![
            ("local_id", AttributeValue::S("LOCAL-0001".into())),
            ("abierto", AttributeValue::Bool(true)),
            ("nota", AttributeValue::Null(true)),
            ("precio", AttributeValue::N("12.50".into())),
        ]));

        assert_eq!(record["local_id"], Value::from("LOCAL-0001"));
        assert_eq!(record["abierto"], Value::Bool(true));
        assert_eq!(record["nota"], Value::Null);
        assert_eq!(
            record["precio"],
            Value::Decimal(BigDecimal::from_str("12.50").unwrap())
        );
    }

    #[test]
    fn test_nested_and_set_attributes() {
        let direccion = item(vec![
            ("ciudad", AttributeValue::S("Lima".into())),
            ("numero", AttributeValue::N("742".into())),
        ]);
        let record = record_from_item(item(vec![
            ("direccion", AttributeValue::M(direccion)),
            (
                "items",
                AttributeValue::L(vec![AttributeValue::S("arroz".into()), AttributeValue::N("2".into())]),
            ),
            ("tags", AttributeValue::Ss(vec!["a".into(), "b".into()])),
            ("foto", AttributeValue::B(Blob::new(b"hi".to_vec()))),
        ]));

        let Value::Map(direccion) = &record["direccion"] else {
            panic!("expected nested map");
        };
        assert_eq!(direccion["ciudad"], Value::from("Lima"));
        assert!(matches!(direccion["numero"], Value::Decimal(_)));

        let Value::List(items) = &record["items"] else {
            panic!("expected list");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(
            record["tags"],
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
        assert_eq!(record["foto"], Value::Binary(b"hi".to_vec()));
    }

    #[test]
    fn test_unparsable_number_is_kept_as_text() {
        let value = Value::from_attribute(AttributeValue::N("not-a-number".into()));
        assert_eq!(value, Value::from("not-a-number"));
    }

    #[test]
    fn test_values_without_json_form_serialize_as_strings() {
        let mut record = Record::new();
        record.insert("foto".into(), Value::Binary(b"hi".to_vec()));
        record.insert("raw".into(), Value::Decimal(BigDecimal::from_str("1.25").unwrap()));
        record.insert("inf".into(), Value::Float(f64::INFINITY));
        record.insert("big".into(), Value::Int(170141183460469231731687303715884105727));

        let encoded = serde_json::to_string(&record).unwrap();

        assert_eq!(
            encoded,
            r#"{"big":170141183460469231731687303715884105727,"foto":"aGk=","inf":"inf","raw":"1.25"}"#
        );
    }

    #[test]
    fn test_big_integer_serializes_as_bare_number() {
        let mut record = Record::new();
        record.insert("n".into(), Value::BigInt(BigInt::from_str(&format!("1{}", "0".repeat(40))).unwrap()));
        record.insert("neg".into(), Value::BigInt(BigInt::from_str("-123456789012345678901234567890123456789012").unwrap()));

        let encoded = serde_json::to_string(&record).unwrap();

        assert_eq!(
            encoded,
            format!(
                r#"{{"n":1{},"neg":-123456789012345678901234567890123456789012}}"#,
                "0".repeat(40)
            )
        );
    }

    #[test]
    fn test_serialize_matches_plain_json() {
        let mut nested = Record::new();
        nested.insert("activo".into(), Value::Bool(false));

        let mut record = Record::new();
        record.insert("nombre".into(), Value::from("Ñandú"));
        record.insert("cantidad".into(), Value::Int(3));
        record.insert("ratio".into(), Value::Float(0.5));
        record.insert("meta".into(), Value::Map(nested));
        record.insert("vacio".into(), Value::Null);

        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(
            value,
            json!({
                "nombre": "Ñandú",
                "cantidad": 3,
                "ratio": 0.5,
                "meta": { "activo": false },
                "vacio": null
            })
        );
    }
}
