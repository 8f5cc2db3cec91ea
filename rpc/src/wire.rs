use serde_json::{Map, Value as Json};

use crate::error::Error;

/// A wire value: `{t, v, c?}`, tags `none|int|float|str|list|
/// dict|class`. Dicts are carried as an ordered list of `[key, value]`
/// pairs so arbitrary (non-string) key types survive the trip.
#[derive(Debug, Clone, PartialEq)]
pub enum Wire {
    None,
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Wire>),
    Dict(Vec<(Wire, Wire)>),
    /// `c` is the class name, `v` is the identity key.
    Class { class: String, key: i64 },
}

impl Wire {
    pub fn int(v: i64) -> Wire {
        Wire::Int(v)
    }

    pub fn str(v: impl Into<String>) -> Wire {
        Wire::Str(v.into())
    }

    pub fn list(v: impl IntoIterator<Item = Wire>) -> Wire {
        Wire::List(v.into_iter().collect())
    }

    pub fn to_json(&self) -> Json {
        let mut obj = Map::new();
        match self {
            Wire::None => {
                obj.insert("t".into(), Json::from("none"));
                obj.insert("v".into(), Json::Null);
            }
            Wire::Int(i) => {
                obj.insert("t".into(), Json::from("int"));
                obj.insert("v".into(), Json::from(*i));
            }
            Wire::Float(f) => {
                obj.insert("t".into(), Json::from("float"));
                obj.insert("v".into(), Json::from(*f));
            }
            Wire::Str(s) => {
                obj.insert("t".into(), Json::from("str"));
                obj.insert("v".into(), Json::from(s.clone()));
            }
            Wire::List(items) => {
                obj.insert("t".into(), Json::from("list"));
                obj.insert(
                    "v".into(),
                    Json::Array(items.iter().map(Wire::to_json).collect()),
                );
            }
            Wire::Dict(pairs) => {
                obj.insert("t".into(), Json::from("dict"));
                obj.insert(
                    "v".into(),
                    Json::Array(
                        pairs
                            .iter()
                            .map(|(k, v)| Json::Array(vec![k.to_json(), v.to_json()]))
                            .collect(),
                    ),
                );
            }
            Wire::Class { class, key } => {
                obj.insert("t".into(), Json::from("class"));
                obj.insert("v".into(), Json::from(*key));
                obj.insert("c".into(), Json::from(class.clone()));
            }
        }
        Json::Object(obj)
    }

    pub fn from_json(json: &Json) -> Result<Wire, Error> {
        let obj = json
            .as_object()
            .ok_or_else(|| Error::Malformed("wire value is not a JSON object".into()))?;
        let tag = obj
            .get("t")
            .and_then(Json::as_str)
            .ok_or_else(|| Error::Malformed("wire value missing string field `t`".into()))?;
        let v = obj
            .get("v")
            .ok_or_else(|| Error::Malformed("wire value missing field `v`".into()))?;
        match tag {
            "none" => Ok(Wire::None),
            "int" => v
                .as_i64()
                .map(Wire::Int)
                .ok_or_else(|| Error::Malformed("`int` wire value is not an integer".into())),
            "float" => v
                .as_f64()
                .map(Wire::Float)
                .ok_or_else(|| Error::Malformed("`float` wire value is not a number".into())),
            "str" => v
                .as_str()
                .map(|s| Wire::Str(s.to_string()))
                .ok_or_else(|| Error::Malformed("`str` wire value is not a string".into())),
            "list" => {
                let items = v
                    .as_array()
                    .ok_or_else(|| Error::Malformed("`list` wire value is not an array".into()))?;
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(Wire::from_json(item)?);
                }
                Ok(Wire::List(out))
            }
            "dict" => {
                let pairs = v
                    .as_array()
                    .ok_or_else(|| Error::Malformed("`dict` wire value is not an array".into()))?;
                let mut out = Vec::with_capacity(pairs.len());
                for pair in pairs {
                    let pair = pair.as_array().ok_or_else(|| {
                        Error::Malformed("`dict` entry is not a [key, value] pair".into())
                    })?;
                    if pair.len() != 2 {
                        return Err(Error::Malformed(
                            "`dict` entry does not have exactly two elements".into(),
                        ));
                    }
                    out.push((Wire::from_json(&pair[0])?, Wire::from_json(&pair[1])?));
                }
                Ok(Wire::Dict(out))
            }
            "class" => {
                let class = obj
                    .get("c")
                    .and_then(Json::as_str)
                    .ok_or_else(|| Error::Malformed("`class` wire value missing `c`".into()))?;
                let key = v
                    .as_i64()
                    .ok_or_else(|| Error::Malformed("`class` wire value `v` is not an int".into()))?;
                Ok(Wire::Class { class: class.to_string(), key })
            }
            other => Err(Error::Malformed(format!("unknown wire tag {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_scalars_and_containers() {
        let cases = vec![
            Wire::None,
            Wire::Int(-7),
            Wire::Float(3.5),
            Wire::Str("hello \" world".into()),
            Wire::List(vec![Wire::Int(1), Wire::Str("a".into())]),
            Wire::Dict(vec![
                (Wire::Str("k1".into()), Wire::Int(1)),
                (Wire::Int(2), Wire::Str("v2".into())),
            ]),
            Wire::Class { class: "Frame".into(), key: 140732 },
        ];
        for wire in cases {
            let json = wire.to_json();
            let back = Wire::from_json(&json).expect("decodes");
            assert_eq!(wire, back);
        }
    }

    #[test]
    fn dict_decode_preserves_pair_order_not_last_write_wins() {
        let json = serde_json::json!({
            "t": "dict",
            "v": [[{"t": "str", "v": "a"}, {"t": "int", "v": 1}],
                  [{"t": "str", "v": "a"}, {"t": "int", "v": 2}]],
        });
        let Wire::Dict(pairs) = Wire::from_json(&json).unwrap() else {
            panic!("expected dict");
        };
        assert_eq!(pairs.len(), 2, "both pairs survive decode, unlike list-indexing a dict");
    }

    #[test]
    fn rejects_unknown_tag() {
        let json = serde_json::json!({"t": "bool", "v": true});
        assert!(Wire::from_json(&json).is_err());
    }
}
