use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use crate::client::RpcClient;
use crate::error::Error;
use crate::wire::Wire;

/// A client-side handle for a live object on the server. Forwards every
/// method/property call as an RPC keyed on `(class_name, key)`. Stubs never
/// embed other stubs; back-edges (thread → inferior, inferior → threads)
/// only ever cross the wire as `(class, key)` pairs and get re-resolved
/// through the registry, so no pointer cycle ever forms locally.
pub struct Stub {
    pub class_name: &'static str,
    pub key: i64,
    client: Weak<RpcClient>,
}

impl Stub {
    pub(crate) fn new(class_name: &'static str, key: i64, client: Weak<RpcClient>) -> Arc<Self> {
        Arc::new(Self { class_name, key, client })
    }

    /// Calls a method or property getter on the live object this stub
    /// refers to. `self.key` is sent as the request's receiver (`i`).
    pub fn call(&self, member: &str, args: Vec<Wire>) -> Result<Value, Error> {
        let client = self.client.upgrade().ok_or(Error::Closed)?;
        client.call(self.class_name, member, args, Some(self.key))
    }
}

impl std::fmt::Debug for Stub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stub")
            .field("class_name", &self.class_name)
            .field("key", &self.key)
            .finish()
    }
}

impl PartialEq for Stub {
    fn eq(&self, other: &Self) -> bool {
        self.class_name == other.class_name && self.key == other.key
    }
}

/// A decoded wire value, with `class` records resolved into live stubs.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Dict(Vec<(Value, Value)>),
    Stub(Arc<Stub>),
}

impl Value {
    pub fn into_string(self) -> Result<String, Error> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(Error::Malformed(format!("expected str, got {other:?}"))),
        }
    }

    pub fn into_i64(self) -> Result<i64, Error> {
        match self {
            Value::Int(i) => Ok(i),
            other => Err(Error::Malformed(format!("expected int, got {other:?}"))),
        }
    }

    /// Python encodes `bool` as `int` (0/1) over the wire, since the
    /// source language's `bool` is an `int` subtype and the wire grammar
    /// has no dedicated boolean tag.
    pub fn into_bool(self) -> Result<bool, Error> {
        Ok(self.into_i64()? != 0)
    }

    pub fn into_list(self) -> Result<Vec<Value>, Error> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(Error::Malformed(format!("expected list, got {other:?}"))),
        }
    }

    pub fn into_stub(self) -> Result<Arc<Stub>, Error> {
        match self {
            Value::Stub(s) => Ok(s),
            other => Err(Error::Malformed(format!("expected remote object, got {other:?}"))),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }
}

/// The client-side identity registry: `(class_name, key) -> stub`.
/// Resolving the same identity twice in one session yields the same
/// `Arc<Stub>`. There is no eviction; entries live for the session's
/// duration, same as the server's identity map.
#[derive(Default)]
pub struct Registry {
    stubs: Mutex<HashMap<(&'static str, i64), Arc<Stub>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self { stubs: Mutex::new(HashMap::new()) }
    }

    /// Resolves `(class_name, key)` to a stub, constructing and caching
    /// one (bound to `client`) if none exists yet and `create_stub` is
    /// true.
    pub fn resolve(
        &self,
        class_name: &'static str,
        key: i64,
        client: &Weak<RpcClient>,
        create_stub: bool,
    ) -> Result<Option<Arc<Stub>>, Error> {
        let mut stubs = self.stubs.lock().expect("registry mutex poisoned");
        if let Some(existing) = stubs.get(&(class_name, key)) {
            return Ok(Some(existing.clone()));
        }
        if !create_stub {
            return Ok(None);
        }
        let stub = Stub::new(class_name, key, client.clone());
        stubs.insert((class_name, key), stub.clone());
        Ok(Some(stub))
    }
}

/// Encodes an outgoing call argument as a wire value. Scalars pass by
/// value; sequences and associative containers recurse; a stub encodes as
/// the `class` record naming the live object it refers to — this never
/// actually happens in this system's call sites today (no method takes
/// another stub as an argument) but is kept general to match the grammar.
pub fn serialize(value: &Value) -> Wire {
    match value {
        Value::None => Wire::None,
        Value::Int(i) => Wire::Int(*i),
        Value::Float(f) => Wire::Float(*f),
        Value::Str(s) => Wire::Str(s.clone()),
        Value::List(items) => Wire::List(items.iter().map(serialize).collect()),
        Value::Dict(pairs) => {
            Wire::Dict(pairs.iter().map(|(k, v)| (serialize(k), serialize(v))).collect())
        }
        Value::Stub(stub) => Wire::Class { class: stub.class_name.to_string(), key: stub.key },
    }
}

/// Decodes a wire value into a `Value`, resolving `class` records
/// through `registry`. `class_lookup` maps a wire class name
/// to the `&'static str` this crate's stub types use internally, since
/// wire class names arrive as owned `String`s but stub identities are
/// keyed by static class-name tokens.
pub fn deserialize(
    wire: &Wire,
    registry: &Registry,
    client: &Weak<RpcClient>,
    class_lookup: impl Fn(&str) -> Option<&'static str>,
    create_stub: bool,
) -> Result<Value, Error> {
    Ok(match wire {
        Wire::None => Value::None,
        Wire::Int(i) => Value::Int(*i),
        Wire::Float(f) => Value::Float(*f),
        Wire::Str(s) => Value::Str(s.clone()),
        Wire::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(deserialize(item, registry, client, &class_lookup, create_stub)?);
            }
            Value::List(out)
        }
        Wire::Dict(pairs) => {
            let mut out = Vec::with_capacity(pairs.len());
            for (k, v) in pairs {
                out.push((
                    deserialize(k, registry, client, &class_lookup, create_stub)?,
                    deserialize(v, registry, client, &class_lookup, create_stub)?,
                ));
            }
            Value::Dict(out)
        }
        Wire::Class { class, key } => {
            let class_name = class_lookup(class)
                .ok_or_else(|| Error::UnknownClass(class.clone()))?;
            match registry.resolve(class_name, *key, client, create_stub)? {
                Some(stub) => Value::Stub(stub),
                None => return Err(Error::Malformed(format!(
                    "no stub exists for ({class_name}, {key}) and create_stub was false"
                ))),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_scalars_and_containers() {
        let values = vec![
            Value::None,
            Value::Int(42),
            Value::Float(1.25),
            Value::Str("hi".into()),
            Value::List(vec![Value::Int(1), Value::Int(2)]),
            Value::Dict(vec![(Value::Str("k".into()), Value::Int(9))]),
        ];
        let registry = Registry::new();
        let client: Weak<RpcClient> = Weak::new();
        for value in values {
            let wire = serialize(&value);
            let back = deserialize(&wire, &registry, &client, |_| None, false).unwrap();
            assert_eq!(format!("{back:?}"), format!("{value:?}"));
        }
    }

    #[test]
    fn resolving_same_identity_twice_yields_the_same_stub() {
        let registry = Registry::new();
        let client: Weak<RpcClient> = Weak::new();
        let a = registry.resolve("Frame", 77, &client, true).unwrap().unwrap();
        let b = registry.resolve("Frame", 77, &client, true).unwrap().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
