//! State assertions run after each successful step.
//!
//! Keys may reach into collections: `metadata.version` reads a map entry,
//! `policies.0` a list element, and `policies.#` (or `metadata.%`) the
//! element count.

use anyhow::{Context, Result, anyhow, bail};
use declarative::{Address, InstanceState, State, Value};

/// A check over the state reached by a step.
pub type Check = Box<dyn Fn(&State) -> Result<()>>;

fn instance<'s>(state: &'s State, address: &str) -> Result<&'s InstanceState> {
    let parsed: Address = address
        .parse()
        .with_context(|| format!("invalid address {address:?} in check"))?;
    state
        .get(&parsed)
        .ok_or_else(|| anyhow!("{address}: not found in state"))
}

/// Value at `key`, following `.` into maps and lists.
pub fn lookup(instance: &InstanceState, key: &str) -> Option<Value> {
    let mut segments = key.split('.');
    let mut current = instance.attribute(segments.next()?)?;
    for segment in segments {
        current = match (segment, &current) {
            ("#", Value::List(items)) => Value::Int(items.len() as i64),
            ("%", Value::Map(map)) => Value::Int(map.len() as i64),
            (index, Value::List(items)) => items.get(index.parse::<usize>().ok()?)?.clone(),
            (name, Value::Map(map)) => map.get(name)?.clone(),
            _ => return None,
        };
    }
    Some(current)
}

/// Render a value the way checks compare it: strings without quotes.
pub fn flat(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `address.key` equals `expected`.
pub fn attr(address: &str, key: &str, expected: impl Into<String>) -> Check {
    let (address, key, expected) = (address.to_string(), key.to_string(), expected.into());
    Box::new(move |state| {
        let actual = lookup(instance(state, &address)?, &key)
            .ok_or_else(|| anyhow!("{address}: attribute {key:?} not found"))?;
        if flat(&actual) != expected {
            bail!(
                "{address}: attribute {key:?} expected {expected:?}, got {:?}",
                flat(&actual)
            );
        }
        Ok(())
    })
}

/// `address.key` is present and not empty.
pub fn attr_set(address: &str, key: &str) -> Check {
    let (address, key) = (address.to_string(), key.to_string());
    Box::new(move |state| match lookup(instance(state, &address)?, &key) {
        Some(value) if !value.is_empty() => Ok(()),
        _ => bail!("{address}: attribute {key:?} expected to be set"),
    })
}

/// `address.key` is absent or empty.
pub fn no_attr(address: &str, key: &str) -> Check {
    let (address, key) = (address.to_string(), key.to_string());
    Box::new(move |state| match lookup(instance(state, &address)?, &key) {
        Some(value) if !value.is_empty() => {
            bail!("{address}: attribute {key:?} expected to be unset, got {value}")
        }
        _ => Ok(()),
    })
}

/// `address.key` equals `other.other_key`. Absent and empty are the same.
pub fn attr_pair(address: &str, key: &str, other: &str, other_key: &str) -> Check {
    let (address, key) = (address.to_string(), key.to_string());
    let (other, other_key) = (other.to_string(), other_key.to_string());
    Box::new(move |state| {
        let left = lookup(instance(state, &address)?, &key).filter(|v| !v.is_empty());
        let right = lookup(instance(state, &other)?, &other_key).filter(|v| !v.is_empty());
        if left != right {
            let show = |v: &Option<Value>| v.as_ref().map_or_else(|| "<unset>".to_string(), flat);
            bail!(
                "{address}: attribute {key:?} is {}, but {other}.{other_key} is {}",
                show(&left),
                show(&right)
            );
        }
        Ok(())
    })
}

/// All checks in order, stopping at the first failure.
pub fn compose(checks: Vec<Check>) -> Check {
    Box::new(move |state| checks.iter().try_for_each(|check| check(state)))
}
