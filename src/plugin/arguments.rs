//! Typed access to an API's `arguments` mapping.

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::framework::types::{ArgumentKey, Arguments, RuntimeApiName};

#[derive(Error, Debug)]
pub enum ArgumentError {
    #[error("invalid argument '{key}' for {api}")]
    Missing {
        key: ArgumentKey,
        api: RuntimeApiName,
    },

    #[error("invalid argument '{key}' for {api}: {reason}")]
    Malformed {
        key: ArgumentKey,
        api: RuntimeApiName,
        reason: String,
    },

    #[error("invalid argument '{key}' for {api}")]
    Unknown { key: String, api: RuntimeApiName },
}

/// Types the raw `arguments` mapping of a script entry.
pub fn parse_arguments(api: RuntimeApiName, raw: &Mapping) -> Result<Arguments, ArgumentError> {
    raw.iter()
        .map(|(key, value)| {
            let name = match key {
                Value::String(s) => s.clone(),
                other => serde_yaml::to_string(other)
                    .map(|s| s.trim_end().to_string())
                    .unwrap_or_default(),
            };
            name.parse::<ArgumentKey>()
                .map(|key| (key, value.clone()))
                .map_err(|_| ArgumentError::Unknown { key: name, api })
        })
        .collect()
}

pub struct ArgReader<'a> {
    api: RuntimeApiName,
    args: &'a Arguments,
}

impl<'a> ArgReader<'a> {
    pub fn new(api: RuntimeApiName, args: &'a Arguments) -> Self {
        ArgReader { api, args }
    }

    fn malformed(&self, key: ArgumentKey, reason: impl Into<String>) -> ArgumentError {
        ArgumentError::Malformed {
            key,
            api: self.api,
            reason: reason.into(),
        }
    }

    /// Scalar rendered as text; numbers and booleans are accepted too.
    pub fn optional_string(&self, key: ArgumentKey) -> Result<Option<String>, ArgumentError> {
        match self.args.get(&key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(self.malformed(key, "expected a scalar")),
        }
    }

    /// Mandatory non-empty string.
    pub fn string(&self, key: ArgumentKey) -> Result<String, ArgumentError> {
        self.optional_string(key)?
            .filter(|s| !s.is_empty())
            .ok_or(ArgumentError::Missing { key, api: self.api })
    }

    /// Missing flags default to `false`.
    pub fn flag(&self, key: ArgumentKey) -> Result<bool, ArgumentError> {
        match self.args.get(&key) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => s
                .trim()
                .parse::<bool>()
                .map_err(|_| self.malformed(key, format!("'{s}' is not a boolean"))),
            Some(_) => Err(self.malformed(key, "expected a boolean")),
        }
    }

    /// Embedded document, given either as a YAML string or inline mapping.
    pub fn raw_document(&self, key: ArgumentKey) -> Result<Value, ArgumentError> {
        match self.args.get(&key) {
            None | Some(Value::Null) => Err(ArgumentError::Missing { key, api: self.api }),
            Some(Value::String(text)) => {
                serde_yaml::from_str(text).map_err(|e| self.malformed(key, e.to_string()))
            }
            Some(other) => Ok(other.clone()),
        }
    }

    pub fn document<T: DeserializeOwned>(&self, key: ArgumentKey) -> Result<T, ArgumentError> {
        let value = self.raw_document(key)?;
        serde_yaml::from_value(value).map_err(|e| self.malformed(key, e.to_string()))
    }

    /// Like [`ArgReader::document`] but with a caller-provided decoder.
    pub fn decode<T>(
        &self,
        key: ArgumentKey,
        decode: impl FnOnce(Value) -> serde_yaml::Result<T>,
    ) -> Result<T, ArgumentError> {
        let value = self.raw_document(key)?;
        decode(value).map_err(|e| self.malformed(key, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_embedded_documents_accept_strings_and_mappings() {
        let mut args = BTreeMap::new();
        args.insert(ArgumentKey::Context, Value::from("name: c1\ntarget: kubernetes\n"));
        let inline: Value = serde_yaml::from_str("name: s1").unwrap();
        args.insert(ArgumentKey::Server, inline);
        let reader = ArgReader::new(RuntimeApiName::SetContext, &args);

        let ctx = reader.raw_document(ArgumentKey::Context).unwrap();
        assert_eq!(ctx["name"], Value::from("c1"));
        let server = reader.raw_document(ArgumentKey::Server).unwrap();
        assert_eq!(server["name"], Value::from("s1"));
    }

    #[test]
    fn test_missing_and_malformed_arguments() {
        let mut args = BTreeMap::new();
        args.insert(ArgumentKey::IsCurrent, Value::from("maybe"));
        let reader = ArgReader::new(RuntimeApiName::GetContext, &args);

        let missing = reader.string(ArgumentKey::ContextName).unwrap_err();
        assert_eq!(
            missing.to_string(),
            "invalid argument 'contextName' for GetContext"
        );
        assert!(reader.flag(ArgumentKey::IsCurrent).is_err());
        assert!(!reader.flag(ArgumentKey::SetCurrent).unwrap());
    }

    #[test]
    fn test_unknown_argument_key_is_rejected() {
        let raw: Mapping = serde_yaml::from_str("key: k\nflavour: mint\n").unwrap();
        let err = parse_arguments(RuntimeApiName::GetEnv, &raw).unwrap_err();
        assert_eq!(err.to_string(), "invalid argument 'flavour' for GetEnv");

        let raw: Mapping = serde_yaml::from_str("key: k\n").unwrap();
        let args = parse_arguments(RuntimeApiName::GetEnv, &raw).unwrap();
        assert_eq!(args[&ArgumentKey::Key], Value::from("k"));
    }

    #[test]
    fn test_scalars_render_as_text() {
        let mut args = BTreeMap::new();
        args.insert(ArgumentKey::Value, Value::Bool(true));
        let reader = ArgReader::new(RuntimeApiName::SetFeature, &args);
        assert_eq!(reader.string(ArgumentKey::Value).unwrap(), "true");
    }
}
