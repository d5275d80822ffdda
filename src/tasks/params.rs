//! Task parameter metadata and strongly typed values

use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared type of a tunable value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterKind {
    Int,
    Float,
    Bool,
    String,
    Enum,
}

/// A parameter value
///
/// Deserialises untagged so TOML and JSON scalars map directly; the declared
/// `ParameterKind` decides the final variant (see [`TaskParameter::coerce`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Enum(String),
}

impl ParamValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            ParamValue::Bool(_) => ParameterKind::Bool,
            ParamValue::Int(_) => ParameterKind::Int,
            ParamValue::Float(_) => ParameterKind::Float,
            ParamValue::Str(_) => ParameterKind::String,
            ParamValue::Enum(_) => ParameterKind::Enum,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Str(v) | ParamValue::Enum(v) => write!(f, "{}", v),
        }
    }
}

/// Inclusive numeric bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Metadata for one tunable value of a task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskParameter {
    /// Unique within its task
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ParameterKind,
    pub default: ParamValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<ValueRange>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<&'static str>,
}

impl TaskParameter {
    pub fn int(key: &'static str, label: &'static str, default: i64, min: i64, max: i64) -> Self {
        Self {
            key,
            label,
            kind: ParameterKind::Int,
            default: ParamValue::Int(default),
            range: Some(ValueRange {
                min: min as f64,
                max: max as f64,
            }),
            options: Vec::new(),
        }
    }

    pub fn float(key: &'static str, label: &'static str, default: f64, min: f64, max: f64) -> Self {
        Self {
            key,
            label,
            kind: ParameterKind::Float,
            default: ParamValue::Float(default),
            range: Some(ValueRange { min, max }),
            options: Vec::new(),
        }
    }

    pub fn boolean(key: &'static str, label: &'static str, default: bool) -> Self {
        Self {
            key,
            label,
            kind: ParameterKind::Bool,
            default: ParamValue::Bool(default),
            range: None,
            options: Vec::new(),
        }
    }

    pub fn text(key: &'static str, label: &'static str, default: &str) -> Self {
        Self {
            key,
            label,
            kind: ParameterKind::String,
            default: ParamValue::Str(default.to_string()),
            range: None,
            options: Vec::new(),
        }
    }

    pub fn choice(
        key: &'static str,
        label: &'static str,
        default: &'static str,
        options: Vec<&'static str>,
    ) -> Self {
        Self {
            key,
            label,
            kind: ParameterKind::Enum,
            default: ParamValue::Enum(default.to_string()),
            range: None,
            options,
        }
    }

    /// Convert `value` to this parameter's kind, enforcing range and options
    pub fn coerce(&self, value: &ParamValue) -> Result<ParamValue> {
        let coerced = match (self.kind, value) {
            (ParameterKind::Int, ParamValue::Int(v)) => {
                self.check_range(*v as f64)?;
                ParamValue::Int(*v)
            }
            (ParameterKind::Float, ParamValue::Float(v)) => {
                self.check_range(*v)?;
                ParamValue::Float(*v)
            }
            (ParameterKind::Float, ParamValue::Int(v)) => {
                self.check_range(*v as f64)?;
                ParamValue::Float(*v as f64)
            }
            (ParameterKind::Bool, ParamValue::Bool(v)) => ParamValue::Bool(*v),
            (ParameterKind::String, ParamValue::Str(v) | ParamValue::Enum(v)) => {
                ParamValue::Str(v.clone())
            }
            (ParameterKind::Enum, ParamValue::Str(v) | ParamValue::Enum(v)) => {
                if !self.options.iter().any(|o| o == v) {
                    return Err(self.invalid(format!(
                        "'{}' is not one of {:?}",
                        v, self.options
                    )));
                }
                ParamValue::Enum(v.clone())
            }
            (kind, other) => {
                return Err(self.invalid(format!(
                    "expected {:?}, got {:?}",
                    kind,
                    other.kind()
                )))
            }
        };
        Ok(coerced)
    }

    /// Parse a textual value (CLI `key=value`) according to the declared kind
    pub fn parse(&self, text: &str) -> Result<ParamValue> {
        let text = text.trim();
        let value = match self.kind {
            ParameterKind::Int => ParamValue::Int(
                text.parse()
                    .map_err(|_| self.invalid(format!("'{}' is not an integer", text)))?,
            ),
            ParameterKind::Float => ParamValue::Float(
                text.parse()
                    .map_err(|_| self.invalid(format!("'{}' is not a number", text)))?,
            ),
            ParameterKind::Bool => ParamValue::Bool(match text.to_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => true,
                "false" | "0" | "off" | "no" => false,
                _ => return Err(self.invalid(format!("'{}' is not a boolean", text))),
            }),
            ParameterKind::String => ParamValue::Str(text.to_string()),
            ParameterKind::Enum => ParamValue::Enum(text.to_string()),
        };
        self.coerce(&value)
    }

    fn check_range(&self, value: f64) -> Result<()> {
        if value.is_nan() {
            return Err(self.invalid("NaN is not allowed".to_string()));
        }
        match self.range {
            Some(range) if !range.contains(value) => Err(self.invalid(format!(
                "{} is outside [{}, {}]",
                value, range.min, range.max
            ))),
            _ => Ok(()),
        }
    }

    fn invalid(&self, reason: String) -> Error {
        Error::InvalidParameter {
            key: self.key.to_string(),
            reason,
        }
    }
}

/// Current values for the active task's parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<String, ParamValue>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every declared parameter at its default
    pub fn from_defaults(parameters: &[TaskParameter]) -> Self {
        Self {
            values: parameters
                .iter()
                .map(|p| (p.key.to_string(), p.default.clone()))
                .collect(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ParamValue) -> Option<ParamValue> {
        self.values.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Value for `param`, falling back to its default when the key is absent
    ///
    /// A present but invalid value is a processing error for the current frame.
    pub fn resolve(&self, param: &TaskParameter) -> Result<ParamValue> {
        match self.values.get(param.key) {
            Some(value) => param
                .coerce(value)
                .map_err(|e| Error::Processing(e.to_string())),
            None => Ok(param.default.clone()),
        }
    }

    pub fn float(&self, param: &TaskParameter) -> Result<f64> {
        match self.resolve(param)? {
            ParamValue::Float(v) => Ok(v),
            ParamValue::Int(v) => Ok(v as f64),
            other => Err(Error::Processing(format!(
                "Parameter '{}' is {:?}, not a number",
                param.key,
                other.kind()
            ))),
        }
    }

    pub fn int(&self, param: &TaskParameter) -> Result<i64> {
        match self.resolve(param)? {
            ParamValue::Int(v) => Ok(v),
            other => Err(Error::Processing(format!(
                "Parameter '{}' is {:?}, not an integer",
                param.key,
                other.kind()
            ))),
        }
    }

    pub fn bool(&self, param: &TaskParameter) -> Result<bool> {
        match self.resolve(param)? {
            ParamValue::Bool(v) => Ok(v),
            other => Err(Error::Processing(format!(
                "Parameter '{}' is {:?}, not a boolean",
                param.key,
                other.kind()
            ))),
        }
    }

    pub fn text(&self, param: &TaskParameter) -> Result<String> {
        match self.resolve(param)? {
            ParamValue::Str(v) | ParamValue::Enum(v) => Ok(v),
            other => Err(Error::Processing(format!(
                "Parameter '{}' is {:?}, not text",
                param.key,
                other.kind()
            ))),
        }
    }
}
