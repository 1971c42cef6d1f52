use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// The name of the field every response is timestamped with.
pub(crate) const SUBMITTED_AT_FIELD: &str = "submittedAt";

/// A single value in a collected response.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FieldValue {
    Text(String),
    Number(i64),
    List(Vec<String>),

    /// A placeholder the document store replaces with its own time when writing.
    ServerTimestamp,
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Number(number) => serializer.serialize_i64(*number),
            Self::List(values) => values.serialize(serializer),
            Self::ServerTimestamp => Err(serde::ser::Error::custom("server timestamp was not resolved")),
        }
    }
}

/// The field values of a survey response, keyed by field name.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub(crate) struct CollectedResponse(BTreeMap<String, FieldValue>);

impl CollectedResponse {
    pub(crate) fn insert<S: Into<String>>(&mut self, name: S, value: FieldValue) {
        self.0.insert(name.into(), value);
    }

    #[cfg(test)]
    pub(crate) fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    /// Replace every server timestamp placeholder with the given value.
    pub(crate) fn resolve_timestamps(&mut self, now: &str) {
        for value in self.0.values_mut() {
            if *value == FieldValue::ServerTimestamp {
                *value = FieldValue::Text(now.to_string());
            }
        }
    }
}
