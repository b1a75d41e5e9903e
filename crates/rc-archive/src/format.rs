//! Format tags of root documents
//!
//! Every root document carries a `format` string naming its schema
//! version. The tag carries no data: it deserializes into a zero-sized
//! [`FormatTag`] when it matches and fails otherwise.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A document schema version
pub trait FormatVersion {
    const TAG: &'static str;
}

pub struct TemplatesV1;
pub struct ProjectTypesV1;
pub struct ProjectsV1;

impl FormatVersion for TemplatesV1 {
    const TAG: &'static str = "templates/v1";
}

impl FormatVersion for ProjectTypesV1 {
    const TAG: &'static str = "projecttypes/v1";
}

impl FormatVersion for ProjectsV1 {
    const TAG: &'static str = "projects/v1";
}

/// The `format` field of a root document
pub struct FormatTag<F>(PhantomData<F>);

impl<F: FormatVersion> FormatTag<F> {
    pub fn new() -> Self {
        Self(PhantomData)
    }

    pub fn tag(&self) -> &'static str {
        F::TAG
    }
}

impl<F: FormatVersion> Default for FormatTag<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> Clone for FormatTag<F> {
    fn clone(&self) -> Self {
        Self(PhantomData)
    }
}

impl<F> Copy for FormatTag<F> {}

impl<F> PartialEq for FormatTag<F> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<F: FormatVersion> fmt::Debug for FormatTag<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FormatTag({:?})", F::TAG)
    }
}

/// Message for a tag that does not match the expected one
pub fn mismatch_message(expected: &str, actual: &str) -> String {
    format!("Invalid format: expected \"{}\" got \"{}\"", expected, actual)
}

impl<F: FormatVersion> Serialize for FormatTag<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(F::TAG)
    }
}

impl<'de, F: FormatVersion> Deserialize<'de> for FormatTag<F> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let actual = match &value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        if actual == F::TAG {
            Ok(Self::new())
        } else {
            Err(de::Error::custom(mismatch_message(F::TAG, &actual)))
        }
    }
}
