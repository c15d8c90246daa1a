//! Strong types for configuration validation
//!
//! Follows the "Parse, don't validate" principle: once one of these
//! wrappers exists, the contained value is known to be well-formed.

use std::fmt;

fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

macro_rules! valid_id_type {
    ($name:ident, $expecting:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            /// Attempts to create a new identifier from a string.
            ///
            /// Returns `None` if the identifier is empty or contains
            /// characters other than alphanumerics, dashes, or underscores.
            pub fn new(id: impl Into<String>) -> Option<Self> {
                let id = id.into();
                if is_valid_id(&id) {
                    Some(Self(id))
                } else {
                    None
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let value = <String as serde::Deserialize>::deserialize(deserializer)?;
                Self::new(&value).ok_or_else(|| {
                    serde::de::Error::custom(format!(concat!("invalid ", $expecting, ": {}"), value))
                })
            }
        }
    };
}

valid_id_type!(ValidRouterId, "router ID");
valid_id_type!(ValidServiceId, "service ID");
valid_id_type!(ValidMiddlewareId, "middleware ID");

/// A validated configuration schema version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version(String);

impl Version {
    const SUPPORTED: &'static [&'static str] = &["1.0"];

    pub fn new(version: &str) -> Option<Self> {
        if Self::SUPPORTED.contains(&version) {
            Some(Self(version.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
