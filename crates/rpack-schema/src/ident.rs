//! Validated identifier newtypes for pack and input names.
//!
//! Grounded on `apl-schema`'s `PackageName` newtype idiom: a thin wrapper
//! around `String` with `Deref`/`AsRef`/`Display`/`From` impls, but here
//! construction goes through a fallible, regex-checked constructor instead
//! of an infallible lowercasing one, since `spec.md` §6.1 ties both name
//! kinds to specific `^[...]{1,N}$` patterns rather than case folding.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn pack_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_\-]{1,64}$").expect("static pattern"))
}

fn input_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_\-.]{1,64}$").expect("static pattern"))
}

macro_rules! validated_ident {
    ($name:ident, $pattern_fn:ident, $what:literal) => {
        /// Validated identifier; see module docs.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap a name.
            ///
            /// # Errors
            ///
            /// Returns an error if `s` does not match the required pattern.
            pub fn parse(s: impl Into<String>) -> Result<Self, String> {
                let s = s.into();
                if $pattern_fn().is_match(&s) {
                    Ok(Self(s))
                } else {
                    Err(format!(concat!("invalid ", $what, ": '{}'"), s))
                }
            }

            /// The identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
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
                let s = String::deserialize(deserializer)?;
                Self::parse(s).map_err(serde::de::Error::custom)
            }
        }
    };
}

validated_ident!(PackName, pack_name_pattern, "pack name");
validated_ident!(InputName, input_name_pattern, "input name");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_name_accepts_idents() {
        assert!(PackName::parse("my-pack_1").is_ok());
    }

    #[test]
    fn pack_name_rejects_dot() {
        // Pack names intentionally exclude '.', unlike input names.
        assert!(PackName::parse("my.pack").is_err());
    }

    #[test]
    fn pack_name_rejects_empty() {
        assert!(PackName::parse("").is_err());
    }

    #[test]
    fn pack_name_rejects_too_long() {
        assert!(PackName::parse("a".repeat(65)).is_err());
    }

    #[test]
    fn input_name_accepts_dotted_filename() {
        assert!(InputName::parse("users.yaml").is_ok());
    }

    #[test]
    fn input_name_rejects_slash() {
        assert!(InputName::parse("a/b").is_err());
    }
}
