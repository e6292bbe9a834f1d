//! Newtype wrappers for string identifiers, providing compile-time type safety.
//!
//! All newtypes serialize/deserialize as plain strings so lock documents and
//! record files stay readable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<String> for $name {
            fn eq(&self, other: &String) -> bool {
                self.0 == *other
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Name of a package as recorded by the installer (e.g. `openssl`).
    ///
    /// Ordering is plain byte-wise comparison, which is exactly the
    /// case-sensitive lexicographic order the lock document uses.
    PackageName
);

string_newtype!(
    /// Platform tag a package was built for (e.g. `linux-64`, `noarch`).
    Platform
);

impl Platform {
    /// Tag used by architecture-independent packages.
    pub const NOARCH: &'static str = "noarch";

    /// Whether this is the architecture-independent tag.
    pub fn is_noarch(&self) -> bool {
        self.0 == Self::NOARCH
    }

    /// Platform tag of the machine this process is running on.
    pub fn current() -> Self {
        let tag = match (std::env::consts::OS, std::env::consts::ARCH) {
            ("linux", "x86_64") => "linux-64".to_owned(),
            ("linux", "x86") => "linux-32".to_owned(),
            ("linux", "aarch64") => "linux-aarch64".to_owned(),
            ("linux", "powerpc64") => "linux-ppc64le".to_owned(),
            ("linux", "riscv64") => "linux-riscv64".to_owned(),
            ("macos", "x86_64") => "osx-64".to_owned(),
            ("macos", "aarch64") => "osx-arm64".to_owned(),
            ("windows", "x86_64") => "win-64".to_owned(),
            ("windows", "aarch64") => "win-arm64".to_owned(),
            (os, arch) => format!("{os}-{arch}"),
        };
        Self(tag)
    }
}
