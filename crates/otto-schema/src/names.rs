//! Validated names for packs and commands.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BASE_PACK, LOCAL_PACK, RES_DIR, SEPARATOR};

/// Errors produced when validating a pack or command name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The name was empty.
    #[error("name must not be empty")]
    Empty,

    /// The name contained a character outside `[A-Za-z0-9_-]`.
    #[error("invalid character '{ch}' in name '{name}'")]
    InvalidChar {
        /// The offending name.
        name: String,
        /// The first character that failed validation.
        ch: char,
    },

    /// The name started with a character that may not lead a name.
    #[error("name '{0}' must start with a letter, digit or underscore")]
    InvalidStart(String),

    /// A command name contained an upper-case letter.
    #[error("command name '{0}' must be lower-case")]
    Uppercase(String),
}

fn validate(name: &str) -> Result<(), NameError> {
    let Some(first) = name.chars().next() else {
        return Err(NameError::Empty);
    };
    if !(first.is_ascii_alphanumeric() || first == '_') {
        return Err(NameError::InvalidStart(name.to_string()));
    }
    if let Some(ch) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(NameError::InvalidChar {
            name: name.to_string(),
            ch,
        });
    }
    Ok(())
}

/// Command names map one-to-one onto the symbols their scripts declare, so
/// they are lower-case.
fn validate_command(name: &str) -> Result<(), NameError> {
    validate(name)?;
    if name.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(NameError::Uppercase(name.to_string()));
    }
    Ok(())
}

macro_rules! name_newtype {
    ($(#[$meta:meta])* $ty:ident, $validate:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $ty(String);

        impl $ty {
            /// Validate and wrap a name.
            pub fn new(name: &str) -> Result<Self, NameError> {
                $validate(name)?;
                Ok(Self(name.to_string()))
            }

            /// Return the name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::ops::Deref for $ty {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $ty {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $ty {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $ty {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl TryFrom<String> for $ty {
            type Error = NameError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                $validate(&s)?;
                Ok(Self(s))
            }
        }

        impl TryFrom<&str> for $ty {
            type Error = NameError;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl FromStr for $ty {
            type Err = NameError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl From<$ty> for String {
            fn from(name: $ty) -> Self {
                name.0
            }
        }
    };
}

name_newtype! {
    /// The name of a pack, unique within a scope.
    PackName, validate
}

name_newtype! {
    /// The name of a command, unique within its pack.
    CommandName, validate_command
}

impl PackName {
    /// The reserved pack of compiled-in commands.
    pub fn base() -> Self {
        Self(BASE_PACK.to_string())
    }

    /// The reserved pack of project-local commands.
    pub fn local() -> Self {
        Self(LOCAL_PACK.to_string())
    }

    /// Whether this is the reserved `base` pack.
    pub fn is_base(&self) -> bool {
        self.0 == BASE_PACK
    }

    /// Whether this is the reserved `local` pack.
    pub fn is_local(&self) -> bool {
        self.0 == LOCAL_PACK
    }

    /// Whether the name collides with the scope's `res/` directory, which
    /// no pack may occupy.
    pub fn is_res(&self) -> bool {
        self.0 == RES_DIR
    }

    /// Whether this pack is neither `base` nor `local`.
    pub fn is_installed(&self) -> bool {
        !self.is_base() && !self.is_local()
    }
}

impl CommandName {
    /// The symbol a command script must declare: the name with its first
    /// character upper-cased (`do_thing` -> `Do_thing`).
    pub fn symbol(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Derive a command name from a declared symbol (`Ping` -> `ping`).
    pub fn from_symbol(symbol: &str) -> Result<Self, NameError> {
        Self::new(&symbol.to_lowercase())
    }

    /// File name of this command's script with the given extension.
    pub fn file_name(&self, ext: &str) -> String {
        if ext.is_empty() {
            self.0.clone()
        } else {
            format!("{}.{ext}", self.0)
        }
    }
}

/// A user-supplied command reference, optionally qualified with its pack
/// (`pack:command` or a bare `command`).
///
/// # Example
///
/// ```
/// use otto_schema::QualifiedName;
///
/// let name: QualifiedName = "tools:ping".parse().unwrap();
/// assert_eq!(name.pack.as_deref(), Some("tools"));
/// assert_eq!(name.command.as_str(), "ping");
///
/// let bare: QualifiedName = "ping".parse().unwrap();
/// assert!(bare.pack.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// Explicit pack, if the name was qualified.
    pub pack: Option<PackName>,
    /// Command name.
    pub command: CommandName,
}

impl FromStr for QualifiedName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(SEPARATOR) {
            Some((pack, command)) => Ok(Self {
                pack: Some(PackName::new(pack)?),
                command: CommandName::new(command)?,
            }),
            None => Ok(Self {
                pack: None,
                command: CommandName::new(s)?,
            }),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pack {
            Some(pack) => write!(f, "{pack}{SEPARATOR}{}", self.command),
            None => write!(f, "{}", self.command),
        }
    }
}
