// Copyright 2025 Cowboy AI, LLC.

//! Named value patterns
//!
//! A [`PatternKind`] names a reusable value shape. Kinds backed by a regular
//! expression are compiled once, when a rule is registered; the remaining
//! kinds are checked semantically (parsing, filesystem lookups).

use crate::errors::{DomainError, DomainResult};
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+-]+@(?:[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$";
const URL_PATTERN: &str = r"(?i)^(?:https?|ftps?|wss?|ssh|git)://[^\s/?#@]+(?:@[^\s/?#]+)?(?:[/?#]\S*)?$";
const USERNAME_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9_-]{2,31}$";
const ALPHANUMERIC_PATTERN: &str = r"^[A-Za-z0-9]+$";
const INTEGER_PATTERN: &str = r"^[+-]?[0-9]+$";

const MIN_PASSWORD_LEN: usize = 8;

/// Named value shapes a validator rule can refer to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// `local@domain.tld`, no leading, trailing or doubled dots
    Email,
    /// Recognized scheme followed by a non-empty authority
    Url,
    /// Any filesystem path
    Path,
    /// A path naming a regular file
    File,
    /// A path naming a directory
    Dir,
    /// Letter first, then 3-32 letters, digits, `_` or `-`
    Username,
    /// At least 8 characters mixing upper case, lower case and digits
    Password,
    /// Dotted-quad IPv4 address
    Ipv4,
    /// TCP/UDP port, 1-65535
    Port,
    /// Hyphenated or simple UUID
    Uuid,
    /// ASCII letters and digits only
    Alphanumeric,
    /// Optionally signed decimal integer
    Integer,
}

impl PatternKind {
    /// Every named pattern
    pub const ALL: [PatternKind; 12] = [
        PatternKind::Email,
        PatternKind::Url,
        PatternKind::Path,
        PatternKind::File,
        PatternKind::Dir,
        PatternKind::Username,
        PatternKind::Password,
        PatternKind::Ipv4,
        PatternKind::Port,
        PatternKind::Uuid,
        PatternKind::Alphanumeric,
        PatternKind::Integer,
    ];

    /// The name rules use to refer to this pattern
    pub fn name(&self) -> &'static str {
        match self {
            PatternKind::Email => "email",
            PatternKind::Url => "url",
            PatternKind::Path => "path",
            PatternKind::File => "file",
            PatternKind::Dir => "dir",
            PatternKind::Username => "username",
            PatternKind::Password => "password",
            PatternKind::Ipv4 => "ipv4",
            PatternKind::Port => "port",
            PatternKind::Uuid => "uuid",
            PatternKind::Alphanumeric => "alphanumeric",
            PatternKind::Integer => "integer",
        }
    }

    /// Whether values of this kind name filesystem entries
    pub fn is_path(&self) -> bool {
        matches!(self, PatternKind::Path | PatternKind::File | PatternKind::Dir)
    }

    fn regex_source(&self) -> Option<&'static str> {
        match self {
            PatternKind::Email => Some(EMAIL_PATTERN),
            PatternKind::Url => Some(URL_PATTERN),
            PatternKind::Username => Some(USERNAME_PATTERN),
            PatternKind::Alphanumeric => Some(ALPHANUMERIC_PATTERN),
            PatternKind::Integer => Some(INTEGER_PATTERN),
            _ => None,
        }
    }

    /// Compile the regular expression behind this kind, if it has one
    pub(crate) fn compile(&self) -> DomainResult<Option<Regex>> {
        self.regex_source()
            .map(|source| {
                Regex::new(source).map_err(|e| {
                    DomainError::internal(format!("invalid '{}' pattern: {e}", self.name()))
                })
            })
            .transpose()
    }

    /// Value as it should be stored once accepted
    pub(crate) fn normalize(&self, value: &str) -> String {
        match self {
            PatternKind::Email => value.trim().to_lowercase(),
            _ => value.to_string(),
        }
    }

    /// Check a value, returning the reason it was rejected
    ///
    /// `matcher` is the compiled expression for regex-backed kinds.
    /// `must_exist` asks path kinds to consult the filesystem.
    pub(crate) fn check(
        &self,
        value: &str,
        matcher: Option<&Regex>,
        must_exist: bool,
    ) -> Result<(), String> {
        if let Some(re) = matcher {
            let candidate = match self {
                PatternKind::Email => value.trim(),
                _ => value,
            };
            if !re.is_match(candidate) {
                return Err(self.expectation().to_string());
            }
        }

        match self {
            PatternKind::Email => check_email_dots(value.trim()),
            PatternKind::Path | PatternKind::File | PatternKind::Dir => {
                self.check_path(value, must_exist)
            }
            PatternKind::Password => check_password(value),
            PatternKind::Ipv4 => Ipv4Addr::from_str(value)
                .map(|_| ())
                .map_err(|_| self.expectation().to_string()),
            PatternKind::Port if !value.bytes().all(|b| b.is_ascii_digit()) => {
                Err(self.expectation().to_string())
            }
            PatternKind::Port => match value.parse::<u16>() {
                Ok(port) if port > 0 => Ok(()),
                _ => Err(self.expectation().to_string()),
            },
            PatternKind::Uuid => uuid::Uuid::parse_str(value)
                .map(|_| ())
                .map_err(|_| self.expectation().to_string()),
            PatternKind::Url
            | PatternKind::Username
            | PatternKind::Alphanumeric
            | PatternKind::Integer => Ok(()),
        }
    }

    fn expectation(&self) -> &'static str {
        match self {
            PatternKind::Email => "expected an address like local@domain.tld",
            PatternKind::Url => "expected a URL with a recognized scheme and a host",
            PatternKind::Path | PatternKind::File | PatternKind::Dir => "expected a path",
            PatternKind::Username => {
                "expected 3-32 letters, digits, '_' or '-', starting with a letter"
            }
            PatternKind::Password => {
                "expected at least 8 characters with upper case, lower case and a digit"
            }
            PatternKind::Ipv4 => "expected a dotted-quad IPv4 address",
            PatternKind::Port => "expected a port between 1 and 65535",
            PatternKind::Uuid => "expected a UUID",
            PatternKind::Alphanumeric => "expected letters and digits only",
            PatternKind::Integer => "expected an integer",
        }
    }

    fn check_path(&self, value: &str, must_exist: bool) -> Result<(), String> {
        if value.trim().is_empty() || value.contains('\0') {
            return Err(self.expectation().to_string());
        }
        if !must_exist {
            return Ok(());
        }

        let path = std::path::Path::new(value);
        match self {
            PatternKind::File if !path.is_file() => Err(format!("file '{value}' does not exist")),
            PatternKind::Dir if !path.is_dir() => {
                Err(format!("directory '{value}' does not exist"))
            }
            _ if !path.exists() => Err(format!("path '{value}' does not exist")),
            _ => Ok(()),
        }
    }
}

fn check_email_dots(value: &str) -> Result<(), String> {
    let Some((local, domain)) = value.rsplit_once('@') else {
        return Err(PatternKind::Email.expectation().to_string());
    };
    let dotted_badly =
        |part: &str| part.starts_with('.') || part.ends_with('.') || part.contains("..");
    if dotted_badly(local) || dotted_badly(domain) {
        return Err("email parts cannot start or end with a dot or contain '..'".to_string());
    }
    Ok(())
}

fn check_password(value: &str) -> Result<(), String> {
    let strong = value.chars().count() >= MIN_PASSWORD_LEN
        && value.chars().any(|c| c.is_uppercase())
        && value.chars().any(|c| c.is_lowercase())
        && value.chars().any(|c| c.is_ascii_digit());
    if strong {
        Ok(())
    } else {
        Err(PatternKind::Password.expectation().to_string())
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PatternKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PatternKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| DomainError::validation(format!("unknown pattern '{s}'")))
    }
}
