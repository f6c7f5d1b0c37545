//! Target framework model and framework compatibility
//!
//! Frameworks are written either in short folder form (`net45`, `netstandard1.3`,
//! `netcoreapp2.1`, `dnxcore50`, `uap10.0`, `any`) or in long form
//! (`.NETFramework,Version=v4.5`).

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::error::FrameworkParseError;

static SHORT_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(netstandard|netcoreapp|dnxcore|net|uap|any)(\d+(?:\.\d+)*)?$").unwrap()
});

static LONG_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)([.a-z]+)\s*,\s*Version=v?(\d+(?:\.\d+)*)$").unwrap());

/// Family of a target framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameworkIdentifier {
    /// Full desktop framework (net45, net461)
    NetFramework,
    NetStandard,
    NetCoreApp,
    DnxCore,
    Uap,
    /// Framework-agnostic assets
    Any,
}

impl FrameworkIdentifier {
    /// Returns the short folder name prefix of the framework family
    pub fn short_name(&self) -> &'static str {
        match self {
            FrameworkIdentifier::NetFramework => "net",
            FrameworkIdentifier::NetStandard => "netstandard",
            FrameworkIdentifier::NetCoreApp => "netcoreapp",
            FrameworkIdentifier::DnxCore => "dnxcore",
            FrameworkIdentifier::Uap => "uap",
            FrameworkIdentifier::Any => "any",
        }
    }

    fn from_short_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "net" => Some(FrameworkIdentifier::NetFramework),
            "netstandard" => Some(FrameworkIdentifier::NetStandard),
            "netcoreapp" => Some(FrameworkIdentifier::NetCoreApp),
            "dnxcore" => Some(FrameworkIdentifier::DnxCore),
            "uap" => Some(FrameworkIdentifier::Uap),
            "any" => Some(FrameworkIdentifier::Any),
            _ => None,
        }
    }

    fn from_long_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            ".netframework" => Some(FrameworkIdentifier::NetFramework),
            ".netstandard" => Some(FrameworkIdentifier::NetStandard),
            ".netcoreapp" => Some(FrameworkIdentifier::NetCoreApp),
            "dnxcore" => Some(FrameworkIdentifier::DnxCore),
            "uap" => Some(FrameworkIdentifier::Uap),
            _ => None,
        }
    }

    /// Short names of these families pack version digits without dots (net451, dnxcore50)
    fn uses_condensed_version(&self) -> bool {
        matches!(
            self,
            FrameworkIdentifier::NetFramework | FrameworkIdentifier::DnxCore
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NuGetFramework {
    identifier: FrameworkIdentifier,
    version: Version,
}

impl NuGetFramework {
    pub fn new(identifier: FrameworkIdentifier, version: Version) -> Self {
        Self {
            identifier,
            version,
        }
    }

    /// The framework-agnostic `any` framework
    pub fn any() -> Self {
        Self::new(FrameworkIdentifier::Any, Version::new(0, 0, 0))
    }

    pub fn identifier(&self) -> FrameworkIdentifier {
        self.identifier
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Returns true for the full desktop framework profile
    pub fn is_desktop(&self) -> bool {
        self.identifier == FrameworkIdentifier::NetFramework
    }

    /// Highest netstandard version this framework can consume, if any
    fn supported_netstandard(&self) -> Option<Version> {
        let v = &self.version;
        let at_least = |major, minor, patch| *v >= Version::new(major, minor, patch);

        let supported = match self.identifier {
            FrameworkIdentifier::NetFramework if at_least(4, 6, 1) => (2, 0),
            FrameworkIdentifier::NetFramework if at_least(4, 6, 0) => (1, 3),
            FrameworkIdentifier::NetFramework if at_least(4, 5, 1) => (1, 2),
            FrameworkIdentifier::NetFramework if at_least(4, 5, 0) => (1, 1),
            FrameworkIdentifier::NetCoreApp if at_least(3, 0, 0) => (2, 1),
            FrameworkIdentifier::NetCoreApp if at_least(2, 0, 0) => (2, 0),
            FrameworkIdentifier::NetCoreApp if at_least(1, 0, 0) => (1, 6),
            FrameworkIdentifier::DnxCore if at_least(5, 0, 0) => (1, 5),
            FrameworkIdentifier::Uap if at_least(10, 0, 0) => (1, 4),
            _ => return None,
        };
        Some(Version::new(supported.0, supported.1, 0))
    }

    /// Check whether assets built for `candidate` can be consumed by this framework
    pub fn is_compatible_with(&self, candidate: &NuGetFramework) -> bool {
        match candidate.identifier {
            FrameworkIdentifier::Any => true,
            identifier if identifier == self.identifier => candidate.version <= self.version,
            FrameworkIdentifier::NetStandard => self
                .supported_netstandard()
                .is_some_and(|supported| candidate.version <= supported),
            _ => false,
        }
    }

    /// Precedence of a compatible candidate: same family first, then netstandard, then any
    fn precedence(&self, candidate: &NuGetFramework) -> u8 {
        if candidate.identifier == self.identifier {
            0
        } else if candidate.identifier == FrameworkIdentifier::NetStandard {
            1
        } else {
            2
        }
    }

    fn parse_version_digits(
        identifier: FrameworkIdentifier,
        digits: &str,
    ) -> Result<Version, FrameworkParseError> {
        let error = || FrameworkParseError(digits.to_string());

        let parts: Vec<u64> = if digits.contains('.') {
            digits
                .split('.')
                .map(|p| p.parse::<u64>().map_err(|_| error()))
                .collect::<Result<_, _>>()?
        } else if identifier.uses_condensed_version() {
            digits
                .chars()
                .map(|c| c.to_digit(10).map(u64::from).ok_or_else(error))
                .collect::<Result<_, _>>()?
        } else {
            vec![digits.parse::<u64>().map_err(|_| error())?]
        };

        match parts.as_slice() {
            [major] => Ok(Version::new(*major, 0, 0)),
            [major, minor] => Ok(Version::new(*major, *minor, 0)),
            [major, minor, patch] | [major, minor, patch, 0] => {
                Ok(Version::new(*major, *minor, *patch))
            }
            _ => Err(error()),
        }
    }
}

/// Select the item whose framework is the nearest compatible match for `target`
///
/// Nearest means: same framework family first, then netstandard, then `any`; within a
/// precedence level the highest compatible version wins. Remaining ties are broken by
/// the framework's short name so the choice is total and deterministic.
pub fn get_nearest<T, I, F>(target: &NuGetFramework, items: I, framework_of: F) -> Option<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> &NuGetFramework,
{
    items
        .into_iter()
        .filter(|item| target.is_compatible_with(framework_of(item)))
        .min_by_key(|item| {
            let framework = framework_of(item);
            (
                target.precedence(framework),
                Reverse(framework.version.clone()),
                framework.to_string(),
            )
        })
}

impl FromStr for NuGetFramework {
    type Err = FrameworkParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let error = || FrameworkParseError(s.to_string());

        if let Some(captures) = LONG_NAME_RE.captures(name) {
            let identifier = FrameworkIdentifier::from_long_name(&captures[1]).ok_or_else(error)?;
            let version = Self::parse_version_digits(identifier, &captures[2])?;
            return Ok(Self::new(identifier, version));
        }

        let captures = SHORT_NAME_RE.captures(name).ok_or_else(error)?;
        let identifier = FrameworkIdentifier::from_short_name(&captures[1]).ok_or_else(error)?;

        match (identifier, captures.get(2)) {
            (FrameworkIdentifier::Any, None) => Ok(Self::any()),
            (FrameworkIdentifier::Any, Some(_)) | (_, None) => Err(error()),
            (identifier, Some(digits)) => {
                let version = Self::parse_version_digits(identifier, digits.as_str())?;
                // net5.0 and later are netcoreapp under a shorter name
                if identifier == FrameworkIdentifier::NetFramework
                    && digits.as_str().contains('.')
                    && version.major >= 5
                {
                    return Ok(Self::new(FrameworkIdentifier::NetCoreApp, version));
                }
                Ok(Self::new(identifier, version))
            }
        }
    }
}

impl fmt::Display for NuGetFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = &self.version;
        match self.identifier {
            FrameworkIdentifier::Any => write!(f, "any"),
            identifier if identifier.uses_condensed_version() && v.minor < 10 && v.patch < 10 => {
                write!(f, "{}{}{}", identifier.short_name(), v.major, v.minor)?;
                if v.patch > 0 {
                    write!(f, "{}", v.patch)?;
                }
                Ok(())
            }
            FrameworkIdentifier::NetCoreApp if v.major >= 5 => {
                write!(f, "net{}.{}", v.major, v.minor)?;
                if v.patch > 0 {
                    write!(f, ".{}", v.patch)?;
                }
                Ok(())
            }
            identifier => {
                write!(f, "{}{}.{}", identifier.short_name(), v.major, v.minor)?;
                if v.patch > 0 {
                    write!(f, ".{}", v.patch)?;
                }
                Ok(())
            }
        }
    }
}
