//! Version ranges for package dependencies
//!
//! Supported syntax:
//! - `1.0` - minimum version, inclusive: >=1.0.0
//! - `[1.0]` - exact version
//! - `[1.0, 2.0)`, `(1.0,)`, `(, 2.0]` - interval notation with open or closed ends
//! - `1.*`, `1.2.*`, `*` - floating on minor, patch, or any version
//! - `1.0.0-*` - floating on prerelease: >=1.0.0-0, prerelease versions allowed

use std::fmt;
use std::str::FromStr;

use semver::Version;

use crate::error::RangeParseError;
use crate::version::semver::parse_version;

/// Which part of the version a floating range leaves open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatBehavior {
    /// `1.0.0-*`: any version at or above the floor, prereleases included
    Prerelease,
    /// `1.2.*`: major and minor fixed
    Patch,
    /// `1.*`: major fixed
    Minor,
    /// `*`: anything
    Major,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    min: Option<Version>,
    min_inclusive: bool,
    max: Option<Version>,
    max_inclusive: bool,
    float: Option<FloatBehavior>,
}

impl VersionRange {
    /// A range accepting every release version
    pub fn all() -> Self {
        Self {
            min: None,
            min_inclusive: false,
            max: None,
            max_inclusive: false,
            float: None,
        }
    }

    /// `>= version`
    pub fn at_least(version: Version) -> Self {
        Self {
            min: Some(version),
            min_inclusive: true,
            ..Self::all()
        }
    }

    /// `[version]`
    pub fn exact(version: Version) -> Self {
        Self {
            min: Some(version.clone()),
            min_inclusive: true,
            max: Some(version),
            max_inclusive: true,
            float: None,
        }
    }

    pub fn min(&self) -> Option<&Version> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&Version> {
        self.max.as_ref()
    }

    pub fn float(&self) -> Option<FloatBehavior> {
        self.float
    }

    /// Returns true if the range has a floor and no ceiling
    pub fn is_open_ended(&self) -> bool {
        self.max.is_none()
    }

    fn allows_prerelease(&self) -> bool {
        self.float == Some(FloatBehavior::Prerelease)
            || self.min.as_ref().is_some_and(|v| !v.pre.is_empty())
            || self.max.as_ref().is_some_and(|v| !v.pre.is_empty())
    }

    /// Check if a version satisfies this range
    pub fn satisfies(&self, version: &Version) -> bool {
        if !version.pre.is_empty() && !self.allows_prerelease() {
            return false;
        }

        if let Some(min) = &self.min {
            let above = if self.min_inclusive {
                version >= min
            } else {
                version > min
            };
            if !above {
                return false;
            }
        }

        if let Some(max) = &self.max {
            let below = if self.max_inclusive {
                version <= max
            } else {
                version < max
            };
            if !below {
                return false;
            }
        }

        match (self.float, &self.min) {
            (Some(FloatBehavior::Minor), Some(floor)) => version.major == floor.major,
            (Some(FloatBehavior::Patch), Some(floor)) => {
                version.major == floor.major && version.minor == floor.minor
            }
            _ => true,
        }
    }

    fn parse_float(text: &str) -> Result<Option<Self>, RangeParseError> {
        let error = || RangeParseError(text.to_string());

        if text == "*" {
            return Ok(Some(Self {
                min: Some(Version::new(0, 0, 0)),
                min_inclusive: true,
                float: Some(FloatBehavior::Major),
                ..Self::all()
            }));
        }

        if let Some(base) = text.strip_suffix("-*") {
            let floor = parse_version(&format!("{base}-0")).ok_or_else(error)?;
            return Ok(Some(Self {
                min: Some(floor),
                min_inclusive: true,
                float: Some(FloatBehavior::Prerelease),
                ..Self::all()
            }));
        }

        if let Some(prefix) = text.strip_suffix(".*") {
            let float = match prefix.split('.').count() {
                1 => FloatBehavior::Minor,
                2 => FloatBehavior::Patch,
                _ => return Err(error()),
            };
            let floor = parse_version(prefix).ok_or_else(error)?;
            return Ok(Some(Self {
                min: Some(floor),
                min_inclusive: true,
                float: Some(float),
                ..Self::all()
            }));
        }

        Ok(None)
    }

    fn parse_interval(text: &str) -> Result<Self, RangeParseError> {
        let error = || RangeParseError(text.to_string());

        let min_inclusive = match text.chars().next() {
            Some('[') => true,
            Some('(') => false,
            _ => return Err(error()),
        };
        let max_inclusive = match text.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(error()),
        };
        let inner = &text[1..text.len() - 1];

        let Some((lower, upper)) = inner.split_once(',') else {
            // [1.0] is the only form without a comma
            if !(min_inclusive && max_inclusive) {
                return Err(error());
            }
            let version = parse_version(inner).ok_or_else(error)?;
            return Ok(Self::exact(version));
        };

        let parse_bound = |bound: &str| -> Result<Option<Version>, RangeParseError> {
            let bound = bound.trim();
            if bound.is_empty() {
                Ok(None)
            } else {
                parse_version(bound).map(Some).ok_or_else(error)
            }
        };

        let min = parse_bound(lower)?;
        let max = parse_bound(upper)?;

        if let (Some(min), Some(max)) = (&min, &max) {
            let empty = min > max || (min == max && !(min_inclusive && max_inclusive));
            if empty {
                return Err(error());
            }
        }

        Ok(Self {
            min_inclusive: min_inclusive && min.is_some(),
            max_inclusive: max_inclusive && max.is_some(),
            min,
            max,
            float: None,
        })
    }
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::all()
    }
}

impl FromStr for VersionRange {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(RangeParseError(s.to_string()));
        }

        if text.starts_with('[') || text.starts_with('(') {
            return Self::parse_interval(text);
        }

        if let Some(range) = Self::parse_float(text)? {
            return Ok(range);
        }

        parse_version(text)
            .map(Self::at_least)
            .ok_or_else(|| RangeParseError(s.to_string()))
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.float, &self.min) {
            (Some(FloatBehavior::Major), _) => return write!(f, "*"),
            (Some(FloatBehavior::Minor), Some(floor)) => return write!(f, "{}.*", floor.major),
            (Some(FloatBehavior::Patch), Some(floor)) => {
                return write!(f, "{}.{}.*", floor.major, floor.minor);
            }
            (Some(FloatBehavior::Prerelease), Some(floor)) => {
                return write!(f, "{}.{}.{}-*", floor.major, floor.minor, floor.patch);
            }
            _ => {}
        }

        if let (Some(min), Some(max)) = (&self.min, &self.max)
            && min == max
            && self.min_inclusive
            && self.max_inclusive
        {
            return write!(f, "[{min}]");
        }

        let open = if self.min_inclusive { '[' } else { '(' };
        let close = if self.max_inclusive { ']' } else { ')' };
        let min = self.min.as_ref().map(|v| v.to_string()).unwrap_or_default();
        let max = self.max.as_ref().map(|v| v.to_string()).unwrap_or_default();
        write!(f, "{open}{min}, {max}{close}")
    }
}
