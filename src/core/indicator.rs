//! # Indicator identifiers.
//!
//! An owner may carry several busy flags; [`IndicatorId`] tells them apart.
//! Ids are only unique within one owner's scope.
//!
//! ## Rules
//! - An omitted id (`None`) always resolves to [`IndicatorId::DEFAULT`], so two
//!   calls that both omit the id share one flag.
//! - Names and indices never compare equal to each other (`Name("1") != Index(1)`).

use std::borrow::Cow;
use std::fmt;

/// Identifier of one busy flag under an owner.
///
/// Use [`IndicatorId::Index`] for enum-like indicators and
/// [`IndicatorId::Name`] for free-form labels.
///
/// ## Example
/// ```rust
/// use loadvisor::IndicatorId;
///
/// #[derive(Clone, Copy)]
/// enum Spinner { Search = 0, Save = 1 }
///
/// impl From<Spinner> for IndicatorId {
///     fn from(s: Spinner) -> Self { IndicatorId::Index(s as u32) }
/// }
///
/// assert_eq!(IndicatorId::from(Spinner::Save), IndicatorId::Index(1));
/// assert_eq!(IndicatorId::from("load"), IndicatorId::name("load"));
/// assert_ne!(IndicatorId::from(Spinner::Search), IndicatorId::DEFAULT);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorId {
    /// Named indicator.
    Name(Cow<'static, str>),
    /// Numeric indicator (typically an enum discriminant).
    Index(u32),
}

impl IndicatorId {
    /// Reserved id substituted when the caller omits one.
    pub const DEFAULT: IndicatorId = IndicatorId::Name(Cow::Borrowed("_DEFAULT"));

    /// Creates a named indicator.
    pub fn name(name: impl Into<Cow<'static, str>>) -> Self {
        IndicatorId::Name(name.into())
    }

    /// Returns `id` if provided, else [`IndicatorId::DEFAULT`].
    #[inline]
    pub fn resolve(id: Option<IndicatorId>) -> IndicatorId {
        id.unwrap_or(IndicatorId::DEFAULT)
    }

    /// True for the reserved default id.
    #[inline]
    pub fn is_default(&self) -> bool {
        *self == IndicatorId::DEFAULT
    }
}

impl Default for IndicatorId {
    fn default() -> Self {
        IndicatorId::DEFAULT
    }
}

impl fmt::Display for IndicatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorId::Name(name) => f.write_str(name),
            IndicatorId::Index(idx) => write!(f, "#{idx}"),
        }
    }
}

impl From<&'static str> for IndicatorId {
    fn from(name: &'static str) -> Self {
        IndicatorId::Name(Cow::Borrowed(name))
    }
}

impl From<String> for IndicatorId {
    fn from(name: String) -> Self {
        IndicatorId::Name(Cow::Owned(name))
    }
}

impl From<u32> for IndicatorId {
    fn from(idx: u32) -> Self {
        IndicatorId::Index(idx)
    }
}
