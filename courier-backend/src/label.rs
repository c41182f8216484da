//! Short names for backends.
//!
//! The provider attaches a backend's name to its dispatch span and its
//! `Debug` output, so a log line tells which transport served a request.

use smol_str::SmolStr;
use std::fmt;

/// Name a [`Backend`](crate::Backend) reports about itself.
///
/// Names are short and usually static, such as `"reqwest"` or `"stub"`.
///
/// ```
/// use courier_backend::BackendLabel;
///
/// let name = BackendLabel::from("stub");
/// assert_eq!(name.to_string(), "stub");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BackendLabel(SmolStr);

impl BackendLabel {
    /// Names a backend from any string-like value.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    /// Names a backend at compile time.
    pub const fn new_static(name: &'static str) -> Self {
        Self(SmolStr::new_static(name))
    }

    /// The name as text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BackendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for BackendLabel {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for BackendLabel {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl AsRef<str> for BackendLabel {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
