//! Declarative description of an API call.

use std::borrow::Cow;

use http::{HeaderMap, Method};
use url::Url;

use crate::encoding::ParameterEncoding;
use crate::parameter::Parameters;
use crate::sample::StubResponse;

/// A single API call, described as data.
///
/// Only [`base_url`](Target::base_url) and [`path`](Target::path) are
/// required; everything else has a default.
///
/// ```
/// use std::borrow::Cow;
/// use courier_core::{Method, Target, Url};
///
/// struct Zen;
///
/// impl Target for Zen {
///     fn base_url(&self) -> Url {
///         Url::parse("https://api.github.com").unwrap()
///     }
///
///     fn path(&self) -> Cow<'_, str> {
///         Cow::Borrowed("/zen")
///     }
/// }
///
/// assert_eq!(Zen.method(), Method::GET);
/// assert_eq!(Zen.full_url().as_str(), "https://api.github.com/zen");
/// ```
pub trait Target: Send + Sync + 'static {
    /// Base URL shared by a family of targets.
    fn base_url(&self) -> Url;

    /// Path appended to [`base_url`](Target::base_url).
    fn path(&self) -> Cow<'_, str>;

    /// HTTP method. Defaults to `GET`.
    fn method(&self) -> Method {
        Method::GET
    }

    /// Header fields. Defaults to none.
    fn headers(&self) -> HeaderMap {
        HeaderMap::new()
    }

    /// Parameters. Defaults to none.
    fn parameters(&self) -> Parameters {
        Parameters::new()
    }

    /// How [`parameters`](Target::parameters) are encoded. Defaults to
    /// [`ParameterEncoding::Url`].
    fn parameter_encoding(&self) -> ParameterEncoding {
        ParameterEncoding::Url
    }

    /// Request URL: the base URL with each non-empty segment of the path
    /// appended.
    fn full_url(&self) -> Url {
        let mut url = self.base_url();
        let path = self.path();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(path.split('/').filter(|segment| !segment.is_empty()));
        }
        url
    }

    /// Canned response used by stub backends when no rule matches.
    fn sample_response(&self) -> Option<StubResponse> {
        None
    }
}
