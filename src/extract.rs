//! Per-location raw value lookup.
//!
//! Each non-body location gets one [`LocationSource`] implementation. Sources only
//! report presence; they never coerce and never fail. The body has its own
//! pipeline in [`crate::body`].

use crate::request::BindRequest;
use crate::spec::ParameterLocation;

/// Lookup capability for one location of a request borrowed for `'r`.
pub trait LocationSource<'r> {
    fn location(&self) -> ParameterLocation;

    /// Raw text for `name`, or `None` when the location does not carry it.
    fn try_get(&self, name: &str) -> Option<&'r str>;
}

/// Path variables supplied by the router.
pub struct PathSource<'r>(pub &'r BindRequest);

/// Decoded query string; the first occurrence of a repeated name wins.
pub struct QuerySource<'r>(pub &'r BindRequest);

/// Request headers, matched case-insensitively; the first occurrence wins.
pub struct HeaderSource<'r>(pub &'r BindRequest);

impl<'r> LocationSource<'r> for PathSource<'r> {
    fn location(&self) -> ParameterLocation {
        ParameterLocation::Path
    }

    fn try_get(&self, name: &str) -> Option<&'r str> {
        let request: &'r BindRequest = self.0;
        request.get_path_param(name)
    }
}

impl<'r> LocationSource<'r> for QuerySource<'r> {
    fn location(&self) -> ParameterLocation {
        ParameterLocation::Query
    }

    fn try_get(&self, name: &str) -> Option<&'r str> {
        let request: &'r BindRequest = self.0;
        request.get_query_param(name)
    }
}

impl<'r> LocationSource<'r> for HeaderSource<'r> {
    fn location(&self) -> ParameterLocation {
        ParameterLocation::Header
    }

    fn try_get(&self, name: &str) -> Option<&'r str> {
        let request: &'r BindRequest = self.0;
        request.get_header(name)
    }
}

/// The three scalar sources of one request, selected by location.
pub struct Sources<'r> {
    path: PathSource<'r>,
    query: QuerySource<'r>,
    header: HeaderSource<'r>,
}

impl<'r> Sources<'r> {
    pub fn new(request: &'r BindRequest) -> Self {
        Self {
            path: PathSource(request),
            query: QuerySource(request),
            header: HeaderSource(request),
        }
    }

    /// Source for a scalar location; `None` for [`ParameterLocation::Body`].
    pub fn for_location(&self, location: ParameterLocation) -> Option<&dyn LocationSource<'r>> {
        match location {
            ParameterLocation::Path => Some(&self.path),
            ParameterLocation::Query => Some(&self.query),
            ParameterLocation::Header => Some(&self.header),
            ParameterLocation::Body => None,
        }
    }

    /// Raw value of `(name, location)`, looked up through that location's source.
    pub fn try_get(&self, name: &str, location: ParameterLocation) -> Option<&'r str> {
        self.for_location(location).and_then(|source| source.try_get(name))
    }
}
