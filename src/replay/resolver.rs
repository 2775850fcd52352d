//! Resolver strategy for mapping live requests to recorded interactions

use crate::intercept::LiveRequest;
use crate::storage::Interaction;

/// Strategy deciding which recorded interaction answers a live request.
///
/// The session controller computes the default sequential result first
/// (see [`MockTable::resolve_default`](super::MockTable::resolve_default))
/// and then hands it to the active strategy along with the request and the
/// full manifest-ordered mock list. A caller-supplied strategy composes
/// with the default by post-processing `default`: return it unchanged,
/// replace it with another candidate, or return `None` to force network
/// fallthrough.
pub trait ResolveMock {
    /// Pick the interaction to serve, or `None` for network fallthrough
    fn resolve(
        &self,
        request: &LiveRequest,
        candidates: &[Interaction],
        default: Option<&Interaction>,
    ) -> Option<Interaction>;
}

/// Default strategy: serve whatever the sequential algorithm resolved
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialResolver;

impl ResolveMock for SequentialResolver {
    fn resolve(
        &self,
        _request: &LiveRequest,
        _candidates: &[Interaction],
        default: Option<&Interaction>,
    ) -> Option<Interaction> {
        default.cloned()
    }
}

struct FnResolver<F>(F);

impl<F> ResolveMock for FnResolver<F>
where
    F: Fn(&LiveRequest, &[Interaction], Option<&Interaction>) -> Option<Interaction>,
{
    fn resolve(
        &self,
        request: &LiveRequest,
        candidates: &[Interaction],
        default: Option<&Interaction>,
    ) -> Option<Interaction> {
        (self.0)(request, candidates, default)
    }
}

/// Wrap a closure as a resolver override, ready for
/// [`SessionOptions::resolver`](crate::config::SessionOptions)
pub fn resolver_fn<F>(f: F) -> Box<dyn ResolveMock + Send>
where
    F: Fn(&LiveRequest, &[Interaction], Option<&Interaction>) -> Option<Interaction>
        + Send
        + 'static,
{
    Box::new(FnResolver(f))
}
