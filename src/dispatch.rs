//! Request dispatch.
//!
//! Per request: match every registered pattern, rank the candidates,
//! attach the winning values to the request context and invoke the
//! handler. A miss and an ambiguous match are ordinary outcomes; the only
//! error here is host misconfiguration, raised synchronously before any
//! matching happens.

use std::{
    fmt::{self, Display, Formatter},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use http::Extensions;

use crate::{
    endpoint::{Endpoint, HandlerResult},
    error::ConfigError,
    registry::EndpointRegistry,
    select::{select, MatchCandidate, Selection},
    value_map::RouteValueMap,
};

/// A cancellation signal shared between the host and an in-flight request.
///
/// The host keeps a clone and cancels it when the client goes away; the
/// dispatcher checks it once, after selection and before handler
/// invocation.
#[derive(Debug, Default, Clone)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    /// Creates a signal in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the signal cancelled.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether the signal has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The per-request context handed to handlers.
///
/// Exclusively owned by one request: created by the host, filled in by the
/// dispatcher on a successful match, consumed by the handler.
pub struct RouteContext {
    path: String,
    values: RouteValueMap,
    endpoint: Option<Arc<Endpoint>>,
    cancel: CancelSignal,
    extensions: Extensions,
}

impl RouteContext {
    /// Creates a context for a request path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            values: RouteValueMap::new(),
            endpoint: None,
            cancel: CancelSignal::new(),
            extensions: Extensions::new(),
        }
    }

    /// Attaches a cancellation signal.
    #[must_use]
    pub fn with_cancel_signal(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// The request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The route values produced by the winning match; empty until the
    /// dispatcher selects an endpoint.
    pub fn values(&self) -> &RouteValueMap {
        &self.values
    }

    /// The matched endpoint, set by the dispatcher.
    pub fn endpoint(&self) -> Option<&Arc<Endpoint>> {
        self.endpoint.as_ref()
    }

    /// Whether the request was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Ambient per-request data.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable access to the ambient per-request data.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    pub(crate) fn set_matched(&mut self, endpoint: Arc<Endpoint>, values: RouteValueMap) {
        self.endpoint = Some(endpoint);
        self.values = values;
    }
}

impl fmt::Debug for RouteContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteContext")
            .field("path", &self.path)
            .field("values", &self.values)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// The host's view of the services the dispatcher needs.
///
/// The host builds and freezes the registry during startup and exposes it
/// here; `None` means the build phase has not completed, which the
/// dispatcher reports as [`ConfigError::RegistryNotBuilt`]. Tests
/// substitute simple in-memory implementations.
pub trait ServiceLocator: Send + Sync {
    /// The frozen endpoint registry, if the host has built one.
    fn route_registry(&self) -> Option<Arc<EndpointRegistry>>;
}

struct FixedServices(Arc<EndpointRegistry>);

impl ServiceLocator for FixedServices {
    fn route_registry(&self) -> Option<Arc<EndpointRegistry>> {
        Some(self.0.clone())
    }
}

/// Report of an ambiguous match: two or more endpoints tied at every
/// precedence level for the same path.
#[derive(Debug)]
pub struct AmbiguousMatch {
    path: String,
    candidates: Vec<MatchCandidate>,
}

impl AmbiguousMatch {
    /// The request path that matched ambiguously.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The tied candidates, in declaration order.
    pub fn candidates(&self) -> &[MatchCandidate] {
        &self.candidates
    }
}

impl Display for AmbiguousMatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "request path `{}` matched multiple endpoints with identical precedence: ",
            self.path
        )?;
        for (i, candidate) in self.candidates.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(candidate.endpoint.name_for_display())?;
        }
        Ok(())
    }
}

/// The outcome of dispatching one request.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// A single endpoint won and its handler ran to completion.
    Handled(HandlerResult),
    /// No endpoint matched the path. The normal high-frequency miss.
    NotFound,
    /// Multiple endpoints tied; usually a registration defect the host
    /// should surface loudly.
    Ambiguous(AmbiguousMatch),
    /// The request was already cancelled; the handler did not run.
    Cancelled,
}

/// Matches, selects and invokes against a frozen registry.
pub struct Dispatcher {
    services: Arc<dyn ServiceLocator>,
}

impl Dispatcher {
    /// Creates a dispatcher resolving the registry through the host's
    /// service locator.
    pub fn new(services: Arc<dyn ServiceLocator>) -> Self {
        Self { services }
    }

    /// Creates a dispatcher over an already-frozen registry.
    pub fn with_registry(registry: Arc<EndpointRegistry>) -> Self {
        Self {
            services: Arc::new(FixedServices(registry)),
        }
    }

    /// Dispatches one request.
    ///
    /// Fails fast with [`ConfigError::RegistryNotBuilt`] when the host has
    /// not finished its build phase; every per-request outcome, including a
    /// miss, is an ordinary [`DispatchOutcome`].
    pub async fn dispatch(&self, mut ctx: RouteContext) -> Result<DispatchOutcome, ConfigError> {
        let registry = self
            .services
            .route_registry()
            .ok_or(ConfigError::RegistryNotBuilt)?;

        let mut candidates = Vec::new();
        for (index, endpoint) in registry.endpoints().iter().enumerate() {
            if let Some(values) = endpoint.pattern().matches(ctx.path()) {
                candidates.push(MatchCandidate {
                    endpoint: endpoint.clone(),
                    values,
                    index,
                });
            }
        }

        match select(candidates) {
            Selection::NoMatch => {
                tracing::debug!(path = %ctx.path(), "no endpoint matched");
                Ok(DispatchOutcome::NotFound)
            }
            Selection::Ambiguous(tied) => {
                let report = AmbiguousMatch {
                    path: ctx.path().to_string(),
                    candidates: tied,
                };
                tracing::warn!(path = %report.path(), "{report}");
                Ok(DispatchOutcome::Ambiguous(report))
            }
            Selection::Single(winner) => {
                if ctx.is_cancelled() {
                    tracing::debug!(path = %ctx.path(), "request cancelled before invocation");
                    return Ok(DispatchOutcome::Cancelled);
                }
                tracing::debug!(
                    path = %ctx.path(),
                    endpoint = %winner.endpoint.name_for_display(),
                    "dispatching"
                );
                ctx.set_matched(winner.endpoint.clone(), winner.values);
                Ok(DispatchOutcome::Handled(
                    winner.endpoint.handler().invoke(ctx).await,
                ))
            }
        }
    }
}
