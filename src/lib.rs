//! Waymark is a fast and predictable request routing and dispatch engine
//! with the Rust programming language.
//!
//! # Table of contents
//!
//! - [Quickstart](#quickstart)
//! - [Route templates](#route-templates)
//! - [Route values](#route-values)
//! - [Precedence](#precedence)
//! - [Host integration](#host-integration)
//!
//! # Quickstart
//!
//! ```
//! use waymark::{make_sync, DispatchOutcome, Dispatcher, EndpointRegistry, RouteContext};
//!
//! let mut builder = EndpointRegistry::builder();
//! builder
//!     .at("/hello/{name}", make_sync(|ctx| {
//!         let name = ctx.values().get_str("name").unwrap_or("world").to_string();
//!         assert_eq!(name, "waymark");
//!     }))
//!     .unwrap();
//! let registry = builder.freeze().unwrap();
//!
//! let dispatcher = Dispatcher::with_registry(registry);
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let outcome = dispatcher
//!     .dispatch(RouteContext::new("/hello/waymark"))
//!     .await
//!     .unwrap();
//! assert!(matches!(outcome, DispatchOutcome::Handled(Ok(()))));
//! # });
//! ```
//!
//! # Route templates
//!
//! A template is a `/`-separated sequence of segments. Each segment is
//! literal text or a single parameter group:
//!
//! - `/users/me` — literals, matched ignoring case.
//! - `/users/{id}` — a parameter capturing one path segment.
//! - `/users/{id:int:min(1)}` — constraints, applied left to right; a
//!   rejection means the pattern simply does not match.
//! - `/{controller}/{action=Index}` — a default used when the segment is
//!   absent from the path.
//! - `/{controller}/{action}/{id?}` — an optional parameter, absent from
//!   the values when unmatched.
//! - `/files/{*path}` and `/files/{**path}` — catch-alls consuming the
//!   remainder; `*` trims a trailing slash from the capture, `**` keeps
//!   it.
//!
//! External default, constraint and required-value maps can be supplied at
//! registration through [`EndpointBuilder`](crate::EndpointBuilder), and
//! custom constraints through
//! [`RegistryBuilder::constraint`](crate::RegistryBuilder::constraint).
//!
//! # Route values
//!
//! Matched values land in a [`RouteValueMap`] with case-insensitive keys.
//! [`RouteValue`] equality follows a documented coercion table: `Null`
//! equals the empty string, strings compare ignoring case, and cross-type
//! pairs compare by canonical text, so `7` equals `"7"`. Absence from the
//! map is distinct from `Null`.
//!
//! # Precedence
//!
//! When several endpoints match one path the most specific wins: explicit
//! order first, then literal segments over constrained parameters over
//! plain parameters over catch-alls, segment by segment. An exact tie is
//! reported as [`DispatchOutcome::Ambiguous`] rather than silently
//! resolved — it almost always indicates a registration defect.
//!
//! # Host integration
//!
//! The host owns startup: it registers endpoints, freezes the registry,
//! and exposes it through a [`ServiceLocator`]. Dispatching before the
//! freeze fails fast with
//! [`ConfigError::RegistryNotBuilt`](crate::error::ConfigError), never
//! with a crash mid-request. After the freeze everything the dispatcher
//! touches is immutable and lock-free; independent requests dispatch fully
//! in parallel.

#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod constraint;
pub mod error;

mod dispatch;
mod endpoint;
mod matcher;
mod pattern;
mod registry;
mod select;
mod value;
mod value_map;

pub use dispatch::{
    AmbiguousMatch, CancelSignal, DispatchOutcome, Dispatcher, RouteContext, ServiceLocator,
};
pub use endpoint::{
    make_async, make_sync, AsyncFnHandler, Endpoint, Handler, HandlerError, HandlerResult,
    IntoHandlerResult, Metadata, SyncFnHandler,
};
pub use error::{ConfigError, PatternError, RegistryError};
pub use pattern::{
    CatchAllSegment, ParamSegment, ParseOptions, RoutePattern, Segment, SlashMode,
};
pub use registry::{EndpointBuilder, EndpointRegistry, RegistryBuilder};
pub use select::{select, MatchCandidate, Selection};
pub use value::{values_equal, RouteValue};
pub use value_map::RouteValueMap;
