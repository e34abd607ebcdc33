//! Error types raised while building a route table or wiring the host.
//!
//! Everything here is a build-time or configuration failure and is fatal to
//! startup. Per-request outcomes (`no match`, `ambiguous`) are ordinary
//! values on [`DispatchOutcome`](crate::DispatchOutcome), never errors:
//! a miss is the high-frequency normal case and must stay cheap.

/// A possible error value when parsing a route template.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// The template text is malformed.
    #[error("invalid route template `{template}`: {message}")]
    Syntax {
        /// The offending template.
        template: String,
        /// What was wrong with it.
        message: String,
    },

    /// The same parameter name appears more than once.
    #[error("duplicate parameter `{name}` in route template `{template}`")]
    DuplicateParameter {
        /// The offending template.
        template: String,
        /// The repeated parameter name.
        name: String,
    },

    /// A catch-all parameter is followed by further segments.
    #[error("catch-all parameter must be the last segment in route template `{template}`")]
    CatchAllPosition {
        /// The offending template.
        template: String,
    },

    /// More than one catch-all parameter in a single template.
    #[error("route template `{template}` contains more than one catch-all parameter")]
    MultipleCatchAll {
        /// The offending template.
        template: String,
    },

    /// A parameter name is empty or not a valid identifier.
    #[error("`{name}` is not a valid parameter name in route template `{template}`")]
    InvalidParameterName {
        /// The offending template.
        template: String,
        /// The rejected name.
        name: String,
    },

    /// A parameter has both an inline default and an external default.
    #[error("parameter `{name}` has both an inline default and an externally supplied default")]
    ConflictingDefault {
        /// The doubly-defaulted parameter name.
        name: String,
    },

    /// A catch-all parameter carries the optional marker.
    #[error("catch-all parameter `{name}` cannot be optional")]
    OptionalCatchAll {
        /// The offending parameter name.
        name: String,
    },

    /// An optional parameter carries a default value.
    #[error("optional parameter `{name}` cannot have a default value")]
    DefaultOnOptional {
        /// The offending parameter name.
        name: String,
    },

    /// A constraint name was not found in the resolver.
    #[error("unknown constraint `{name}`")]
    UnknownConstraint {
        /// The unresolved constraint name.
        name: String,
    },

    /// A constraint argument could not be parsed.
    #[error("invalid argument `{argument}` for constraint `{name}`")]
    BadConstraintArgument {
        /// The constraint name.
        name: String,
        /// The rejected argument text.
        argument: String,
    },
}

/// A possible error value when registering endpoints.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The registry was frozen before this registration.
    #[error("the endpoint registry is frozen and no longer accepts registrations")]
    Frozen,

    /// The endpoint's route template failed to parse.
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// A host wiring error, raised synchronously when dispatch runs before the
/// host finished its build phase.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No frozen registry is available to the dispatcher.
    #[error(
        "the endpoint registry has not been built: register endpoints on a \
         `RegistryBuilder`, call `freeze`, and expose the result through the \
         host's service locator before dispatching requests"
    )]
    RegistryNotBuilt,
}
