//! Endpoint registration and the frozen registry.
//!
//! Registration is a single-writer build phase: endpoints accumulate on a
//! [`RegistryBuilder`], and [`freeze`](RegistryBuilder::freeze) produces
//! the immutable [`EndpointRegistry`] the dispatcher reads. Registering
//! after the freeze fails with [`RegistryError::Frozen`] — a malformed or
//! mutated route table is a startup defect, never something to limp past.

use std::sync::Arc;

use crate::{
    constraint::{Constraint, ConstraintResolver},
    endpoint::{Endpoint, Handler, Metadata},
    error::{PatternError, RegistryError},
    pattern::{ParseOptions, RoutePattern},
    value::RouteValue,
};

/// The frozen, immutable set of registered endpoints.
///
/// Built once before the first request and safe for unlimited concurrent
/// readers; nothing in it mutates after the freeze.
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    endpoints: Vec<Arc<Endpoint>>,
}

impl EndpointRegistry {
    /// Starts a registration build phase.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// The registered endpoints, in declaration order.
    pub fn endpoints(&self) -> &[Arc<Endpoint>] {
        &self.endpoints
    }

    /// The number of registered endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns `true` when no endpoints are registered.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// Accumulates endpoint registrations during the build phase.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    endpoints: Vec<Arc<Endpoint>>,
    resolver: ConstraintResolver,
    frozen: bool,
}

impl RegistryBuilder {
    /// Creates an empty builder with the builtin constraints.
    pub fn new() -> Self {
        Self {
            endpoints: Vec::new(),
            resolver: ConstraintResolver::new(),
            frozen: false,
        }
    }

    /// Registers a custom constraint for templates parsed by this builder.
    pub fn constraint<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(Option<&str>) -> Result<Arc<dyn Constraint>, PatternError> + Send + Sync + 'static,
    {
        self.resolver.register(name, factory);
        self
    }

    /// Registers a handler at `template` with default order, no display
    /// name and no metadata.
    pub fn at(
        &mut self,
        template: &str,
        handler: impl Handler + 'static,
    ) -> Result<&mut Self, RegistryError> {
        self.endpoint(template, handler).register()?;
        Ok(self)
    }

    /// Starts registering an endpoint at `template`, returning a builder
    /// for its order, display name, metadata and external value maps.
    pub fn endpoint(
        &mut self,
        template: &str,
        handler: impl Handler + 'static,
    ) -> EndpointBuilder<'_> {
        EndpointBuilder {
            registry: self,
            template: template.to_string(),
            handler: Arc::new(handler),
            order: 0,
            display_name: None,
            metadata: Metadata::new(),
            options: ParseOptions::default(),
        }
    }

    /// Registers a pre-parsed pattern directly.
    pub fn register_parsed(
        &mut self,
        pattern: RoutePattern,
        handler: Arc<dyn Handler>,
        order: i32,
        display_name: Option<String>,
        metadata: Metadata,
    ) -> Result<(), RegistryError> {
        if self.frozen {
            return Err(RegistryError::Frozen);
        }
        tracing::debug!(template = %pattern.template(), order, "endpoint registered");
        self.endpoints.push(Arc::new(Endpoint::new(
            pattern,
            handler,
            order,
            display_name,
            metadata,
        )));
        Ok(())
    }

    /// Ends the build phase, producing the immutable registry.
    ///
    /// The builder stays frozen afterwards: further registrations and a
    /// second freeze both fail with [`RegistryError::Frozen`].
    pub fn freeze(&mut self) -> Result<Arc<EndpointRegistry>, RegistryError> {
        if self.frozen {
            return Err(RegistryError::Frozen);
        }
        self.frozen = true;
        let endpoints = std::mem::take(&mut self.endpoints);
        tracing::debug!(endpoints = endpoints.len(), "endpoint registry frozen");
        Ok(Arc::new(EndpointRegistry { endpoints }))
    }
}

/// Builds one endpoint registration; created by
/// [`RegistryBuilder::endpoint`].
pub struct EndpointBuilder<'a> {
    registry: &'a mut RegistryBuilder,
    template: String,
    handler: Arc<dyn Handler>,
    order: i32,
    display_name: Option<String>,
    metadata: Metadata,
    options: ParseOptions,
}

impl<'a> EndpointBuilder<'a> {
    /// Sets the explicit order (default 0; lower ranks first).
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Sets the display name used in diagnostics.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Appends a metadata item.
    pub fn metadata<T: std::any::Any + Send + Sync>(mut self, item: T) -> Self {
        self.metadata.push(item);
        self
    }

    /// Supplies an external default for a parameter (or an extra value
    /// copied into every match).
    pub fn default_value(
        mut self,
        name: impl Into<String>,
        value: impl Into<RouteValue>,
    ) -> Self {
        self.options.defaults.insert(name, value);
        self
    }

    /// Requires every match to carry `name` equal to `value`.
    pub fn required_value(
        mut self,
        name: impl Into<String>,
        value: impl Into<RouteValue>,
    ) -> Self {
        self.options.required_values.insert(name, value);
        self
    }

    /// Attaches a constraint expression (e.g. `int:min(1)`) to a parameter
    /// by name, after any inline constraints.
    pub fn constraint_hint(
        mut self,
        param: impl Into<String>,
        expr: impl Into<String>,
    ) -> Self {
        self.options.constraints.insert(param.into(), expr.into());
        self
    }

    /// Parses the template and registers the endpoint.
    pub fn register(self) -> Result<(), RegistryError> {
        if self.registry.frozen {
            return Err(RegistryError::Frozen);
        }
        let pattern =
            RoutePattern::parse_with(&self.template, &self.options, &self.registry.resolver)?;
        self.registry.register_parsed(
            pattern,
            self.handler,
            self.order,
            self.display_name,
            self.metadata,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::make_sync;

    #[test]
    fn test_register_and_freeze() {
        let mut builder = EndpointRegistry::builder();
        builder.at("/a", make_sync(|_| ())).unwrap();
        builder
            .endpoint("/users/{id:int}", make_sync(|_| ()))
            .order(-1)
            .name("user-by-id")
            .register()
            .unwrap();

        let registry = builder.freeze().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.endpoints()[1].order(), -1);
        assert_eq!(registry.endpoints()[1].display_name(), Some("user-by-id"));
    }

    #[test]
    fn test_register_after_freeze_fails() {
        let mut builder = EndpointRegistry::builder();
        builder.at("/a", make_sync(|_| ())).unwrap();
        let _registry = builder.freeze().unwrap();

        assert_eq!(
            builder.at("/b", make_sync(|_| ())).unwrap_err(),
            RegistryError::Frozen
        );
        assert_eq!(builder.freeze().unwrap_err(), RegistryError::Frozen);
    }

    #[test]
    fn test_bad_template_surfaces_pattern_error() {
        let mut builder = EndpointRegistry::builder();
        let err = builder.at("/{id}/{id}", make_sync(|_| ())).unwrap_err();

        assert!(matches!(
            err,
            RegistryError::Pattern(PatternError::DuplicateParameter { .. })
        ));
    }

    #[test]
    fn test_custom_constraint_through_builder() {
        use crate::{value::RouteValue, value_map::RouteValueMap};

        struct HexConstraint;

        impl Constraint for HexConstraint {
            fn accepts(&self, value: &RouteValue, _values: &RouteValueMap) -> bool {
                matches!(
                    value,
                    RouteValue::String(s) if !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit())
                )
            }
        }

        let mut builder = EndpointRegistry::builder();
        builder.constraint("hex", |_| Ok(Arc::new(HexConstraint)));
        builder.at("/blobs/{digest:hex}", make_sync(|_| ())).unwrap();
        let registry = builder.freeze().unwrap();

        let pattern = registry.endpoints()[0].pattern();
        assert!(pattern.matches("/blobs/deadbeef").is_some());
        assert!(pattern.matches("/blobs/nope!").is_none());
    }

    #[test]
    fn test_external_maps_through_builder() {
        let mut builder = EndpointRegistry::builder();
        builder
            .endpoint("/{controller}/{action}", make_sync(|_| ()))
            .default_value("action", "Index")
            .required_value("controller", "Home")
            .constraint_hint("action", "alpha")
            .register()
            .unwrap();
        let registry = builder.freeze().unwrap();
        let pattern = registry.endpoints()[0].pattern();

        let matched = pattern.matches("/home").unwrap();
        assert_eq!(matched.get_str("action"), Some("Index"));
        assert!(pattern.matches("/store").is_none());
    }
}
