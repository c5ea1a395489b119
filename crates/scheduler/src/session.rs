//! Protocol session interface.
//!
//! A [`Session`] executes one combined [`BatchRequest`] against a live
//! endpoint and answers with one [`StepOutcome`] per request step, in step
//! order. Wire formats and connection setup belong to the implementations.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use vigil_core::{Kind, Location, Protocol};

use crate::error::SessionError;

/// One read inside a combined request.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadStep {
    /// Read `attribute` at `location`. When `path` is set the session
    /// resolves it inside the attribute's composite value.
    Attribute {
        location: Location,
        attribute: String,
        path: Option<String>,
    },
    /// Read the resource itself (existence check).
    Resource { location: Location },
}

impl ReadStep {
    pub fn location(&self) -> &Location {
        match self {
            ReadStep::Attribute { location, .. } | ReadStep::Resource { location } => location,
        }
    }
}

/// The single request sent for a task group.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    pub kind: Kind,
    pub steps: Vec<ReadStep>,
}

/// Result for one target of a multi-target step.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetOutcome {
    pub location: Location,
    pub result: Result<Value, String>,
}

/// Result of one request step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Value read at a single-target location.
    Value(Value),
    /// One outcome per resolved target of a wildcard location.
    Targets(Vec<TargetOutcome>),
    /// The endpoint reported a failure for this step.
    Failed(String),
}

/// Response to a [`BatchRequest`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResponse {
    pub outcomes: Vec<StepOutcome>,
}

/// Live, protocol-specific connection used for one group execution.
pub trait Session: Send {
    fn execute(&mut self, request: &BatchRequest) -> Result<BatchResponse, SessionError>;

    /// Release the underlying connection. Called exactly once by
    /// [`SessionGuard`].
    fn close(&mut self) {}
}

/// Opens sessions for one protocol.
pub trait SessionFactory: Send + Sync {
    fn protocol(&self) -> Protocol;

    fn open(&self, kind: &Kind) -> Result<Box<dyn Session>, SessionError>;
}

/// Closes the wrapped session when dropped, on every exit path.
pub struct SessionGuard {
    session: Box<dyn Session>,
    endpoint: String,
}

impl SessionGuard {
    pub fn new(session: Box<dyn Session>, kind: &Kind) -> Self {
        Self {
            session,
            endpoint: kind.endpoint.clone(),
        }
    }
}

impl Deref for SessionGuard {
    type Target = dyn Session;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref()
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session.as_mut()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        debug!(endpoint = %self.endpoint, "Closing session");
        self.session.close();
    }
}

/// Session factories keyed by protocol.
#[derive(Clone, Default)]
pub struct SessionFactories {
    factories: HashMap<Protocol, Arc<dyn SessionFactory>>,
}

impl SessionFactories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any previous one for the same protocol.
    pub fn register(&mut self, factory: Arc<dyn SessionFactory>) {
        self.factories.insert(factory.protocol(), factory);
    }

    pub fn with(mut self, factory: Arc<dyn SessionFactory>) -> Self {
        self.register(factory);
        self
    }

    pub fn get(&self, protocol: Protocol) -> Option<&Arc<dyn SessionFactory>> {
        self.factories.get(&protocol)
    }

    /// Open a guarded session for `kind`.
    pub fn open(&self, kind: &Kind) -> Result<SessionGuard, SessionError> {
        let factory = self
            .get(kind.protocol)
            .ok_or_else(|| SessionError::NoFactory(kind.protocol.to_string()))?;
        let session = factory.open(kind)?;
        Ok(SessionGuard::new(session, kind))
    }
}
