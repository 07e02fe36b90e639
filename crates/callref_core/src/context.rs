//! Explicit execution context for extension-facing operations.
//!
//! # Responsibility
//! - Carry "which instance is calling" into every core operation.
//! - Bundle the collaborators (directory, dispatcher, codec) an instance uses.
//!
//! # Invariants
//! - Handles minted through a context are scoped to that context's owner.
//! - No operation reads a process-wide "current instance".

use crate::callref::owner::Owner;
use crate::callref::proxy::CallProxy;
use crate::callref::validator::{CallRefError, HandleValidator};
use crate::codec::args::ArgumentCodec;
use crate::event::dispatch::{EventDispatcher, EventError, EventScope, EventTarget};
use crate::event::network::PeerId;
use crate::extension::directory::ExtensionDirectory;
use crate::extension::instance::ExtensionInstance;
use crate::model::function::ScriptFunction;
use crate::model::handle::HandleRef;
use crate::model::value::ScriptValue;
use std::sync::Arc;

/// Shared collaborators every context in one host points at.
#[derive(Clone)]
pub struct HostServices {
    pub directory: Arc<dyn ExtensionDirectory>,
    pub dispatcher: Arc<EventDispatcher>,
    pub codec: ArgumentCodec,
}

impl HostServices {
    pub fn new(directory: Arc<dyn ExtensionDirectory>, dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            directory,
            dispatcher,
            codec: ArgumentCodec::default(),
        }
    }

    pub fn with_codec(mut self, codec: ArgumentCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn validator(&self) -> HandleValidator {
        HandleValidator::new(Arc::clone(&self.directory))
    }

    /// Context for code running inside `instance`.
    pub fn context_for(&self, instance: Arc<ExtensionInstance>) -> ExecutionContext {
        ExecutionContext {
            owner: Owner::Extension(instance),
            services: self.clone(),
        }
    }

    /// Context for host-native code outside any extension.
    pub fn internal_context(&self) -> ExecutionContext {
        ExecutionContext {
            owner: Owner::internal(),
            services: self.clone(),
        }
    }
}

/// The calling instance plus the host services it may use.
#[derive(Clone)]
pub struct ExecutionContext {
    owner: Owner,
    services: HostServices,
}

impl ExecutionContext {
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn services(&self) -> &HostServices {
        &self.services
    }

    /// Mints a handle for `function` in the calling instance's registry.
    pub fn mint_handle(&self, function: ScriptFunction) -> HandleRef {
        let (reference_id, instance_id) = self.owner.registry().mint(function);
        HandleRef::new(reference_id, instance_id, self.owner.name())
    }

    /// Builds a proxy for a handle minted by any owner.
    pub fn build_proxy(&self, handle: HandleRef) -> Result<CallProxy, CallRefError> {
        CallProxy::build(self.services.validator(), handle)
    }

    /// Encodes `args` and dispatches `event_name` to local handlers.
    ///
    /// Returns `false` when a handler cancelled the dispatch.
    pub fn trigger_local(
        &self,
        event_name: &str,
        args: &[ScriptValue],
    ) -> Result<bool, EventError> {
        let payload = self.services.codec.encode(Some(args))?;
        Ok(self
            .services
            .dispatcher
            .trigger(event_name, &payload, EventTarget::Local))
    }

    /// Encodes `args` and forwards `event_name` to one remote peer.
    pub fn trigger_client(
        &self,
        event_name: &str,
        args: &[ScriptValue],
        peer_id: PeerId,
    ) -> Result<(), EventError> {
        let payload = self.services.codec.encode(Some(args))?;
        self.services
            .dispatcher
            .trigger(event_name, &payload, EventTarget::Remote(peer_id));
        Ok(())
    }

    pub fn whitelist_event(&self, event_name: &str) {
        self.services.dispatcher.whitelist_event(event_name);
    }

    /// Registers a handler owned by the calling instance.
    pub fn add_event_handler(
        &self,
        event_name: &str,
        handler: impl Fn(&EventScope<'_>) + Send + Sync + 'static,
    ) {
        self.services
            .dispatcher
            .add_handler(event_name, self.owner.clone(), handler);
    }
}
