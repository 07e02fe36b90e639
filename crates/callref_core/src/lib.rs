//! Cross-extension callback handles and event dispatch.
//! Extensions share functions only through revocable handle triples; this
//! crate owns every check made at that boundary.

pub mod callref;
pub mod codec;
pub mod config;
pub mod context;
pub mod event;
pub mod extension;
pub mod logging;
pub mod model;

pub use callref::owner::{InternalOwner, Owner};
pub use callref::proxy::CallProxy;
pub use callref::registry::HandleRegistry;
pub use callref::validator::{CallRefError, HandleValidator};
pub use codec::args::{
    ArgumentCodec, CodecError, EncodedArgs, MsgPackPacker, Packer, NIL_SENTINEL,
};
pub use config::{ConfigError, HostConfig};
pub use context::{ExecutionContext, HostServices};
pub use event::dispatch::{
    CancellationFlag, EventDispatcher, EventError, EventScope, EventSource, EventTarget,
};
pub use event::network::{
    EventOutbox, NetworkSink, NullNetwork, OutboundEvent, PeerId, ALL_PEERS, MAX_FANOUT,
};
pub use extension::directory::{ExtensionDirectory, ExtensionError, ExtensionTable};
pub use extension::instance::ExtensionInstance;
pub use extension::state::ExtensionState;
pub use logging::{
    default_log_level, init_from_config, init_logging, logging_status, LoggingError,
};
pub use model::function::{ParamKind, ScriptFunction, ScriptResults};
pub use model::handle::{
    HandleRef, InstanceId, ReferenceId, INTERNAL_INSTANCE_ID, INTERNAL_OWNER_NAME,
};
pub use model::value::{ScriptTable, ScriptValue, TableKey};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
