//! Script-facing call surface.
//!
//! # Responsibility
//! - Expose handle and event operations to extension code with stable,
//!   script-level semantics.
//! - Translate core errors into the messages scripts see.
//!
//! # Invariants
//! - Exported functions never panic.
//! - Only proxy construction raises errors; invoking a stale proxy and
//!   codec failures degrade to empty/false results.

use callref_core::{
    init_logging as init_logging_inner, CallProxy, CallRefError, EventScope, ExecutionContext,
    HandleRef, InstanceId, PeerId, ReferenceId, ScriptFunction, ScriptResults, ScriptValue,
};
use log::error;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Error raised to script code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    InvalidResourceName,
    ResourceNotRunning,
    InvalidFunctionReference,
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidResourceName => write!(f, "Invalid resource name."),
            Self::ResourceNotRunning => write!(f, "Resource wasn't running."),
            Self::InvalidFunctionReference => write!(f, "Invalid function reference."),
        }
    }
}

impl Error for ScriptError {}

impl From<CallRefError> for ScriptError {
    fn from(value: CallRefError) -> Self {
        match value {
            CallRefError::UnknownOwner(_) => Self::InvalidResourceName,
            CallRefError::OwnerNotRunning(_) => Self::ResourceNotRunning,
            CallRefError::UnknownReference(_) => Self::InvalidFunctionReference,
        }
    }
}

/// Starts host file logging.
///
/// # Script contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns an empty string on success and the error message on failure.
pub fn init_logging(level: &str, log_dir: &str) -> String {
    match init_logging_inner(level, Path::new(log_dir.trim())) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Shares `function` and returns its `(reference, instance, resource)` triple.
///
/// # Script contract
/// - Never fails.
/// - The handle is scoped to the calling instance and dies with it.
pub fn mint_handle(ctx: &ExecutionContext, function: ScriptFunction) -> HandleRef {
    ctx.mint_handle(function)
}

/// Builds a callable proxy from a handle triple.
///
/// # Script contract
/// - Raises `Invalid resource name.` for an unknown owner.
/// - Raises `Resource wasn't running.` for an owner outside
///   parsing/starting/running.
/// - Raises `Invalid function reference.` when the owner never shared the id.
pub fn build_proxy(
    ctx: &ExecutionContext,
    reference_id: ReferenceId,
    instance_id: InstanceId,
    owner_name: &str,
) -> Result<CallProxy, ScriptError> {
    ctx.build_proxy(HandleRef::new(reference_id, instance_id, owner_name))
        .map_err(ScriptError::from)
}

/// Calls a proxy the way script call syntax does.
///
/// `args[0]` is the proxy slot of the call convention and is ignored.
///
/// # Script contract
/// - Returns an empty result when the handle was revoked since construction.
pub fn call_proxy(proxy: &CallProxy, args: Vec<ScriptValue>) -> ScriptResults {
    proxy.invoke(args).unwrap_or_default()
}

/// Triggers an event for local handlers.
///
/// # Script contract
/// - Returns `false` when a handler cancelled the event.
/// - Returns `false` without running any handler when the arguments could
///   not be encoded. That is a host misconfiguration, not a script error: it
///   is logged at error level, and hosts that must tell it apart from
///   cancellation call `ExecutionContext::trigger_local`, which reports
///   `EventError::Codec`.
pub fn trigger_local(ctx: &ExecutionContext, event_name: &str, args: &[ScriptValue]) -> bool {
    match ctx.trigger_local(event_name, args) {
        Ok(delivered) => delivered,
        Err(err) => {
            error!(
                "event=script_trigger module=script status=error name={} error={}",
                event_name, err
            );
            false
        }
    }
}

/// Sends an event to one remote peer. Fire-and-forget.
pub fn trigger_client(
    ctx: &ExecutionContext,
    event_name: &str,
    peer_id: PeerId,
    args: &[ScriptValue],
) {
    if let Err(err) = ctx.trigger_client(event_name, args, peer_id) {
        error!(
            "event=script_trigger_client module=script status=error name={} peer_id={} error={}",
            event_name, peer_id, err
        );
    }
}

/// Allows remote peers to trigger `event_name`.
pub fn whitelist_event(ctx: &ExecutionContext, event_name: &str) {
    ctx.whitelist_event(event_name);
}

/// Registers a handler owned by the calling extension.
pub fn add_event_handler(
    ctx: &ExecutionContext,
    event_name: &str,
    handler: impl Fn(&EventScope<'_>) + Send + Sync + 'static,
) {
    ctx.add_event_handler(event_name, handler);
}

/// Cancels the event whose handler is running.
pub fn cancel_current_event(scope: &EventScope<'_>) {
    scope.cancel();
}

/// Whether an earlier handler cancelled the event in progress.
pub fn is_current_event_cancelled(scope: &EventScope<'_>) -> bool {
    scope.is_cancelled()
}

#[cfg(test)]
mod tests {
    use super::{init_logging, ScriptError};
    use callref_core::{CallRefError, HandleRef};

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info", "");
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose", "/tmp/callref-logs");
        assert!(!error.is_empty());
    }

    #[test]
    fn maps_core_errors_to_script_messages() {
        let unknown: ScriptError = CallRefError::UnknownOwner("x".to_string()).into();
        assert_eq!(unknown.to_string(), "Invalid resource name.");

        let stopped: ScriptError = CallRefError::OwnerNotRunning("x".to_string()).into();
        assert_eq!(stopped.to_string(), "Resource wasn't running.");

        let missing: ScriptError =
            CallRefError::UnknownReference(HandleRef::new(1, 1, "x")).into();
        assert_eq!(missing, ScriptError::InvalidFunctionReference);
    }
}
