//! Invocable proxies over shared callback handles.
//!
//! # Responsibility
//! - Turn a handle triple into something callers can invoke.
//! - Revalidate on every call and shape arguments to the declared arity.
//!
//! # Invariants
//! - A proxy never calls into an owner that fails validation at call time.
//! - Invocation never reports validation failures as errors.

use crate::callref::validator::{CallRefError, HandleValidator};
use crate::model::function::{ScriptFunction, ScriptResults};
use crate::model::handle::HandleRef;
use crate::model::value::ScriptValue;
use log::{debug, warn};
use std::fmt::{Debug, Formatter};

/// Callable stand-in for a function owned by another extension.
#[derive(Clone)]
pub struct CallProxy {
    handle: HandleRef,
    function: ScriptFunction,
    validator: HandleValidator,
}

impl CallProxy {
    /// Validates `handle` and captures the function it refers to.
    ///
    /// # Errors
    /// - `UnknownOwner` when no owner carries the handle's owner name.
    /// - `OwnerNotRunning` when the owner is not Parsing/Starting/Running.
    /// - `UnknownReference` when the owner's current instance lacks the id.
    pub fn build(validator: HandleValidator, handle: HandleRef) -> Result<Self, CallRefError> {
        let resolved = validator
            .validate_detailed(handle.reference_id, handle.instance_id, &handle.owner_name)
            .and_then(|owner| {
                owner
                    .registry()
                    .resolve(handle.reference_id)
                    .ok_or_else(|| CallRefError::UnknownReference(handle.clone()))
            });

        match resolved {
            Ok(function) => Ok(Self {
                handle,
                function,
                validator,
            }),
            Err(err) => {
                warn!(
                    "event=proxy_build module=callref status=error handle={} error={}",
                    handle, err
                );
                Err(err)
            }
        }
    }

    /// Revalidates the handle, then forwards the call.
    ///
    /// `call_args[0]` carries the proxy itself under the calling convention
    /// and is always dropped. Returns `None` when the handle no longer
    /// validates.
    pub fn invoke(&self, call_args: Vec<ScriptValue>) -> Option<ScriptResults> {
        if self.validator.validate_handle(&self.handle).is_none() {
            debug!(
                "event=proxy_invoke module=callref status=stale handle={}",
                self.handle
            );
            return None;
        }

        let args = shape_arguments(&self.function, call_args);
        Some(self.function.call(args))
    }
}

impl Debug for CallProxy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallProxy")
            .field("handle", &self.handle)
            .field("function", &self.function)
            .finish_non_exhaustive()
    }
}

/// Drops the leading housekeeping value and truncates to the arity the
/// function accepts from callers.
pub(crate) fn shape_arguments(
    function: &ScriptFunction,
    call_args: Vec<ScriptValue>,
) -> Vec<ScriptValue> {
    let accepted = function.forwarded_arity();
    let supplied = call_args.len().saturating_sub(1);
    if supplied > accepted {
        debug!(
            "event=proxy_args module=callref status=truncated function={} supplied={} accepted={}",
            function.name(),
            supplied,
            accepted
        );
    }
    call_args.into_iter().skip(1).take(accepted).collect()
}

#[cfg(test)]
mod tests {
    use super::{shape_arguments, CallProxy};
    use crate::callref::validator::{CallRefError, HandleValidator};
    use crate::extension::directory::ExtensionTable;
    use crate::extension::state::ExtensionState;
    use crate::model::function::{ParamKind, ScriptFunction};
    use crate::model::handle::HandleRef;
    use crate::model::value::ScriptValue;
    use std::sync::Arc;

    fn values(count: i64) -> Vec<ScriptValue> {
        (0..count).map(ScriptValue::Integer).collect()
    }

    #[test]
    fn shape_drops_housekeeping_value_and_truncates_for_trailing_table() {
        let func = ScriptFunction::new(
            "opts",
            vec![ParamKind::Value, ParamKind::Table],
            |args| args,
        );
        // Housekeeping slot plus four caller-supplied values.
        let shaped = shape_arguments(&func, values(5));
        assert_eq!(shaped, vec![ScriptValue::Integer(1)]);
    }

    #[test]
    fn shape_keeps_short_argument_lists() {
        let func = ScriptFunction::with_arity("three", 3, |args| args);
        assert_eq!(shape_arguments(&func, values(2)), vec![ScriptValue::Integer(1)]);
        assert!(shape_arguments(&func, vec![]).is_empty());
    }

    #[test]
    fn invoke_forwards_shaped_arguments() {
        let table = Arc::new(ExtensionTable::new());
        let instance = table.load("math").expect("load");
        let sum = ScriptFunction::with_arity("sum", 2, |args| {
            let total = args.iter().filter_map(ScriptValue::as_integer).sum::<i64>();
            vec![ScriptValue::Integer(total)]
        });
        let (reference_id, instance_id) = instance.registry().mint(sum);
        let proxy = CallProxy::build(
            HandleValidator::new(table.clone()),
            HandleRef::new(reference_id, instance_id, "math"),
        )
        .expect("build proxy");

        let out = proxy.invoke(values(4)).expect("live handle");
        assert_eq!(out, vec![ScriptValue::Integer(3)]);
    }

    #[test]
    fn invoke_after_stop_is_silent_no_op() {
        let table = Arc::new(ExtensionTable::new());
        let instance = table.load("math").expect("load");
        let (reference_id, instance_id) = instance
            .registry()
            .mint(ScriptFunction::with_arity("f", 0, |_| vec![ScriptValue::Boolean(true)]));
        let proxy = CallProxy::build(
            HandleValidator::new(table.clone()),
            HandleRef::new(reference_id, instance_id, "math"),
        )
        .expect("build proxy");

        table
            .set_state("math", ExtensionState::Stopped)
            .expect("stop");
        assert!(proxy.invoke(values(1)).is_none());

        table
            .set_state("math", ExtensionState::Running)
            .expect("restart same instance");
        assert!(proxy.invoke(values(1)).is_some());
    }

    #[test]
    fn build_rejects_missing_reference() {
        let table = Arc::new(ExtensionTable::new());
        let instance = table.load("math").expect("load");
        let err = CallProxy::build(
            HandleValidator::new(table.clone()),
            HandleRef::new(99, instance.instance_id(), "math"),
        )
        .expect_err("unknown reference");
        assert!(matches!(err, CallRefError::UnknownReference(_)));
    }
}
