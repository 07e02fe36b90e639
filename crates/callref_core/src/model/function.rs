//! Underlying function values held by handle registries.

use crate::model::value::ScriptValue;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Multi-value result of one function call.
pub type ScriptResults = Vec<ScriptValue>;

type NativeCall = dyn Fn(Vec<ScriptValue>) -> ScriptResults + Send + Sync;

/// Declared shape of one function parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Plain positional value.
    Value,
    /// Structured table, typically a trailing options bag.
    Table,
    /// Execution context injected by the runtime, typically leading.
    Context,
}

/// Callable function value with an inspectable parameter list.
#[derive(Clone)]
pub struct ScriptFunction {
    name: String,
    params: Vec<ParamKind>,
    call: Arc<NativeCall>,
}

impl ScriptFunction {
    pub fn new(
        name: impl Into<String>,
        params: Vec<ParamKind>,
        call: impl Fn(Vec<ScriptValue>) -> ScriptResults + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            call: Arc::new(call),
        }
    }

    /// Convenience constructor for `arity` plain value parameters.
    pub fn with_arity(
        name: impl Into<String>,
        arity: usize,
        call: impl Fn(Vec<ScriptValue>) -> ScriptResults + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, vec![ParamKind::Value; arity], call)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Returns 1 when the runtime fills one declared slot itself.
    ///
    /// A trailing table parameter or a leading context parameter is never
    /// supplied by callers.
    pub fn reserved_slots(&self) -> usize {
        let trailing_table = self.params.last() == Some(&ParamKind::Table);
        let leading_context = self.params.first() == Some(&ParamKind::Context);
        usize::from(trailing_table || leading_context)
    }

    /// Number of caller-supplied arguments the function accepts.
    pub fn forwarded_arity(&self) -> usize {
        self.arity().saturating_sub(self.reserved_slots())
    }

    /// Calls the function with already-shaped arguments.
    pub fn call(&self, args: Vec<ScriptValue>) -> ScriptResults {
        (self.call)(args)
    }
}

impl Debug for ScriptFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptFunction")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
