use callref_core::{
    CallRefError, EventDispatcher, ExecutionContext, ExtensionState, ExtensionTable, HandleRef,
    HostServices, NullNetwork, ParamKind, ScriptFunction, ScriptValue,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Host {
    table: Arc<ExtensionTable>,
    services: HostServices,
}

impl Host {
    fn new() -> Self {
        let table = Arc::new(ExtensionTable::new());
        let services = HostServices::new(
            table.clone(),
            Arc::new(EventDispatcher::new(Arc::new(NullNetwork))),
        );
        Self { table, services }
    }

    fn running(&self, name: &str) -> ExecutionContext {
        let instance = self.table.load(name).expect("load extension");
        self.table
            .set_state(name, ExtensionState::Running)
            .expect("start extension");
        self.services.context_for(instance)
    }
}

fn counter_function(calls: Arc<AtomicUsize>) -> ScriptFunction {
    ScriptFunction::with_arity("count", 1, move |args| {
        calls.fetch_add(1, Ordering::SeqCst);
        args
    })
}

#[test]
fn minted_handle_is_valid_from_another_extension() {
    let host = Host::new();
    let owner = host.running("inventory");
    let caller = host.running("shop");

    let calls = Arc::new(AtomicUsize::new(0));
    let handle = owner.mint_handle(counter_function(calls.clone()));
    assert!(owner
        .owner()
        .registry()
        .has(handle.reference_id, handle.instance_id));

    let proxy = caller.build_proxy(handle).expect("proxy from shop");
    let out = proxy
        .invoke(vec![ScriptValue::Nil, ScriptValue::from("sword")])
        .expect("live handle");
    assert_eq!(out, vec![ScriptValue::from("sword")]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn build_proxy_reports_unknown_owner() {
    let host = Host::new();
    let caller = host.running("shop");
    let err = caller
        .build_proxy(HandleRef::new(1, 1, "missing"))
        .expect_err("owner not in directory");
    assert_eq!(err, CallRefError::UnknownOwner("missing".to_string()));
    assert_eq!(err.to_string(), "Invalid resource name.");
}

#[test]
fn build_proxy_reports_owner_not_running() {
    let host = Host::new();
    let owner = host.running("inventory");
    let caller = host.running("shop");
    let handle = owner.mint_handle(ScriptFunction::with_arity("f", 0, |_| vec![]));

    for state in [ExtensionState::Stopped, ExtensionState::Errored] {
        host.table.set_state("inventory", state).expect("state");
        let err = caller
            .build_proxy(handle.clone())
            .expect_err("owner not acceptable");
        assert_eq!(err, CallRefError::OwnerNotRunning("inventory".to_string()));
        assert_eq!(err.to_string(), "Resource wasn't running.");
    }
}

#[test]
fn build_proxy_accepts_parsing_starting_and_running_owners() {
    let host = Host::new();
    let owner = host.running("inventory");
    let caller = host.running("shop");
    let handle = owner.mint_handle(ScriptFunction::with_arity("f", 0, |_| vec![]));

    for state in [
        ExtensionState::Parsing,
        ExtensionState::Starting,
        ExtensionState::Running,
    ] {
        host.table.set_state("inventory", state).expect("state");
        caller
            .build_proxy(handle.clone())
            .expect("live owner accepts proxies");
    }
}

#[test]
fn invoke_after_owner_teardown_returns_no_result() {
    let host = Host::new();
    let owner = host.running("inventory");
    let caller = host.running("shop");
    let calls = Arc::new(AtomicUsize::new(0));
    let handle = owner.mint_handle(counter_function(calls.clone()));
    let proxy = caller.build_proxy(handle).expect("proxy");

    host.table.reload("inventory").expect("reload tears down instance");
    host.table
        .set_state("inventory", ExtensionState::Running)
        .expect("new instance running");
    assert!(proxy.invoke(vec![ScriptValue::Nil]).is_none());

    host.table.unload("inventory").expect("unload");
    assert!(proxy.invoke(vec![ScriptValue::Nil]).is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn stale_instance_handle_cannot_build_proxy_after_reload() {
    let host = Host::new();
    let owner = host.running("inventory");
    let caller = host.running("shop");
    let handle = owner.mint_handle(ScriptFunction::with_arity("f", 0, |_| vec![]));
    host.table.reload("inventory").expect("reload");

    let err = caller.build_proxy(handle).expect_err("old instance id");
    assert!(matches!(err, CallRefError::UnknownReference(_)));
}

#[test]
fn handles_cannot_be_forged_for_unshared_functions() {
    let host = Host::new();
    let owner = host.running("inventory");
    let caller = host.running("shop");
    let shared = owner.mint_handle(ScriptFunction::with_arity("shared", 0, |_| vec![]));

    let forged = HandleRef::new(shared.reference_id + 1, shared.instance_id, "inventory");
    assert!(matches!(
        caller.build_proxy(forged),
        Err(CallRefError::UnknownReference(_))
    ));
}

#[test]
fn trailing_table_parameter_limits_forwarded_arguments() {
    let host = Host::new();
    let owner = host.running("inventory");
    let caller = host.running("shop");
    let received = Arc::new(AtomicUsize::new(usize::MAX));
    let seen = received.clone();
    let handle = owner.mint_handle(ScriptFunction::new(
        "with_options",
        vec![ParamKind::Value, ParamKind::Table],
        move |args| {
            seen.store(args.len(), Ordering::SeqCst);
            vec![]
        },
    ));
    let proxy = caller.build_proxy(handle).expect("proxy");

    let mut call_args = vec![ScriptValue::Nil];
    call_args.extend((1..=4).map(ScriptValue::Integer));
    proxy.invoke(call_args).expect("live handle");
    assert_eq!(received.load(Ordering::SeqCst), 1);
}

#[test]
fn handle_survives_transport_as_func_ref_value() {
    let host = Host::new();
    let owner = host.running("inventory");
    let caller = host.running("shop");
    let handle = owner.mint_handle(ScriptFunction::with_arity("price", 1, |args| {
        let base = args.first().and_then(ScriptValue::as_integer).unwrap_or(0);
        vec![ScriptValue::Integer(base * 2)]
    }));

    let transported = ScriptValue::FuncRef(handle);
    let ScriptValue::FuncRef(received) = transported else {
        panic!("expected funcref");
    };
    let proxy = caller.build_proxy(received).expect("proxy");
    let out = proxy
        .invoke(vec![ScriptValue::Nil, ScriptValue::Integer(21)])
        .expect("live handle");
    assert_eq!(out, vec![ScriptValue::Integer(42)]);
}
