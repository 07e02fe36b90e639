use callref_core::{
    EncodedArgs, EventDispatcher, EventOutbox, EventSource, ExecutionContext, ExtensionState,
    ExtensionTable, HostServices, ScriptValue, MAX_FANOUT,
};
use parking_lot::Mutex;
use std::sync::Arc;

fn host() -> (Arc<ExtensionTable>, Arc<EventOutbox>, HostServices) {
    let table = Arc::new(ExtensionTable::new());
    let outbox = Arc::new(EventOutbox::new());
    let services = HostServices::new(
        table.clone(),
        Arc::new(EventDispatcher::new(outbox.clone())),
    );
    (table, outbox, services)
}

fn running(table: &ExtensionTable, services: &HostServices, name: &str) -> ExecutionContext {
    let instance = table.load(name).expect("load");
    table
        .set_state(name, ExtensionState::Running)
        .expect("start");
    services.context_for(instance)
}

fn decode(payload: &EncodedArgs) -> rmpv::Value {
    let mut bytes = payload.as_bytes();
    rmpv::decode::read_value(&mut bytes).expect("decode payload")
}

#[test]
fn second_handler_cancels_and_third_observes_it() {
    let (table, _outbox, services) = host();
    let ctx = running(&table, &services, "doors");
    let observed = Arc::new(Mutex::new(Vec::new()));

    let first = observed.clone();
    ctx.add_event_handler("open", move |scope| {
        first.lock().push(("first", scope.is_cancelled()))
    });
    ctx.add_event_handler("open", |scope| scope.cancel());
    let third = observed.clone();
    ctx.add_event_handler("open", move |scope| {
        third.lock().push(("third", scope.is_cancelled()))
    });

    let delivered = ctx.trigger_local("open", &[]).expect("trigger");
    assert!(!delivered);
    assert_eq!(*observed.lock(), vec![("first", false), ("third", true)]);
}

#[test]
fn new_dispatch_starts_uncancelled() {
    let (table, _outbox, services) = host();
    let ctx = running(&table, &services, "doors");
    let cancel_next = Arc::new(Mutex::new(true));
    let readings = Arc::new(Mutex::new(Vec::new()));

    let toggle = cancel_next.clone();
    ctx.add_event_handler("open", move |scope| {
        if *toggle.lock() {
            scope.cancel();
        }
    });
    let seen = readings.clone();
    ctx.add_event_handler("open", move |scope| seen.lock().push(scope.is_cancelled()));

    assert!(!ctx.trigger_local("open", &[]).expect("first"));
    *cancel_next.lock() = false;
    assert!(ctx.trigger_local("open", &[]).expect("second"));
    assert_eq!(*readings.lock(), vec![true, false]);
}

#[test]
fn nested_dispatch_has_its_own_flag() {
    let (table, _outbox, services) = host();
    let ctx = running(&table, &services, "doors");
    let inner_result = Arc::new(Mutex::new(None));

    ctx.add_event_handler("inner", |scope| scope.cancel());
    let nested_ctx = ctx.clone();
    let captured = inner_result.clone();
    ctx.add_event_handler("outer", move |scope| {
        let delivered = nested_ctx.trigger_local("inner", &[]).expect("inner");
        *captured.lock() = Some(delivered);
        assert!(!scope.is_cancelled());
    });

    assert!(ctx.trigger_local("outer", &[]).expect("outer"));
    assert_eq!(*inner_result.lock(), Some(false));
}

#[test]
fn handlers_receive_ordered_payload_and_local_source() {
    let (table, _outbox, services) = host();
    let ctx = running(&table, &services, "chat");
    let received = Arc::new(Mutex::new(None));

    let captured = received.clone();
    ctx.add_event_handler("say", move |scope| {
        *captured.lock() = Some((scope.source(), decode(scope.payload())));
    });
    ctx.trigger_local(
        "say",
        &[
            ScriptValue::from("hello"),
            ScriptValue::Integer(3),
            ScriptValue::Boolean(true),
        ],
    )
    .expect("trigger");

    let (source, payload) = received.lock().take().expect("handler ran");
    assert_eq!(source, EventSource::Local);
    let items = payload.as_array().expect("array payload");
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].as_str(), Some("hello"));
    assert_eq!(items[1].as_i64(), Some(3));
    assert_eq!(items[2].as_bool(), Some(true));
}

#[test]
fn trigger_client_forwards_encoded_args_to_network() {
    let (table, outbox, services) = host();
    let ctx = running(&table, &services, "chat");

    ctx.trigger_client("chat:message", &[ScriptValue::from("hi")], 12)
        .expect("send");
    ctx.trigger_client("chat:ping", &[], 12).expect("send");

    let sent = outbox.drain();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].event_name, "chat:message");
    assert_eq!(sent[0].peer_id, 12);
    assert_eq!(sent[0].max_fanout, MAX_FANOUT);
    let items = decode(&sent[0].payload);
    assert_eq!(items.as_array().map(Vec::len), Some(1));
    assert!(sent[1].payload.is_nil());
}

#[test]
fn remote_events_need_whitelist_but_local_triggers_do_not() {
    let (table, _outbox, services) = host();
    let ctx = running(&table, &services, "auth");
    let hits = Arc::new(Mutex::new(Vec::new()));
    let captured = hits.clone();
    ctx.add_event_handler("auth:login", move |scope| captured.lock().push(scope.source()));

    assert!(ctx.trigger_local("auth:login", &[]).expect("local"));
    assert!(services
        .dispatcher
        .accept_remote_event("auth:login", &EncodedArgs::nil(), 5)
        .is_err());

    ctx.whitelist_event("auth:login");
    assert!(services
        .dispatcher
        .accept_remote_event("auth:login", &EncodedArgs::nil(), 5)
        .expect("whitelisted"));
    assert_eq!(
        *hits.lock(),
        vec![EventSource::Local, EventSource::Peer(5)]
    );
}

#[test]
fn unloading_extension_drops_its_handlers() {
    let (table, _outbox, services) = host();
    let auth = running(&table, &services, "auth");
    let observer = running(&table, &services, "observer");
    auth.add_event_handler("tick", |scope| scope.cancel());
    assert!(!observer.trigger_local("tick", &[]).expect("cancelled"));

    table.unload("auth").expect("unload");
    assert!(observer.trigger_local("tick", &[]).expect("no live handlers"));
    assert_eq!(services.dispatcher.handler_count("tick"), 0);
}

#[test]
fn stopped_and_reloaded_instances_no_longer_handle_events() {
    let (table, _outbox, services) = host();
    let dead = running(&table, &services, "dead");
    let live = running(&table, &services, "live");
    let hits = Arc::new(Mutex::new(0));

    let counter = hits.clone();
    dead.add_event_handler("ev", move |scope| {
        *counter.lock() += 1;
        scope.cancel();
    });
    assert!(!live.trigger_local("ev", &[]).expect("live owner cancels"));
    assert_eq!(*hits.lock(), 1);

    table
        .set_state("dead", ExtensionState::Stopped)
        .expect("stop");
    assert!(live.trigger_local("ev", &[]).expect("after stop"));

    table
        .set_state("dead", ExtensionState::Running)
        .expect("restart");
    table.reload("dead").expect("reload");
    table
        .set_state("dead", ExtensionState::Running)
        .expect("start new instance");
    assert!(live.trigger_local("ev", &[]).expect("after reload"));
    assert_eq!(*hits.lock(), 1);
}

#[test]
fn reload_keeps_handlers_of_the_new_instance() {
    let (table, _outbox, services) = host();
    let old = running(&table, &services, "chat");
    old.add_event_handler("say", |_| {});

    let fresh = services.context_for(table.reload("chat").expect("reload"));
    fresh.add_event_handler("say", |scope| scope.cancel());

    assert!(!fresh.trigger_local("say", &[]).expect("new handler runs"));
    assert_eq!(services.dispatcher.handler_count("say"), 1);
}
