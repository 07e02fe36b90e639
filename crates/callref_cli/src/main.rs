//! CLI smoke entry point.
//!
//! # Responsibility
//! - Wire two extensions through the core and exercise one shared handle,
//!   one cancelled event and one remote send.
//! - Keep output deterministic `key=value` lines for quick sanity checks.

use callref_core::{
    init_from_config, EventDispatcher, EventOutbox, ExtensionState, ExtensionTable, HostConfig,
    HostServices, ScriptFunction, ScriptValue,
};
use callref_script::{
    add_event_handler, build_proxy, call_proxy, cancel_current_event, mint_handle,
    trigger_client, trigger_local,
};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    let config = match HostConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = init_from_config(&config) {
        eprintln!("logging error: {err}");
        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("smoke run failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &HostConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Why: keep a tiny in-process host to validate handle and event wiring
    // without a real script runtime or network layer.
    println!("callref_core version={}", callref_core::core_version());

    let table = Arc::new(ExtensionTable::new());
    let outbox = Arc::new(EventOutbox::new());
    let dispatcher = EventDispatcher::new(outbox.clone()).with_max_fanout(config.max_fanout);
    let services = HostServices::new(table.clone(), Arc::new(dispatcher));

    let greeter = table.load("greeter")?;
    let caller = table.load("caller")?;
    table.set_state("greeter", ExtensionState::Running)?;
    table.set_state("caller", ExtensionState::Running)?;
    let greeter_ctx = services.context_for(greeter);
    let caller_ctx = services.context_for(caller);
    println!("extensions={}", table.names().join(","));

    let handle = mint_handle(
        &greeter_ctx,
        ScriptFunction::with_arity("greet", 1, |args| {
            let name = args.first().and_then(ScriptValue::as_str).unwrap_or("nobody");
            vec![ScriptValue::from(format!("hello, {name}"))]
        }),
    );
    println!("handle={handle}");

    let proxy = build_proxy(
        &caller_ctx,
        handle.reference_id,
        handle.instance_id,
        &handle.owner_name,
    )?;
    let greeting = call_proxy(&proxy, vec![ScriptValue::Nil, ScriptValue::from("caller")]);
    println!(
        "invoke={}",
        greeting.first().and_then(ScriptValue::as_str).unwrap_or("")
    );

    let reloaded = table.reload("greeter")?;
    table.set_state("greeter", ExtensionState::Running)?;
    let greeter_ctx = services.context_for(reloaded);
    let stale = call_proxy(&proxy, vec![ScriptValue::Nil, ScriptValue::from("caller")]);
    println!("invoke_after_reload_results={}", stale.len());

    add_event_handler(&caller_ctx, "smoke:event", cancel_current_event);
    let delivered = trigger_local(&greeter_ctx, "smoke:event", &[ScriptValue::Integer(1)]);
    println!("trigger_local_delivered={delivered}");

    trigger_client(&caller_ctx, "smoke:remote", 1, &[ScriptValue::from("ping")]);
    for event in outbox.drain() {
        println!(
            "remote_event name={} peer_id={} bytes={} max_fanout={}",
            event.event_name,
            event.peer_id,
            event.payload.len(),
            event.max_fanout
        );
    }
    Ok(())
}
