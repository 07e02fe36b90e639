//! Scripting surface over `callref_core`.

pub mod api;

pub use api::{
    add_event_handler, build_proxy, call_proxy, cancel_current_event, init_logging,
    is_current_event_cancelled, mint_handle, trigger_client, trigger_local, whitelist_event,
    ScriptError,
};
