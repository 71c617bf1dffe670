//! Domain layer: core entities and screen state.

pub mod events;
pub mod message;
pub mod message_input_state;
pub mod message_list_state;
pub mod shell_state;
pub mod user;

/// Returns the domain module name for smoke checks.
pub fn module_name() -> &'static str {
    "domain"
}
