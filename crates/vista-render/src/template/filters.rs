//! MiniJinja helper registration.

use minijinja::value::Value;
use minijinja::{Environment, State};
use vista_dispatch::AliasTable;

/// Registers vista's template helpers on a MiniJinja environment.
///
/// This is called automatically by [`MiniJinjaEngine::new`](super::MiniJinjaEngine::new).
///
/// - `is_action(name, value)`: returns `value` when the intent being rendered
///   belongs to the action `name`, otherwise an empty string. Handy for
///   marking the active navigation entry:
///   `<li class="{{ is_action('home.landing', 'active') }}">`.
/// - `action_alias(name)`: the path of the action's first alias, or an empty
///   string. Reads an empty table until [`register_action_aliases`] is called.
pub fn register_helpers(env: &mut Environment<'_>) {
    env.add_function("is_action", is_action);
    register_action_aliases(env, AliasTable::new());
}

/// Backs `action_alias` with `aliases`, usually a dispatcher's
/// [`alias_table`](vista_dispatch::Dispatcher::alias_table).
///
/// `<a href="{{ action_alias('users.list') }}">Users</a>`
pub fn register_action_aliases(env: &mut Environment<'_>, aliases: AliasTable) {
    env.add_function("action_alias", move |name: String| {
        aliases.path(&name).unwrap_or_default()
    });
}

fn is_action(state: &State, name: String, value: Value) -> Value {
    let current = state
        .lookup("intent")
        .and_then(|intent| intent.get_attr("action").ok())
        .and_then(|action| action.as_str().map(str::to_string));

    match current {
        Some(action) if action == name => value,
        _ => Value::from(""),
    }
}
