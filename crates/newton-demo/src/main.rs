#![forbid(unsafe_code)]

//! Todo manager connected to a reducer store.
//!
//! ```text
//! RUST_LOG=newton=debug cargo run -p newton-demo [-- binding.toml]
//! ```
//!
//! The optional argument is a `.toml` or `.json` file holding a
//! [`ConnectConfig`].

use std::error::Error;

use newton::{
    BoundAction, BoundActions, ChangeHook, ChangeMap, ConnectConfig, Dispatch, Module, ModuleBase,
    OnChange, ProjectedState, Props, Store, Unsubscribe, connect,
};
use newton_harness::MemoryStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

type Todos = Vec<String>;

const DEFAULT_TODO: &str = "Take out the trash";

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
struct StoreState {
    todos: Todos,
    done_todos: Todos,
}

#[derive(Debug, Clone)]
enum Action {
    AddTodo(String),
    MarkTodoAsDone(String),
}

fn reducer(state: &StoreState, action: Action) -> StoreState {
    let mut next = state.clone();
    match action {
        Action::AddTodo(todo) => next.todos.push(todo),
        Action::MarkTodoAsDone(todo) => {
            next.todos.retain(|t| *t != todo);
            next.done_todos.push(todo);
        }
    }
    next
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

fn map_state(state: &StoreState) -> ProjectedState<Todos> {
    ProjectedState::new()
        .with("todos", state.todos.clone())
        .with("done_todos", state.done_todos.clone())
}

fn map_dispatch(dispatch: &Dispatch<Action>) -> BoundActions<String> {
    BoundActions::new()
        .with(
            "add_default_todo",
            dispatch.bind(|_: String| Action::AddTodo(DEFAULT_TODO.to_string())),
        )
        .with("add_todo", dispatch.bind(Action::AddTodo))
        .with("mark_todo_as_done", dispatch.bind(Action::MarkTodoAsDone))
}

// ---------------------------------------------------------------------------
// TodosManager
// ---------------------------------------------------------------------------

struct TodosManager {
    base: ModuleBase<Todos, String>,
}

impl TodosManager {
    fn todos(&self) -> &[String] {
        self.base.props().field("todos").map(Vec::as_slice).unwrap_or_default()
    }

    fn done_todos(&self) -> &[String] {
        self.base.props().field("done_todos").map(Vec::as_slice).unwrap_or_default()
    }

    fn is_empty(&self) -> bool {
        self.todos().is_empty() && self.done_todos().is_empty()
    }

    fn action(&self, name: &str) -> Option<BoundAction<String>> {
        self.base.props().action(name).cloned()
    }
}

impl Module for TodosManager {
    type Value = Todos;
    type Input = String;

    fn from_props(props: Props<Todos, String>) -> Self {
        let manager = Self {
            base: ModuleBase::new(props),
        };
        info!(
            todos = manager.todos().len(),
            done = manager.done_todos().len(),
            "todos manager created"
        );
        manager
    }

    fn props(&self) -> &Props<Todos, String> {
        self.base.props()
    }

    fn set_props(&mut self, props: Props<Todos, String>) {
        self.base.set_props(props);
    }

    fn change_hook(&mut self) -> ChangeHook<'_, Todos> {
        ChangeHook::Callable(self)
    }

    fn set_unsubscribe(&mut self, unsubscribe: Unsubscribe) {
        self.base.set_unsubscribe(unsubscribe);
    }
}

impl OnChange<Todos> for TodosManager {
    fn on_change(&mut self, changes: &ChangeMap<Todos>) {
        if changes.has_changed("todos") {
            info!(todos = ?self.todos(), "todos have changed");
        }
        if changes.has_changed("done_todos") {
            info!(done = ?self.done_todos(), "done todos have changed");
        }
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ConnectConfig::load(path)?,
        None => ConnectConfig::new().name("todos"),
    };

    let store = MemoryStore::new(StoreState::default(), reducer);
    let binding = connect(map_state, map_dispatch)
        .with_config(config)
        .bind::<TodosManager, _>(&store);

    let run = |name: &str, input: &str| -> Result<(), Box<dyn Error>> {
        let action = binding
            .with_instance(|m| m.action(name))
            .ok_or_else(|| format!("no action bound as `{name}`"))?;
        action.call(input.to_string())?;
        Ok(())
    };

    if binding.with_instance(TodosManager::is_empty) {
        run("add_default_todo", "")?;
    }
    run("add_todo", "Write the report")?;
    run("mark_todo_as_done", DEFAULT_TODO)?;

    binding.unsubscribe();
    store.dispatch(Action::AddTodo("Never seen by the manager".to_string()))?;

    binding.with_instance(|m| {
        info!(todos = ?m.todos(), done = ?m.done_todos(), "final todos");
    });
    Ok(())
}
