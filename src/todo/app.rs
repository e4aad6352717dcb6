use std::fmt::Write as _;

use thiserror::Error;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{ReducerStore, StateStore};
use crate::todo::command::{Command, ItemRef};
use crate::todo::model::{todos_key, todos_lens, ListItem, Todos};
use crate::todo::reducer::{ListsAction, ListsReducer, TodosAction, TodosReducer};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no list matches '{0}'")]
    UnknownList(String),

    #[error("no todo matches '{0}'")]
    UnknownTodo(String),
}

/// What a command changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ListAdded { id: String },
    ListRemoved { id: String },
    TodosChanged { list_id: String },
    Show(String),
}

/// The to-do sample: an overview of lists, each with its own todos stored as
/// a sub-state of the overview.
pub struct TodoApp {
    store: StateStore<Vec<ListItem>>,
    lists: ReducerStore<Vec<ListItem>, ListsAction>,
}

impl TodoApp {
    pub fn new(store: StateStore<Vec<ListItem>>) -> Self {
        let lists = store.with_reducer_of::<ListsReducer>();
        Self { store, lists }
    }

    pub fn lists(&self) -> &ReducerStore<Vec<ListItem>, ListsAction> {
        &self.lists
    }

    /// Store of the todos of `list_id`. Writing through it keeps the list's
    /// count up to date.
    pub fn todos(&self, list_id: &str) -> ReducerStore<Todos, TodosAction> {
        self.store
            .sub_state(todos_key(list_id), Vec::new)
            .map(todos_lens(list_id))
            .with_reducer_of::<TodosReducer>()
    }

    pub fn resolve_list(&self, list: &ItemRef) -> Result<ListItem, AppError> {
        let lists = self.lists.state();
        let found = match list {
            ItemRef::Id(id) => lists.into_iter().find(|item| &item.id == id),
            ItemRef::Position(n) => n.checked_sub(1).and_then(|i| lists.into_iter().nth(i)),
        };
        found.ok_or_else(|| AppError::UnknownList(describe(list)))
    }

    /// Runs `command` and waits until its change has reached the state and
    /// every subscriber, so the next command sees it even with thread
    /// schedulers.
    pub fn execute(&self, command: Command) -> Result<Effect, AppError> {
        let effect = self.run(command);
        self.flush();
        effect
    }

    /// Waits for work already handed to the store's schedulers.
    pub fn flush(&self) {
        self.store.flush();
    }

    fn run(&self, command: Command) -> Result<Effect, AppError> {
        match command {
            Command::AddList { title } => {
                let id = new_id();
                self.lists.dispatch(ListsAction::Add {
                    id: id.clone(),
                    title,
                })?;
                Ok(Effect::ListAdded { id })
            }
            Command::RemoveList { list } => {
                let id = self.resolve_list(&list)?.id;
                self.lists.dispatch(ListsAction::Remove { id: id.clone() })?;
                Ok(Effect::ListRemoved { id })
            }
            Command::AddTodo { list, text } => {
                let list_id = self.resolve_list(&list)?.id;
                self.todos(&list_id).dispatch(TodosAction::Add { id: new_id(), text })?;
                Ok(Effect::TodosChanged { list_id })
            }
            Command::RemoveTodo { list, todo } => {
                let list_id = self.resolve_list(&list)?.id;
                let todos = self.todos(&list_id);
                let current = todos.state().todos;
                let found = match &todo {
                    ItemRef::Id(id) => current.into_iter().find(|item| &item.id == id),
                    ItemRef::Position(n) => n.checked_sub(1).and_then(|i| current.into_iter().nth(i)),
                };
                let id = found.ok_or_else(|| AppError::UnknownTodo(describe(&todo)))?.id;
                todos.dispatch(TodosAction::Remove { id })?;
                Ok(Effect::TodosChanged { list_id })
            }
            Command::Show => Ok(Effect::Show(self.render())),
        }
    }

    /// Every list with its todos.
    pub fn render(&self) -> String {
        let lists = self.lists.state();
        if lists.is_empty() {
            return "no lists".to_string();
        }
        let mut out = String::new();
        for (position, list) in lists.iter().enumerate() {
            if position > 0 {
                out.push('\n');
            }
            let _ = write!(out, "#{} {}", position + 1, self.todos(&list.id).state());
        }
        out
    }
}

fn new_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

fn describe(item: &ItemRef) -> String {
    match item {
        ItemRef::Id(id) => id.clone(),
        ItemRef::Position(n) => format!("#{n}"),
    }
}
