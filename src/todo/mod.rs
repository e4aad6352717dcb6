//! A small to-do domain built on the store: an overview of lists, and the
//! todos of each list kept as a sub-state of the overview.

mod app;
mod command;
mod model;
mod reducer;

pub use app::{AppError, Effect, TodoApp};
pub use command::{parse_line, Command, CommandError, ItemRef};
pub use model::{todos_key, todos_lens, ListItem, Todo, Todos};
pub use reducer::{ListsAction, ListsReducer, TodosAction, TodosReducer};
