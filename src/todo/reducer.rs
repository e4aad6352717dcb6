//! Reducers for the to-do sample.

use crate::store::Reducer;
use crate::todo::model::{ListItem, Todo, Todos};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListsAction {
    Add { id: String, title: String },
    Remove { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodosAction {
    Add { id: String, text: String },
    Remove { id: String },
}

/// Maintains the overview of lists.
pub struct ListsReducer;

impl Reducer for ListsReducer {
    type State = Vec<ListItem>;
    type Action = ListsAction;

    fn reduce(mut state: Vec<ListItem>, action: ListsAction) -> Vec<ListItem> {
        match action {
            ListsAction::Add { id, title } => {
                state.push(ListItem { id, title, count: 0 });
                state
            }
            ListsAction::Remove { id } => {
                state.retain(|list| list.id != id);
                state
            }
        }
    }
}

/// Maintains the todos of a single list.
pub struct TodosReducer;

impl Reducer for TodosReducer {
    type State = Todos;
    type Action = TodosAction;

    fn reduce(mut state: Todos, action: TodosAction) -> Todos {
        match action {
            TodosAction::Add { id, text } => state.todos.push(Todo { id, text }),
            TodosAction::Remove { id } => state.todos.retain(|todo| todo.id != id),
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_add_then_remove() {
        let state = ListsReducer::reduce(
            Vec::new(),
            ListsAction::Add {
                id: "a".to_string(),
                title: "Home".to_string(),
            },
        );
        assert_eq!(state.len(), 1);
        assert_eq!(state[0].count, 0);

        let state = ListsReducer::reduce(state, ListsAction::Remove { id: "x".to_string() });
        assert_eq!(state.len(), 1);
        let state = ListsReducer::reduce(state, ListsAction::Remove { id: "a".to_string() });
        assert!(state.is_empty());
    }
}
