use std::fmt;

use crate::optic::Lens;

/// A to-do list as shown in the overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub id: String,
    pub title: String,
    /// Number of todos in the list, kept in sync by [`todos_lens`].
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: String,
    pub text: String,
}

/// The todos of one list together with the list they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todos {
    pub list_id: String,
    pub list_title: String,
    pub todos: Vec<Todo>,
}

impl fmt::Display for ListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.count)
    }
}

impl fmt::Display for Todos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.list_title)?;
        if self.todos.is_empty() {
            return write!(f, " (empty)");
        }
        for (position, todo) in self.todos.iter().enumerate() {
            write!(f, "\n  #{} {}", position + 1, todo.text)?;
        }
        Ok(())
    }
}

/// Child state key holding the todos of `list_id`.
pub fn todos_key(list_id: &str) -> String {
    format!("list-{list_id}")
}

/// Views `(lists, todos of one list)` as [`Todos`].
///
/// Writing stores the todos and updates the list's `count`. A list that has
/// been removed reads with an empty title.
pub fn todos_lens(list_id: &str) -> Lens<(Vec<ListItem>, Vec<Todo>), Todos> {
    let read_id = list_id.to_string();
    let write_id = list_id.to_string();
    Lens::new(
        move |(lists, todos): &(Vec<ListItem>, Vec<Todo>)| Todos {
            list_id: read_id.clone(),
            list_title: lists
                .iter()
                .find(|list| list.id == read_id)
                .map(|list| list.title.clone())
                .unwrap_or_default(),
            todos: todos.clone(),
        },
        move |(lists, _): &(Vec<ListItem>, Vec<Todo>), todos: Todos| {
            let lists = lists
                .iter()
                .map(|list| {
                    if list.id == write_id {
                        ListItem {
                            count: todos.todos.len(),
                            ..list.clone()
                        }
                    } else {
                        list.clone()
                    }
                })
                .collect();
            (lists, todos.todos)
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optic::{Getter, Setter};

    fn list(id: &str, title: &str) -> ListItem {
        ListItem {
            id: id.to_string(),
            title: title.to_string(),
            count: 0,
        }
    }

    #[test]
    fn test_todos_lens_updates_count() {
        let lens = todos_lens("b");
        let state = (vec![list("a", "Home"), list("b", "Work")], Vec::new());

        let mut todos = lens.get(&state);
        assert_eq!(todos.list_title, "Work");
        todos.todos.push(Todo {
            id: "t1".to_string(),
            text: "write report".to_string(),
        });

        let (lists, stored) = lens.set(&state, todos);
        assert_eq!(lists[0].count, 0);
        assert_eq!(lists[1].count, 1);
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn test_display() {
        let todos = Todos {
            list_id: "a".to_string(),
            list_title: "Home".to_string(),
            todos: vec![Todo {
                id: "1".to_string(),
                text: "dishes".to_string(),
            }],
        };
        assert_eq!(todos.to_string(), "Home:\n  #1 dishes");
        assert_eq!(list("a", "Home").to_string(), "Home (0)");
    }
}
