mod common;

use common::Recorder;
use lenstore::todo::{
    parse_line, AppError, Command, Effect, ItemRef, ListItem, TodoApp, TodosAction,
};
use lenstore::config::StoreConfig;
use lenstore::StateStore;

fn app() -> TodoApp {
    TodoApp::new(StateStore::new(Vec::<ListItem>::new()))
}

fn run(app: &TodoApp, line: &str) -> Effect {
    let command = parse_line(line).unwrap().unwrap();
    app.execute(command).unwrap()
}

#[test]
fn adding_todos_updates_list_count() {
    let app = app();
    let Effect::ListAdded { id } = run(&app, "list add Groceries") else {
        panic!("expected ListAdded");
    };
    run(&app, "list add Work");

    let counts = Recorder::new();
    let _subscription = app
        .lists()
        .subscribe({
            let sink = counts.sink();
            move |lists: Vec<ListItem>| sink(lists.iter().map(|l| l.count).collect::<Vec<_>>())
        });

    run(&app, "todo add #1 milk");
    run(&app, &format!("todo add {id} eggs"));

    let todos = app.todos(&id).state();
    assert_eq!(todos.list_title, "Groceries");
    assert_eq!(
        todos.todos.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
        vec!["milk", "eggs"]
    );
    assert_eq!(counts.values(), vec![vec![0, 0], vec![1, 0], vec![2, 0]]);
}

#[test]
fn removing_todo_by_position() {
    let app = app();
    run(&app, "list add Home");
    run(&app, "todo add #1 dishes");
    run(&app, "todo add #1 laundry");

    let Effect::TodosChanged { list_id } = run(&app, "todo remove #1 #1") else {
        panic!("expected TodosChanged");
    };

    let todos = app.todos(&list_id).state();
    assert_eq!(todos.todos.len(), 1);
    assert_eq!(todos.todos[0].text, "laundry");
    assert_eq!(app.lists().state()[0].count, 1);
}

#[test]
fn todos_subscriber_sees_only_its_list() {
    let app = app();
    let Effect::ListAdded { id: first } = run(&app, "list add A") else {
        panic!("expected ListAdded");
    };
    run(&app, "list add B");

    let seen = Recorder::new();
    let _subscription = app
        .todos(&first)
        .subscribe({
            let sink = seen.sink();
            move |todos: lenstore::todo::Todos| sink(todos.todos.len())
        });

    run(&app, "todo add #2 unrelated");
    run(&app, "todo add #1 related");

    assert_eq!(seen.values(), vec![0, 1]);
}

#[test]
fn removing_list_drops_it_from_overview() {
    let app = app();
    run(&app, "list add Old");
    run(&app, "list add New");

    let Effect::ListRemoved { .. } = run(&app, "list remove #1") else {
        panic!("expected ListRemoved");
    };

    let lists = app.lists().state();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].title, "New");
}

#[test]
fn unknown_references_are_errors() {
    let app = app();
    run(&app, "list add Only");

    let err = app
        .execute(Command::AddTodo {
            list: ItemRef::Position(2),
            text: "x".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, AppError::UnknownList(ref r) if r == "#2"));

    let err = app
        .execute(Command::RemoveTodo {
            list: ItemRef::Position(1),
            todo: ItemRef::Id("missing".to_string()),
        })
        .unwrap_err();
    assert!(matches!(err, AppError::UnknownTodo(_)));
}

#[test]
fn todos_store_accepts_actions_directly() {
    let app = app();
    let Effect::ListAdded { id } = run(&app, "list add Direct") else {
        panic!("expected ListAdded");
    };

    let todos = app.todos(&id);
    todos
        .dispatch(TodosAction::Add {
            id: "t1".to_string(),
            text: "first".to_string(),
        })
        .unwrap();
    todos
        .dispatch(TodosAction::Remove {
            id: "t1".to_string(),
        })
        .unwrap();

    assert!(todos.state().todos.is_empty());
    assert_eq!(app.lists().state()[0].count, 0);
}

#[test]
fn show_renders_every_list() {
    let app = app();
    assert_eq!(
        run(&app, "show"),
        Effect::Show("no lists".to_string())
    );

    run(&app, "list add Home");
    run(&app, "todo add #1 dishes");
    run(&app, "list add Work");

    assert_eq!(
        run(&app, "show"),
        Effect::Show("#1 Home:\n  #1 dishes\n#2 Work: (empty)".to_string())
    );
}

#[test]
fn commands_see_each_other_with_thread_schedulers() {
    let config = StoreConfig::from_toml_str(
        "[update]\nkind = \"thread\"\n\n[notification]\nkind = \"thread\"\n",
    )
    .unwrap();
    let store = StateStore::builder()
        .with_config(&config)
        .unwrap()
        .build(Vec::<ListItem>::new());
    let app = TodoApp::new(store);

    let counts = Recorder::new();
    let _subscription = app.lists().subscribe({
        let sink = counts.sink();
        move |lists: Vec<ListItem>| sink(lists.iter().map(|l| l.count).sum::<usize>())
    });

    for _ in 0..5 {
        run(&app, "list add Fast");
        run(&app, "todo add #1 item");
    }

    assert_eq!(app.lists().state().len(), 5);
    assert_eq!(counts.values().last(), Some(&5));
}
