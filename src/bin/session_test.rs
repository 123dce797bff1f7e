use formgrid::cell::FlatMap;
use formgrid::config::GridConfig;
use formgrid::grid::{GridError, LoadError};
use formgrid::session::{GridSession, LoadOutcome};
use std::sync::{Arc, Mutex};

fn flat(pairs: &[(&str, &str)]) -> FlatMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// Session whose observer records every snapshot it receives
fn recording_session() -> (GridSession, Arc<Mutex<Vec<FlatMap>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let mut session = GridSession::new(GridConfig::default());
    session.on_change(move |snapshot| sink.lock().unwrap().push(snapshot.clone()));
    (session, seen)
}

#[cfg_attr(test, test)]
fn test_no_table_loaded() {
    println!("\n====== Testing empty session ======");
    let mut session = GridSession::new(GridConfig::default());
    assert!(session.grid().is_none());
    assert!(session.view().is_empty());
    assert!(session.snapshot().is_none());
    assert_eq!(session.insert_row(0), Err(GridError::NoGrid));
    println!("✓ Without a table the view is empty and edits are rejected");
}

#[cfg_attr(test, test)]
fn test_load_applies() {
    println!("\n====== Testing load ======");
    let mut session = GridSession::new(GridConfig::default());
    let ticket = session.begin_load("t1");
    let outcome = session.finish_load(ticket, Ok(flat(&[("cell-1-1", "x"), ("formid", "t1")])));

    assert!(matches!(outcome, LoadOutcome::Applied));
    assert_eq!(session.table_id(), Some("t1"));
    let grid = session.grid().unwrap();
    assert_eq!(grid.row_count(), 2);
    assert_eq!(grid.column_count(), 2);
    assert_eq!(session.view().body, vec![vec!["".to_string(), "x".to_string()]]);
    println!("✓ A current load replaces the grid");
}

#[cfg_attr(test, test)]
fn test_stale_load_discarded() {
    println!("\n====== Testing stale-load guard ======");
    let mut session = GridSession::new(GridConfig::default());
    let first = session.begin_load("old");
    let second = session.begin_load("new");
    assert!(!session.is_current(&first));
    assert!(session.is_current(&second));

    // The newer load resolves first
    let outcome = session.finish_load(second, Ok(flat(&[("cell-0-0", "fresh")])));
    assert!(matches!(outcome, LoadOutcome::Applied));

    // The older one resolves late and must not overwrite
    let outcome = session.finish_load(first, Ok(flat(&[("cell-0-0", "stale")])));
    assert!(matches!(outcome, LoadOutcome::Stale));
    assert_eq!(session.grid().unwrap().get(0, 0), "fresh");
    assert_eq!(session.table_id(), Some("new"));
    println!("✓ Late results of superseded loads are discarded");

    let pending = session.begin_load("other");
    session.open_new(3, 3);
    let outcome = session.finish_load(pending, Ok(flat(&[("cell-0-0", "late")])));
    assert!(matches!(outcome, LoadOutcome::Stale));
    assert_eq!(session.grid().unwrap().row_count(), 3);
    assert_eq!(session.table_id(), None);
    println!("✓ open_new invalidates in-flight loads");
}

#[cfg_attr(test, test)]
fn test_failed_load_falls_back() {
    println!("\n====== Testing failed loads ======");
    let mut session = GridSession::new(GridConfig::default());
    let ticket = session.begin_load("t9");
    let outcome = session.finish_load(ticket, Err(LoadError::Transport("timeout".to_string())));

    match outcome {
        LoadOutcome::Failed(LoadError::Transport(msg)) => assert_eq!(msg, "timeout"),
        other => panic!("unexpected outcome {:?}", other),
    }
    let grid = session.grid().unwrap();
    assert_eq!(grid.row_count(), 2);
    assert_eq!(grid.column_count(), 2);
    assert_eq!(session.table_id(), Some("t9"));
    println!("✓ A failed first load surfaces the error and leaves a default grid");
}

#[cfg_attr(test, test)]
fn test_failed_reload_keeps_grid() {
    let mut session = GridSession::new(GridConfig::default());
    let ticket = session.begin_load("t1");
    session.finish_load(ticket, Ok(flat(&[("cell-2-2", "kept")])));
    session.set_cell(0, 0, "edited").unwrap();
    let before = session.snapshot().unwrap();

    let retry = session.begin_load("t1");
    let outcome = session.finish_load(retry, Err(LoadError::Transport("reset".to_string())));
    assert!(matches!(outcome, LoadOutcome::Failed(_)));
    assert_eq!(session.snapshot().unwrap(), before);
    assert_eq!(session.grid().unwrap().get(2, 2), "kept");
    assert_eq!(session.table_id(), Some("t1"));
    println!("✓ A failed reload of the same table keeps the last good grid");

    let other = session.begin_load("t2");
    session.finish_load(other, Err(LoadError::Transport("reset".to_string())));
    let grid = session.grid().unwrap();
    assert_eq!(grid.row_count(), 2);
    assert_eq!(grid.get(0, 0), "");
    assert_eq!(session.table_id(), Some("t2"));
    println!("✓ A failed load of another table still falls back");
}

#[cfg_attr(test, test)]
fn test_observer_receives_snapshots() {
    println!("\n====== Testing change observer ======");
    let (mut session, seen) = recording_session();
    session.open_new(1, 1);

    session.insert_column(1).unwrap();
    session.set_cell(0, 0, "Name").unwrap();
    session.set_cell(0, 1, "Age").unwrap();
    session.insert_row(1).unwrap();
    session.set_cell(1, 0, "Bob").unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 5);
    assert_eq!(seen[0], flat(&[("cell-0-0", ""), ("cell-0-1", "")]));
    assert_eq!(seen[2].get("cell-0-1").map(String::as_str), Some("Age"));
    assert_eq!(
        seen[4],
        flat(&[
            ("cell-0-0", "Name"),
            ("cell-0-1", "Age"),
            ("cell-1-0", "Bob"),
            ("cell-1-1", ""),
        ])
    );
    println!("✓ Every edit delivers a full snapshot, in call order");
}

#[cfg_attr(test, test)]
fn test_observer_on_every_accepted_edit() {
    let (mut session, seen) = recording_session();
    session.open_new(1, 1);

    assert!(session.insert_row(5).is_err());
    assert!(session.set_cell(3, 0, "x").is_err());
    assert!(seen.lock().unwrap().is_empty());
    println!("✓ Rejected edits do not notify");

    assert_eq!(session.delete_row(0), Ok(false));
    assert_eq!(session.delete_column(0), Ok(false));
    assert_eq!(session.set_cell(0, 0, ""), Ok(false));
    {
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|snap| *snap == flat(&[("cell-0-0", "")])));
    }
    println!("✓ Accepted edits notify even when nothing changed");

    session.insert_row(0).unwrap();
    session.delete_row(0).unwrap();
    assert_eq!(seen.lock().unwrap().len(), 5);
    assert_eq!(session.snapshot().unwrap(), flat(&[("cell-0-0", "")]));
}

fn main() {
    test_no_table_loaded();
    test_load_applies();
    test_stale_load_discarded();
    test_failed_load_falls_back();
    test_failed_reload_keeps_grid();
    test_observer_receives_snapshots();
    test_observer_on_every_accepted_edit();
    println!("\nAll session tests passed.");
}
