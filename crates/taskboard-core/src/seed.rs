//! Demo data for local development.

use crate::error::Result;
use crate::store::Store;
use crate::{board, list, task, user};

const DEMO_EMAIL: &str = "demo@example.com";

/// Populate the store with a demo account and a small board. Safe to run
/// repeatedly: if the demo user exists, nothing is written.
pub fn run(store: &mut Store) -> Result<()> {
    if user::login(store, DEMO_EMAIL, "Demo123!").is_ok() {
        tracing::info!("seed data already present, skipping");
        return Ok(());
    }

    let demo = user::register(store, DEMO_EMAIL, "Demo123!", "Demo User")?;
    let alice = user::register(store, "alice@example.com", "Alice123!", "Alice Johnson")?;
    let bob = user::register(store, "bob@example.com", "Bob123!", "Bob Smith")?;

    let b = board::create(
        store,
        &demo.id,
        "Product Development",
        Some("Main product development board"),
    )?;
    let todo = list::create(store, &b.id, &demo.id, "To Do")?;
    let doing = list::create(store, &b.id, &demo.id, "In Progress")?;
    let done = list::create(store, &b.id, &demo.id, "Done")?;

    let design = task::create(
        store,
        &todo.id,
        &demo.id,
        "Design new landing page",
        Some("Create mockups for the redesigned landing page"),
    )?;
    task::create(
        store,
        &todo.id,
        &demo.id,
        "Set up CI pipeline",
        Some("Automate test and deploy steps"),
    )?;
    task::create(
        store,
        &doing.id,
        &demo.id,
        "Implement auth flow",
        Some("Registration, login, and token refresh"),
    )?;
    task::create(store, &done.id, &demo.id, "Project kickoff", None)?;

    task::assign(store, &design.id, &demo.id, &alice.id)?;
    task::assign(store, &design.id, &demo.id, &bob.id)?;

    tracing::info!(board = %b.id, "seeded demo data");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_idempotent() {
        let mut store = Store::open_in_memory().unwrap();
        run(&mut store).unwrap();
        run(&mut store).unwrap();

        let users: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
            .unwrap();
        let boards: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM boards", [], |r| r.get(0))
            .unwrap();
        assert_eq!(users, 3);
        assert_eq!(boards, 1);
    }
}
