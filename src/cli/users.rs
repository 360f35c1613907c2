use super::ui;
use crate::store::{User, UserStore};
use anyhow::Result;
use comfy_table::{Cell, CellAlignment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    List,
    Add { name: String, age: i64 },
    Find { name: String },
    SetAge { name: String, age: i64 },
    Remove { name: String },
}

fn print_users(users: &[User]) {
    if users.is_empty() {
        println!("{}", ui::style_text("No users", ui::StyleType::Subtle));
        return;
    }
    let mut table = ui::new_styled_table();
    table.set_header(ui::header_row(&["ID", "Name", "Age"]));
    for user in users {
        table.add_row(vec![
            Cell::new(user.id).set_alignment(CellAlignment::Right),
            Cell::new(&user.name),
            Cell::new(user.age).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");
}

pub async fn run(store: &UserStore, action: UserAction) -> Result<()> {
    match action {
        UserAction::List => print_users(&store.list().await?),
        UserAction::Add { name, age } => {
            let id = store.insert(&name, age).await?;
            println!("Added {name} with id {id}");
        }
        UserAction::Find { name } => print_users(&store.find_by_name(&name).await?),
        UserAction::SetAge { name, age } => {
            let updated = store.update_age(&name, age).await?;
            println!("Updated {updated} user(s)");
        }
        UserAction::Remove { name } => {
            let deleted = store.delete_by_name(&name).await?;
            println!("Deleted {deleted} user(s)");
        }
    }
    Ok(())
}
