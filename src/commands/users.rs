// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Ctx, json_flags};
use crate::dashboard::{self, list_users};
use crate::models::Profile;
use crate::query::UserQuery;
use crate::store::DataStore;
use crate::utils::{fmt_day, maybe_print_json, or_dash, pretty_table};
use anyhow::Result;
use std::io::{BufRead, Write};

pub async fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    let Some(store) = ctx.store() else {
        return Ok(());
    };
    let store = store.as_ref();
    match m.subcommand() {
        Some(("list", sub)) => list(store, sub).await?,
        Some(("suspend", sub)) => set_status(store, user_id(sub), true).await?,
        Some(("activate", sub)) => set_status(store, user_id(sub), false).await?,
        Some(("delete", sub)) => delete(store, sub).await?,
        _ => {}
    }
    Ok(())
}

fn user_id(sub: &clap::ArgMatches) -> &str {
    sub.get_one::<String>("user_id")
        .map(|s| s.trim())
        .unwrap_or_default()
}

async fn list(store: &dyn DataStore, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let q = UserQuery {
        search: sub.get_one::<String>("search").cloned().unwrap_or_default(),
    };
    let users = load(store, &q).await;
    if !maybe_print_json(json_flag, jsonl_flag, &users)? {
        println!("{}", render(&users));
    }
    Ok(())
}

async fn load(store: &dyn DataStore, q: &UserQuery) -> Vec<Profile> {
    match list_users(store, q).await {
        Ok(users) => users,
        Err(e) => {
            log::error!("fetching users failed: {}", e);
            eprintln!("Error fetching users: {}", e.user_message());
            Vec::new()
        }
    }
}

/// Mutations are confirmed by the store, then the listing is fetched again.
async fn set_status(store: &dyn DataStore, user_id: &str, suspend: bool) -> Result<()> {
    match dashboard::set_suspended(store, user_id, suspend).await {
        Ok(()) => {
            println!(
                "User {} successfully",
                if suspend { "suspended" } else { "activated" }
            );
            println!("{}", render(&load(store, &UserQuery::default()).await));
        }
        Err(e) => {
            log::error!("updating user {} failed: {}", user_id, e);
            eprintln!("Failed to update user status: {}", e.user_message());
        }
    }
    Ok(())
}

async fn delete(store: &dyn DataStore, sub: &clap::ArgMatches) -> Result<()> {
    let id = user_id(sub);
    if !sub.get_flag("yes") && !confirm(&format!(
        "Are you sure you want to delete user {}? This action cannot be undone. [y/N] ",
        id
    ))? {
        println!("Cancelled");
        return Ok(());
    }
    match dashboard::delete_user(store, id).await {
        Ok(()) => {
            println!("User deleted successfully");
            println!("{}", render(&load(store, &UserQuery::default()).await));
        }
        Err(e) => {
            log::error!("deleting user {} failed: {}", id, e);
            eprintln!("Failed to delete user: {}", e.user_message());
        }
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

pub fn render(users: &[Profile]) -> String {
    if users.is_empty() {
        return "No users found".to_string();
    }
    let rows = users
        .iter()
        .map(|u| {
            vec![
                u.display_name().to_string(),
                or_dash(u.email.as_deref()),
                or_dash(u.university.as_deref()),
                or_dash(u.student_id.as_deref()),
                fmt_day(&u.created_at.date_naive()),
                if u.is_suspended { "Suspended" } else { "Active" }.to_string(),
                u.user_id.clone(),
            ]
        })
        .collect();
    pretty_table(
        &["Name", "Email", "University", "Student ID", "Joined", "Status", "User ID"],
        rows,
    )
    .to_string()
}
