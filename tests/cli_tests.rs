// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use moneydesk::cli;
use moneydesk::commands::{goals, transactions};
use moneydesk::dashboard::TransactionPage;
use moneydesk::models::TransactionType;
use moneydesk::query::{SortField, TransactionQuery, TypeFilter};

fn tx_list(args: &[&str]) -> TransactionQuery {
    let mut argv = vec!["moneydesk", "tx", "list"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let Some(("tx", tx_m)) = matches.subcommand() else {
        panic!("no tx subcommand");
    };
    let Some(("list", list_m)) = tx_m.subcommand() else {
        panic!("no list subcommand");
    };
    transactions::query_from_matches(list_m, 10).unwrap()
}

#[test]
fn list_defaults() {
    let q = tx_list(&[]);
    assert_eq!(q, TransactionQuery::default());
}

#[test]
fn list_flags_map_onto_query() {
    let q = tx_list(&[
        "--search", "coffee", "--type", "expense", "--page", "2", "--page-size", "5", "--sort",
        "amount", "--asc",
    ]);
    assert_eq!(q.search, "coffee");
    assert_eq!(q.type_filter, TypeFilter::Only(TransactionType::Expense));
    assert_eq!(q.page, 2);
    assert_eq!(q.page_size, 5);
    assert_eq!(q.sort, SortField::Amount);
    assert!(!q.descending);
}

#[test]
fn page_zero_is_refused_by_parser() {
    let res = cli::build_cli().try_get_matches_from(["moneydesk", "tx", "list", "--page", "0"]);
    assert!(res.is_err());
}

#[test]
fn local_store_flags() {
    let m = cli::build_cli().get_matches_from(["moneydesk", "--local", "tx", "list"]);
    assert!(m.get_flag("local"));
    assert!(m.get_one::<String>("db").is_none());
    let m = cli::build_cli().get_matches_from(["moneydesk", "doctor"]);
    assert!(!m.get_flag("local"));
    let m = cli::build_cli().get_matches_from(["moneydesk", "--local", "--db", "x.sqlite", "doctor"]);
    assert_eq!(m.get_one::<String>("db").map(String::as_str), Some("x.sqlite"));
}

#[test]
fn watch_accepts_listing_filters() {
    let m = cli::build_cli().get_matches_from([
        "moneydesk", "watch", "tx", "--type", "income", "--interval", "2", "--no-realtime",
    ]);
    let Some(("watch", w)) = m.subcommand() else {
        panic!("no watch subcommand");
    };
    assert_eq!(w.get_one::<String>("view").map(String::as_str), Some("tx"));
    assert_eq!(w.get_one::<u64>("interval"), Some(&2));
    assert!(w.get_flag("no-realtime"));
    let q = transactions::query_from_matches(w, 10).unwrap();
    assert_eq!(q.type_filter, TypeFilter::Only(TransactionType::Income));
}

#[test]
fn empty_page_renders_placeholder() {
    let out = transactions::render_page(&TransactionPage::empty(&TransactionQuery::default()));
    assert!(out.contains("No transactions found"));
    assert!(!out.contains("Showing"));
}

#[test]
fn goal_deadline_labels() {
    assert_eq!(goals::days_label(3), "3 days left");
    assert_eq!(goals::days_label(0), "0 days left");
    assert_eq!(goals::days_label(-1), "Overdue");
}
