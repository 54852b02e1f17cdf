// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use moneydesk::error::StoreError;
use moneydesk::models::TransactionType;
use moneydesk::query::{
    SortField, TableQuery, TransactionQuery, TypeFilter, UserQuery, total_pages,
};
use moneydesk::store::rest::{admin_user_url, parse_content_range, query_params};

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

#[test]
fn default_listing_is_first_page_newest_first() {
    let q = TransactionQuery::default().to_table_query().unwrap();
    assert_eq!(q.table, "transactions");
    assert!(q.count);
    assert_eq!(q.offset, Some(0));
    assert_eq!(q.limit, Some(10));
    let order = q.order.unwrap();
    assert_eq!(order.column, "created_at");
    assert!(order.descending);
    assert!(q.search.is_none());
    assert!(q.filters.is_empty());
}

#[test]
fn second_page_skips_first_ten() {
    let q = TransactionQuery {
        page: 2,
        ..TransactionQuery::default()
    };
    let tq = q.to_table_query().unwrap();
    assert_eq!(tq.offset, Some(10));
    assert_eq!(tq.limit, Some(10));
    let params = query_params(&tq);
    assert_eq!(param(&params, "offset"), Some("10"));
    assert_eq!(param(&params, "limit"), Some("10"));
}

#[test]
fn page_zero_is_rejected() {
    let q = TransactionQuery {
        page: 0,
        ..TransactionQuery::default()
    };
    assert!(matches!(q.to_table_query(), Err(StoreError::InvalidQuery(_))));

    let q = TransactionQuery {
        page_size: 0,
        ..TransactionQuery::default()
    };
    assert!(matches!(q.to_table_query(), Err(StoreError::InvalidQuery(_))));
}

#[test]
fn search_matches_description_or_category() {
    let q = TransactionQuery {
        search: "coffee".into(),
        ..TransactionQuery::default()
    };
    let params = query_params(&q.to_table_query().unwrap());
    assert_eq!(
        param(&params, "or"),
        Some("(description.ilike.*coffee*,category.ilike.*coffee*)")
    );
}

#[test]
fn empty_search_adds_no_condition() {
    let q = TransactionQuery {
        search: String::new(),
        ..TransactionQuery::default()
    };
    let params = query_params(&q.to_table_query().unwrap());
    assert_eq!(param(&params, "or"), None);
}

#[test]
fn search_keeps_surrounding_whitespace() {
    let q = TransactionQuery {
        search: " bus".into(),
        ..TransactionQuery::default()
    };
    let tq = q.to_table_query().unwrap();
    assert_eq!(tq.search.as_ref().map(|s| s.term.as_str()), Some(" bus"));
    let params = query_params(&tq);
    assert_eq!(
        param(&params, "or"),
        Some("(description.ilike.\"* bus*\",category.ilike.\"* bus*\")")
    );

    let tq = TableQuery::new("transactions").ilike_any(&["description"], "   ");
    assert!(tq.search.is_some());
}

#[test]
fn literal_star_in_search_matches_one_character() {
    let tq = TableQuery::new("transactions").ilike_any(&["description"], "a*b");
    let params = query_params(&tq);
    assert_eq!(param(&params, "or"), Some("(description.ilike.*a_b*)"));
}

#[test]
fn search_terms_with_reserved_characters_are_quoted() {
    let tq = TableQuery::new("transactions").ilike_any(&["description"], "a,b");
    let params = query_params(&tq);
    assert_eq!(param(&params, "or"), Some("(description.ilike.\"*a,b*\")"));
}

#[test]
fn type_filter_becomes_equality() {
    let q = TransactionQuery {
        type_filter: "Expense".parse().unwrap(),
        ..TransactionQuery::default()
    };
    assert_eq!(q.type_filter, TypeFilter::Only(TransactionType::Expense));
    let params = query_params(&q.to_table_query().unwrap());
    assert_eq!(param(&params, "type"), Some("eq.expense"));

    let all: TypeFilter = "all".parse().unwrap();
    assert_eq!(all, TypeFilter::All);
    assert!("refund".parse::<TypeFilter>().is_err());
}

#[test]
fn amount_sort_is_numeric() {
    let q = TransactionQuery {
        sort: SortField::Amount,
        descending: false,
        ..TransactionQuery::default()
    };
    let tq = q.to_table_query().unwrap();
    let order = tq.order.clone().unwrap();
    assert!(order.numeric);
    assert_eq!(param(&query_params(&tq), "order"), Some("amount.asc"));
    assert!("payee".parse::<SortField>().is_err());
}

#[test]
fn batched_lookup_quotes_values() {
    let tq = TableQuery::new("profiles").is_in("user_id", ["u1", "a,b"]);
    let params = query_params(&tq);
    assert_eq!(param(&params, "select"), Some("*"));
    assert_eq!(param(&params, "user_id"), Some("in.(u1,\"a,b\")"));
}

#[test]
fn user_search_covers_name_university_and_student_id() {
    let tq = UserQuery {
        search: "mit".into(),
    }
    .to_table_query();
    assert_eq!(tq.table, "profiles");
    let s = tq.search.clone().unwrap();
    assert_eq!(s.columns, vec!["name", "university", "student_id"]);
    assert_eq!(param(&query_params(&tq), "order"), Some("created_at.desc"));
}

#[test]
fn bad_identifiers_are_rejected() {
    assert!(TableQuery::new("transactions;drop").validate().is_err());
    assert!(
        TableQuery::new("transactions")
            .eq("amount) or (1", "x")
            .validate()
            .is_err()
    );
    assert!(TableQuery::new("goals").order("target_date", false).validate().is_ok());
}

#[test]
fn content_range_totals() {
    assert_eq!(parse_content_range("0-9/25"), Some(25));
    assert_eq!(parse_content_range("*/0"), Some(0));
    assert_eq!(parse_content_range("0-9/*"), None);
    assert_eq!(parse_content_range("garbage"), None);
}

#[test]
fn page_count_rounds_up() {
    assert_eq!(total_pages(25, 10), 3);
    assert_eq!(total_pages(20, 10), 2);
    assert_eq!(total_pages(0, 10), 0);
}

#[test]
fn admin_url_encodes_the_user_id() {
    let url = admin_user_url("https://abc.supabase.co", "a/b c?x").unwrap();
    assert_eq!(
        url.as_str(),
        "https://abc.supabase.co/auth/v1/admin/users/a%2Fb%20c%3Fx"
    );
    let url = admin_user_url("https://abc.supabase.co/", "u1").unwrap();
    assert_eq!(url.path(), "/auth/v1/admin/users/u1");
    assert!(matches!(
        admin_user_url("not a url", "u1"),
        Err(StoreError::InvalidQuery(_))
    ));
}
