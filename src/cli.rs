// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn today_arg() -> Arg {
    Arg::new("today")
        .long("today")
        .value_name("YYYY-MM-DD")
        .help("Evaluate date-relative figures as of this day")
}

fn tx_filter_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("search")
            .short('s')
            .long("search")
            .help("Case-insensitive match on description or category"),
    )
    .arg(
        Arg::new("type")
            .short('t')
            .long("type")
            .value_parser(["all", "income", "expense", "transfer"])
            .default_value("all"),
    )
    .arg(
        Arg::new("page")
            .short('p')
            .long("page")
            .value_parser(value_parser!(u32).range(1..))
            .default_value("1"),
    )
    .arg(
        Arg::new("page-size")
            .long("page-size")
            .value_parser(value_parser!(u32).range(1..))
            .help("Rows per page (default from config)"),
    )
    .arg(
        Arg::new("sort")
            .long("sort")
            .value_parser(["created_at", "date", "amount"])
            .default_value("created_at"),
    )
    .arg(
        Arg::new("asc")
            .long("asc")
            .action(ArgAction::SetTrue)
            .help("Sort ascending instead of newest first"),
    )
}

fn user_id_arg() -> Arg {
    Arg::new("user_id").required(true).value_name("USER_ID")
}

pub fn build_cli() -> Command {
    Command::new("moneydesk")
        .version(crate_version!())
        .about("Admin console for the personal-finance backend")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("PATH")
                .help("YAML config file (default: platform config dir)"),
        )
        .arg(
            Arg::new("local")
                .long("local")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Use a local SQLite store instead of the hosted backend"),
        )
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .value_name("PATH")
                .requires("local")
                .help("Local store file (default: platform data dir)"),
        )
        .subcommand(json_flags(
            Command::new("overview")
                .about("Totals, 7-day trend and expense breakdown")
                .arg(Arg::new("user").long("user").value_name("USER_ID"))
                .arg(today_arg()),
        ))
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand(json_flags(tx_filter_args(
                    Command::new("list").about("List one page of transactions"),
                ))),
        )
        .subcommand(
            Command::new("users")
                .about("User management")
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List users")
                        .arg(Arg::new("search").short('s').long("search").help(
                            "Case-insensitive match on name, university or student id",
                        )),
                ))
                .subcommand(
                    Command::new("suspend")
                        .about("Suspend a user")
                        .arg(user_id_arg()),
                )
                .subcommand(
                    Command::new("activate")
                        .about("Lift a suspension")
                        .arg(user_id_arg()),
                )
                .subcommand(
                    Command::new("delete")
                        .about("Delete a user (needs the service role key)")
                        .arg(user_id_arg())
                        .arg(
                            Arg::new("yes")
                                .short('y')
                                .long("yes")
                                .action(ArgAction::SetTrue)
                                .help("Do not ask for confirmation"),
                        ),
                ),
        )
        .subcommand(json_flags(
            Command::new("budgets").about("Budget vs spent by category"),
        ))
        .subcommand(json_flags(
            Command::new("goals")
                .about("Savings goals and their progress")
                .arg(today_arg()),
        ))
        .subcommand(tx_filter_args(
            Command::new("watch")
                .about("Live view that re-renders on changes, on a timer, or on Enter")
                .arg(
                    Arg::new("view")
                        .value_parser(["overview", "tx"])
                        .default_value("overview"),
                )
                .arg(
                    Arg::new("interval")
                        .long("interval")
                        .value_name("SECS")
                        .value_parser(value_parser!(u64).range(1..))
                        .help("Polling interval (default from config)"),
                )
                .arg(
                    Arg::new("no-realtime")
                        .long("no-realtime")
                        .action(ArgAction::SetTrue)
                        .help("Ignore store change notifications"),
                ),
        ))
        .subcommand(Command::new("doctor").about("Check configuration and connectivity"))
        .subcommand(
            Command::new("import")
                .about("Load rows into the local store (--local)")
                .arg(
                    Arg::new("table")
                        .long("table")
                        .default_value("transactions")
                        .help("Target table for JSON input; CSV is always transactions"),
                )
                .arg(Arg::new("path").required(true).value_name("FILE")),
        )
}
