// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

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
            .help("Print as JSON lines"),
    )
}

fn window_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("from")
            .long("from")
            .required(true)
            .help("Window start, YYYY-MM-DD (inclusive)"),
    )
    .arg(
        Arg::new("to")
            .long("to")
            .required(true)
            .help("Window end, YYYY-MM-DD (inclusive)"),
    )
}

pub fn build_cli() -> Command {
    Command::new("panelpay")
        .version(clap::crate_version!())
        .about("Advertising-panel sites, agreements, cashier ledger and site payments")
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("company")
                .about("Manage advertiser companies")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("contact").long("contact")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("rm").arg(Arg::new("company").long("company").required(true))),
        )
        .subcommand(
            Command::new("site")
                .about("Manage sites hosting panels")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("percentage")
                                .long("percentage")
                                .required(true)
                                .help("Revenue share of the site, 0-100"),
                        )
                        .arg(Arg::new("code").long("code").help("Legacy external id"))
                        .arg(Arg::new("address").long("address")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("rm").arg(Arg::new("site").long("site").required(true)))
                .subcommand(
                    Command::new("advance")
                        .about("Pay an advance to a site")
                        .arg(Arg::new("site").long("site").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("date").long("date").help("Defaults to today")),
                ),
        )
        .subcommand(
            Command::new("agreement")
                .about("Manage panel agreements")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("company").long("company").required(true))
                        .arg(
                            Arg::new("rate")
                                .long("rate")
                                .required(true)
                                .help("Weekly rate per panel"),
                        )
                        .arg(
                            Arg::new("range")
                                .long("range")
                                .required(true)
                                .action(ArgAction::Append)
                                .help("FROM:TO, repeat for discontinuous ranges"),
                        )
                        .arg(
                            Arg::new("panels")
                                .long("panels")
                                .required(true)
                                .action(ArgAction::Append)
                                .help("SITE=COUNT, site by id or name"),
                        ),
                )
                .subcommand(json_flags(Command::new("list")).arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Include archived agreements"),
                ))
                .subcommand(
                    Command::new("archive").arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Cashier ledger")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .required(true)
                                .value_parser(["income", "expense"]),
                        )
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .allow_negative_numbers(true),
                        )
                        .arg(Arg::new("source").long("source").required(true))
                        .arg(Arg::new("description").long("description"))
                        .arg(Arg::new("site").long("site"))
                        .arg(
                            Arg::new("agreement")
                                .long("agreement")
                                .action(ArgAction::Append)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("period_from").long("period-from").requires("period_to"))
                        .arg(Arg::new("period_to").long("period-to").requires("period_from")),
                )
                .subcommand(
                    json_flags(Command::new("list"))
                        .arg(Arg::new("site").long("site"))
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .value_parser(["income", "expense"]),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ),
        )
        .subcommand(
            Command::new("payment")
                .about("Site payment calculation and execution")
                .subcommand(
                    json_flags(window_args(Command::new("calc")))
                        .arg(
                            Arg::new("site")
                                .long("site")
                                .action(ArgAction::Append)
                                .help("Restrict to these sites"),
                        )
                        .arg(
                            Arg::new("track")
                                .long("track")
                                .action(ArgAction::SetTrue)
                                .help("Remember results as pending entries on the sites"),
                        )
                        .arg(
                            Arg::new("skipped")
                                .long("skipped")
                                .action(ArgAction::SetTrue)
                                .help("Also list skipped agreement/site pairs"),
                        ),
                )
                .subcommand(
                    window_args(Command::new("pay"))
                        .arg(Arg::new("site").long("site").required(true))
                        .arg(Arg::new("date").long("date").help("Ledger date, defaults to today"))
                        .arg(
                            Arg::new("yes")
                                .long("yes")
                                .short('y')
                                .action(ArgAction::SetTrue)
                                .help("Do not ask for confirmation"),
                        ),
                )
                .subcommand(json_flags(Command::new("pending")).arg(Arg::new("site").long("site"))),
        )
        .subcommand(
            Command::new("import")
                .about("Import records from CSV")
                .subcommand(Command::new("sites").arg(Arg::new("path").long("path").required(true))),
        )
        .subcommand(
            Command::new("export")
                .about("Export records")
                .subcommand(
                    Command::new("sites")
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .help("csv|json"),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                )
                .subcommand(
                    window_args(Command::new("payments"))
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .help("csv|json"),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Show or change settings")
                .subcommand(Command::new("get").arg(Arg::new("key")))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Check data for inconsistencies"))
}
