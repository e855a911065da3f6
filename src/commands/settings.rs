// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{self, Settings};
use crate::utils::pretty_table;
use anyhow::{Result, anyhow};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let settings = Settings::load(conn)?;
            let all = vec![
                vec!["currency".to_string(), settings.currency.clone()],
                vec![
                    "legacy_text_match".to_string(),
                    settings.legacy_text_match.to_string(),
                ],
                vec![
                    "strict_payment_period".to_string(),
                    settings.strict_payment_period.to_string(),
                ],
            ];
            match sub.get_one::<String>("key") {
                Some(k) => {
                    let row = all
                        .iter()
                        .find(|r| r[0] == k.trim())
                        .ok_or_else(|| anyhow!("Unknown setting '{}'", k))?;
                    println!("{}", row[1]);
                }
                None => println!("{}", pretty_table(&["Key", "Value"], all)),
            }
        }
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim();
            let value = sub.get_one::<String>("value").unwrap();
            config::set(conn, key, value)?;
            println!("{} = {}", key, config::get(conn, key)?.unwrap_or_default());
        }
        _ => {}
    }
    Ok(())
}
