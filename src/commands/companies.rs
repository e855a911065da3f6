// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::{SqliteStore, Store};
use crate::utils::{id_for_company, maybe_print_json, pretty_table};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let contact = sub
                .get_one::<String>("contact")
                .map(|s| s.trim())
                .filter(|s| !s.is_empty());
            conn.execute(
                "INSERT INTO companies(name, contact) VALUES (?1, ?2)",
                params![name, contact],
            )?;
            println!("Added company '{}' (id {})", name, conn.last_insert_rowid());
        }
        Some(("list", sub)) => {
            let companies = SqliteStore::new(conn).companies()?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &companies)? {
                let rows = companies
                    .into_iter()
                    .map(|c| vec![c.id.to_string(), c.name, c.contact.unwrap_or_default()])
                    .collect();
                println!("{}", pretty_table(&["ID", "Name", "Contact"], rows));
            }
        }
        Some(("rm", sub)) => {
            let id = id_for_company(conn, sub.get_one::<String>("company").unwrap())?;
            let in_use: i64 = conn.query_row(
                "SELECT COUNT(*) FROM agreements WHERE company_id=?1 AND status != 'archived'",
                params![id],
                |r| r.get(0),
            )?;
            if in_use > 0 {
                return Err(anyhow!(
                    "Company {} still has {} open agreement(s); archive them first",
                    id,
                    in_use
                ));
            }
            conn.execute("DELETE FROM companies WHERE id=?1", params![id])?;
            println!("Removed company {}", id);
        }
        _ => {}
    }
    Ok(())
}
