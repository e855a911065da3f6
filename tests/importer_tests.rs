// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use panelpay::{cli, commands::importer};
use rusqlite::Connection;
use std::io::Write;
use tempfile::NamedTempFile;

fn base_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    panelpay::db::init_schema(&conn).unwrap();
    conn
}

fn csv_file(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", body).unwrap();
    file.flush().unwrap();
    file
}

fn run_import(conn: &mut Connection, path: &str) -> anyhow::Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches_from(["panelpay", "import", "sites", "--path", path]);
    if let Some(("import", import_m)) = matches.subcommand() {
        importer::handle(conn, import_m)
    } else {
        panic!("no import subcommand");
    }
}

#[test]
fn imports_valid_sites() {
    let mut conn = base_conn();
    let file = csv_file(
        "name,percentage,code,address,advance\n\
         Merkez Plaza,50,MRK-01,Atatürk Cd. 5,\n  Kule İş Merkezi , 35.5 ,,, 250\n",
    );
    run_import(&mut conn, file.path().to_str().unwrap()).unwrap();

    let mut stmt = conn
        .prepare("SELECT name, agreement_percentage, code, advance_balance FROM sites ORDER BY id")
        .unwrap();
    let rows: Vec<(String, String, Option<String>, String)> = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(
        rows,
        vec![
            (
                "Merkez Plaza".to_string(),
                "50".to_string(),
                Some("MRK-01".to_string()),
                "0".to_string()
            ),
            (
                "Kule İş Merkezi".to_string(),
                "35.5".to_string(),
                None,
                "250".to_string()
            ),
        ]
    );
}

#[test]
fn any_invalid_row_blocks_the_whole_file() {
    let mut conn = base_conn();
    let file = csv_file(
        "name,percentage,code,address,advance\n\
         Good Site,40,,,\n\
         ,20,,,\n\
         Too Much,120,,,\n\
         Bad Code,10,has space,,\n\
         Good Site,30,,,\n\
         Negative,10,,,-5\n",
    );
    let err = run_import(&mut conn, file.path().to_str().unwrap()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("line 3: name is required"), "{}", msg);
    assert!(msg.contains("line 4: percentage 120"), "{}", msg);
    assert!(msg.contains("line 5: invalid code"), "{}", msg);
    assert!(msg.contains("line 6: site 'Good Site' appears twice"), "{}", msg);
    assert!(msg.contains("line 7: invalid advance"), "{}", msg);

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM sites", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn existing_site_names_are_rejected() {
    let mut conn = base_conn();
    conn.execute(
        "INSERT INTO sites(name, agreement_percentage) VALUES ('Merkez', '50')",
        [],
    )
    .unwrap();
    let file = csv_file("name,percentage\nMerkez,40\n");
    let err = run_import(&mut conn, file.path().to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[test]
fn codes_must_be_unique_and_not_numeric() {
    let mut conn = base_conn();
    conn.execute(
        "INSERT INTO sites(name, agreement_percentage, code) VALUES ('Merkez', '50', 'MRK')",
        [],
    )
    .unwrap();
    let file = csv_file(
        "name,percentage,code\n\
         Plaza,40,1\n\
         Kule,30,MRK\n\
         Liman,20,LMN\n\
         Vadi,20,LMN\n",
    );
    let err = run_import(&mut conn, file.path().to_str().unwrap()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("line 2: code '1' reads as a site id"), "{}", msg);
    assert!(msg.contains("line 3: code 'MRK' is already used"), "{}", msg);
    assert!(msg.contains("line 5: code 'LMN' appears twice"), "{}", msg);
    assert!(!msg.contains("line 4"), "{}", msg);

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM sites", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
}
