use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use rust_xlsxwriter::Workbook;

const OWNER_HEADERS: &[&str] = &[
    "NOME/RAZÃO SOCIAL*",
    "CPF/CNPJ*",
    "EMAIL",
    "WPP/TELEFONE",
    "ENDEREÇO COMPLETO",
    "DADOS BANCÁRIOS",
    "IMÓVEL LOCADO:",
];
const TENANT_HEADERS: &[&str] = &[
    "NOME/RAZÃO SOCIAL*",
    "CPF/CNPJ*",
    "EMAIL*",
    "WPP/TELEFONE*",
    "ENDEREÇO COMPLETO*",
    "DATA DE NASCIMENTO",
    "IMÓVEL LOCADO:",
];
const PROPERTY_HEADERS: &[&str] = &["IMÓVEL LOCADO:", "CEP - ENDEREÇO COMPLETO", "VALOR DO ALUGUEL"];
const CONTRACT_HEADERS: &[&str] = &[
    "IMÓVEL LOCADO:",
    "DADOS DO CONTRATO (VALOR DO ALUGUEL, DATA DE INÍCIO, DURAÇÃO, DATA DE TÉRMINO, DIA DO VENCIMENTO)",
    "GARANTIAS (FIANÇA, CAUÇÃO OU SEGURO-FIANÇA)",
    "VALOR DA ADMINISTRAÇÃO",
    "OBSERVAÇÕES",
];

fn write_sheet(wb: &mut Workbook, name: &str, headers: &[&str], rows: &[&[&str]]) {
    let ws = wb.add_worksheet();
    ws.set_name(name).unwrap();
    for (c, h) in headers.iter().enumerate() {
        ws.write_string(0, c as u16, *h).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                ws.write_string(r as u32 + 1, c as u16, *value).unwrap();
            }
        }
    }
}

fn write_workbook(dir: &Path, with_contracts: bool) -> PathBuf {
    let path = dir.join("controle-locacao.xlsx");
    let mut wb = Workbook::new();
    write_sheet(
        &mut wb,
        "Proprietários",
        OWNER_HEADERS,
        &[
            &["João Silva", "529.982.247-25", "", "(62) 99999-1234", "Rua 10", "Itaú", "Ed. Aurora 101"],
            &["Imob Ltda", "11.222.333/0001-81", "contato@imob.com", "", "", "", "Casa Verde"],
        ],
    );
    write_sheet(
        &mut wb,
        "Inquilinos",
        TENANT_HEADERS,
        &[
            &["Ana Souza", "111.444.777-35", "ana@mail.com", "", "", "02/05/1990", "Ed. Aurora 101"],
            &["Carla Dias", "390.533.447-05", "", "", "", "", "Casa Verde"],
        ],
    );
    write_sheet(
        &mut wb,
        "Imóveis",
        PROPERTY_HEADERS,
        &[
            &["Ed. Aurora 101", "Rua T-30, 74210-030", "R$ 2.500,00"],
            &["Casa Verde", "Av. 85", ""],
        ],
    );
    if with_contracts {
        write_sheet(
            &mut wb,
            "Contratos",
            CONTRACT_HEADERS,
            &[
                &["Ed. Aurora 101", "R$ 2.600,00 INÍCIO 01/03/2024 TODO DIA 10 - 31/08/2026", "Caução R$ 5.200,00", "", ""],
                &["Casa Verde", "sem valor", "Fiança", "", ""],
            ],
        );
    }
    wb.save(&path).unwrap();
    path
}

fn locacao(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("locacao").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env_remove("DATABASE_URL")
        .env_remove("LOCACAO_WORKBOOK")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn count(db: &Path, table: &str) -> i64 {
    let conn = rusqlite::Connection::open(db).unwrap();
    conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))
        .unwrap()
}

#[test]
fn analyze_prints_structure_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let xlsx = write_workbook(dir.path(), true);
    locacao(dir.path())
        .args(["analyze", "--file"])
        .arg(&xlsx)
        .assert()
        .success()
        .stdout(predicate::str::contains("Proprietários"))
        .stdout(predicate::str::contains("2 rows x 7 columns"))
        .stdout(predicate::str::contains("CPF/CNPJ*"))
        .stdout(predicate::str::contains("Type"));
    assert!(!dir.path().join("locacao.db").exists());
}

#[test]
fn import_then_reimport_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let xlsx = write_workbook(dir.path(), true);
    let db = dir.path().join("locacao.db");

    for _ in 0..2 {
        locacao(dir.path())
            .args(["import", "--file"])
            .arg(&xlsx)
            .arg("--database")
            .arg(&db)
            .assert()
            .success()
            .stdout(predicate::str::contains("Import committed."));
    }

    assert_eq!(count(&db, "owners"), 2);
    assert_eq!(count(&db, "tenants"), 2);
    assert_eq!(count(&db, "properties"), 2);
    assert_eq!(count(&db, "contracts"), 1);
    assert_eq!(count(&db, "import_runs"), 2);

    locacao(dir.path())
        .arg("status")
        .arg("--database")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Contracts:    1"))
        .stdout(predicate::str::contains("R$ 2.600,00"))
        .stdout(predicate::str::contains("controle-locacao.xlsx"));
}

#[test]
fn database_url_env_selects_database() {
    let dir = tempfile::tempdir().unwrap();
    let xlsx = write_workbook(dir.path(), true);
    let db = dir.path().join("from-env.db");

    locacao(dir.path())
        .env("DATABASE_URL", format!("sqlite://{}", db.display()))
        .args(["import", "--file"])
        .arg(&xlsx)
        .assert()
        .success();
    assert_eq!(count(&db, "contracts"), 1);
}

#[test]
fn failed_import_rolls_back_and_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let xlsx = write_workbook(dir.path(), false);
    let db = dir.path().join("locacao.db");

    locacao(dir.path())
        .args(["import", "--file"])
        .arg(&xlsx)
        .arg("--database")
        .arg(&db)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("rolled back"))
        .stderr(predicate::str::contains("Contratos"));

    assert_eq!(count(&db, "owners"), 0);
    assert_eq!(count(&db, "properties"), 0);
}

#[test]
fn init_remembers_database_for_later_commands() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("dados").join("locacao.db");

    locacao(dir.path())
        .arg("init")
        .arg("--database")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized database"));
    assert!(dir.path().join(".config/locacao/settings.json").exists());

    locacao(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Owners:       0"));
}

#[test]
fn missing_workbook_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    locacao(dir.path())
        .args(["analyze", "--file", "nao-existe.xlsx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
