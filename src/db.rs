use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS owners (
    id TEXT PRIMARY KEY,
    person_kind TEXT NOT NULL CHECK (person_kind IN ('PF', 'PJ')),
    name TEXT NOT NULL,
    tax_id TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    phone TEXT,
    mobile TEXT,
    address TEXT,
    bank_notes TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS tenants (
    id TEXT PRIMARY KEY,
    person_kind TEXT NOT NULL CHECK (person_kind IN ('PF', 'PJ')),
    name TEXT NOT NULL,
    tax_id TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    phone TEXT,
    mobile TEXT,
    birth_date TEXT,
    address TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS properties (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    postal_code TEXT NOT NULL,
    street TEXT NOT NULL,
    number TEXT NOT NULL,
    complement TEXT,
    neighborhood TEXT NOT NULL,
    city TEXT NOT NULL,
    state TEXT NOT NULL,
    rent REAL NOT NULL DEFAULT 0,
    status TEXT NOT NULL CHECK (status IN ('disponivel', 'locado', 'manutencao')),
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (owner_id) REFERENCES owners(id)
);

CREATE TABLE IF NOT EXISTS contracts (
    id TEXT PRIMARY KEY,
    property_id TEXT NOT NULL,
    primary_tenant_id TEXT NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    rent REAL NOT NULL,
    due_day INTEGER NOT NULL,
    guarantee_type TEXT NOT NULL CHECK (guarantee_type IN ('nenhuma', 'caucao', 'fianca', 'seguro_fianca')),
    deposit_amount REAL,
    admin_fee_pct REAL NOT NULL,
    owner_payout_pct REAL NOT NULL,
    notes TEXT,
    status TEXT NOT NULL CHECK (status IN ('ativo', 'encerrado', 'cancelado')),
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (property_id) REFERENCES properties(id),
    FOREIGN KEY (primary_tenant_id) REFERENCES tenants(id)
);

CREATE TABLE IF NOT EXISTS contract_tenants (
    contract_id TEXT NOT NULL,
    tenant_id TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('principal', 'secundario')),
    PRIMARY KEY (contract_id, tenant_id),
    FOREIGN KEY (contract_id) REFERENCES contracts(id),
    FOREIGN KEY (tenant_id) REFERENCES tenants(id)
);

CREATE TABLE IF NOT EXISTS import_runs (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    checksum TEXT NOT NULL,
    imported_at TEXT DEFAULT (datetime('now')),
    owners_created INTEGER NOT NULL,
    tenants_created INTEGER NOT NULL,
    properties_created INTEGER NOT NULL,
    contracts_created INTEGER NOT NULL
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCounts {
    pub owners: i64,
    pub tenants: i64,
    pub properties: i64,
    pub contracts: i64,
    pub total_rent: f64,
}

pub fn table_counts(conn: &Connection) -> Result<TableCounts> {
    let count = |table: &str| -> Result<i64> {
        Ok(conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))?)
    };
    let total_rent: f64 = conn.query_row(
        "SELECT COALESCE(SUM(rent), 0) FROM contracts WHERE status = 'ativo'",
        [],
        |r| r.get(0),
    )?;
    Ok(TableCounts {
        owners: count("owners")?,
        tenants: count("tenants")?,
        properties: count("properties")?,
        contracts: count("contracts")?,
        total_rent,
    })
}

#[derive(Debug, Clone)]
pub struct ImportRun {
    pub filename: String,
    pub checksum: String,
    pub imported_at: String,
    pub owners_created: i64,
    pub tenants_created: i64,
    pub properties_created: i64,
    pub contracts_created: i64,
}

pub fn recent_runs(conn: &Connection, limit: i64) -> Result<Vec<ImportRun>> {
    let mut stmt = conn.prepare(
        "SELECT filename, checksum, imported_at, owners_created, tenants_created, \
         properties_created, contracts_created FROM import_runs ORDER BY id DESC LIMIT ?1",
    )?;
    let runs = stmt
        .query_map([limit], |row| {
            Ok(ImportRun {
                filename: row.get(0)?,
                checksum: row.get(1)?,
                imported_at: row.get(2)?,
                owners_created: row.get(3)?,
                tenants_created: row.get(4)?,
                properties_created: row.get(5)?,
                contracts_created: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(runs)
}

/// Owners fabricated for properties the spreadsheet left without one:
/// (name, tax id, property label).
pub fn placeholder_owners(conn: &Connection) -> Result<Vec<(String, String, Option<String>)>> {
    let mut stmt = conn.prepare(
        "SELECT o.name, o.tax_id, p.complement FROM owners o \
         LEFT JOIN properties p ON p.owner_id = o.id \
         WHERE o.email LIKE 'temp\\_%@martinez.temp' ESCAPE '\\' ORDER BY o.name",
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["owners", "tenants", "properties", "contracts", "contract_tenants", "import_runs"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_get_connection_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("locacao.db");
        get_connection(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_owner_tax_id_is_unique() {
        let (_dir, conn) = test_db();
        let insert = "INSERT INTO owners (id, person_kind, name, tax_id, email) VALUES (?1, 'PF', 'A', '12345678901', ?2)";
        conn.execute(insert, rusqlite::params!["a", "a@x"]).unwrap();
        assert!(conn.execute(insert, rusqlite::params!["b", "b@x"]).is_err());
    }

    #[test]
    fn test_table_counts_empty() {
        let (_dir, conn) = test_db();
        assert_eq!(table_counts(&conn).unwrap(), TableCounts::default());
        assert!(recent_runs(&conn, 5).unwrap().is_empty());
    }

    #[test]
    fn test_placeholder_owners_matches_temp_emails_only() {
        let (_dir, conn) = test_db();
        conn.execute_batch(
            "INSERT INTO owners (id, person_kind, name, tax_id, email) VALUES
                ('o1', 'PF', 'Proprietário - Loja', '99912345678', 'temp_o1@martinez.temp'),
                ('o2', 'PF', 'Maria', '52998224725', 'prop_52998224725@martinez.temp');
             INSERT INTO properties (id, owner_id, kind, postal_code, street, number, complement,
                neighborhood, city, state, status)
             VALUES ('p1', 'o1', 'Apartamento', '74000-000', 'Rua', 'S/N', 'Loja', 'B', 'C', 'GO', 'locado');",
        )
        .unwrap();
        let rows = placeholder_owners(&conn).unwrap();
        assert_eq!(
            rows,
            vec![("Proprietário - Loja".to_string(), "99912345678".to_string(), Some("Loja".to_string()))]
        );
    }
}
