use comfy_table::{Cell, Table};

use crate::db::{get_connection, placeholder_owners, recent_runs, table_counts};
use crate::error::Result;
use crate::fmt::{brl, format_tax_id};
use crate::settings::resolve_database_path;

pub fn run(database: Option<String>) -> Result<()> {
    let db_path = resolve_database_path(database.as_deref());
    println!("Database:   {}", db_path.display());

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `locacao init` or `locacao import` first.");
        return Ok(());
    }

    let conn = get_connection(&db_path)?;
    let counts = table_counts(&conn)?;
    println!();
    println!("Owners:       {}", counts.owners);
    println!("Tenants:      {}", counts.tenants);
    println!("Properties:   {}", counts.properties);
    println!("Contracts:    {}", counts.contracts);
    println!("Active rent:  {}", brl(counts.total_rent));

    let placeholders = placeholder_owners(&conn)?;
    if !placeholders.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Placeholder owner", "Tax ID", "Property"]);
        for (name, tax_id, property) in placeholders {
            table.add_row(vec![
                Cell::new(name),
                Cell::new(format_tax_id(&tax_id)),
                Cell::new(property.unwrap_or_default()),
            ]);
        }
        println!("\n{table}");
    }

    let runs = recent_runs(&conn, 5)?;
    if !runs.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Imported at", "File", "Checksum", "Owners", "Tenants", "Properties", "Contracts"]);
        for run in runs {
            table.add_row(vec![
                Cell::new(run.imported_at),
                Cell::new(run.filename),
                Cell::new(&run.checksum[..run.checksum.len().min(12)]),
                Cell::new(run.owners_created),
                Cell::new(run.tenants_created),
                Cell::new(run.properties_created),
                Cell::new(run.contracts_created),
            ]);
        }
        println!("\nRecent imports\n{table}");
    }
    Ok(())
}
