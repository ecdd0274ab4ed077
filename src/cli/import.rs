use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::importer::{import_workbook, ImportSource, ImportSummary};
use crate::settings::{resolve_database_path, resolve_workbook_path};
use crate::workbook::Workbook;

pub fn run(file: Option<String>, database: Option<String>) -> Result<()> {
    let workbook_path = resolve_workbook_path(file.as_deref());
    let db_path = resolve_database_path(database.as_deref());

    println!("Importing {} into {}", workbook_path.display(), db_path.display());

    let workbook = Workbook::open(&workbook_path)?;
    let source = ImportSource::from_path(&workbook_path)?;
    let mut conn = get_connection(&db_path)?;
    init_db(&conn)?;

    let summary = import_workbook(&mut conn, &workbook, &source)?;
    print!("{}", format_summary(&summary));
    println!("{}", "Import committed.".green().bold());
    Ok(())
}

pub fn format_summary(s: &ImportSummary) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Sheet", "Created", "Reused", "Skipped"]);
    table.add_row(vec![
        Cell::new("Owners"),
        Cell::new(s.owners.created),
        Cell::new(s.owners.reused),
        Cell::new(s.owners.skipped),
    ]);
    table.add_row(vec![
        Cell::new("Tenants"),
        Cell::new(s.tenants.created),
        Cell::new(s.tenants.reused),
        Cell::new(s.tenants.skipped),
    ]);
    table.add_row(vec![
        Cell::new("Properties"),
        Cell::new(s.properties.created),
        Cell::new(s.properties.reused),
        Cell::new(s.properties.skipped),
    ]);
    table.add_row(vec![
        Cell::new("Contracts"),
        Cell::new(s.contracts.created),
        Cell::new(s.contracts.existing),
        Cell::new(s.contracts.skipped + s.contracts.missing_terms + s.contracts.unresolved),
    ]);

    let mut out = format!("{table}\n");
    let warnings = [
        (s.contracts.missing_terms, "contract row(s) without rent or start date"),
        (s.contracts.unresolved, "contract row(s) with no matching property or tenant"),
        (s.properties.placeholder_owners, "placeholder owner(s) created for unowned properties"),
        (
            s.owners.invalid_tax_ids + s.tenants.invalid_tax_ids,
            "tax id(s) with invalid check digits",
        ),
    ];
    for (n, what) in warnings {
        if n > 0 {
            out.push_str(&format!("{}\n", format!("{n} {what}").yellow()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::{ContractStats, PropertyStats};

    #[test]
    fn test_summary_lists_warnings_only_when_present() {
        colored::control::set_override(false);
        let clean = ImportSummary::default();
        assert!(!format_summary(&clean).contains("placeholder"));

        let summary = ImportSummary {
            properties: PropertyStats {
                created: 3,
                placeholder_owners: 1,
                ..Default::default()
            },
            contracts: ContractStats {
                created: 2,
                missing_terms: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        let text = format_summary(&summary);
        assert!(text.contains("Properties"));
        assert!(text.contains("1 placeholder owner(s) created for unowned properties"));
        assert!(text.contains("1 contract row(s) without rent or start date"));
        assert!(!text.contains("invalid check digits"));
    }
}
