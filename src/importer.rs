use std::collections::HashMap;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::models::{ContractTerms, PersonKind, PersonRecord, PropertyRecord, TenantRole};
use crate::normalize::{
    classify_guarantee, clean_phone, clean_tax_id, extract_brl, extract_cep, extract_date,
    extract_due_day, extract_end_date, person_kind, tax_id_is_valid, DEFAULT_ADMIN_FEE_PCT,
    DEFAULT_END_DATE, DEFAULT_POSTAL_CODE,
};
use crate::workbook::{cols, sheets, Row, Sheet, Workbook};

/// Property label -> owner id.
pub type OwnerIndex = HashMap<String, String>;
/// Property label -> tenant ids, primary tenant first.
pub type TenantIndex = HashMap<String, Vec<String>>;
/// Property label -> property id.
pub type PropertyIndex = HashMap<String, String>;

const PLACEHOLDER_DOMAIN: &str = "martinez.temp";
const PROPERTY_KIND: &str = "Apartamento";
const PROPERTY_NUMBER: &str = "S/N";
const DEFAULT_STREET: &str = "Goiânia";
const DEFAULT_NEIGHBORHOOD: &str = "Setor Bueno";
const DEFAULT_CITY: &str = "Goiânia";
const DEFAULT_STATE: &str = "GO";
const LABEL_MAX: usize = 100;
const TEXT_MAX: usize = 255;

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonStats {
    pub created: usize,
    pub reused: usize,
    pub skipped: usize,
    pub invalid_tax_ids: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyStats {
    pub created: usize,
    pub reused: usize,
    pub skipped: usize,
    pub placeholder_owners: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractStats {
    pub created: usize,
    pub existing: usize,
    pub missing_terms: usize,
    pub unresolved: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub owners: PersonStats,
    pub tenants: PersonStats,
    pub properties: PropertyStats,
    pub contracts: ContractStats,
}

/// Where a workbook came from, recorded in `import_runs`.
#[derive(Debug, Clone)]
pub struct ImportSource {
    pub filename: String,
    pub checksum: String,
}

impl ImportSource {
    pub fn from_path(file_path: &Path) -> Result<Self> {
        let data = std::fs::read(file_path)?;
        let mut hasher = Sha256::new();
        hasher.update(&data);
        Ok(Self {
            filename: file_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_string(),
            checksum: hex::encode(hasher.finalize()),
        })
    }
}

// ---------------------------------------------------------------------------
// import_workbook
// ---------------------------------------------------------------------------

/// Run all four phases inside one transaction. Nothing is written unless
/// every phase succeeds; on error the transaction is dropped and rolled back.
pub fn import_workbook(
    conn: &mut Connection,
    workbook: &Workbook,
    source: &ImportSource,
) -> Result<ImportSummary> {
    let tx = conn.transaction()?;

    log::info!("Importing owners");
    let (people, owner_stats) =
        import_people(&tx, workbook.sheet(sheets::OWNERS)?, PersonSheet::Owners)?;
    let mut owners = owner_index(people);

    log::info!("Importing tenants");
    let (tenants, tenant_stats) =
        import_people(&tx, workbook.sheet(sheets::TENANTS)?, PersonSheet::Tenants)?;

    log::info!("Importing properties");
    let (properties, property_stats) =
        import_properties(&tx, workbook.sheet(sheets::PROPERTIES)?, &mut owners)?;

    log::info!("Importing contracts");
    let contract_stats =
        import_contracts(&tx, workbook.sheet(sheets::CONTRACTS)?, &properties, &tenants)?;

    let summary = ImportSummary {
        owners: owner_stats,
        tenants: tenant_stats,
        properties: property_stats,
        contracts: contract_stats,
    };
    record_run(&tx, source, &summary)?;
    tx.commit()?;
    log::info!("Import committed");
    Ok(summary)
}

fn record_run(conn: &Connection, source: &ImportSource, summary: &ImportSummary) -> Result<()> {
    conn.execute(
        "INSERT INTO import_runs (filename, checksum, owners_created, tenants_created, \
         properties_created, contracts_created) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            source.filename,
            source.checksum,
            summary.owners.created as i64,
            summary.tenants.created as i64,
            summary.properties.created as i64,
            summary.contracts.created as i64,
        ],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Owners and tenants
// ---------------------------------------------------------------------------

/// Owners and tenants share a row layout; only a few headers and the
/// target table differ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PersonSheet {
    Owners,
    Tenants,
}

impl PersonSheet {
    fn table(&self) -> &'static str {
        match self {
            Self::Owners => "owners",
            Self::Tenants => "tenants",
        }
    }

    fn email_prefix(&self) -> &'static str {
        match self {
            Self::Owners => "prop",
            Self::Tenants => "inq",
        }
    }

    fn email_col(&self) -> &'static str {
        match self {
            Self::Owners => cols::OWNER_EMAIL,
            Self::Tenants => cols::TENANT_EMAIL,
        }
    }

    fn phone_col(&self) -> &'static str {
        match self {
            Self::Owners => cols::OWNER_PHONE,
            Self::Tenants => cols::TENANT_PHONE,
        }
    }

    fn address_col(&self) -> &'static str {
        match self {
            Self::Owners => cols::OWNER_ADDRESS,
            Self::Tenants => cols::TENANT_ADDRESS,
        }
    }

    fn record(&self, row: &Row, name: &str, tax_id: &str) -> PersonRecord {
        let email = row
            .text(self.email_col())
            .unwrap_or_else(|| format!("{}_{tax_id}@{PLACEHOLDER_DOMAIN}", self.email_prefix()));
        PersonRecord {
            kind: person_kind(tax_id),
            name: truncate(name, TEXT_MAX),
            tax_id: tax_id.to_string(),
            email: truncate(&email, TEXT_MAX),
            phone: clean_phone(row.text(self.phone_col()).as_deref()),
            address: row.text(self.address_col()).map(|a| truncate(&a, TEXT_MAX)),
            bank_notes: match self {
                Self::Owners => row.text(cols::OWNER_BANK),
                Self::Tenants => None,
            },
            birth_date: match self {
                Self::Owners => None,
                Self::Tenants => row.date(cols::TENANT_BIRTH),
            },
        }
    }

    fn insert(&self, conn: &Connection, id: &str, p: &PersonRecord) -> Result<()> {
        match self {
            Self::Owners => conn.execute(
                "INSERT INTO owners (id, person_kind, name, tax_id, email, phone, mobile, \
                 address, bank_notes, active) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1)",
                rusqlite::params![
                    id,
                    p.kind.code(),
                    p.name,
                    p.tax_id,
                    p.email,
                    p.phone,
                    p.phone,
                    p.address,
                    p.bank_notes
                ],
            )?,
            Self::Tenants => conn.execute(
                "INSERT INTO tenants (id, person_kind, name, tax_id, email, phone, mobile, \
                 birth_date, address, active) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1)",
                rusqlite::params![
                    id,
                    p.kind.code(),
                    p.name,
                    p.tax_id,
                    p.email,
                    p.phone,
                    p.phone,
                    p.birth_date,
                    p.address
                ],
            )?,
        };
        Ok(())
    }
}

fn find_by_tax_id(conn: &Connection, table: &str, tax_id: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare_cached(&format!("SELECT id FROM {table} WHERE tax_id = ?1"))?;
    Ok(stmt.query_row([tax_id], |r| r.get(0)).optional()?)
}

/// Import one people sheet. Returns property label -> distinct person ids.
/// Tenants keep first-seen order; owners are ordered by last appearance so
/// the final id is the owner from the latest row naming the property.
pub fn import_people(
    conn: &Connection,
    sheet: &Sheet,
    kind: PersonSheet,
) -> Result<(HashMap<String, Vec<String>>, PersonStats)> {
    let mut index: HashMap<String, Vec<String>> = HashMap::new();
    let mut stats = PersonStats::default();

    for row in sheet.rows() {
        let name = row.text(cols::NAME);
        let tax_id = clean_tax_id(row.text(cols::TAX_ID).as_deref()).filter(|t| !t.is_empty());
        let (Some(name), Some(tax_id)) = (name, tax_id) else {
            stats.skipped += 1;
            continue;
        };

        let id = match find_by_tax_id(conn, kind.table(), &tax_id)? {
            Some(id) => {
                stats.reused += 1;
                id
            }
            None => {
                if !tax_id_is_valid(&tax_id) {
                    log::warn!("{}: invalid check digits for tax id {tax_id} ({name})", kind.table());
                    stats.invalid_tax_ids += 1;
                }
                let record = kind.record(&row, &name, &tax_id);
                let id = new_id();
                kind.insert(conn, &id, &record)?;
                log::debug!("{}: inserted {} ({})", kind.table(), record.name, record.tax_id);
                stats.created += 1;
                id
            }
        };

        if let Some(label) = row.text(cols::PROPERTY) {
            let ids = index.entry(label).or_default();
            match kind {
                // Later rows take over the property, so the id moves to the end.
                PersonSheet::Owners => {
                    ids.retain(|existing| existing != &id);
                    ids.push(id);
                }
                PersonSheet::Tenants => {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
        }
    }

    log::info!(
        "{}: {} created, {} reused, {} skipped",
        kind.table(),
        stats.created,
        stats.reused,
        stats.skipped
    );
    Ok((index, stats))
}

/// Owners keyed by property: the owner on the last row naming a property wins.
pub fn owner_index(people: HashMap<String, Vec<String>>) -> OwnerIndex {
    people
        .into_iter()
        .filter_map(|(label, ids)| ids.last().cloned().map(|id| (label, id)))
        .collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// Data-quality fallback: the spreadsheet names a property nobody owns.
fn insert_placeholder_owner(conn: &Connection, label: &str) -> Result<String> {
    let id = new_id();
    let digits: String = uuid::Uuid::new_v4().as_u128().to_string().chars().take(8).collect();
    conn.execute(
        "INSERT INTO owners (id, person_kind, name, tax_id, email, active) \
         VALUES (?1, ?2, ?3, ?4, ?5, 1)",
        rusqlite::params![
            id,
            PersonKind::Individual.code(),
            truncate(&format!("Proprietário - {label}"), TEXT_MAX),
            format!("999{digits}"),
            format!("temp_{id}@{PLACEHOLDER_DOMAIN}"),
        ],
    )?;
    Ok(id)
}

fn find_property(conn: &Connection, complement: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare_cached("SELECT id FROM properties WHERE complement = ?1")?;
    Ok(stmt.query_row([complement], |r| r.get(0)).optional()?)
}

fn property_rent(row: &Row) -> f64 {
    row.number(cols::PROPERTY_RENT)
        .or_else(|| row.text(cols::PROPERTY_RENT).and_then(|t| extract_brl(&t)))
        .unwrap_or(0.0)
}

fn insert_property(conn: &Connection, id: &str, p: &PropertyRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO properties (id, owner_id, kind, postal_code, street, number, complement, \
         neighborhood, city, state, rent, status) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 'locado')",
        rusqlite::params![
            id,
            p.owner_id,
            PROPERTY_KIND,
            p.postal_code,
            p.street,
            PROPERTY_NUMBER,
            p.label,
            DEFAULT_NEIGHBORHOOD,
            DEFAULT_CITY,
            DEFAULT_STATE,
            p.rent,
        ],
    )?;
    Ok(())
}

/// Import the properties sheet. Owners missing from `owners` get a
/// placeholder, which is added to the index.
pub fn import_properties(
    conn: &Connection,
    sheet: &Sheet,
    owners: &mut OwnerIndex,
) -> Result<(PropertyIndex, PropertyStats)> {
    let mut index = PropertyIndex::new();
    let mut stats = PropertyStats::default();

    for row in sheet.rows() {
        let Some(label) = row.text(cols::PROPERTY) else {
            stats.skipped += 1;
            continue;
        };
        let complement = truncate(&label, LABEL_MAX);

        let id = if let Some(existing) = find_property(conn, &complement)? {
            stats.reused += 1;
            existing
        } else {
            let owner_id = match owners.get(&label) {
                Some(id) => id.clone(),
                None => {
                    log::warn!("No owner found for property {label}; creating placeholder owner");
                    let id = insert_placeholder_owner(conn, &label)?;
                    owners.insert(label.clone(), id.clone());
                    stats.placeholder_owners += 1;
                    id
                }
            };
            let address = row.text(cols::PROPERTY_ADDRESS).unwrap_or_default();
            let record = PropertyRecord {
                owner_id,
                postal_code: extract_cep(&address).unwrap_or_else(|| DEFAULT_POSTAL_CODE.to_string()),
                street: if address.is_empty() {
                    DEFAULT_STREET.to_string()
                } else {
                    truncate(&address, TEXT_MAX)
                },
                rent: property_rent(&row),
                label: complement,
            };
            let id = new_id();
            insert_property(conn, &id, &record)?;
            log::debug!("properties: inserted {}", record.label);
            stats.created += 1;
            id
        };
        index.insert(label, id);
    }

    log::info!(
        "properties: {} created, {} reused, {} skipped, {} placeholder owners",
        stats.created,
        stats.reused,
        stats.skipped,
        stats.placeholder_owners
    );
    Ok((index, stats))
}

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

/// Parse the free-text columns of a contract row. The terms column packs
/// rent, start date, due day and (after the last " - ") end date.
pub fn parse_contract_terms(
    terms: &str,
    guarantee: &str,
    admin_fee: Option<f64>,
    notes: Option<String>,
) -> ContractTerms {
    let (guarantee, deposit_amount) = classify_guarantee(guarantee);
    ContractTerms {
        rent: extract_brl(terms),
        start_date: extract_date(terms),
        end_date: extract_end_date(terms).unwrap_or_else(|| DEFAULT_END_DATE.to_string()),
        due_day: extract_due_day(terms),
        guarantee,
        deposit_amount,
        admin_fee_pct: admin_fee.unwrap_or(DEFAULT_ADMIN_FEE_PCT),
        notes,
    }
}

fn contract_exists(conn: &Connection, property_id: &str) -> Result<bool> {
    let mut stmt = conn.prepare_cached("SELECT 1 FROM contracts WHERE property_id = ?1")?;
    Ok(stmt.exists([property_id])?)
}

fn insert_contract(
    conn: &Connection,
    property_id: &str,
    tenant_ids: &[String],
    terms: &ContractTerms,
    rent: f64,
    start_date: &str,
) -> Result<String> {
    let id = new_id();
    conn.execute(
        "INSERT INTO contracts (id, property_id, primary_tenant_id, start_date, end_date, rent, \
         due_day, guarantee_type, deposit_amount, admin_fee_pct, owner_payout_pct, notes, status) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 'ativo')",
        rusqlite::params![
            id,
            property_id,
            tenant_ids[0],
            start_date,
            terms.end_date,
            rent,
            terms.due_day,
            terms.guarantee.code(),
            terms.deposit_amount,
            terms.admin_fee_pct,
            terms.owner_payout_pct(),
            terms.notes,
        ],
    )?;
    conn.execute(
        "UPDATE properties SET rent = ?1 WHERE id = ?2",
        rusqlite::params![rent, property_id],
    )?;
    for (i, tenant_id) in tenant_ids.iter().enumerate() {
        let role = if i == 0 { TenantRole::Primary } else { TenantRole::Secondary };
        conn.execute(
            "INSERT INTO contract_tenants (contract_id, tenant_id, role) VALUES (?1, ?2, ?3)",
            rusqlite::params![id, tenant_id, role.code()],
        )?;
    }
    Ok(id)
}

pub fn import_contracts(
    conn: &Connection,
    sheet: &Sheet,
    properties: &PropertyIndex,
    tenants: &TenantIndex,
) -> Result<ContractStats> {
    let mut stats = ContractStats::default();

    for row in sheet.rows() {
        let Some(label) = row.text(cols::PROPERTY) else {
            stats.skipped += 1;
            continue;
        };

        let property_id = properties.get(&label);
        let tenant_ids = tenants.get(&label).filter(|ids| !ids.is_empty());
        let (Some(property_id), Some(tenant_ids)) = (property_id, tenant_ids) else {
            log::warn!("Incomplete data for contract: {label}");
            stats.unresolved += 1;
            continue;
        };

        let terms = parse_contract_terms(
            &row.text(cols::CONTRACT_TERMS).unwrap_or_default(),
            &row.text(cols::CONTRACT_GUARANTEE).unwrap_or_default(),
            row.number(cols::CONTRACT_ADMIN_FEE),
            row.text(cols::CONTRACT_NOTES),
        );

        if contract_exists(conn, property_id)? {
            stats.existing += 1;
            continue;
        }

        let rent = terms.rent.filter(|r| *r > 0.0);
        let (Some(rent), Some(start_date)) = (rent, terms.start_date.as_deref()) else {
            log::warn!("Contract for {label} is missing rent or start date; skipped");
            stats.missing_terms += 1;
            continue;
        };

        insert_contract(conn, property_id, tenant_ids, &terms, rent, start_date)?;
        log::debug!("contracts: inserted {label} ({rent:.2} from {start_date})");
        stats.created += 1;
    }

    log::info!(
        "contracts: {} created, {} already present, {} missing terms, {} unresolved",
        stats.created,
        stats.existing,
        stats.missing_terms,
        stats.unresolved
    );
    Ok(stats)
}
