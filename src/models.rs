/// Individual (CPF) or organization (CNPJ).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonKind {
    Individual,
    Organization,
}

impl PersonKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Individual => "PF",
            Self::Organization => "PJ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuaranteeType {
    None,
    Deposit,
    Guarantor,
    Insurance,
}

impl GuaranteeType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::None => "nenhuma",
            Self::Deposit => "caucao",
            Self::Guarantor => "fianca",
            Self::Insurance => "seguro_fianca",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantRole {
    Primary,
    Secondary,
}

impl TenantRole {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Primary => "principal",
            Self::Secondary => "secundario",
        }
    }
}

/// Owner or tenant as read from a sheet row, before insert.
#[derive(Debug, Clone)]
pub struct PersonRecord {
    pub kind: PersonKind,
    pub name: String,
    pub tax_id: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bank_notes: Option<String>,
    pub birth_date: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PropertyRecord {
    pub owner_id: String,
    pub label: String,
    pub postal_code: String,
    pub street: String,
    pub rent: f64,
}

/// Fields parsed out of a contract row. `rent` and `start_date` are
/// required for insertion; everything else has a default.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractTerms {
    pub rent: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: String,
    pub due_day: u32,
    pub guarantee: GuaranteeType,
    pub deposit_amount: Option<f64>,
    pub admin_fee_pct: f64,
    pub notes: Option<String>,
}

impl ContractTerms {
    pub fn owner_payout_pct(&self) -> f64 {
        100.0 - self.admin_fee_pct
    }
}
