use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocacaoError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Sheet not found in workbook: {0}")]
    MissingSheet(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, LocacaoError>;
