use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, resolve_database_path, save_settings, shellexpand_path};

pub fn run(database: Option<String>) -> Result<()> {
    let db_path = resolve_database_path(database.as_deref());
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;

    let resolved = shellexpand_path(&db_path.to_string_lossy());
    let mut settings = load_settings();
    settings.database_path = resolved.clone();
    save_settings(&settings)?;

    println!("Initialized database at {resolved}");
    Ok(())
}
