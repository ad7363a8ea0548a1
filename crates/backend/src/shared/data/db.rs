use once_cell::sync::OnceCell;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Таблицы агрегатов, проекций и журнала импорта
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS a001_gas_gage (
        device_id TEXT PRIMARY KEY NOT NULL,
        center_id TEXT NOT NULL DEFAULT '',
        serial_number TEXT NOT NULL DEFAULT '',
        model TEXT,
        code_name TEXT,
        erp_id TEXT,
        protocol TEXT,
        black REAL,
        cyan REAL,
        magenta REAL,
        yellow REAL,
        special_color REAL,
        special_color_gage TEXT,
        customer TEXT,
        customer_site TEXT,
        customer_number TEXT,
        sales_office TEXT,
        service_office TEXT,
        latest_receive_date TEXT,
        device_host_name TEXT,
        device_location TEXT,
        toner_replacement_date_black TEXT,
        toner_replacement_date_cyan TEXT,
        toner_replacement_date_magenta TEXT,
        toner_replacement_date_yellow TEXT,
        toner_replacement_date_special_color TEXT,
        created_at TEXT,
        updated_at TEXT
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_a001_gas_gage_serial ON a001_gas_gage (serial_number);",
    r#"
    CREATE TABLE IF NOT EXISTS a002_device (
        serial_number TEXT PRIMARY KEY NOT NULL,
        device_id TEXT,
        center_id TEXT,
        code_name TEXT,
        service_office TEXT,
        department TEXT,
        device_host_name TEXT,
        customer_name TEXT,
        model TEXT,
        location TEXT,
        last_updated_at TEXT,
        last_seen_at TEXT,
        last_meter_received_at TEXT,
        offline_threshold_minutes INTEGER,
        toner_c_percent REAL,
        toner_m_percent REAL,
        toner_y_percent REAL,
        toner_k_percent REAL,
        waste_toner_percent REAL,
        warning_message TEXT,
        counter_total INTEGER,
        counter_color INTEGER,
        counter_mono INTEGER,
        created_at TEXT,
        updated_at TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a003_supply_order (
        order_id TEXT PRIMARY KEY NOT NULL,
        device_id TEXT NOT NULL,
        customer_name TEXT NOT NULL,
        order_type TEXT NOT NULL,
        toner_color TEXT,
        status TEXT NOT NULL DEFAULT 'open',
        created_at TEXT NOT NULL,
        ordered_at TEXT,
        sales_order_number TEXT
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_a003_supply_order_device ON a003_supply_order (device_id, status);",
    r#"
    CREATE TABLE IF NOT EXISTS a004_alert_settings (
        device_id TEXT PRIMARY KEY NOT NULL,
        black_threshold REAL NOT NULL DEFAULT 15,
        cyan_threshold REAL NOT NULL DEFAULT 15,
        magenta_threshold REAL NOT NULL DEFAULT 15,
        yellow_threshold REAL NOT NULL DEFAULT 15,
        special_color_threshold REAL,
        alerts_enabled INTEGER NOT NULL DEFAULT 1,
        black_enabled INTEGER NOT NULL DEFAULT 1,
        cyan_enabled INTEGER NOT NULL DEFAULT 1,
        magenta_enabled INTEGER NOT NULL DEFAULT 1,
        yellow_enabled INTEGER NOT NULL DEFAULT 1,
        replacement_detection_threshold REAL NOT NULL DEFAULT 70,
        offline_alert_enabled INTEGER NOT NULL DEFAULT 1,
        offline_threshold_hours INTEGER NOT NULL DEFAULT 24,
        created_at TEXT,
        updated_at TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a005_warning_override (
        id TEXT PRIMARY KEY NOT NULL,
        device_id TEXT,
        serial_number TEXT NOT NULL,
        scope TEXT NOT NULL,
        dismissed_at TEXT NOT NULL,
        expires_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (serial_number, scope)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS p900_toner_snapshots (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        device_id TEXT,
        serial_number TEXT,
        snapshot_source TEXT,
        captured_at TEXT NOT NULL,
        black REAL,
        cyan REAL,
        magenta REAL,
        yellow REAL,
        special_color REAL,
        waste_toner REAL,
        raw TEXT
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_p900_serial ON p900_toner_snapshots (serial_number, captured_at);",
    r#"
    CREATE TABLE IF NOT EXISTS p901_meter_readings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        device_id TEXT,
        serial_number TEXT NOT NULL,
        captured_at TEXT NOT NULL,
        total INTEGER,
        printer_total INTEGER,
        copy_total INTEGER,
        scan_total INTEGER,
        duplex_total INTEGER,
        black_total INTEGER,
        color_total INTEGER,
        meter_a INTEGER,
        meter_b INTEGER,
        meter_c INTEGER,
        raw TEXT,
        UNIQUE (serial_number, captured_at)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS p902_warning_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        device_id TEXT NOT NULL,
        serial_number TEXT,
        alert_code TEXT NOT NULL DEFAULT '',
        message TEXT,
        warning_type TEXT,
        received_at_server TEXT NOT NULL,
        occurred_at_device TEXT,
        recovered_at_server TEXT,
        recovered_at_device TEXT,
        recovered INTEGER,
        raw TEXT,
        created_at TEXT,
        UNIQUE (device_id, alert_code, received_at_server)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS p903_consumable_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        device_id TEXT,
        serial_number TEXT,
        event_type TEXT,
        warning_code TEXT,
        description TEXT,
        status TEXT,
        tc REAL,
        captured_at TEXT,
        raw TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS p904_order_lifecycle (
        id TEXT PRIMARY KEY NOT NULL,
        order_id TEXT NOT NULL,
        event_type TEXT NOT NULL,
        toner_color TEXT,
        toner_level_before REAL,
        toner_level_after REAL,
        auto_completed INTEGER NOT NULL DEFAULT 0,
        completed_by TEXT,
        notes TEXT,
        detected_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS p905_connection_events (
        id TEXT PRIMARY KEY NOT NULL,
        device_id TEXT,
        serial_number TEXT,
        event_type TEXT NOT NULL,
        last_seen_at TEXT,
        detected_at TEXT NOT NULL,
        resolved_at TEXT,
        duration_hours REAL,
        notes TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS u501_import_job (
        id TEXT PRIMARY KEY NOT NULL,
        source_file TEXT,
        source_type TEXT NOT NULL,
        imported_by TEXT,
        imported_at TEXT NOT NULL,
        row_count INTEGER NOT NULL DEFAULT 0,
        status TEXT NOT NULL,
        details TEXT
    );
    "#,
];

/// Открывает файл SQLite (создаётся при отсутствии) и готовит схему
pub async fn initialize_database(db_path: Option<&str>) -> anyhow::Result<()> {
    let db_file = db_path.unwrap_or("target/db/mps.db");
    if let Some(parent) = std::path::Path::new(db_file).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if std::path::Path::new(db_file).is_absolute() {
        std::path::PathBuf::from(db_file)
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    initialize_database_with_url(&db_url, 8).await
}

/// Подключение по готовому URL (в тестах - `sqlite::memory:` с одним соединением)
pub async fn initialize_database_with_url(
    db_url: &str,
    max_connections: u32,
) -> anyhow::Result<()> {
    if DB_CONN.get().is_some() {
        return Ok(());
    }

    let mut options = ConnectOptions::new(db_url.to_owned());
    options
        .max_connections(max_connections)
        .min_connections(1)
        .sqlx_logging(false);
    let conn = Database::connect(options).await?;

    bootstrap_schema(&conn).await?;
    tracing::info!("Database ready ({} tables)", table_count());

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

async fn bootstrap_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    for sql in SCHEMA {
        conn.execute(Statement::from_string(DatabaseBackend::Sqlite, sql.to_string()))
            .await?;
    }
    Ok(())
}

fn table_count() -> usize {
    SCHEMA
        .iter()
        .filter(|sql| sql.contains("CREATE TABLE"))
        .count()
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}
