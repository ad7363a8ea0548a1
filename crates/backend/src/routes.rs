use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::handlers;

/// Лимит тела запроса для импорта CSV
const IMPORT_BODY_LIMIT: usize = 64 * 1024 * 1024;

/// Конфигурация всех роутов приложения
pub fn configure_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // D400 Device status dashboard
        // ========================================
        .route("/api/devices", get(handlers::d400_device_status::list_devices))
        .route("/api/devices/:serial", get(handlers::a002_device::get_detail))
        .route(
            "/api/devices/:serial/warnings/dismiss",
            post(handlers::a005_warning_override::dismiss),
        )
        .route(
            "/api/devices/:serial/warnings/restore",
            post(handlers::a005_warning_override::restore),
        )
        // A004 Alert settings
        .route(
            "/api/device-alert-settings",
            get(handlers::a004_alert_settings::get_settings)
                .post(handlers::a004_alert_settings::save_settings),
        )
        .route(
            "/api/device-alert-settings/bulk",
            post(handlers::a004_alert_settings::bulk_update),
        )
        // ========================================
        // U501 CSV import
        // ========================================
        .route(
            "/api/gas-gage/import",
            post(handlers::u501_import_device_csv::import_chunk),
        )
        .route(
            "/api/gas-gage/import/csv",
            post(handlers::u501_import_device_csv::import_csv),
        )
        .route(
            "/api/import-jobs",
            get(handlers::u501_import_device_csv::list_jobs),
        )
        // ========================================
        // A003 Supply orders
        // ========================================
        .route("/api/orders", get(handlers::a003_supply_order::list))
        .route("/api/orders/active", get(handlers::a003_supply_order::active))
        .route("/api/orders/create", post(handlers::a003_supply_order::create))
        .route("/api/orders/bulk", post(handlers::a003_supply_order::bulk))
        .route(
            "/api/orders/:id/status",
            put(handlers::a003_supply_order::change_status),
        )
        .route(
            "/api/orders/:id/events",
            get(handlers::a003_supply_order::history),
        )
        // U502 Connectivity
        .route(
            "/api/connectivity/check",
            post(handlers::u502_connectivity_check::run_check),
        )
        .route(
            "/api/connectivity/events",
            get(handlers::u502_connectivity_check::list_events),
        )
        .layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT))
}
