use serde::{Deserialize, Serialize};

use super::schema::DeviceImportType;
use crate::domain::a003_supply_order::auto_completion::AutoCompletionDetail;

/// Итог импорта одной порции (или целого CSV-файла)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDeviceCsvResponse {
    /// Строк записано успешно
    pub success: usize,
    /// Строк в упавших пакетах
    pub errors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<Vec<String>>,
    pub auto_completed: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub completion_details: Vec<AutoCompletionDetail>,
    pub import_type: DeviceImportType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

impl ImportDeviceCsvResponse {
    pub fn new(import_type: DeviceImportType) -> Self {
        Self {
            success: 0,
            errors: 0,
            error_details: None,
            auto_completed: 0,
            completion_details: Vec::new(),
            import_type,
            job_id: None,
        }
    }

    /// Пакет с номером `batch_number` (с единицы) упал целиком
    pub fn record_failed_batch(&mut self, batch_number: usize, rows: usize, message: &str) {
        self.errors += rows;
        self.error_details
            .get_or_insert_with(Vec::new)
            .push(format!("Batch {}: {}", batch_number, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_batch_is_reported() {
        let mut response = ImportDeviceCsvResponse::new(DeviceImportType::GasGage);
        response.success = 100;
        response.record_failed_batch(2, 37, "UNIQUE constraint failed");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["errors"], 37);
        assert_eq!(json["error_details"][0], "Batch 2: UNIQUE constraint failed");
        assert_eq!(json["import_type"], "gas_gage");
        assert!(json.get("job_id").is_none());
    }
}
