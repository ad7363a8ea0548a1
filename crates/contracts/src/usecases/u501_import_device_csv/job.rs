use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportJobStatus {
    Completed,
    CompletedWithErrors,
    Failed,
}

impl ImportJobStatus {
    pub fn code(&self) -> &'static str {
        match self {
            ImportJobStatus::Completed => "completed",
            ImportJobStatus::CompletedWithErrors => "completed_with_errors",
            ImportJobStatus::Failed => "failed",
        }
    }

    /// Итог по числу успешных и ошибочных строк
    pub fn from_counts(success: usize, errors: usize) -> Self {
        match (success, errors) {
            (_, 0) => ImportJobStatus::Completed,
            (0, _) => ImportJobStatus::Failed,
            _ => ImportJobStatus::CompletedWithErrors,
        }
    }
}

/// Запись журнала импортов
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportJobDto {
    pub id: String,
    pub source_file: Option<String>,
    pub source_type: String,
    pub imported_by: Option<String>,
    pub imported_at: DateTime<Utc>,
    pub row_count: i64,
    pub status: String,
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_counts() {
        assert_eq!(ImportJobStatus::from_counts(10, 0), ImportJobStatus::Completed);
        assert_eq!(ImportJobStatus::from_counts(0, 0), ImportJobStatus::Completed);
        assert_eq!(ImportJobStatus::from_counts(0, 5), ImportJobStatus::Failed);
        assert_eq!(
            ImportJobStatus::from_counts(3, 5),
            ImportJobStatus::CompletedWithErrors
        );
    }
}
