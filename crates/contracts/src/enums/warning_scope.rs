use serde::{Deserialize, Serialize};
use std::fmt;

use super::toner_color::TonerColor;

/// Область действия подавления предупреждений (warning override)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningScope {
    All,
    Black,
    Cyan,
    Magenta,
    Yellow,
    Waste,
}

impl WarningScope {
    pub fn code(&self) -> &'static str {
        match self {
            WarningScope::All => "all",
            WarningScope::Black => "black",
            WarningScope::Cyan => "cyan",
            WarningScope::Magenta => "magenta",
            WarningScope::Yellow => "yellow",
            WarningScope::Waste => "waste",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "all" => Some(WarningScope::All),
            "black" => Some(WarningScope::Black),
            "cyan" => Some(WarningScope::Cyan),
            "magenta" => Some(WarningScope::Magenta),
            "yellow" => Some(WarningScope::Yellow),
            "waste" => Some(WarningScope::Waste),
            _ => None,
        }
    }
}

impl From<TonerColor> for WarningScope {
    fn from(color: TonerColor) -> Self {
        match color {
            TonerColor::Black => WarningScope::Black,
            TonerColor::Cyan => WarningScope::Cyan,
            TonerColor::Magenta => WarningScope::Magenta,
            TonerColor::Yellow => WarningScope::Yellow,
        }
    }
}

impl fmt::Display for WarningScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
