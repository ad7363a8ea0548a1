use serde::{Deserialize, Serialize};
use std::fmt;

/// Цвета тонера, для которых Gas Gage присылает уровни
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TonerColor {
    Black,
    Cyan,
    Magenta,
    Yellow,
}

impl TonerColor {
    /// Порядок отображения: K, C, M, Y
    pub const ALL: [TonerColor; 4] = [
        TonerColor::Black,
        TonerColor::Cyan,
        TonerColor::Magenta,
        TonerColor::Yellow,
    ];

    /// Код цвета (как хранится в БД)
    pub fn code(&self) -> &'static str {
        match self {
            TonerColor::Black => "black",
            TonerColor::Cyan => "cyan",
            TonerColor::Magenta => "magenta",
            TonerColor::Yellow => "yellow",
        }
    }

    /// Человекочитаемое название
    pub fn label(&self) -> &'static str {
        match self {
            TonerColor::Black => "Black",
            TonerColor::Cyan => "Cyan",
            TonerColor::Magenta => "Magenta",
            TonerColor::Yellow => "Yellow",
        }
    }

    /// Однобуквенный ключ гейджа (k/c/m/y)
    pub fn gauge_key(&self) -> char {
        match self {
            TonerColor::Black => 'k',
            TonerColor::Cyan => 'c',
            TonerColor::Magenta => 'm',
            TonerColor::Yellow => 'y',
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "black" => Some(TonerColor::Black),
            "cyan" => Some(TonerColor::Cyan),
            "magenta" => Some(TonerColor::Magenta),
            "yellow" => Some(TonerColor::Yellow),
            _ => None,
        }
    }
}

impl fmt::Display for TonerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Уровни тонера устройства по четырём цветам
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TonerLevels {
    pub black: Option<f64>,
    pub cyan: Option<f64>,
    pub magenta: Option<f64>,
    pub yellow: Option<f64>,
}

impl TonerLevels {
    pub fn get(&self, color: TonerColor) -> Option<f64> {
        match color {
            TonerColor::Black => self.black,
            TonerColor::Cyan => self.cyan,
            TonerColor::Magenta => self.magenta,
            TonerColor::Yellow => self.yellow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip_and_serde() {
        for color in TonerColor::ALL {
            assert_eq!(TonerColor::from_code(color.code()), Some(color));
        }
        assert_eq!(TonerColor::from_code("waste"), None);
        assert_eq!(
            serde_json::to_string(&TonerColor::Magenta).unwrap(),
            "\"magenta\""
        );
    }
}
