use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ShellError;

macro_rules! id_newtype {
    ($name:ident, $inner:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(AlertId, i64);
id_newtype!(NoticeId, u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewId {
    #[default]
    Map,
    Search,
    Departures,
    Alerts,
}

impl ViewId {
    pub const ALL: [ViewId; 4] = [
        ViewId::Map,
        ViewId::Search,
        ViewId::Departures,
        ViewId::Alerts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ViewId::Map => "map",
            ViewId::Search => "search",
            ViewId::Departures => "departures",
            ViewId::Alerts => "alerts",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewId::Map => "Mapa",
            ViewId::Search => "Rutas",
            ViewId::Departures => "Salidas",
            ViewId::Alerts => "Alertas",
        }
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewId {
    type Err = ShellError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "map" => Ok(ViewId::Map),
            "search" => Ok(ViewId::Search),
            "departures" => Ok(ViewId::Departures),
            "alerts" => Ok(ViewId::Alerts),
            _ => Err(ShellError::UnknownView(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn from_dark(dark: bool) -> Self {
        if dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn as_stored(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn from_stored(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Contrast {
    #[default]
    Normal,
    High,
}

impl Contrast {
    pub fn from_high(high: bool) -> Self {
        if high {
            Contrast::High
        } else {
            Contrast::Normal
        }
    }

    pub fn as_stored(self) -> &'static str {
        match self {
            Contrast::Normal => "normal",
            Contrast::High => "high",
        }
    }

    pub fn from_stored(raw: &str) -> Option<Self> {
        match raw {
            "normal" => Some(Contrast::Normal),
            "high" => Some(Contrast::High),
            _ => None,
        }
    }

    pub fn is_high(self) -> bool {
        self == Contrast::High
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: Theme,
    pub contrast: Contrast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_view_names_case_insensitively() {
        assert_eq!("Departures".parse::<ViewId>().expect("view"), ViewId::Departures);
        assert_eq!(" alerts ".parse::<ViewId>().expect("view"), ViewId::Alerts);
    }

    #[test]
    fn rejects_undefined_view() {
        let err = "timetable".parse::<ViewId>().expect_err("unknown view");
        assert!(matches!(err, ShellError::UnknownView(name) if name == "timetable"));
    }

    #[test]
    fn stored_values_are_exact() {
        assert_eq!(Theme::from_stored("dark"), Some(Theme::Dark));
        assert_eq!(Theme::from_stored("Dark"), None);
        assert_eq!(Contrast::from_stored("blue"), None);
        assert_eq!(Contrast::from_stored(Contrast::High.as_stored()), Some(Contrast::High));
    }

    #[test]
    fn view_serializes_as_snake_case() {
        let raw = serde_json::to_string(&ViewId::Departures).expect("serialize");
        assert_eq!(raw, "\"departures\"");
    }
}
