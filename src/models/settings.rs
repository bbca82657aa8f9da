use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Printer {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PrintSettings {
    pub enabled: bool,
    #[serde(default)]
    pub printers: Vec<Printer>,
}

impl PrintSettings {
    /// The active printer flagged as default wins; otherwise the first active one.
    pub fn target_printer(&self) -> Option<&Printer> {
        self.printers
            .iter()
            .find(|printer| printer.is_default && printer.active)
            .or_else(|| self.printers.iter().find(|printer| printer.active))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub auto_accept: bool,
    #[serde(default)]
    pub printing: PrintSettings,
}

#[cfg(test)]
mod tests {
    use super::{PrintSettings, Printer};
    use uuid::Uuid;

    fn printer(name: &str, active: bool, is_default: bool) -> Printer {
        Printer {
            id: Uuid::new_v4(),
            name: name.to_string(),
            active,
            is_default,
        }
    }

    #[test]
    fn default_printer_takes_precedence() {
        let settings = PrintSettings {
            enabled: true,
            printers: vec![printer("bar", true, false), printer("kitchen", true, true)],
        };

        assert_eq!(settings.target_printer().unwrap().name, "kitchen");
    }

    #[test]
    fn falls_back_to_first_active_printer() {
        let settings = PrintSettings {
            enabled: true,
            printers: vec![
                printer("broken", false, false),
                printer("counter", true, false),
                printer("bar", true, false),
            ],
        };

        assert_eq!(settings.target_printer().unwrap().name, "counter");
    }

    #[test]
    fn inactive_default_is_passed_over() {
        let settings = PrintSettings {
            enabled: true,
            printers: vec![printer("kitchen", false, true), printer("bar", true, false)],
        };

        assert_eq!(settings.target_printer().unwrap().name, "bar");
    }

    #[test]
    fn no_target_without_active_printers() {
        let settings = PrintSettings {
            enabled: true,
            printers: vec![printer("broken", false, false)],
        };

        assert!(settings.target_printer().is_none());
    }
}
