// src/employee.rs
//
// Employee identity helpers: NIP cleaning, the prefix-based eligibility
// filters, and the employment-category split encoded in NIP substrings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strips the leading-quote text-encoding artifact some spreadsheet exports
/// put in front of the NIP, and trims surrounding whitespace.
pub fn clean_nip(raw: &str) -> String {
    raw.replace('\'', "").trim().to_string()
}

/// Prefix matcher used wherever employee lists are rendered or extracted.
/// The applicable set is passed explicitly per call site; the two sets the
/// system uses are preserved as named constructors.
#[derive(Debug, Clone)]
pub struct ExclusionList {
    prefixes: Vec<String>,
}

impl ExclusionList {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(|p| p.into().to_uppercase()).collect(),
        }
    }

    /// Exclusions applied on reporting surfaces: the meal-allowance view and
    /// the attendance/tunjangan exports.
    pub fn reporting() -> Self {
        Self::new(["TATT", "DIRDATAKB", "PPNPN", "DIRPGKP"])
    }

    /// Narrower set the ADK UM extract generator uses.
    pub fn adk_extract() -> Self {
        Self::new(["TATT", "PPNPN", "DIRDATA"])
    }

    pub fn is_excluded(&self, nip: &str) -> bool {
        let nip = nip.to_uppercase();
        self.prefixes.iter().any(|p| nip.starts_with(p.as_str()))
    }
}

/// Employment category, inferred from year substrings embedded in the NIP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmployeeType {
    Cpns,
    Pns,
    Pppk,
}

impl EmployeeType {
    /// CPNS takes precedence when a NIP carries both year markers; PNS is
    /// the remainder bucket.
    pub fn classify(nip: &str) -> Self {
        if nip.contains("2025") {
            EmployeeType::Cpns
        } else if nip.contains("2024") {
            EmployeeType::Pppk
        } else {
            EmployeeType::Pns
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeType::Cpns => "CPNS",
            EmployeeType::Pns => "PNS",
            EmployeeType::Pppk => "PPPK",
        }
    }
}

impl fmt::Display for EmployeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_nip_strips_quote_artifact() {
        assert_eq!(clean_nip("'198001012024121001"), "198001012024121001");
        assert_eq!(clean_nip("  TATT001 "), "TATT001");
    }

    #[test]
    fn exclusion_is_case_insensitive_prefix_match() {
        let list = ExclusionList::reporting();
        assert!(list.is_excluded("TATT001"));
        assert!(list.is_excluded("tatt001"));
        assert!(list.is_excluded("DIRDATAKB7"));
        assert!(!list.is_excluded("198001012024121001"));
    }

    #[test]
    fn extract_set_catches_wider_dirdata_prefix() {
        let list = ExclusionList::adk_extract();
        assert!(list.is_excluded("DIRDATAKB7"));
        assert!(list.is_excluded("DIRDATA99"));
        assert!(!list.is_excluded("DIRPGKP1"));
    }

    #[test]
    fn cpns_takes_precedence_over_pppk() {
        assert_eq!(EmployeeType::classify("ABC2025X2024"), EmployeeType::Cpns);
        assert_eq!(EmployeeType::classify("19800101202412"), EmployeeType::Pppk);
        assert_eq!(EmployeeType::classify("196512301990031"), EmployeeType::Pns);
    }
}
