//! Conductor cross-sections and their ampacities.
//!
//! Default values: copper, PVC insulation (70 °C), three loaded conductors,
//! installation method B1.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// One row of the capacity table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CableSection {
    /// Cross-section (mm²)
    pub section_mm2: f64,
    /// Continuous current capacity (A)
    pub ampacity_a: f64,
}

impl CableSection {
    pub const fn new(section_mm2: f64, ampacity_a: f64) -> Self {
        CableSection {
            section_mm2,
            ampacity_a,
        }
    }

    /// Display label, e.g. "2.5mm²" or "10mm²"
    pub fn label(&self) -> String {
        format!("{}mm²", format_section(self.section_mm2))
    }
}

/// Outcome of a table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CableSelection {
    pub section: CableSection,
    /// True when no entry satisfied the request and the largest was used
    pub exhausted: bool,
}

const DEFAULT_SECTIONS: [CableSection; 16] = [
    CableSection::new(1.5, 15.5),
    CableSection::new(2.5, 21.0),
    CableSection::new(4.0, 28.0),
    CableSection::new(6.0, 36.0),
    CableSection::new(10.0, 50.0),
    CableSection::new(16.0, 68.0),
    CableSection::new(25.0, 89.0),
    CableSection::new(35.0, 110.0),
    CableSection::new(50.0, 134.0),
    CableSection::new(70.0, 171.0),
    CableSection::new(95.0, 207.0),
    CableSection::new(120.0, 239.0),
    CableSection::new(150.0, 272.0),
    CableSection::new(185.0, 310.0),
    CableSection::new(240.0, 364.0),
    CableSection::new(300.0, 419.0),
];

/// Ordered (cross-section, ampacity) table.
///
/// Always non-empty and strictly increasing in both columns; the constructor
/// and deserialization both enforce it.
///
/// ## JSON Example
///
/// ```json
/// [
///   { "section_mm2": 1.5, "ampacity_a": 15.5 },
///   { "section_mm2": 2.5, "ampacity_a": 21.0 }
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CableSection>", into = "Vec<CableSection>")]
pub struct CableCapacityTable {
    sections: Vec<CableSection>,
    largest: CableSection,
}

impl CableCapacityTable {
    /// Build a table, validating ordering.
    pub fn new(sections: Vec<CableSection>) -> CalcResult<Self> {
        let largest = match sections.last() {
            Some(last) => *last,
            None => {
                return Err(CalcError::invalid_input(
                    "cable_table",
                    "[]",
                    "Cable table must have at least one section",
                ))
            }
        };
        for pair in sections.windows(2) {
            if pair[1].section_mm2 <= pair[0].section_mm2 || pair[1].ampacity_a <= pair[0].ampacity_a {
                return Err(CalcError::invalid_input(
                    "cable_table",
                    format!("{} mm² after {} mm²", pair[1].section_mm2, pair[0].section_mm2),
                    "Sections and ampacities must be strictly increasing",
                ));
            }
        }
        if sections.iter().any(|s| s.section_mm2 <= 0.0 || s.ampacity_a <= 0.0) {
            return Err(CalcError::invalid_input(
                "cable_table",
                format!("{:?}", sections.first()),
                "Sections and ampacities must be positive",
            ));
        }
        Ok(CableCapacityTable { sections, largest })
    }

    pub fn sections(&self) -> &[CableSection] {
        &self.sections
    }

    pub fn largest(&self) -> CableSection {
        self.largest
    }

    /// Smallest section whose ampacity covers `required_a`.
    pub fn select(&self, required_a: f64) -> CableSelection {
        self.first_matching(|s| s.ampacity_a >= required_a)
    }

    /// Smallest section of at least `section_mm2`.
    pub fn smallest_at_least(&self, section_mm2: f64) -> CableSelection {
        self.first_matching(|s| s.section_mm2 >= section_mm2)
    }

    fn first_matching(&self, predicate: impl Fn(&CableSection) -> bool) -> CableSelection {
        match self.sections.iter().find(|s| predicate(s)) {
            Some(section) => CableSelection {
                section: *section,
                exhausted: false,
            },
            None => CableSelection {
                section: self.largest,
                exhausted: true,
            },
        }
    }
}

impl Default for CableCapacityTable {
    fn default() -> Self {
        CableCapacityTable {
            sections: DEFAULT_SECTIONS.to_vec(),
            largest: DEFAULT_SECTIONS[DEFAULT_SECTIONS.len() - 1],
        }
    }
}

impl TryFrom<Vec<CableSection>> for CableCapacityTable {
    type Error = CalcError;

    fn try_from(sections: Vec<CableSection>) -> CalcResult<Self> {
        CableCapacityTable::new(sections)
    }
}

impl From<CableCapacityTable> for Vec<CableSection> {
    fn from(table: CableCapacityTable) -> Self {
        table.sections
    }
}

fn format_section(section_mm2: f64) -> String {
    if section_mm2.fract() == 0.0 {
        format!("{:.0}", section_mm2)
    } else {
        format!("{}", section_mm2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_valid() {
        let table = CableCapacityTable::default();
        let rebuilt = CableCapacityTable::new(table.sections().to_vec()).unwrap();
        assert_eq!(rebuilt, table);
        assert_eq!(table.largest().section_mm2, 300.0);
    }

    #[test]
    fn test_select_smallest_sufficient() {
        let table = CableCapacityTable::default();
        assert_eq!(table.select(15.5).section.section_mm2, 1.5);
        assert_eq!(table.select(15.6).section.section_mm2, 2.5);
        assert_eq!(table.select(201.0).section.section_mm2, 95.0);
    }

    #[test]
    fn test_select_falls_back_to_largest() {
        let table = CableCapacityTable::default();
        let selection = table.select(500.0);
        assert!(selection.exhausted);
        assert_eq!(selection.section.section_mm2, 300.0);
    }

    #[test]
    fn test_smallest_at_least() {
        let table = CableCapacityTable::default();
        assert_eq!(table.smallest_at_least(2.5).section.section_mm2, 2.5);
        assert_eq!(table.smallest_at_least(11.8).section.section_mm2, 16.0);
        assert_eq!(table.smallest_at_least(0.1).section.section_mm2, 1.5);
    }

    #[test]
    fn test_rejects_unordered_and_empty() {
        assert!(CableCapacityTable::new(vec![]).is_err());
        assert!(CableCapacityTable::new(vec![
            CableSection::new(2.5, 21.0),
            CableSection::new(1.5, 15.5),
        ])
        .is_err());
        assert!(CableCapacityTable::new(vec![
            CableSection::new(1.5, 21.0),
            CableSection::new(2.5, 21.0),
        ])
        .is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: CableCapacityTable =
            serde_json::from_str(r#"[{"section_mm2":1.5,"ampacity_a":15.5},{"section_mm2":4.0,"ampacity_a":28.0}]"#)
                .unwrap();
        assert_eq!(ok.largest().section_mm2, 4.0);

        let bad: Result<CableCapacityTable, _> = serde_json::from_str("[]");
        assert!(bad.is_err());
    }

    #[test]
    fn test_labels() {
        assert_eq!(CableSection::new(1.5, 15.5).label(), "1.5mm²");
        assert_eq!(CableSection::new(10.0, 50.0).label(), "10mm²");
    }
}
