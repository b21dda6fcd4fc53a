use serde::Serialize;
use tracing::debug;

use crate::models::{ExtractionResult, PatientInfo};

pub const NO_PATIENT_INFO: &str = "No patient information found";
pub const NO_DIAGNOSIS: &str = "No diagnosis information found";
pub const NO_MEDICATIONS: &str = "No medications found";
pub const NO_ALLERGIES: &str = "No allergies found";
pub const NO_PROCEDURES: &str = "No procedures found";
pub const NO_RAW_TEXT: &str = "No text content extracted";

/// One visually distinct output area per logical field group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    PatientInfo,
    Diagnosis,
    Medications,
    Allergies,
    Procedures,
    RawText,
}

impl RegionKind {
    pub const ALL: [RegionKind; 6] = [
        Self::PatientInfo,
        Self::Diagnosis,
        Self::Medications,
        Self::Allergies,
        Self::Procedures,
        Self::RawText,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::PatientInfo => "Patient Information",
            Self::Diagnosis => "Diagnosis",
            Self::Medications => "Medications",
            Self::Allergies => "Allergies",
            Self::Procedures => "Procedures",
            Self::RawText => "Extracted Text",
        }
    }

    pub fn fallback(&self) -> &'static str {
        match self {
            Self::PatientInfo => NO_PATIENT_INFO,
            Self::Diagnosis => NO_DIAGNOSIS,
            Self::Medications => NO_MEDICATIONS,
            Self::Allergies => NO_ALLERGIES,
            Self::Procedures => NO_PROCEDURES,
            Self::RawText => NO_RAW_TEXT,
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledRow {
    pub label: &'static str,
    pub value: String,
}

impl std::fmt::Display for LabeledRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum RegionContent {
    /// Cleared, nothing painted yet
    #[default]
    Empty,
    Rows(Vec<LabeledRow>),
    Text(String),
    List(Vec<String>),
    Fallback(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRegion {
    pub kind: RegionKind,
    pub content: RegionContent,
}

impl DisplayRegion {
    fn cleared(kind: RegionKind) -> Self {
        Self {
            kind,
            content: RegionContent::Empty,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.content, RegionContent::Fallback(_))
    }

    /// The entries a list-style view shows: rows, items, the text, or the single fallback entry.
    pub fn entries(&self) -> Vec<String> {
        match &self.content {
            RegionContent::Empty => Vec::new(),
            RegionContent::Rows(rows) => rows.iter().map(ToString::to_string).collect(),
            RegionContent::Text(text) => vec![text.clone()],
            RegionContent::List(items) => items.clone(),
            RegionContent::Fallback(notice) => vec![notice.to_string()],
        }
    }
}

/// The six display regions, always in `RegionKind::ALL` order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Regions {
    regions: [DisplayRegion; 6],
}

impl Default for Regions {
    fn default() -> Self {
        Self {
            regions: RegionKind::ALL.map(DisplayRegion::cleared),
        }
    }
}

impl Regions {
    pub fn get(&self, kind: RegionKind) -> &DisplayRegion {
        &self.regions[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &DisplayRegion> {
        self.regions.iter()
    }

    pub fn clear(&mut self) {
        for region in &mut self.regions {
            region.content = RegionContent::Empty;
        }
    }

    fn paint(&mut self, kind: RegionKind, content: RegionContent) {
        self.regions[kind.index()].content = content;
    }

    /// Clear every region and repaint it from `result`.
    pub fn render(&mut self, result: &ExtractionResult) {
        self.clear();

        let record = result.medical_record.as_ref();
        self.paint(
            RegionKind::PatientInfo,
            patient_rows(result.patient_info.as_ref()),
        );
        self.paint(
            RegionKind::Diagnosis,
            text_or(record.and_then(|r| r.diagnosis.as_deref()), NO_DIAGNOSIS),
        );
        self.paint(
            RegionKind::Medications,
            list_or(record.and_then(|r| r.medications.as_deref()), NO_MEDICATIONS),
        );
        self.paint(
            RegionKind::Allergies,
            list_or(record.and_then(|r| r.allergies.as_deref()), NO_ALLERGIES),
        );
        self.paint(
            RegionKind::Procedures,
            list_or(record.and_then(|r| r.procedures.as_deref()), NO_PROCEDURES),
        );
        self.paint(
            RegionKind::RawText,
            text_or(result.raw_text.as_deref(), NO_RAW_TEXT),
        );

        debug!(
            fallbacks = self.iter().filter(|r| r.is_fallback()).count(),
            "Rendered extraction result"
        );
    }
}

/// Render into a fresh set of regions.
pub fn render(result: &ExtractionResult) -> Regions {
    let mut regions = Regions::default();
    regions.render(result);
    regions
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn patient_rows(patient: Option<&PatientInfo>) -> RegionContent {
    let Some(p) = patient else {
        return RegionContent::Fallback(NO_PATIENT_INFO);
    };

    let fields = [
        ("Name", &p.name),
        ("Date of Birth", &p.dob),
        ("Gender", &p.gender),
        ("Patient ID", &p.patient_id),
        ("Address", &p.address),
        ("Phone", &p.phone),
    ];
    let rows: Vec<LabeledRow> = fields
        .into_iter()
        .filter_map(|(label, value)| {
            present(value.as_deref()).map(|v| LabeledRow {
                label,
                value: v.to_string(),
            })
        })
        .collect();

    if rows.is_empty() {
        RegionContent::Fallback(NO_PATIENT_INFO)
    } else {
        RegionContent::Rows(rows)
    }
}

fn text_or(text: Option<&str>, fallback: &'static str) -> RegionContent {
    match present(text) {
        Some(t) => RegionContent::Text(t.to_string()),
        None => RegionContent::Fallback(fallback),
    }
}

fn list_or(items: Option<&[String]>, fallback: &'static str) -> RegionContent {
    match items {
        Some(items) if !items.is_empty() => RegionContent::List(items.to_vec()),
        _ => RegionContent::Fallback(fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MedicalRecord;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> ExtractionResult {
        ExtractionResult::from_value(value).unwrap()
    }

    #[test]
    fn all_absent_result_paints_every_fallback() {
        let regions = render(&ExtractionResult::default());
        for kind in RegionKind::ALL {
            let region = regions.get(kind);
            assert_eq!(region.content, RegionContent::Fallback(kind.fallback()));
            assert_eq!(region.entries(), vec![kind.fallback().to_string()]);
        }
    }

    #[test]
    fn patient_rows_skip_absent_fields_in_fixed_order() {
        let result = parse(json!({
            "patient_info": { "phone": "555-0100", "name": "Jane Doe", "gender": "" }
        }));
        let regions = render(&result);
        assert_eq!(
            regions.get(RegionKind::PatientInfo).entries(),
            vec!["Name: Jane Doe", "Phone: 555-0100"]
        );
    }

    #[test]
    fn structured_items_are_listed_not_replaced_by_fallback() {
        let result = parse(json!({
            "medical_record": {
                "allergies": [{"name": "Peanut", "severity": "high"}],
                "medications": [["Aspirin", "81mg"]]
            }
        }));
        let regions = render(&result);

        let allergies = regions.get(RegionKind::Allergies);
        assert!(!allergies.is_fallback());
        assert_eq!(
            allergies.entries(),
            vec![r#"{"name":"Peanut","severity":"high"}"#]
        );
        assert_eq!(
            regions.get(RegionKind::Medications).entries(),
            vec![r#"["Aspirin","81mg"]"#]
        );
    }

    #[test]
    fn medications_keep_count_and_order() {
        let meds: Vec<String> = (1..=7).map(|i| format!("Drug {i}")).collect();
        let result = parse(json!({ "medical_record": { "medications": meds } }));
        let regions = render(&result);
        let region = regions.get(RegionKind::Medications);
        assert!(!region.is_fallback());
        assert_eq!(region.entries(), meds);
    }

    #[test]
    fn empty_lists_render_a_single_fallback_entry() {
        let result = parse(json!({
            "medical_record": { "medications": [], "allergies": null }
        }));
        let regions = render(&result);
        assert_eq!(
            regions.get(RegionKind::Medications).entries(),
            vec![NO_MEDICATIONS]
        );
        assert_eq!(
            regions.get(RegionKind::Allergies).entries(),
            vec![NO_ALLERGIES]
        );
    }

    #[test]
    fn one_missing_field_does_not_affect_others() {
        let result = parse(json!({
            "medical_record": { "diagnosis": "Asthma", "procedures": ["Spirometry"] },
            "raw_text": "Dx: Asthma"
        }));
        let regions = render(&result);
        assert_eq!(
            regions.get(RegionKind::Diagnosis).content,
            RegionContent::Text("Asthma".to_string())
        );
        assert_eq!(
            regions.get(RegionKind::Procedures).entries(),
            vec!["Spirometry"]
        );
        assert!(regions.get(RegionKind::Medications).is_fallback());
        assert!(regions.get(RegionKind::PatientInfo).is_fallback());
        assert_eq!(
            regions.get(RegionKind::RawText).content,
            RegionContent::Text("Dx: Asthma".to_string())
        );
    }

    #[test]
    fn blank_values_built_in_code_still_fall_back() {
        let result = ExtractionResult {
            raw_text: Some("   ".to_string()),
            medical_record: Some(MedicalRecord {
                diagnosis: Some(String::new()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let regions = render(&result);
        assert!(regions.get(RegionKind::RawText).is_fallback());
        assert!(regions.get(RegionKind::Diagnosis).is_fallback());
    }

    #[test]
    fn rendering_is_idempotent_and_replaces_previous_content() {
        let full = parse(json!({
            "patient_info": { "name": "Jane Doe" },
            "medical_record": { "allergies": ["Latex"] },
            "raw_text": "text"
        }));
        let mut regions = Regions::default();
        regions.render(&full);
        let once = regions.clone();
        regions.render(&full);
        assert_eq!(regions, once);

        regions.render(&ExtractionResult::default());
        assert_eq!(regions, render(&ExtractionResult::default()));
    }

    #[test]
    fn regions_serialize_in_display_order() {
        let json = serde_json::to_value(render(&ExtractionResult::default())).unwrap();
        let kinds: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["kind"].as_str().unwrap())
            .collect();
        assert_eq!(
            kinds,
            vec![
                "patient_info",
                "diagnosis",
                "medications",
                "allergies",
                "procedures",
                "raw_text"
            ]
        );
    }
}
