use serde::{Deserialize, Serialize};

/// Kind of document presented at the kiosk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocType {
    #[serde(rename = "GOVT_ID")]
    GovtId,
    #[serde(rename = "STAFF_ID")]
    StaffId,
}

impl DocType {
    pub fn is_staff(self) -> bool {
        matches!(self, DocType::StaffId)
    }
}

/// Identity extracted from a scanned document (or fabricated in
/// simulation mode). Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedIdentity {
    pub name: String,
    pub id: String,
    pub doc_type: DocType,
    pub department: Option<String>,
    /// Expiry as printed on the document; "N/A" when not legible.
    pub expiry: String,
}

impl ExtractedIdentity {
    /// Build an identity from raw OCR fields, normalizing name and
    /// department to uppercase.
    pub fn new(name: &str, id: &str, doc_type: DocType, department: Option<&str>) -> Self {
        Self {
            name: name.to_uppercase(),
            id: id.to_string(),
            doc_type,
            department: department.map(|d| d.to_uppercase()),
            expiry: "N/A".to_string(),
        }
    }
}

/// Terminal output of the enrollment scanner, handed to the session
/// controller exactly once on a successful biometric match.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub name: String,
    pub id: String,
    /// Face similarity score, 0–100.
    pub match_score: f32,
    pub doc_type: DocType,
    pub department: Option<String>,
}

impl ScanResult {
    pub fn from_identity(identity: &ExtractedIdentity, match_score: f32) -> Self {
        Self {
            name: identity.name.clone(),
            id: identity.id.clone(),
            match_score,
            doc_type: identity.doc_type,
            department: identity.department.clone(),
        }
    }
}
