use async_trait::async_trait;
use serde::Deserialize;
use vanguard_core::identity::DocType;

use crate::error::AiError;

/// Outcome of a document-detection request. Tagged rather than a bag of
/// optionals so the scanner's phase logic stays exhaustive.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentScan {
    Recognized {
        name: String,
        id: String,
        doc_type: DocType,
        department: Option<String>,
    },
    NotRecognized {
        /// Operator guidance from the model ("Hold card steady"), if any.
        reason: Option<String>,
    },
}

/// Outcome of a face-comparison request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceComparison {
    /// Similarity score, 0–100.
    pub score: f32,
    pub matched: bool,
}

/// Wire shape of the model's document-detection JSON.
#[derive(Debug, Deserialize)]
pub(crate) struct DocumentScanWire {
    #[serde(default)]
    pub valid: bool,
    #[serde(rename = "docType")]
    pub doc_type: Option<DocType>,
    pub name: Option<String>,
    pub id: Option<String>,
    pub department: Option<String>,
    pub reason: Option<String>,
}

impl From<DocumentScanWire> for DocumentScan {
    fn from(wire: DocumentScanWire) -> Self {
        match (wire.valid, wire.name, wire.id) {
            // A positive response with either field missing counts as
            // not recognized; the scanner never stores a partial identity.
            (true, Some(name), Some(id)) if !name.is_empty() && !id.is_empty() => {
                DocumentScan::Recognized {
                    name,
                    id,
                    doc_type: wire.doc_type.unwrap_or(DocType::GovtId),
                    department: wire.department,
                }
            }
            _ => DocumentScan::NotRecognized { reason: wire.reason },
        }
    }
}

/// Wire shape of the model's face-comparison JSON.
#[derive(Debug, Deserialize)]
pub(crate) struct FaceComparisonWire {
    pub score: Option<f32>,
    #[serde(rename = "match", default)]
    pub matched: bool,
}

impl From<FaceComparisonWire> for FaceComparison {
    fn from(wire: FaceComparisonWire) -> Self {
        FaceComparison {
            // A non-numeric score is treated as zero, i.e. no match.
            score: wire.score.unwrap_or(0.0),
            matched: wire.matched,
        }
    }
}

/// The injected recognition-service dependency. The kiosk only ever
/// talks to the hosted model through this trait.
#[async_trait]
pub trait RecognitionClient: Send + Sync {
    /// Submit one JPEG frame and ask for a government ID or staff badge.
    async fn detect_document(&self, jpeg: &[u8]) -> Result<DocumentScan, AiError>;

    /// Compare the face on the stored ID frame with a live frame.
    async fn compare_faces(&self, id_jpeg: &[u8], live_jpeg: &[u8])
        -> Result<FaceComparison, AiError>;

    /// Free-text assistant query under the campus system instruction.
    async fn chat(&self, query: &str) -> Result<String, AiError>;
}
