use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::campus::{Destination, Purpose};
use crate::identity::ScanResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisitorPersona {
    CorporateVisitor,
    Contractor,
    Delivery,
    Vip,
    InterviewCandidate,
    InternalStaff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassStatus {
    Pending,
    CheckedIn,
    CheckedOut,
    Expired,
}

/// How the pass holder clears the turnstile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessType {
    Qr,
    Face,
    Nfc,
}

/// An issued visitor pass. Created once at pass-generation time and
/// never mutated afterward; held only in memory for the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visitor {
    pub id: String,
    pub name: String,
    /// National ID / passport number from the scanned or keyed-in document.
    pub nric: String,
    pub tower: String,
    pub floor: String,
    pub purpose: String,
    pub persona: VisitorPersona,
    pub duration_hours: f64,
    pub status: PassStatus,
    pub check_in_time: DateTime<Utc>,
    pub qr_code: String,
    pub access_type: AccessType,
    pub parking_slot: Option<String>,
    pub ev_required: bool,
    pub department: Option<String>,
}

/// Fields keyed in by an officer on the manual-entry form. Email and
/// phone are collected for the visit log but do not appear on the pass.
#[derive(Debug, Clone, Default)]
pub struct ManualEntry {
    pub name: String,
    pub ic: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub purpose_label: String,
    pub venue_id: String,
    pub duration_hours: f64,
}

impl Visitor {
    /// Issue a pass from a completed enrollment scan. Face access, since
    /// the holder's face was captured at the kiosk.
    pub fn from_scan(
        scan: &ScanResult,
        destination: Destination,
        purpose: Purpose,
        duration_hours: f64,
        parking_slot: String,
        check_in_time: DateTime<Utc>,
    ) -> Self {
        let floor = if scan.doc_type.is_staff() {
            "Level 8 (Staff Hub)"
        } else {
            "Lobby"
        };

        Self {
            id: scan.id.clone(),
            name: scan.name.clone(),
            nric: scan.id.clone(),
            tower: destination.label.to_string(),
            floor: floor.to_string(),
            purpose: purpose.label.to_string(),
            persona: purpose.persona,
            duration_hours,
            status: PassStatus::CheckedIn,
            check_in_time,
            qr_code: qr_code_for(&scan.id, check_in_time),
            access_type: AccessType::Face,
            parking_slot: Some(parking_slot),
            ev_required: false,
            department: scan.department.clone(),
        }
    }

    /// Issue a pass from an officer-authorized manual entry. QR access,
    /// since no face was captured.
    pub fn from_manual_entry(
        entry: &ManualEntry,
        destination: Destination,
        purpose: Purpose,
        parking_slot: String,
        check_in_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: entry.ic.clone(),
            name: entry.name.to_uppercase(),
            nric: entry.ic.clone(),
            tower: destination.label.to_string(),
            floor: "Lobby".to_string(),
            purpose: purpose.label.to_string(),
            persona: purpose.persona,
            duration_hours: entry.duration_hours,
            status: PassStatus::CheckedIn,
            check_in_time,
            qr_code: qr_code_for(&entry.ic, check_in_time),
            access_type: AccessType::Qr,
            parking_slot: Some(parking_slot),
            ev_required: false,
            department: if entry.company.is_empty() {
                None
            } else {
                Some(entry.company.clone())
            },
        }
    }

    /// Pass expiry, exact to the minute. Fractional hours are supported
    /// (the duration picker steps in halves).
    pub fn expiry(&self) -> DateTime<Utc> {
        self.check_in_time + Duration::minutes((self.duration_hours * 60.0).round() as i64)
    }
}

fn qr_code_for(id: &str, at: DateTime<Utc>) -> String {
    format!("QR_{id}_{}", at.timestamp_millis())
}
