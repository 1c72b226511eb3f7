//! Session controller — the outer kiosk flow from scan to navigation.
//!
//! Seven screens selected by a single step value. Both issuance paths
//! (enrollment scan and officer-authorized manual entry) converge on
//! the same [`Visitor`] pass, so the pass and navigation screens do not
//! care which path produced it.

use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;

use vanguard_core::campus::{
    self, destination_by_id, purpose_by_label, staff_purpose, Destination, Purpose,
    WalkingEstimate, DESTINATIONS, PURPOSES,
};
use vanguard_core::identity::ScanResult;
use vanguard_core::visitor::{ManualEntry, Visitor};

/// Kiosk screen currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Scan,
    AuthManualEntry,
    ManualEntry,
    Details,
    KioskSuccess,
    Pass,
    Navigation,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("operation not valid on the {0:?} screen")]
    WrongStep(Step),
    #[error("no scanned identity; a pass needs a scan result or a manual entry")]
    MissingIdentity,
}

/// Destination/purpose/duration picked on the details screen, seeded
/// from the scanned identity.
#[derive(Debug, Clone)]
pub struct DetailsForm {
    pub destination: Destination,
    pub purpose: Purpose,
    pub duration_hours: f64,
}

impl Default for DetailsForm {
    fn default() -> Self {
        Self {
            destination: DESTINATIONS[0],
            purpose: PURPOSES[0],
            duration_hours: 2.0,
        }
    }
}

/// Hours granted to a scanned staff badge (a full work day).
const STAFF_SHIFT_HOURS: f64 = 9.0;

pub struct Session<R: Rng> {
    step: Step,
    rng: R,
    scanned: Option<ScanResult>,
    details: DetailsForm,
    officer_badge: Option<String>,
    pass: Option<Visitor>,
}

impl<R: Rng> Session<R> {
    pub fn new(rng: R) -> Self {
        Self {
            step: Step::Scan,
            rng,
            scanned: None,
            details: DetailsForm::default(),
            officer_badge: None,
            pass: None,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn details(&self) -> &DetailsForm {
        &self.details
    }

    pub fn scanned(&self) -> Option<&ScanResult> {
        self.scanned.as_ref()
    }

    pub fn pass(&self) -> Option<&Visitor> {
        self.pass.as_ref()
    }

    pub fn officer_badge(&self) -> Option<&str> {
        self.officer_badge.as_deref()
    }

    /// Consume the scanner's result. A staff badge auto-selects the
    /// staff purpose and a full-shift duration before the details screen.
    pub fn complete_scan(&mut self, result: ScanResult) -> Result<(), SessionError> {
        if self.step != Step::Scan {
            return Err(SessionError::WrongStep(self.step));
        }

        if result.doc_type.is_staff() {
            self.details.purpose = staff_purpose();
            self.details.duration_hours = STAFF_SHIFT_HOURS;
        }
        tracing::info!(id = %result.id, staff = result.doc_type.is_staff(), "scan complete");
        self.scanned = Some(result);
        self.step = Step::Details;
        Ok(())
    }

    /// Escape hatch to the officer gate (camera down, or on request).
    pub fn request_manual_entry(&mut self) {
        self.step = Step::AuthManualEntry;
    }

    /// Officer gate: any non-empty badge code unlocks the manual form.
    /// There is no real validation behind this.
    pub fn authorize_officer(&mut self, badge: &str) -> bool {
        let badge = badge.trim();
        if self.step == Step::AuthManualEntry && !badge.is_empty() {
            self.officer_badge = Some(badge.to_uppercase());
            self.step = Step::ManualEntry;
            true
        } else {
            false
        }
    }

    /// Back out of the override screens to the scanner.
    pub fn cancel_to_scan(&mut self) {
        if matches!(self.step, Step::AuthManualEntry | Step::ManualEntry) {
            self.step = Step::Scan;
        }
    }

    pub fn set_destination(&mut self, destination: Destination) {
        self.details.destination = destination;
    }

    pub fn set_purpose(&mut self, purpose: Purpose) {
        self.details.purpose = purpose;
    }

    pub fn set_duration(&mut self, hours: f64) {
        self.details.duration_hours = hours;
    }

    /// Issue the pass from the details screen. Requires a scan result —
    /// a pass is never built from a partial identity.
    pub fn generate_pass(&mut self, now: DateTime<Utc>) -> Result<&Visitor, SessionError> {
        if self.step != Step::Details {
            return Err(SessionError::WrongStep(self.step));
        }
        let scanned = self.scanned.as_ref().ok_or(SessionError::MissingIdentity)?;

        let slot = campus::parking_slot(&mut self.rng, self.details.destination.parking_zone);
        let pass = Visitor::from_scan(
            scanned,
            self.details.destination,
            self.details.purpose,
            self.details.duration_hours,
            slot,
            now,
        );
        tracing::info!(id = %pass.id, tower = %pass.tower, "pass issued (scan path)");
        self.pass = Some(pass);
        self.step = Step::KioskSuccess;
        Ok(self.pass.as_ref().expect("pass just stored"))
    }

    /// Issue the pass straight from the manual-entry form, bypassing the
    /// scanner. The details form is updated to match so the pass and
    /// navigation screens render consistently.
    pub fn submit_manual_entry(
        &mut self,
        entry: ManualEntry,
        now: DateTime<Utc>,
    ) -> Result<&Visitor, SessionError> {
        if self.step != Step::ManualEntry {
            return Err(SessionError::WrongStep(self.step));
        }

        let destination = destination_by_id(&entry.venue_id);
        let purpose = purpose_by_label(&entry.purpose_label);
        let slot = campus::parking_slot(&mut self.rng, destination.parking_zone);

        let pass = Visitor::from_manual_entry(&entry, destination, purpose, slot, now);
        tracing::info!(id = %pass.id, tower = %pass.tower, "pass issued (manual path)");

        self.details = DetailsForm {
            destination,
            purpose,
            duration_hours: entry.duration_hours,
        };
        self.pass = Some(pass);
        self.step = Step::KioskSuccess;
        Ok(self.pass.as_ref().expect("pass just stored"))
    }

    /// The simulated mobile hand-off: advance from the QR screen to the
    /// pass itself.
    pub fn proceed_to_pass(&mut self) -> Result<(), SessionError> {
        if self.step != Step::KioskSuccess {
            return Err(SessionError::WrongStep(self.step));
        }
        self.step = Step::Pass;
        Ok(())
    }

    /// Enter live navigation and compute the walking estimate to the
    /// chosen destination.
    pub fn navigate(&mut self) -> Result<WalkingEstimate, SessionError> {
        if self.step != Step::Pass {
            return Err(SessionError::WrongStep(self.step));
        }
        self.step = Step::Navigation;
        Ok(campus::walking_estimate(self.details.destination.id))
    }

    pub fn back_to_pass(&mut self) {
        if self.step == Step::Navigation {
            self.step = Step::Pass;
        }
    }

    /// Clear all transient state and return to the scanner.
    pub fn reset(&mut self) {
        self.step = Step::Scan;
        self.scanned = None;
        self.details = DetailsForm::default();
        self.officer_badge = None;
        self.pass = None;
    }
}
