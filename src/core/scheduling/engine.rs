//! Booking engine with conflict detection.

use crate::adapters::directory::{DirectoryLookup, NameResolver};
use crate::core::locks::KeyedLocks;
use crate::domain::appointment::{Appointment, AppointmentStatus};
use crate::domain::errors::ClinopsError;
use crate::domain::ids::{AppointmentId, DoctorId, IdSequence, PatientId};
use crate::domain::result::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Half-width of the conflict window around a proposed appointment time.
pub const CONFLICT_WINDOW_MINUTES: i64 = 30;

/// Caller input for booking an appointment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: Option<u32>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// An appointment enriched with the patient's display name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient_name: String,
}

/// The scheduling conflict checker and appointment store.
///
/// Bookings for the same doctor are serialized through a per-doctor lock so
/// the conflict check and the insert act as one unit; bookings for different
/// doctors proceed in parallel.
pub struct SchedulingService {
    appointments: RwLock<HashMap<AppointmentId, Appointment>>,
    ids: IdSequence,
    doctor_locks: KeyedLocks<DoctorId>,
    directory: Arc<dyn DirectoryLookup>,
    names: NameResolver,
}

impl SchedulingService {
    /// Creates an empty scheduler backed by the given directory port.
    pub fn new(directory: Arc<dyn DirectoryLookup>) -> Self {
        Self {
            appointments: RwLock::new(HashMap::new()),
            ids: IdSequence::new(),
            doctor_locks: KeyedLocks::new(),
            names: NameResolver::new(directory.clone()),
            directory,
        }
    }

    /// Books an appointment.
    ///
    /// The patient id is verified against the directory first (a booking for
    /// an unknown patient is rejected), then the conflict check and insert
    /// run under the doctor's lock. On conflict nothing is written.
    ///
    /// # Errors
    ///
    /// - [`ClinopsError::PatientNotFound`] if the directory cannot confirm
    ///   the patient.
    /// - [`ClinopsError::SchedulingConflict`] if the doctor already has a
    ///   non-cancelled appointment within ±30 minutes.
    pub async fn book(&self, request: BookingRequest) -> Result<AppointmentView> {
        // Existence check through the fallible port; this is the one write
        // path where a directory failure is surfaced rather than recovered.
        let person = self
            .directory
            .fetch_person(request.patient_id)
            .await
            .map_err(|err| {
                tracing::warn!(patient_id = %request.patient_id, error = %err, "patient verification failed");
                ClinopsError::PatientNotFound(request.patient_id)
            })?;

        let appointment = {
            let _doctor = self.doctor_locks.lock(request.doctor_id).await;

            if self.has_conflict(request.doctor_id, request.scheduled_at) {
                tracing::info!(
                    doctor_id = %request.doctor_id,
                    scheduled_at = %request.scheduled_at,
                    "booking rejected: scheduling conflict"
                );
                return Err(ClinopsError::SchedulingConflict {
                    doctor_id: request.doctor_id,
                    requested: request.scheduled_at,
                });
            }

            let appointment = Appointment::new(
                AppointmentId::new(self.ids.next()),
                request.patient_id,
                request.doctor_id,
                request.scheduled_at,
                request.duration_minutes,
                request.reason,
                request.notes,
            );
            self.write().insert(appointment.id, appointment.clone());
            appointment
        };

        tracing::info!(
            appointment_id = %appointment.id,
            doctor_id = %appointment.doctor_id,
            "appointment booked"
        );

        Ok(AppointmentView {
            patient_name: person.display_name(),
            appointment,
        })
    }

    /// Applies a status change parsed from its wire form.
    ///
    /// Transitions are unguarded: any recognized status is accepted from any
    /// current status. An unrecognized string is a validation error.
    pub async fn set_status(&self, id: AppointmentId, status: &str) -> Result<AppointmentView> {
        let status: AppointmentStatus = status
            .parse()
            .map_err(|e: String| ClinopsError::Validation(e))?;

        let appointment = {
            let mut appointments = self.write();
            let appointment = appointments
                .get_mut(&id)
                .ok_or_else(|| ClinopsError::not_found("Appointment", id))?;
            appointment.set_status(status);
            appointment.clone()
        };

        tracing::info!(appointment_id = %id, status = %status, "appointment status updated");
        Ok(self.enrich(appointment).await)
    }

    /// Cancels an appointment. Shorthand for a `CANCELLED` status update.
    pub async fn cancel(&self, id: AppointmentId) -> Result<()> {
        let mut appointments = self.write();
        let appointment = appointments
            .get_mut(&id)
            .ok_or_else(|| ClinopsError::not_found("Appointment", id))?;
        appointment.set_status(AppointmentStatus::Cancelled);
        tracing::info!(appointment_id = %id, "appointment cancelled");
        Ok(())
    }

    /// Fetches a single appointment, name-enriched.
    pub async fn get(&self, id: AppointmentId) -> Result<AppointmentView> {
        let appointment = self
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| ClinopsError::not_found("Appointment", id))?;
        Ok(self.enrich(appointment).await)
    }

    /// All appointments, ordered by id.
    pub async fn list_all(&self) -> Vec<AppointmentView> {
        self.enrich_all(self.collect(|_| true)).await
    }

    /// Appointments for one patient, ordered by id.
    pub async fn list_by_patient(&self, patient_id: PatientId) -> Vec<AppointmentView> {
        self.enrich_all(self.collect(|a| a.patient_id == patient_id))
            .await
    }

    /// Appointments for one doctor, ordered by id.
    pub async fn list_by_doctor(&self, doctor_id: DoctorId) -> Vec<AppointmentView> {
        self.enrich_all(self.collect(|a| a.doctor_id == doctor_id))
            .await
    }

    /// Appointments scheduled on a calendar day (UTC).
    pub async fn list_by_date(&self, date: NaiveDate) -> Vec<AppointmentView> {
        let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1);
        self.enrich_all(self.collect(|a| a.scheduled_at >= start && a.scheduled_at < end))
            .await
    }

    /// True when the doctor has a non-cancelled appointment whose instant
    /// falls within the inclusive ±30-minute window. Cancelled slots do not
    /// block rebooking.
    fn has_conflict(&self, doctor_id: DoctorId, when: DateTime<Utc>) -> bool {
        let window = Duration::minutes(CONFLICT_WINDOW_MINUTES);
        let (from, to) = (when - window, when + window);
        self.read().values().any(|a| {
            a.doctor_id == doctor_id
                && !a.is_cancelled()
                && a.scheduled_at >= from
                && a.scheduled_at <= to
        })
    }

    fn collect(&self, keep: impl Fn(&Appointment) -> bool) -> Vec<Appointment> {
        let mut out: Vec<Appointment> = self.read().values().filter(|a| keep(a)).cloned().collect();
        out.sort_by_key(|a| a.id);
        out
    }

    async fn enrich(&self, appointment: Appointment) -> AppointmentView {
        AppointmentView {
            patient_name: self.names.display_name(appointment.patient_id).await,
            appointment,
        }
    }

    async fn enrich_all(&self, appointments: Vec<Appointment>) -> Vec<AppointmentView> {
        let mut views = Vec::with_capacity(appointments.len());
        for appointment in appointments {
            views.push(self.enrich(appointment).await);
        }
        views
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<AppointmentId, Appointment>> {
        self.appointments
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<AppointmentId, Appointment>> {
        self.appointments
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::directory::Person;
    use async_trait::async_trait;
    use chrono::TimeZone;

    /// Directory stub: even-numbered patients exist, odd ones don't.
    struct EvenPatients;

    #[async_trait]
    impl DirectoryLookup for EvenPatients {
        async fn fetch_person(&self, id: PatientId) -> Result<Person> {
            if id.value() % 2 == 0 {
                Ok(Person {
                    id,
                    first_name: "Pat".into(),
                    last_name: format!("No{}", id),
                })
            } else {
                Err(ClinopsError::Directory("unknown person".into()))
            }
        }
    }

    fn service() -> SchedulingService {
        SchedulingService::new(Arc::new(EvenPatients))
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, hour, minute, 0).unwrap()
    }

    fn booking(doctor: u64, when: DateTime<Utc>) -> BookingRequest {
        BookingRequest {
            patient_id: PatientId::new(2),
            doctor_id: DoctorId::new(doctor),
            scheduled_at: when,
            duration_minutes: None,
            reason: Some("checkup".into()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_booking_inside_window_conflicts() {
        let svc = service();
        svc.book(booking(7, at(10, 0))).await.unwrap();

        let err = svc.book(booking(7, at(10, 20))).await.unwrap_err();
        assert!(matches!(err, ClinopsError::SchedulingConflict { .. }));

        // An hour later is outside the window.
        svc.book(booking(7, at(11, 0))).await.unwrap();
        assert_eq!(svc.list_by_doctor(DoctorId::new(7)).await.len(), 2);
    }

    #[tokio::test]
    async fn test_conflict_check_is_per_doctor() {
        let svc = service();
        svc.book(booking(7, at(10, 0))).await.unwrap();
        // Same slot, different doctor.
        svc.book(booking(8, at(10, 0))).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_booking_writes_nothing() {
        let svc = service();
        svc.book(booking(7, at(10, 0))).await.unwrap();
        let _ = svc.book(booking(7, at(10, 10))).await.unwrap_err();
        assert_eq!(svc.list_all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_patient_is_rejected() {
        let svc = service();
        let mut req = booking(7, at(10, 0));
        req.patient_id = PatientId::new(3);
        let err = svc.book(req).await.unwrap_err();
        assert!(matches!(err, ClinopsError::PatientNotFound(_)));
        assert!(svc.list_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_slot_can_be_rebooked() {
        let svc = service();
        let booked = svc.book(booking(7, at(10, 0))).await.unwrap();
        svc.cancel(booked.appointment.id).await.unwrap();
        // The cancelled appointment no longer blocks the slot.
        svc.book(booking(7, at(10, 0))).await.unwrap();
    }

    #[tokio::test]
    async fn test_status_update_is_unguarded() {
        let svc = service();
        let booked = svc.book(booking(7, at(10, 0))).await.unwrap();
        let id = booked.appointment.id;

        let view = svc.set_status(id, "completed").await.unwrap();
        assert_eq!(view.appointment.status, AppointmentStatus::Completed);

        // Even terminal-looking states can be left again.
        let view = svc.set_status(id, "SCHEDULED").await.unwrap();
        assert_eq!(view.appointment.status, AppointmentStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_status_update_rejects_unknown_string() {
        let svc = service();
        let booked = svc.book(booking(7, at(10, 0))).await.unwrap();
        let err = svc
            .set_status(booked.appointment.id, "TELEPORTED")
            .await
            .unwrap_err();
        assert!(matches!(err, ClinopsError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cancel_unknown_id_is_not_found() {
        let svc = service();
        let err = svc.cancel(AppointmentId::new(404)).await.unwrap_err();
        assert!(matches!(err, ClinopsError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_by_date_uses_utc_day_bounds() {
        let svc = service();
        svc.book(booking(7, at(0, 0))).await.unwrap();
        svc.book(booking(7, at(23, 45))).await.unwrap();
        svc.book(booking(8, Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 0).unwrap()))
            .await
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        assert_eq!(svc.list_by_date(date).await.len(), 2);
    }

    #[tokio::test]
    async fn test_views_carry_patient_name() {
        let svc = service();
        let view = svc.book(booking(7, at(10, 0))).await.unwrap();
        assert_eq!(view.patient_name, "Pat No2");
    }
}
