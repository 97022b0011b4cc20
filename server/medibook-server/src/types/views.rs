// Response shapes for appointments with their participants attached
use database_layer::{Appointment, ClinicStore, DatabaseResult, Identity, StatusCounts};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// The other party of an appointment, as shown next to it
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PartySummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultation_fee: Option<f64>,
}

impl From<&Identity> for PartySummary {
    fn from(identity: &Identity) -> Self {
        let doctor = identity.doctor();
        Self {
            id: identity.id,
            name: identity.name.clone(),
            email: identity.email.clone(),
            phone: identity.phone.clone(),
            specialization: doctor.map(|d| d.specialization.clone()),
            consultation_fee: doctor.map(|d| d.consultation_fee),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient: Option<PartySummary>,
    pub doctor: Option<PartySummary>,
}

/// Attach patient and doctor summaries, loading each identity once
pub async fn appointment_views(
    store: &dyn ClinicStore,
    appointments: Vec<Appointment>,
) -> DatabaseResult<Vec<AppointmentView>> {
    let mut ids: Vec<Uuid> = appointments
        .iter()
        .flat_map(|a| [a.patient_id, a.doctor_id])
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let parties: HashMap<Uuid, PartySummary> = store
        .find_identities(&ids)
        .await?
        .iter()
        .map(|identity| (identity.id, PartySummary::from(identity)))
        .collect();

    Ok(appointments
        .into_iter()
        .map(|appointment| AppointmentView {
            patient: parties.get(&appointment.patient_id).cloned(),
            doctor: parties.get(&appointment.doctor_id).cloned(),
            appointment,
        })
        .collect())
}

pub async fn appointment_view(
    store: &dyn ClinicStore,
    appointment: Appointment,
) -> DatabaseResult<AppointmentView> {
    let mut views = appointment_views(store, vec![appointment.clone()]).await?;
    Ok(views.pop().unwrap_or(AppointmentView {
        appointment,
        patient: None,
        doctor: None,
    }))
}

/// An identity together with its per-status appointment counts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityWithStats {
    #[serde(flatten)]
    pub identity: Identity,
    pub appointment_stats: StatusCounts,
}
