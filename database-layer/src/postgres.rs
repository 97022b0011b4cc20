// Postgres-backed clinic store
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::types::Json;
use sqlx::{FromRow, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::connection::DatabasePool;
use crate::error::{DatabaseError, DatabaseResult};
use crate::models::{
    Address, Appointment, AppointmentStatus, AvailabilityWindow, DoctorProfile, Identity,
    NewAppointment, NewIdentity, PatientProfile, Prescription, Profile, Role, Slot, StatusChange,
    StatusCounts,
};
use crate::store::{
    AppointmentQuery, AppointmentStore, ClinicStore, ConflictProbe, CredentialStore,
    IdentityQuery, IdentitySort, Page, PageRequest,
};

const INSERT_IDENTITY: &str = r"
    INSERT INTO identities (
        id, name, email, phone, password_hash, is_active, avatar, last_login,
        date_of_birth, gender, address, medical_history,
        specialization, qualification, experience, registration_number, is_approved,
        consultation_fee, bio, availability, rating, total_reviews,
        role, created_at, updated_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
            $18, $19, $20, $21, $22, $23, $24, $25)
    RETURNING *";

const UPDATE_IDENTITY: &str = r"
    UPDATE identities SET
        name = $2, email = $3, phone = $4, password_hash = $5, is_active = $6, avatar = $7,
        last_login = $8, date_of_birth = $9, gender = $10, address = $11, medical_history = $12,
        specialization = $13, qualification = $14, experience = $15, registration_number = $16,
        is_approved = $17, consultation_fee = $18, bio = $19, availability = $20, rating = $21,
        total_reviews = $22, updated_at = now()
    WHERE id = $1
    RETURNING *";

const TOUCH_LAST_LOGIN: &str = "UPDATE identities SET last_login = $2 WHERE id = $1 RETURNING *";

const INSERT_APPOINTMENT: &str = r"
    INSERT INTO appointments (
        id, patient_id, doctor_id, department, appointment_date, appointment_time, status,
        consultation_type, symptoms, notes, fee, payment_status, payment_method,
        reminder_sent, created_at, updated_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
    RETURNING *";

#[derive(Debug, FromRow)]
struct IdentityRow {
    id: Uuid,
    role: String,
    name: String,
    email: String,
    phone: Option<String>,
    password_hash: String,
    is_active: bool,
    avatar: Option<String>,
    last_login: Option<DateTime<Utc>>,
    date_of_birth: Option<NaiveDate>,
    gender: Option<String>,
    address: Option<Json<Address>>,
    medical_history: Vec<String>,
    specialization: Option<String>,
    qualification: Vec<String>,
    experience: Option<i32>,
    registration_number: Option<String>,
    is_approved: bool,
    consultation_fee: Option<f64>,
    bio: Option<String>,
    availability: Json<Vec<AvailabilityWindow>>,
    rating: f64,
    total_reviews: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = DatabaseError;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        let profile = match row.role.parse::<Role>()? {
            Role::Patient => Profile::Patient(PatientProfile {
                date_of_birth: row.date_of_birth,
                gender: row.gender,
                address: row.address.map(|Json(address)| address),
                medical_history: row.medical_history,
            }),
            Role::Doctor => {
                let (Some(specialization), Some(registration_number)) =
                    (row.specialization, row.registration_number)
                else {
                    return Err(DatabaseError::InvalidRecord(format!(
                        "doctor {} is missing specialization or registration number",
                        row.id
                    )));
                };
                Profile::Doctor(DoctorProfile {
                    specialization,
                    qualification: row.qualification,
                    experience: row.experience.unwrap_or_default(),
                    registration_number,
                    is_approved: row.is_approved,
                    consultation_fee: row.consultation_fee.unwrap_or_default(),
                    bio: row.bio,
                    availability: row.availability.0,
                    rating: row.rating,
                    total_reviews: row.total_reviews,
                })
            }
            Role::Admin => Profile::Admin,
        };

        Ok(Identity {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            password_hash: row.password_hash,
            is_active: row.is_active,
            avatar: row.avatar,
            last_login: row.last_login,
            profile,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Flattened column values of an identity, in `$2..$22` order
struct IdentityColumns {
    name: String,
    email: String,
    phone: Option<String>,
    password_hash: String,
    is_active: bool,
    avatar: Option<String>,
    last_login: Option<DateTime<Utc>>,
    date_of_birth: Option<NaiveDate>,
    gender: Option<String>,
    address: Option<Json<Address>>,
    medical_history: Vec<String>,
    specialization: Option<String>,
    qualification: Vec<String>,
    experience: Option<i32>,
    registration_number: Option<String>,
    is_approved: bool,
    consultation_fee: Option<f64>,
    bio: Option<String>,
    availability: Json<Vec<AvailabilityWindow>>,
    rating: f64,
    total_reviews: i32,
}

impl From<&Identity> for IdentityColumns {
    fn from(identity: &Identity) -> Self {
        let patient = identity.patient().cloned().unwrap_or_default();
        let doctor = identity.doctor();
        Self {
            name: identity.name.clone(),
            email: identity.email.to_lowercase(),
            phone: identity.phone.clone(),
            password_hash: identity.password_hash.clone(),
            is_active: identity.is_active,
            avatar: identity.avatar.clone(),
            last_login: identity.last_login,
            date_of_birth: patient.date_of_birth,
            gender: patient.gender,
            address: patient.address.map(Json),
            medical_history: patient.medical_history,
            specialization: doctor.map(|d| d.specialization.clone()),
            qualification: doctor.map(|d| d.qualification.clone()).unwrap_or_default(),
            experience: doctor.map(|d| d.experience),
            registration_number: doctor.map(|d| d.registration_number.clone()),
            is_approved: doctor.is_some_and(|d| d.is_approved),
            consultation_fee: doctor.map(|d| d.consultation_fee),
            bio: doctor.and_then(|d| d.bio.clone()),
            availability: Json(doctor.map(|d| d.availability.clone()).unwrap_or_default()),
            rating: doctor.map_or(0.0, |d| d.rating),
            total_reviews: doctor.map_or(0, |d| d.total_reviews),
        }
    }
}

impl IdentityColumns {
    fn bind<'q>(
        self,
        query: QueryAs<'q, Postgres, IdentityRow, PgArguments>,
    ) -> QueryAs<'q, Postgres, IdentityRow, PgArguments> {
        query
            .bind(self.name)
            .bind(self.email)
            .bind(self.phone)
            .bind(self.password_hash)
            .bind(self.is_active)
            .bind(self.avatar)
            .bind(self.last_login)
            .bind(self.date_of_birth)
            .bind(self.gender)
            .bind(self.address)
            .bind(self.medical_history)
            .bind(self.specialization)
            .bind(self.qualification)
            .bind(self.experience)
            .bind(self.registration_number)
            .bind(self.is_approved)
            .bind(self.consultation_fee)
            .bind(self.bio)
            .bind(self.availability)
            .bind(self.rating)
            .bind(self.total_reviews)
    }
}

#[derive(Debug, FromRow)]
struct AppointmentRow {
    id: Uuid,
    patient_id: Uuid,
    doctor_id: Uuid,
    department: String,
    appointment_date: NaiveDate,
    appointment_time: String,
    status: String,
    consultation_type: String,
    symptoms: Option<String>,
    notes: Option<String>,
    prescription: Option<Json<Prescription>>,
    fee: f64,
    payment_status: String,
    payment_method: String,
    reminder_sent: bool,
    cancellation_reason: Option<String>,
    cancelled_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DatabaseError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        Ok(Appointment {
            id: row.id,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            department: row.department.parse()?,
            appointment_date: row.appointment_date,
            appointment_time: row.appointment_time,
            status: row.status.parse()?,
            consultation_type: row.consultation_type.parse()?,
            symptoms: row.symptoms,
            notes: row.notes,
            prescription: row.prescription.map(|Json(p)| p),
            fee: row.fee,
            payment_status: row.payment_status.parse()?,
            payment_method: row.payment_method.parse()?,
            reminder_sent: row.reminder_sent,
            cancellation_reason: row.cancellation_reason,
            cancelled_by: row.cancelled_by.as_deref().map(str::parse).transpose()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> DatabaseResult<Vec<T>>
where
    T: TryFrom<R, Error = DatabaseError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// `%term%` for ILIKE with the LIKE metacharacters escaped
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn limit_offset(page: PageRequest) -> (i64, i64) {
    (
        i64::from(page.limit),
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
    )
}

fn push_identity_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &IdentityQuery) {
    builder.push(" WHERE role = ");
    builder.push_bind(query.role.as_str());
    if let Some(active) = query.is_active {
        builder.push(" AND is_active = ");
        builder.push_bind(active);
    }
    if let Some(approved) = query.is_approved {
        builder.push(" AND is_approved = ");
        builder.push_bind(approved);
    }
    if let Some(specialization) = &query.specialization {
        builder.push(" AND specialization = ");
        builder.push_bind(specialization.clone());
    }
    if let Some(since) = query.created_since {
        builder.push(" AND created_at >= ");
        builder.push_bind(since);
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        builder.push(" AND (");
        for (i, column) in ["name", "email", "phone", "specialization"].iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder.push(*column);
            builder.push(" ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(r" ESCAPE '\'");
        }
        builder.push(")");
    }
}

fn push_appointment_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &AppointmentQuery) {
    builder.push(" WHERE TRUE");
    if let Some(patient_id) = query.patient_id {
        builder.push(" AND patient_id = ");
        builder.push_bind(patient_id);
    }
    if let Some(doctor_id) = query.doctor_id {
        builder.push(" AND doctor_id = ");
        builder.push_bind(doctor_id);
    }
    if !query.statuses.is_empty() {
        let statuses: Vec<String> = query.statuses.iter().map(|s| s.as_str().to_string()).collect();
        builder.push(" AND status = ANY(");
        builder.push_bind(statuses);
        builder.push(")");
    }
    if let Some(date) = query.date {
        builder.push(" AND appointment_date = ");
        builder.push_bind(date);
    }
    if let Some(from) = query.from_date {
        builder.push(" AND appointment_date >= ");
        builder.push_bind(from);
    }
}

/// Clinic store over a shared Postgres pool
#[derive(Clone)]
pub struct PgClinicStore {
    pool: DatabasePool,
}

impl PgClinicStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

#[async_trait]
impl CredentialStore for PgClinicStore {
    async fn insert_identity(&self, identity: NewIdentity) -> DatabaseResult<Identity> {
        let identity = identity.into_identity(Utc::now());
        let query = sqlx::query_as::<_, IdentityRow>(INSERT_IDENTITY).bind(identity.id);
        let row = IdentityColumns::from(&identity)
            .bind(query)
            .bind(identity.role().as_str())
            .bind(identity.created_at)
            .bind(identity.updated_at)
            .fetch_one(self.pool.pool())
            .await?;

        debug!(identity_id = %row.id, role = %row.role, "Identity inserted");
        row.try_into()
    }

    async fn find_identity(&self, id: Uuid) -> DatabaseResult<Option<Identity>> {
        sqlx::query_as::<_, IdentityRow>("SELECT * FROM identities WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?
            .map(Identity::try_from)
            .transpose()
    }

    async fn find_identity_by_email(&self, role: Role, email: &str) -> DatabaseResult<Option<Identity>> {
        sqlx::query_as::<_, IdentityRow>("SELECT * FROM identities WHERE role = $1 AND email = $2")
            .bind(role.as_str())
            .bind(email.to_lowercase())
            .fetch_optional(self.pool.pool())
            .await?
            .map(Identity::try_from)
            .transpose()
    }

    async fn find_identities(&self, ids: &[Uuid]) -> DatabaseResult<Vec<Identity>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, IdentityRow>("SELECT * FROM identities WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(self.pool.pool())
            .await?;
        convert_all(rows)
    }

    async fn find_conflicting_identity(
        &self,
        role: Role,
        probe: &ConflictProbe<'_>,
    ) -> DatabaseResult<Option<Identity>> {
        let mut keys: Vec<(&str, String)> = Vec::new();
        if let Some(email) = probe.email {
            keys.push(("email", email.to_lowercase()));
        }
        if let Some(phone) = probe.phone {
            keys.push(("phone", phone.to_string()));
        }
        if let Some(number) = probe.registration_number {
            keys.push(("registration_number", number.to_string()));
        }
        if keys.is_empty() {
            return Ok(None);
        }

        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM identities WHERE role = ");
        builder.push_bind(role.as_str());
        if let Some(exclude) = probe.exclude_id {
            builder.push(" AND id <> ");
            builder.push_bind(exclude);
        }
        builder.push(" AND (");
        for (i, (column, value)) in keys.into_iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder.push(column);
            builder.push(" = ");
            builder.push_bind(value);
        }
        builder.push(") LIMIT 1");

        builder
            .build_query_as::<IdentityRow>()
            .fetch_optional(self.pool.pool())
            .await?
            .map(Identity::try_from)
            .transpose()
    }

    async fn save_identity(&self, identity: &Identity) -> DatabaseResult<Option<Identity>> {
        let query = sqlx::query_as::<_, IdentityRow>(UPDATE_IDENTITY).bind(identity.id);
        IdentityColumns::from(identity)
            .bind(query)
            .fetch_optional(self.pool.pool())
            .await?
            .map(Identity::try_from)
            .transpose()
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> DatabaseResult<Option<Identity>> {
        sqlx::query_as::<_, IdentityRow>(TOUCH_LAST_LOGIN)
            .bind(id)
            .bind(at)
            .fetch_optional(self.pool.pool())
            .await?
            .map(Identity::try_from)
            .transpose()
    }

    async fn list_identities(
        &self,
        query: &IdentityQuery,
        page: PageRequest,
    ) -> DatabaseResult<Page<Identity>> {
        let total = self.count_identities(query).await?;

        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM identities");
        push_identity_filters(&mut builder, query);
        builder.push(match query.sort {
            IdentitySort::Newest => " ORDER BY created_at DESC",
            IdentitySort::TopRated => " ORDER BY rating DESC, total_reviews DESC, created_at DESC",
        });
        let (limit, offset) = limit_offset(page);
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows = builder
            .build_query_as::<IdentityRow>()
            .fetch_all(self.pool.pool())
            .await?;
        Ok(Page {
            items: convert_all(rows)?,
            total,
        })
    }

    async fn count_identities(&self, query: &IdentityQuery) -> DatabaseResult<i64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM identities");
        push_identity_filters(&mut builder, query);
        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(self.pool.pool())
            .await?;
        Ok(count)
    }

    async fn distinct_specializations(&self) -> DatabaseResult<Vec<String>> {
        let specializations = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT specialization FROM identities \
             WHERE role = 'doctor' AND is_approved AND is_active AND specialization IS NOT NULL \
             ORDER BY specialization",
        )
        .fetch_all(self.pool.pool())
        .await?;
        Ok(specializations)
    }

    async fn delete_identity(&self, id: Uuid) -> DatabaseResult<bool> {
        let mut tx = self.pool.pool().begin().await?;

        let appointments = sqlx::query("DELETE FROM appointments WHERE patient_id = $1 OR doctor_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM identities WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            identity_id = %id,
            appointments_removed = appointments.rows_affected(),
            "Identity deleted"
        );
        Ok(deleted.rows_affected() > 0)
    }
}

#[async_trait]
impl AppointmentStore for PgClinicStore {
    async fn find_slot_holder(&self, slot: &Slot) -> DatabaseResult<Option<Appointment>> {
        sqlx::query_as::<_, AppointmentRow>(
            "SELECT * FROM appointments \
             WHERE doctor_id = $1 AND appointment_date = $2 AND appointment_time = $3 \
               AND status IN ('pending', 'approved') \
             LIMIT 1",
        )
        .bind(slot.doctor_id)
        .bind(slot.date)
        .bind(&slot.time)
        .fetch_optional(self.pool.pool())
        .await?
        .map(Appointment::try_from)
        .transpose()
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> DatabaseResult<Appointment> {
        let appointment = appointment.into_appointment(Utc::now());
        let row = sqlx::query_as::<_, AppointmentRow>(INSERT_APPOINTMENT)
            .bind(appointment.id)
            .bind(appointment.patient_id)
            .bind(appointment.doctor_id)
            .bind(appointment.department.as_str())
            .bind(appointment.appointment_date)
            .bind(&appointment.appointment_time)
            .bind(appointment.status.as_str())
            .bind(appointment.consultation_type.as_str())
            .bind(&appointment.symptoms)
            .bind(&appointment.notes)
            .bind(appointment.fee)
            .bind(appointment.payment_status.as_str())
            .bind(appointment.payment_method.as_str())
            .bind(appointment.reminder_sent)
            .bind(appointment.created_at)
            .bind(appointment.updated_at)
            .fetch_one(self.pool.pool())
            .await?;
        row.try_into()
    }

    async fn find_appointment(&self, id: Uuid) -> DatabaseResult<Option<Appointment>> {
        sqlx::query_as::<_, AppointmentRow>("SELECT * FROM appointments WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?
            .map(Appointment::try_from)
            .transpose()
    }

    async fn list_appointments(
        &self,
        query: &AppointmentQuery,
        page: PageRequest,
    ) -> DatabaseResult<Page<Appointment>> {
        let total = self.count_appointments(query).await?;

        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM appointments");
        push_appointment_filters(&mut builder, query);
        let direction = query.sort.as_sql();
        builder.push(format!(
            " ORDER BY appointment_date {direction}, appointment_time {direction}"
        ));
        let (limit, offset) = limit_offset(page);
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows = builder
            .build_query_as::<AppointmentRow>()
            .fetch_all(self.pool.pool())
            .await?;
        Ok(Page {
            items: convert_all(rows)?,
            total,
        })
    }

    async fn count_appointments(&self, query: &AppointmentQuery) -> DatabaseResult<i64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM appointments");
        push_appointment_filters(&mut builder, query);
        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(self.pool.pool())
            .await?;
        Ok(count)
    }

    async fn status_counts(&self, query: &AppointmentQuery) -> DatabaseResult<StatusCounts> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT status, COUNT(*) FROM appointments");
        push_appointment_filters(&mut builder, query);
        builder.push(" GROUP BY status");

        let rows = builder
            .build_query_as::<(String, i64)>()
            .fetch_all(self.pool.pool())
            .await?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            counts.add(status.parse::<AppointmentStatus>()?, count);
        }
        Ok(counts)
    }

    async fn update_status(
        &self,
        id: Uuid,
        change: StatusChange,
    ) -> DatabaseResult<Option<Appointment>> {
        let (reason, by) = match change.cancellation {
            Some(cancellation) => (Some(cancellation.reason), Some(cancellation.by.as_str())),
            None => (None, None),
        };

        sqlx::query_as::<_, AppointmentRow>(
            "UPDATE appointments SET \
                 status = $2, \
                 cancellation_reason = COALESCE($3, cancellation_reason), \
                 cancelled_by = COALESCE($4, cancelled_by), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING *",
        )
        .bind(id)
        .bind(change.status.as_str())
        .bind(reason)
        .bind(by)
        .fetch_optional(self.pool.pool())
        .await?
        .map(Appointment::try_from)
        .transpose()
    }

    async fn complete_with_prescription(
        &self,
        id: Uuid,
        prescription: Prescription,
    ) -> DatabaseResult<Option<Appointment>> {
        sqlx::query_as::<_, AppointmentRow>(
            "UPDATE appointments SET prescription = $2, status = 'completed', updated_at = now() \
             WHERE id = $1 \
             RETURNING *",
        )
        .bind(id)
        .bind(Json(prescription))
        .fetch_optional(self.pool.pool())
        .await?
        .map(Appointment::try_from)
        .transpose()
    }
}

#[async_trait]
impl ClinicStore for PgClinicStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn is_healthy(&self) -> bool {
        self.pool.is_healthy().await
    }
}
