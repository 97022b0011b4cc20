//! Route path constants, grouped the way the routers in [`super`] nest them
//!
//! Paths inside a group are relative to the group's prefix.

pub mod health {
    pub const HEALTH: &str = "/health";
}

pub mod auth {
    pub const PREFIX: &str = "/api/auth";
    pub const REGISTER_USER: &str = "/register/user";
    pub const REGISTER_DOCTOR: &str = "/register/doctor";
    pub const LOGIN_USER: &str = "/login/user";
    pub const LOGIN_DOCTOR: &str = "/login/doctor";
    pub const LOGIN_ADMIN: &str = "/login/admin";
    pub const ME: &str = "/me";
}

pub mod appointments {
    pub const PREFIX: &str = "/api/appointments";
    pub const ROOT: &str = "/";
    pub const USER: &str = "/user";
    pub const DOCTOR: &str = "/doctor";
    pub const BY_ID: &str = "/:id";
    pub const STATUS: &str = "/:id/status";
    pub const PRESCRIPTION: &str = "/:id/prescription";
}

pub mod doctors {
    pub const PREFIX: &str = "/api/doctors";
    pub const ROOT: &str = "/";
    pub const SPECIALIZATIONS: &str = "/specializations/list";
    pub const AVAILABILITY: &str = "/availability/:id";
    pub const PROFILE: &str = "/profile";
    pub const PASSWORD: &str = "/password";
    pub const BY_ID: &str = "/:id";
}

pub mod users {
    pub const PREFIX: &str = "/api/users";
    pub const PROFILE: &str = "/profile";
    pub const PASSWORD: &str = "/password";
    pub const AVATAR: &str = "/avatar";
    pub const STATS: &str = "/stats";
}

pub mod admin {
    pub const PREFIX: &str = "/api/admin";
    pub const STATS: &str = "/stats";
    pub const USERS: &str = "/users";
    pub const USER_BY_ID: &str = "/users/:id";
    pub const USER_STATUS: &str = "/users/:id/status";
    pub const DOCTORS: &str = "/doctors";
    pub const DOCTOR_BY_ID: &str = "/doctors/:id";
    pub const DOCTOR_APPROVE: &str = "/doctors/:id/approve";
    pub const DOCTOR_STATUS: &str = "/doctors/:id/status";
    pub const APPOINTMENTS: &str = "/appointments";
    pub const APPOINTMENT_BY_ID: &str = "/appointments/:id";
}
