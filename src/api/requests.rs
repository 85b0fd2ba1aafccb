use serde::Serialize;

#[derive(Serialize)]
pub struct SaveCredentialsRequest<'a> {
    pub login: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub struct SelectSchoolRequest {
    pub school_number: i64,
}

#[derive(Serialize)]
pub struct SelectClassRequest<'a> {
    pub class_name: &'a str,
}
