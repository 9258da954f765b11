/// Wire request body for `POST /auth/register`.
#[derive(Debug, serde::Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Wire request body for `POST /auth/login`.
#[derive(Debug, serde::Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Minimal public user projection returned alongside a token.
#[derive(Debug, serde::Serialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub chips: rbp_core::Chips,
}

/// Wire response body for register/login.
#[derive(Debug, serde::Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}
