//! User DTOs - Data Transfer Objects per utenti e autenticazione

use crate::entities::User;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

lazy_static! {
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_.\-]+$").unwrap();
}

// struct per gestire io col client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserDTO {
    pub id: i32,
    pub username: String,
}

impl From<User> for UserDTO {
    fn from(value: User) -> Self {
        Self {
            id: value.user_id,
            username: value.username,
            // password ed email mai esposte al client
        }
    }
}

/// DTO per creare un nuovo utente (senza user_id)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateUserDTO {
    #[validate(
        length(min = 3, max = 30, message = "Username must be between 3 and 30 characters"),
        regex(path = *USERNAME_REGEX, message = "Username may only contain letters, digits, '.', '_' and '-'")
    )]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,
}

/// DTO per il login (solo username e password)
#[derive(Deserialize, Debug)]
pub struct LoginDTO {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponseDTO {
    pub user: UserDTO,
    pub access: String,
}

#[derive(Deserialize, Debug, Validate)]
pub struct PasswordResetRequestDTO {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Deserialize, Debug, Validate)]
pub struct PasswordResetConfirmDTO {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub new_password: String,
}
