use crate::error::AppError;
use regex::Regex;
use std::sync::LazyLock;

static FULL_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[А-Яа-яЁё\s]+$").expect("full name regex"));

const PASSWORD_SYMBOLS: &str = "!@#$%^&*()_+=-";

pub const FULL_NAME_RULE: &str = "ФИО должно содержать только русские буквы";
pub const PASSWORD_RULE: &str = "Пароль должен быть от 8 символов с латиницей, цифрами и символами";

pub fn full_name_error(full_name: &str) -> Option<&'static str> {
    if FULL_NAME_RE.is_match(full_name) {
        None
    } else {
        Some(FULL_NAME_RULE)
    }
}

pub fn password_error(password: &str) -> Option<&'static str> {
    let long_enough = password.chars().count() >= 8;
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));

    if long_enough && has_letter && has_digit && has_symbol {
        None
    } else {
        Some(PASSWORD_RULE)
    }
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    match password_error(password) {
        None => Ok(()),
        Some(msg) => Err(AppError::Validation(msg.to_string())),
    }
}
