use regex::Regex;
use std::sync::LazyLock;

use crate::error::AppError;

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{4,16}$").expect("username pattern compiles"));

// Alphanumerics plus !@#$%^&*()\/;: and _-., all single-byte, so the upper
// bound matches the bcrypt input limit.
static PASSWORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9!@#$%^&*()\\/;:_.,\-]{6,72}$").expect("password pattern compiles")
});

pub const USERNAME_RULE: &str =
    "Invalid username. It should be 4-16 characters long and contain only alphanumeric characters.";

pub const PASSWORD_RULE: &str = "Invalid password. It should be alphanumeric and can contain \
     symbols !@#$%^&*()\\/;:_-., with a length of 6 to 72 characters.";

pub fn valid_username(username: &str) -> bool {
    USERNAME_PATTERN.is_match(username)
}

pub fn valid_password(password: &str) -> bool {
    PASSWORD_PATTERN.is_match(password)
}

pub fn check_username(username: &str) -> Result<(), AppError> {
    if valid_username(username) {
        Ok(())
    } else {
        Err(AppError::ValidationError(USERNAME_RULE.to_string()))
    }
}

pub fn check_password(password: &str) -> Result<(), AppError> {
    if valid_password(password) {
        Ok(())
    } else {
        Err(AppError::ValidationError(PASSWORD_RULE.to_string()))
    }
}
