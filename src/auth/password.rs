use crate::db::models::FieldErrors;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_USERNAME_LEN: usize = 150;

pub fn hash_password(plaintext: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plaintext, bcrypt::DEFAULT_COST)
}

/// Constant-time via bcrypt; a malformed stored hash never verifies.
pub fn verify_password(plaintext: &str, hash: &str) -> bool {
    bcrypt::verify(plaintext, hash).unwrap_or(false)
}

/// Letters, digits and `@ . + - _`, like the usernames in profile URLs expect.
pub fn validate_username(username: &str, errors: &mut FieldErrors) {
    if username.is_empty() {
        errors.add("username", crate::db::models::REQUIRED);
    } else if username.chars().count() > MAX_USERNAME_LEN {
        errors.add("username", "Username is too long.");
    } else if !username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        errors.add(
            "username",
            "Use only letters, digits and @/./+/-/_ characters.",
        );
    } else if crate::routes::RESERVED_PATHS.contains(&username) {
        errors.add("username", "This username is not available.");
    }
}

pub fn validate_new_password(password: &str, confirmation: &str, errors: &mut FieldErrors) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add("password1", "Password must be at least 8 characters.");
    } else if password != confirmation {
        errors.add("password2", "The two password fields didn't match.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = bcrypt::hash("correct horse", 4).unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("anything", "not-a-hash"));
    }

    #[test]
    fn username_rules() {
        let check = |name: &str| {
            let mut errors = FieldErrors::default();
            validate_username(name, &mut errors);
            errors.is_empty()
        };
        assert!(check("PostAuthor"));
        assert!(check("leo.tolstoy_1828"));
        assert!(!check(""));
        assert!(!check("has space"));
        assert!(!check("slash/name"));
        assert!(!check("new"));
        assert!(!check(&"x".repeat(151)));
    }

    #[test]
    fn password_rules() {
        let mut errors = FieldErrors::default();
        validate_new_password("short", "short", &mut errors);
        assert!(errors.get("password1").is_some());

        let mut errors = FieldErrors::default();
        validate_new_password("long enough", "different!", &mut errors);
        assert!(errors.get("password2").is_some());

        let mut errors = FieldErrors::default();
        validate_new_password("long enough", "long enough", &mut errors);
        assert!(errors.is_empty());
    }
}
