use axum::Json;
use axum::extract::rejection::JsonRejection;

use super::ApiError;
use crate::models::anime::{AnimeUpdate, NewAnime};

/// Unwraps a JSON body, reporting malformed input as a 400.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

pub fn validate_id(resource: &str, id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {resource} ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

pub fn validate_username(name: &str) -> Result<&str, ApiError> {
    let name = name.trim();
    if name.len() < 3 || name.len() > 50 {
        return Err(ApiError::validation(
            "Username must be between 3 and 50 characters",
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(ApiError::validation(
            "Username can only contain letters, numbers, dots, hyphens, and underscores",
        ));
    }

    Ok(name)
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'))
        && !email.chars().any(char::is_whitespace);

    if !valid {
        return Err(ApiError::validation(format!("Invalid email address: {email}")));
    }
    Ok(email)
}

fn validate_anime_numbers(episodes: Option<i32>, rating: Option<f32>) -> Result<(), ApiError> {
    if episodes.is_some_and(|e| e < 0) {
        return Err(ApiError::validation("Episodes cannot be negative"));
    }
    if rating.is_some_and(|r| !(0.0..=10.0).contains(&r)) {
        return Err(ApiError::validation("Rating must be between 0 and 10"));
    }
    Ok(())
}

pub fn validate_new_anime(input: &NewAnime) -> Result<(), ApiError> {
    if input.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    validate_anime_numbers(input.episodes, input.rating)
}

pub fn validate_anime_update(input: &AnimeUpdate) -> Result<(), ApiError> {
    validate_anime_numbers(input.episodes, input.rating)
}

/// Parses an optional filter value; unknown values mean "no filter".
pub fn optional_filter<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, WatchStatus};

    #[test]
    fn test_validate_id() {
        assert!(validate_id("anime", 1).is_ok());
        assert!(validate_id("anime", 12345).is_ok());
        assert!(validate_id("anime", 0).is_err());
        assert!(validate_id("user", -1).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username("  spike  ").unwrap(), "spike");
        assert!(validate_username("ed_2071").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(51)).is_err());
        assert!(validate_username("robert'); DROP").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("faye@bebop.test").is_ok());
        assert!(validate_email("faye@bebop").is_err());
        assert!(validate_email("@bebop.test").is_err());
        assert!(validate_email("faye @bebop.test").is_err());
    }

    #[test]
    fn test_validate_new_anime() {
        let mut anime = NewAnime {
            title: "Planetes".into(),
            episodes: Some(26),
            rating: Some(8.7),
            ..NewAnime::default()
        };
        assert!(validate_new_anime(&anime).is_ok());

        anime.rating = Some(11.0);
        assert!(validate_new_anime(&anime).is_err());

        anime.rating = None;
        anime.title = "   ".into();
        assert!(validate_new_anime(&anime).is_err());
    }

    #[test]
    fn test_optional_filter() {
        assert_eq!(optional_filter::<Role>(Some("admin")), Some(Role::Admin));
        assert_eq!(optional_filter::<Role>(Some("root")), None);
        assert_eq!(optional_filter::<Role>(Some("")), None);
        assert_eq!(
            optional_filter::<WatchStatus>(Some("on-hold")),
            Some(WatchStatus::OnHold)
        );
    }
}
