use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use crate::error::ApiError;
use crate::settings::Settings;

/// Checks the admin token, taken from the bearer header or the `token`
/// query parameter.
///
/// One token guards every organisation route and the schedule preview; the
/// organisation in the path is not part of the check.
pub fn verify_token(
    settings: &Settings,
    auth: Option<Authorization<Bearer>>,
    query_token: Option<&str>,
) -> Result<(), ApiError> {
    let provided_token = auth
        .map(|a| a.token().to_string())
        .or_else(|| query_token.map(|s| s.to_string()));
    match provided_token {
        Some(token) if token == settings.auth_token => Ok(()),
        _ => Err(ApiError::Unauthorized(
            "Invalid authentication token".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            debug: false,
            auth_token: "secret".to_string(),
            enable_swagger: true,
            port: 8080,
            timezone: chrono_tz::Tz::UTC,
            calendar_name: "Studio".to_string(),
        }
    }

    #[test]
    fn test_verify_token_header() {
        let auth = Authorization::bearer("secret").unwrap();
        assert!(verify_token(&settings(), Some(auth), None).is_ok());

        let auth = Authorization::bearer("wrong").unwrap();
        assert!(verify_token(&settings(), Some(auth), Some("secret")).is_err());
    }

    #[test]
    fn test_verify_token_query() {
        assert!(verify_token(&settings(), None, Some("secret")).is_ok());
        assert!(verify_token(&settings(), None, Some("bad")).is_err());
        assert!(verify_token(&settings(), None, None).is_err());
    }
}
