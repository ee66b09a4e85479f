use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

/// JWT claims embedded in both access and refresh tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user ID as a UUID string.
    pub sub: String,
    /// Email of the user at issue time.
    pub email: String,
    /// Token type: `"access"` or `"refresh"`.
    pub token_type: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued-at time (Unix timestamp).
    pub iat: i64,
    /// Unique JWT identifier.
    pub jti: String,
}

/// A pair of access and refresh tokens returned on login and refresh.
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiration of the refresh token, persisted alongside it in the database.
    pub refresh_expires_at: chrono::DateTime<Utc>,
}

/// Generate a new access + refresh token pair for the given user.
///
/// The two tokens are signed with separate secrets so a leaked refresh secret
/// cannot mint access tokens and vice versa.
///
/// # Errors
///
/// Returns an error if JWT encoding fails.
pub fn generate_token_pair(
    user_id: Uuid,
    email: &str,
    config: &Config,
) -> anyhow::Result<TokenPair> {
    let now = Utc::now();

    #[allow(clippy::cast_possible_wrap)]
    let access_exp = now.timestamp() + config.jwt_access_ttl_secs as i64;
    #[allow(clippy::cast_possible_wrap)]
    let refresh_exp = now.timestamp() + config.jwt_refresh_ttl_secs as i64;

    let access_claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        token_type: "access".to_string(),
        exp: access_exp,
        iat: now.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    let refresh_claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        token_type: "refresh".to_string(),
        exp: refresh_exp,
        iat: now.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    let access_token = encode(
        &Header::default(),
        &access_claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| anyhow::anyhow!("Failed to encode access token: {e}"))?;

    let refresh_token = encode(
        &Header::default(),
        &refresh_claims,
        &EncodingKey::from_secret(config.jwt_refresh_secret.as_bytes()),
    )
    .map_err(|e| anyhow::anyhow!("Failed to encode refresh token: {e}"))?;

    let refresh_expires_at =
        chrono::DateTime::from_timestamp(refresh_exp, 0).unwrap_or_else(Utc::now);

    Ok(TokenPair {
        access_token,
        refresh_token,
        refresh_expires_at,
    })
}

/// Validate an access token and return its claims.
///
/// # Errors
///
/// Returns an error if the token is invalid, expired, or not an access token.
pub fn validate_access_token(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &key, &validation)
        .map_err(|e| anyhow::anyhow!("Invalid access token: {e}"))?;

    if token_data.claims.token_type != "access" {
        return Err(anyhow::anyhow!("Token is not an access token"));
    }

    Ok(token_data.claims)
}

/// Validate a refresh token signature and return its claims.
///
/// This checks the JWT only; the caller is responsible for checking the
/// persisted token row.
///
/// # Errors
///
/// Returns an error if the token is invalid, expired, or not a refresh token.
pub fn validate_refresh_token(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &key, &validation)
        .map_err(|e| anyhow::anyhow!("Invalid refresh token: {e}"))?;

    if token_data.claims.token_type != "refresh" {
        return Err(anyhow::anyhow!("Token is not a refresh token"));
    }

    Ok(token_data.claims)
}

/// Generate a short-lived JWT for OAuth CSRF state (30 minutes).
///
/// # Errors
///
/// Returns an error if JWT encoding fails.
pub fn generate_oauth_state(secret: &str, redirect_uri: Option<&str>) -> anyhow::Result<String> {
    let now = Utc::now();
    let csrf = Uuid::new_v4().to_string();

    let claims = OAuthStateClaims {
        csrf,
        redirect_uri: redirect_uri.map(String::from),
        exp: now.timestamp() + 1800, // 30 minutes
        iat: now.timestamp(),
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key)
        .map_err(|e| anyhow::anyhow!("Failed to encode OAuth state: {e}"))
}

/// Validate an OAuth CSRF state token.
///
/// # Errors
///
/// Returns an error if the state token is invalid or expired.
pub fn validate_oauth_state(state: &str, secret: &str) -> anyhow::Result<OAuthStateClaims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<OAuthStateClaims>(state, &key, &validation)
        .map_err(|e| anyhow::anyhow!("Invalid OAuth state: {e}"))?;

    Ok(token_data.claims)
}

/// Claims for OAuth CSRF state tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct OAuthStateClaims {
    pub csrf: String,
    pub redirect_uri: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use std::net::IpAddr;

    fn test_config() -> Config {
        Config {
            database_url: String::new(),
            server_host: IpAddr::from([127, 0, 0, 1]),
            server_port: 0,
            environment: Environment::Development,
            log_level: "warn".to_string(),
            jwt_secret: "access-secret-for-tests-32-characters".to_string(),
            jwt_refresh_secret: "refresh-secret-for-tests-32-chars".to_string(),
            jwt_access_ttl_secs: 900,
            jwt_refresh_ttl_secs: 604_800,
            google_client_id: String::new(),
            google_client_secret: String::new(),
            google_redirect_uri: String::new(),
            github_client_id: String::new(),
            github_client_secret: String::new(),
            github_redirect_uri: String::new(),
            frontend_url: String::new(),
            stripe_secret_key: String::new(),
            stripe_webhook_secret: String::new(),
            stripe_price_id: String::new(),
            ai_provider: "openai".to_string(),
            openai_api_key: String::new(),
            anthropic_api_key: String::new(),
            upload_dir: "test_uploads".to_string(),
        }
    }

    #[test]
    fn token_pair_round_trip() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let pair = generate_token_pair(user_id, "a@b.com", &config).unwrap();

        let access = validate_access_token(&pair.access_token, &config.jwt_secret).unwrap();
        assert_eq!(access.sub, user_id.to_string());
        assert_eq!(access.email, "a@b.com");
        assert_eq!(access.token_type, "access");

        let refresh =
            validate_refresh_token(&pair.refresh_token, &config.jwt_refresh_secret).unwrap();
        assert_eq!(refresh.token_type, "refresh");
    }

    #[test]
    fn secrets_are_not_interchangeable() {
        let config = test_config();
        let pair = generate_token_pair(Uuid::new_v4(), "a@b.com", &config).unwrap();

        assert!(validate_access_token(&pair.access_token, &config.jwt_refresh_secret).is_err());
        assert!(validate_refresh_token(&pair.refresh_token, &config.jwt_secret).is_err());
        // A refresh token never passes access validation even with the right secret
        assert!(validate_access_token(&pair.refresh_token, &config.jwt_secret).is_err());
    }

    #[test]
    fn oauth_state_round_trip() {
        let state = generate_oauth_state("secret", Some("https://app.example/cb")).unwrap();
        let claims = validate_oauth_state(&state, "secret").unwrap();
        assert_eq!(
            claims.redirect_uri.as_deref(),
            Some("https://app.example/cb")
        );
        assert!(validate_oauth_state(&state, "wrong").is_err());
    }
}
