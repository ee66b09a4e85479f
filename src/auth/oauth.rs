use oauth2::basic::{BasicErrorResponseType, BasicTokenType};
use oauth2::{
    AuthUrl, Client, ClientId, ClientSecret, EmptyExtraTokenFields, EndpointNotSet, EndpointSet,
    RedirectUrl, RevocationErrorResponseType, StandardErrorResponse, StandardRevocableToken,
    StandardTokenIntrospectionResponse, StandardTokenResponse, TokenUrl,
};
use serde::Deserialize;

use crate::config::Config;

/// Fully configured `OAuth2` client type (auth URI, token URI, and redirect URI all set).
pub type ConfiguredClient = Client<
    StandardErrorResponse<BasicErrorResponseType>,
    StandardTokenResponse<EmptyExtraTokenFields, BasicTokenType>,
    StandardTokenIntrospectionResponse<EmptyExtraTokenFields, BasicTokenType>,
    StandardRevocableToken,
    StandardErrorResponse<RevocationErrorResponseType>,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Provider-agnostic profile used by `find_or_create_user`.
#[derive(Debug)]
pub struct OAuthProfile {
    /// `"google"` or `"github"`.
    pub provider: String,
    pub provider_id: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Build an `OAuth2` client for Google.
///
/// # Errors
///
/// Returns an error if the OAuth URLs are malformed.
pub fn google_client(config: &Config) -> anyhow::Result<ConfiguredClient> {
    let client = Client::new(ClientId::new(config.google_client_id.clone()))
        .set_client_secret(ClientSecret::new(config.google_client_secret.clone()))
        .set_auth_uri(AuthUrl::new(
            "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
        )?)
        .set_token_uri(TokenUrl::new(
            "https://oauth2.googleapis.com/token".to_string(),
        )?)
        .set_redirect_uri(RedirectUrl::new(config.google_redirect_uri.clone())?);
    Ok(client)
}

/// Build an `OAuth2` client for `GitHub`.
///
/// # Errors
///
/// Returns an error if the OAuth URLs are malformed.
pub fn github_client(config: &Config) -> anyhow::Result<ConfiguredClient> {
    let client = Client::new(ClientId::new(config.github_client_id.clone()))
        .set_client_secret(ClientSecret::new(config.github_client_secret.clone()))
        .set_auth_uri(AuthUrl::new(
            "https://github.com/login/oauth/authorize".to_string(),
        )?)
        .set_token_uri(TokenUrl::new(
            "https://github.com/login/oauth/access_token".to_string(),
        )?)
        .set_redirect_uri(RedirectUrl::new(config.github_redirect_uri.clone())?);
    Ok(client)
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: String,
    name: Option<String>,
    picture: Option<String>,
}

/// Fetch a normalized profile from Google's userinfo endpoint.
///
/// # Errors
///
/// Returns an error if the HTTP request fails or the response is malformed.
pub async fn fetch_google_profile(access_token: &str) -> anyhow::Result<OAuthProfile> {
    let client = reqwest::Client::new();
    let resp = client
        .get("https://www.googleapis.com/oauth2/v3/userinfo")
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to fetch Google userinfo: {e}"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow::anyhow!(
            "Google userinfo request failed ({status}): {body}"
        ));
    }

    let info: GoogleUserInfo = resp
        .json()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to parse Google userinfo: {e}"))?;

    Ok(OAuthProfile {
        provider: "google".to_string(),
        provider_id: info.sub,
        email: info.email,
        name: info.name,
        avatar_url: info.picture,
    })
}

#[derive(Debug, Deserialize)]
struct GitHubUserInfo {
    id: i64,
    email: Option<String>,
    name: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

/// Fetch a normalized profile from `GitHub`'s API.
///
/// `GitHub` hides the email for many accounts, so this falls back to the
/// `/user/emails` endpoint for the primary verified address.
///
/// # Errors
///
/// Returns an error if an HTTP request fails or no usable email is found.
pub async fn fetch_github_profile(access_token: &str) -> anyhow::Result<OAuthProfile> {
    let client = reqwest::Client::new();
    let resp = client
        .get("https://api.github.com/user")
        .bearer_auth(access_token)
        .header("User-Agent", "Momentum-API")
        .header("Accept", "application/vnd.github+json")
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to fetch GitHub userinfo: {e}"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow::anyhow!(
            "GitHub userinfo request failed ({status}): {body}"
        ));
    }

    let info: GitHubUserInfo = resp
        .json()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to parse GitHub userinfo: {e}"))?;

    let email = match info.email {
        Some(email) => email,
        None => fetch_github_primary_email(access_token).await?,
    };

    Ok(OAuthProfile {
        provider: "github".to_string(),
        provider_id: info.id.to_string(),
        email,
        name: info.name,
        avatar_url: info.avatar_url,
    })
}

/// Fetch the primary verified email from `GitHub`'s `/user/emails` endpoint.
async fn fetch_github_primary_email(access_token: &str) -> anyhow::Result<String> {
    let client = reqwest::Client::new();
    let resp = client
        .get("https://api.github.com/user/emails")
        .bearer_auth(access_token)
        .header("User-Agent", "Momentum-API")
        .header("Accept", "application/vnd.github+json")
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to fetch GitHub emails: {e}"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow::anyhow!(
            "GitHub emails request failed ({status}): {body}"
        ));
    }

    let emails: Vec<GitHubEmail> = resp
        .json()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to parse GitHub emails: {e}"))?;

    emails
        .into_iter()
        .find(|e| e.primary && e.verified)
        .map(|e| e.email)
        .ok_or_else(|| anyhow::anyhow!("No primary verified email found on GitHub account"))
}
