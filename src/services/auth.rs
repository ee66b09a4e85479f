use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::auth::jwt::{self, Claims, TokenPair};
use crate::auth::oauth::OAuthProfile;
use crate::config::Config;
use crate::entities::{refresh_token, user};

/// Generate a token pair and persist the refresh token row.
///
/// # Errors
///
/// Returns an error if JWT encoding or the insert fails.
pub async fn issue_token_pair(
    db: &DatabaseConnection,
    config: &Config,
    user_model: &user::Model,
) -> anyhow::Result<TokenPair> {
    let pair = jwt::generate_token_pair(user_model.id, &user_model.email, config)?;

    let record = refresh_token::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_model.id),
        token: Set(pair.refresh_token.clone()),
        expires_at: Set(pair.refresh_expires_at.fixed_offset()),
        created_at: Set(Utc::now().fixed_offset()),
    };
    record.insert(db).await?;

    Ok(pair)
}

/// Verify a refresh token against both its signature and its persisted row.
///
/// Every failure mode (malformed token, wrong signature, JWT expiry, missing
/// row, stored expiry in the past) collapses to `None`; callers map that to a
/// single 401.
///
/// # Errors
///
/// Returns an error only on a database failure.
pub async fn verify_refresh_token(
    db: &DatabaseConnection,
    config: &Config,
    token: &str,
) -> anyhow::Result<Option<Claims>> {
    let Ok(claims) = jwt::validate_refresh_token(token, &config.jwt_refresh_secret) else {
        return Ok(None);
    };

    let record = refresh_token::Entity::find()
        .filter(refresh_token::Column::Token.eq(token))
        .one(db)
        .await?;

    match record {
        Some(row) if row.expires_at > Utc::now().fixed_offset() => Ok(Some(claims)),
        _ => Ok(None),
    }
}

/// Consume a refresh token: delete its row and report whether this caller won.
///
/// The token column is unique, so the delete affects at most one row. Two
/// concurrent refreshes with the same token race on this delete; exactly one
/// observes `true` and gets a new pair, the other observes `false` and is
/// rejected.
///
/// # Errors
///
/// Returns an error on a database failure.
pub async fn consume_refresh_token(db: &DatabaseConnection, token: &str) -> anyhow::Result<bool> {
    let result = refresh_token::Entity::delete_many()
        .filter(refresh_token::Column::Token.eq(token))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Revoke a refresh token (logout). Deleting an already-absent token is fine.
///
/// # Errors
///
/// Returns an error on a database failure.
pub async fn revoke_refresh_token(db: &DatabaseConnection, token: &str) -> anyhow::Result<()> {
    refresh_token::Entity::delete_many()
        .filter(refresh_token::Column::Token.eq(token))
        .exec(db)
        .await?;
    Ok(())
}

/// Find a user by email or create one from an OAuth profile.
///
/// Email is the natural key: logging in with a different provider that reports
/// the same email lands on the same account, and the profile fields
/// (name, avatar, provider, provider id) are overwritten with the latest
/// login's values.
///
/// # Errors
///
/// Returns an error on a database failure.
pub async fn find_or_create_user(
    db: &DatabaseConnection,
    profile: &OAuthProfile,
) -> anyhow::Result<user::Model> {
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&profile.email))
        .one(db)
        .await?;

    let now = Utc::now().fixed_offset();

    if let Some(found) = existing {
        let mut active: user::ActiveModel = found.into();
        active.name = Set(profile.name.clone());
        active.avatar_url = Set(profile.avatar_url.clone());
        active.provider = Set(profile.provider.clone());
        active.provider_id = Set(Some(profile.provider_id.clone()));
        active.updated_at = Set(now);
        return Ok(active.update(db).await?);
    }

    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(profile.email.clone()),
        name: Set(profile.name.clone()),
        avatar_url: Set(profile.avatar_url.clone()),
        provider: Set(profile.provider.clone()),
        provider_id: Set(Some(profile.provider_id.clone())),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(new_user.insert(db).await?)
}
