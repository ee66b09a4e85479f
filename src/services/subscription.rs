use std::time::Instant;

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use uuid::Uuid;

use crate::entities::subscription;
use crate::services::pro_cache::ProCache;
use crate::state::AppState;

/// Fields applied when creating or updating a subscription from Stripe data.
#[derive(Debug, Clone)]
pub struct SubscriptionUpdate {
    pub stripe_subscription_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub status: String,
    pub plan: String,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
}

/// Return the user's newest active subscription, lazily expiring it.
///
/// If the active row's period end has passed, its status is persisted as
/// `"expired"` and `None` is returned.
///
/// # Errors
///
/// Returns an error on a database failure.
pub async fn get_active_subscription(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> anyhow::Result<Option<subscription::Model>> {
    let found = subscription::Entity::find()
        .filter(subscription::Column::UserId.eq(user_id))
        .filter(subscription::Column::Status.eq("active"))
        .order_by_desc(subscription::Column::CreatedAt)
        .one(db)
        .await?;

    let Some(sub) = found else {
        return Ok(None);
    };

    if let Some(period_end) = sub.current_period_end
        && period_end < Utc::now().fixed_offset()
    {
        let mut active: subscription::ActiveModel = sub.into();
        active.status = Set("expired".to_string());
        active.updated_at = Set(Utc::now().fixed_offset());
        active.update(db).await?;
        return Ok(None);
    }

    Ok(Some(sub))
}

/// Cached entitlement check used by the Pro gate.
///
/// # Errors
///
/// Returns an error on a database failure.
pub async fn has_active_subscription(state: &AppState, user_id: Uuid) -> anyhow::Result<bool> {
    let now = Instant::now();
    if let Some(cached) = state.pro_cache.get(user_id, now) {
        return Ok(cached);
    }

    let has_pro = get_active_subscription(&state.db, user_id).await?.is_some();
    state.pro_cache.insert(user_id, has_pro, now);
    Ok(has_pro)
}

/// Create or update the user's subscription from Stripe data.
///
/// Upserts by `stripe_subscription_id` when the incoming update is for a row
/// we already track. Otherwise, any prior active rows are canceled and the new
/// row inserted inside one transaction, preserving the at-most-one-active
/// invariant. Safe to re-apply: the webhook provider delivers at least once.
///
/// # Errors
///
/// Returns an error on a database failure.
pub async fn create_subscription(
    db: &DatabaseConnection,
    cache: &ProCache,
    user_id: Uuid,
    update: SubscriptionUpdate,
) -> anyhow::Result<subscription::Model> {
    let now = Utc::now().fixed_offset();

    let existing = match &update.stripe_subscription_id {
        Some(stripe_id) => {
            subscription::Entity::find()
                .filter(subscription::Column::StripeSubscriptionId.eq(stripe_id))
                .one(db)
                .await?
        }
        None => None,
    };

    let model = if let Some(found) = existing {
        let mut active: subscription::ActiveModel = found.into();
        active.status = Set(update.status);
        active.plan = Set(update.plan);
        active.stripe_customer_id = Set(update.stripe_customer_id);
        active.current_period_start = Set(update.current_period_start.map(|t| t.fixed_offset()));
        active.current_period_end = Set(update.current_period_end.map(|t| t.fixed_offset()));
        active.cancel_at_period_end = Set(update.cancel_at_period_end);
        active.updated_at = Set(now);
        active.update(db).await?
    } else {
        let txn = db.begin().await?;

        let priors = subscription::Entity::find()
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(subscription::Column::Status.eq("active"))
            .all(&txn)
            .await?;
        for prior in priors {
            let mut active: subscription::ActiveModel = prior.into();
            active.status = Set("canceled".to_string());
            active.updated_at = Set(now);
            active.update(&txn).await?;
        }

        let new_sub = subscription::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            stripe_subscription_id: Set(update.stripe_subscription_id),
            stripe_customer_id: Set(update.stripe_customer_id),
            status: Set(update.status),
            plan: Set(update.plan),
            current_period_start: Set(update.current_period_start.map(|t| t.fixed_offset())),
            current_period_end: Set(update.current_period_end.map(|t| t.fixed_offset())),
            cancel_at_period_end: Set(update.cancel_at_period_end),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = new_sub.insert(&txn).await?;
        txn.commit().await?;
        model
    };

    cache.invalidate(user_id);
    Ok(model)
}

/// Find the local row tracking a Stripe subscription.
///
/// # Errors
///
/// Returns an error on a database failure.
pub async fn find_by_stripe_id(
    db: &DatabaseConnection,
    stripe_subscription_id: &str,
) -> anyhow::Result<Option<subscription::Model>> {
    Ok(subscription::Entity::find()
        .filter(subscription::Column::StripeSubscriptionId.eq(stripe_subscription_id))
        .one(db)
        .await?)
}

/// Set the status of the row tracking a Stripe subscription.
///
/// Used by the webhook for `deleted` (canceled) and `payment_failed`
/// (past_due) events. A missing row is logged and ignored.
///
/// # Errors
///
/// Returns an error on a database failure.
pub async fn mark_status_by_stripe_id(
    db: &DatabaseConnection,
    cache: &ProCache,
    stripe_subscription_id: &str,
    status: &str,
) -> anyhow::Result<()> {
    let Some(sub) = find_by_stripe_id(db, stripe_subscription_id).await? else {
        tracing::warn!(
            stripe_subscription_id,
            status,
            "No local subscription for Stripe event"
        );
        return Ok(());
    };

    let user_id = sub.user_id;
    let mut active: subscription::ActiveModel = sub.into();
    active.status = Set(status.to_string());
    active.updated_at = Set(Utc::now().fixed_offset());
    active.update(db).await?;

    cache.invalidate(user_id);
    Ok(())
}

/// Cancel the user's active subscription.
///
/// With `immediately` the row is marked canceled right away; otherwise
/// `cancel_at_period_end` is set and the subscription stays active until the
/// period lapses.
///
/// # Errors
///
/// Returns an error on a database failure.
pub async fn cancel_subscription(
    db: &DatabaseConnection,
    cache: &ProCache,
    user_id: Uuid,
    immediately: bool,
) -> anyhow::Result<Option<subscription::Model>> {
    let Some(sub) = get_active_subscription(db, user_id).await? else {
        return Ok(None);
    };

    let mut active: subscription::ActiveModel = sub.into();
    if immediately {
        active.status = Set("canceled".to_string());
    } else {
        active.cancel_at_period_end = Set(true);
    }
    active.updated_at = Set(Utc::now().fixed_offset());
    let model = active.update(db).await?;

    cache.invalidate(user_id);
    Ok(Some(model))
}
