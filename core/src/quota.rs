/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Daily build quota ledger. The reset marker is a date string compared
//! against "today"; a stale marker means the counter reads as zero until
//! the next write (lazy reset, no scheduled job). Updates are single-row
//! last-write-wins.

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
};
use tracing::{error, warn};
use uuid::Uuid;

use super::consts::*;
use super::types::*;

#[derive(Debug, Clone, Copy)]
pub struct QuotaCheck {
    pub allowed: bool,
    pub remaining: i32,
    pub limit: i32,
}

pub fn today_string() -> String {
    Local::now().format(QUOTA_DATE_FORMAT).to_string()
}

fn effective_used(wallet: &MWallet, today: &str) -> i32 {
    if wallet.daily_builds_reset_at == today {
        wallet.daily_builds_used
    } else {
        0
    }
}

async fn get_or_create_wallet(db: &DatabaseConnection, user_id: Uuid) -> Result<MWallet> {
    let wallet = EWallet::find()
        .filter(CWallet::User.eq(user_id))
        .one(db)
        .await
        .context("Failed to query wallet")?;

    if let Some(wallet) = wallet {
        return Ok(wallet);
    }

    let now = Utc::now().naive_utc();
    let awallet = AWallet {
        id: Set(Uuid::new_v4()),
        user: Set(user_id),
        daily_builds_limit: Set(DEFAULT_DAILY_BUILDS),
        daily_builds_used: Set(0),
        daily_builds_reset_at: Set(today_string()),
        file_retention_days: Set(DEFAULT_RETENTION_DAYS),
        created_at: Set(now),
        updated_at: Set(now),
    };

    awallet.insert(db).await.context("Failed to create wallet")
}

pub async fn check_daily_quota(
    db: &DatabaseConnection,
    user_id: Uuid,
    count: i32,
) -> Result<QuotaCheck> {
    let wallet = get_or_create_wallet(db, user_id).await?;
    let used = effective_used(&wallet, &today_string());
    let remaining = (wallet.daily_builds_limit - used).max(0);

    Ok(QuotaCheck {
        allowed: count <= remaining,
        remaining,
        limit: wallet.daily_builds_limit,
    })
}

/// Deducts `count` units. Returns false and leaves the ledger unchanged
/// when the deduction would exceed the daily limit.
pub async fn consume_daily_quota(
    db: &DatabaseConnection,
    user_id: Uuid,
    count: i32,
) -> Result<bool> {
    let wallet = get_or_create_wallet(db, user_id).await?;
    let today = today_string();
    let used = effective_used(&wallet, &today);

    if used + count > wallet.daily_builds_limit {
        return Ok(false);
    }

    let mut awallet = wallet.into_active_model();
    awallet.daily_builds_used = Set(used + count);
    awallet.daily_builds_reset_at = Set(today);
    awallet.updated_at = Set(Utc::now().naive_utc());
    awallet
        .update(db)
        .await
        .context("Failed to update wallet")?;

    Ok(true)
}

/// Returns `count` units to the ledger, saturating at zero. Best-effort:
/// failures are logged and never propagated into the caller's error
/// path (a refund must not fail the failure handling it is part of).
pub async fn refund_daily_quota(db: &DatabaseConnection, user_id: Uuid, count: i32) {
    let wallet = match EWallet::find()
        .filter(CWallet::User.eq(user_id))
        .one(db)
        .await
    {
        Ok(Some(wallet)) => wallet,
        Ok(None) => {
            warn!(user = %user_id, "No wallet to refund quota to");
            return;
        }
        Err(e) => {
            error!(error = %e, user = %user_id, "Failed to query wallet for refund");
            return;
        }
    };

    let today = today_string();
    let used = effective_used(&wallet, &today);

    let mut awallet = wallet.into_active_model();
    awallet.daily_builds_used = Set((used - count).max(0));
    awallet.daily_builds_reset_at = Set(today);
    awallet.updated_at = Set(Utc::now().naive_utc());

    if let Err(e) = awallet.update(db).await {
        error!(error = %e, user = %user_id, "Failed to refund daily quota");
    }
}

/// Plan-derived retention window, fixed into `expires_at` at submission.
pub async fn retention_days(db: &DatabaseConnection, user_id: Uuid) -> Result<i32> {
    Ok(get_or_create_wallet(db, user_id).await?.file_retention_days)
}
