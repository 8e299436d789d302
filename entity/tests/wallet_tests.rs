/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Tests for wallet entity

use chrono::NaiveDate;
use entity::*;
use sea_orm::{DatabaseBackend, MockDatabase, entity::prelude::*};
use uuid::Uuid;

#[tokio::test]
async fn test_wallet_entity() -> Result<(), DbErr> {
    let wallet_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let naive_date = NaiveDate::from_ymd_opt(2026, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![wallet::Model {
            id: wallet_id,
            user: user_id,
            daily_builds_limit: 5,
            daily_builds_used: 2,
            daily_builds_reset_at: "2026-01-01".to_owned(),
            file_retention_days: 7,
            created_at: naive_date,
            updated_at: naive_date,
        }]])
        .into_connection();

    let wallet = wallet::Entity::find_by_id(wallet_id).one(&db).await?;

    assert!(wallet.is_some());
    let wallet = wallet.unwrap();
    assert_eq!(wallet.user, user_id);
    assert!(wallet.daily_builds_used <= wallet.daily_builds_limit);

    Ok(())
}
