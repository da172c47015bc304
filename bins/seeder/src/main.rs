//! Database seeder for Affdesk development and testing.
//!
//! Seeds one user per role, an organization, directory entries and a CPA
//! flow with a week of statistics. Every record has a fixed id, so running
//! the seeder twice changes nothing.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{Days, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use affdesk_core::auth::hash_password;
use affdesk_core::flow::PercentageRange;
use affdesk_db::entities::{
    brands, departments, flow_stats, flow_users, flows, geos, payment_methods,
    sea_orm_active_enums::{FlowStatus, FlowType, KpiMetric, UserRole},
    teams, users,
};
use affdesk_shared::AppConfig;

const DEPARTMENT_ID: Uuid = Uuid::from_u128(0x10);
const TEAM_ID: Uuid = Uuid::from_u128(0x20);
const ADMIN_ID: Uuid = Uuid::from_u128(0x101);
const FINANCE_ID: Uuid = Uuid::from_u128(0x102);
const TEAMLEAD_ID: Uuid = Uuid::from_u128(0x103);
const BUYER_ID: Uuid = Uuid::from_u128(0x104);
const BIZDEV_ID: Uuid = Uuid::from_u128(0x105);
const BRAND_ID: Uuid = Uuid::from_u128(0x201);
const GEO_ID: Uuid = Uuid::from_u128(0x202);
const PAYMENT_METHOD_ID: Uuid = Uuid::from_u128(0x203);
const FLOW_ID: Uuid = Uuid::from_u128(0x301);

/// Password shared by every seeded account.
const SEED_PASSWORD: &str = "affdesk-dev";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;

    println!("Connecting to database...");
    let db = affdesk_db::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    println!("Seeding organization...");
    seed_organization(&db).await?;

    println!("Seeding users...");
    seed_users(&db).await?;

    println!("Seeding directory...");
    seed_directory(&db).await?;

    println!("Seeding flow...");
    seed_flow(&db).await?;

    println!("Seeding flow statistics...");
    seed_stats(&db).await?;

    println!("Seeding complete! Log in as admin@affdesk.dev / {SEED_PASSWORD}");
    Ok(())
}

fn now() -> sea_orm::prelude::DateTimeWithTimeZone {
    Utc::now().fixed_offset()
}

async fn seed_organization(db: &DatabaseConnection) -> anyhow::Result<()> {
    if departments::Entity::find_by_id(DEPARTMENT_ID).one(db).await?.is_none() {
        departments::ActiveModel {
            id: Set(DEPARTMENT_ID),
            name: Set("Media Buying".to_string()),
            description: Set(Some("Paid traffic teams".to_string())),
            created_at: Set(now()),
            updated_at: Set(now()),
        }
        .insert(db)
        .await?;
    } else {
        println!("  Department already exists, skipping...");
    }

    // The lead is attached once the user exists.
    if teams::Entity::find_by_id(TEAM_ID).one(db).await?.is_none() {
        teams::ActiveModel {
            id: Set(TEAM_ID),
            name: Set("Team Alpha".to_string()),
            department_id: Set(Some(DEPARTMENT_ID)),
            lead_id: Set(None),
            created_at: Set(now()),
            updated_at: Set(now()),
        }
        .insert(db)
        .await?;
    } else {
        println!("  Team already exists, skipping...");
    }
    Ok(())
}

async fn seed_users(db: &DatabaseConnection) -> anyhow::Result<()> {
    let password_hash = hash_password(SEED_PASSWORD)?;
    let seeds = [
        (ADMIN_ID, "admin", "Admin User", UserRole::Admin, None),
        (FINANCE_ID, "finance", "Finance User", UserRole::Finance, None),
        (TEAMLEAD_ID, "lead", "Team Lead", UserRole::TeamLead, Some(TEAM_ID)),
        (BUYER_ID, "buyer", "Media Buyer", UserRole::Buyer, Some(TEAM_ID)),
        (BIZDEV_ID, "bizdev", "Bizdev Manager", UserRole::BizDev, None),
    ];

    for (id, login, full_name, role, team_id) in seeds {
        if users::Entity::find_by_id(id).one(db).await?.is_some() {
            println!("  {login} already exists, skipping...");
            continue;
        }
        users::ActiveModel {
            id: Set(id),
            email: Set(format!("{login}@affdesk.dev")),
            password_hash: Set(password_hash.clone()),
            full_name: Set(full_name.to_string()),
            role: Set(role),
            team_id: Set(team_id),
            department_id: Set(team_id.map(|_| DEPARTMENT_ID)),
            telegram: Set(None),
            is_active: Set(true),
            created_at: Set(now()),
            updated_at: Set(now()),
        }
        .insert(db)
        .await?;
    }

    if let Some(team) = teams::Entity::find_by_id(TEAM_ID).one(db).await?
        && team.lead_id.is_none()
    {
        let mut team: teams::ActiveModel = team.into();
        team.lead_id = Set(Some(TEAMLEAD_ID));
        team.updated_at = Set(now());
        team.update(db).await?;
    }
    Ok(())
}

async fn seed_directory(db: &DatabaseConnection) -> anyhow::Result<()> {
    if brands::Entity::find_by_id(BRAND_ID).one(db).await?.is_none() {
        brands::ActiveModel {
            id: Set(BRAND_ID),
            name: Set("LuckySpin".to_string()),
            website: Set(Some("https://luckyspin.example".to_string())),
            is_active: Set(true),
            created_at: Set(now()),
            updated_at: Set(now()),
        }
        .insert(db)
        .await?;
    }

    if geos::Entity::find_by_id(GEO_ID).one(db).await?.is_none() {
        geos::ActiveModel {
            id: Set(GEO_ID),
            code: Set("BR".to_string()),
            name: Set("Brazil".to_string()),
            created_at: Set(now()),
            updated_at: Set(now()),
        }
        .insert(db)
        .await?;
    }

    if payment_methods::Entity::find_by_id(PAYMENT_METHOD_ID)
        .one(db)
        .await?
        .is_none()
    {
        payment_methods::ActiveModel {
            id: Set(PAYMENT_METHOD_ID),
            name: Set("USDT TRC20".to_string()),
            details: Set(None),
            is_active: Set(true),
            created_at: Set(now()),
            updated_at: Set(now()),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

async fn seed_flow(db: &DatabaseConnection) -> anyhow::Result<()> {
    if flows::Entity::find_by_id(FLOW_ID).one(db).await?.is_none() {
        let ranges = vec![
            PercentageRange {
                from: Decimal::ZERO,
                to: Some(dec!(80)),
                percent: dec!(5),
            },
            PercentageRange {
                from: dec!(80),
                to: Some(dec!(100)),
                percent: dec!(10),
            },
            PercentageRange {
                from: dec!(100),
                to: None,
                percent: dec!(15),
            },
        ];

        flows::ActiveModel {
            id: Set(FLOW_ID),
            name: Set("LuckySpin BR CPA".to_string()),
            brand_id: Set(BRAND_ID),
            geo_id: Set(GEO_ID),
            team_id: Set(Some(TEAM_ID)),
            owner_id: Set(TEAMLEAD_ID),
            flow_type: Set(FlowType::Cpa),
            status: Set(FlowStatus::Active),
            kpi_metric: Set(KpiMetric::Roi),
            kpi_target: Set(dec!(30)),
            percentage_ranges: Set(serde_json::to_value(ranges)?),
            cpa_rate: Set(Some(dec!(45))),
            currency: Set("USD".to_string()),
            start_date: Set(None),
            end_date: Set(None),
            description: Set(Some("Seeded demo flow".to_string())),
            created_at: Set(now()),
            updated_at: Set(now()),
        }
        .insert(db)
        .await?;
    }

    if flow_users::Entity::find_by_id((FLOW_ID, BUYER_ID))
        .one(db)
        .await?
        .is_none()
    {
        flow_users::ActiveModel {
            flow_id: Set(FLOW_ID),
            user_id: Set(BUYER_ID),
            created_at: Set(now()),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

async fn seed_stats(db: &DatabaseConnection) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();

    for offset in 1..=7_u32 {
        let Some(stat_date) = today.checked_sub_days(Days::new(u64::from(offset))) else {
            continue;
        };
        let exists = flow_stats::Entity::find()
            .filter(flow_stats::Column::FlowId.eq(FLOW_ID))
            .filter(flow_stats::Column::UserId.eq(BUYER_ID))
            .filter(flow_stats::Column::StatDate.eq(stat_date))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let step = i64::from(offset);
        let deposits = 8 + step;
        flow_stats::ActiveModel {
            id: Set(Uuid::now_v7()),
            flow_id: Set(FLOW_ID),
            user_id: Set(BUYER_ID),
            stat_date: Set(stat_date),
            spend: Set(dec!(300) + Decimal::from(step * 25)),
            revenue: Set(dec!(45) * Decimal::from(deposits)),
            installs: Set(400 + step * 30),
            registrations: Set(90 + step * 5),
            deposits: Set(deposits),
            redeposits: Set(step * 2),
            unique_redeposits: Set(step),
            notes: Set(None),
            created_at: Set(now()),
            updated_at: Set(now()),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}
