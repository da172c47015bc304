//! Integration tests for the user repository.

mod common;

use affdesk_db::UserRepository;
use affdesk_db::entities::sea_orm_active_enums::UserRole;
use affdesk_db::repositories::{CreateUserInput, UserError, UserFilter};
use affdesk_shared::types::PageRequest;

#[tokio::test]
#[ignore = "requires a migrated Postgres at DATABASE_URL"]
async fn test_user_create_and_find_by_email() {
    let db = common::connect().await;
    let repo = UserRepository::new(db.clone());

    let user = common::user(&db, UserRole::Buyer, None).await;
    assert!(user.is_active);

    let found = repo
        .find_by_email(&user.email.to_uppercase())
        .await
        .expect("Failed to find user")
        .expect("User should exist");
    assert_eq!(found.id, user.id);
}

#[tokio::test]
#[ignore = "requires a migrated Postgres at DATABASE_URL"]
async fn test_duplicate_email_rejected() {
    let db = common::connect().await;
    let repo = UserRepository::new(db.clone());
    let user = common::user(&db, UserRole::Buyer, None).await;

    let result = repo
        .create(CreateUserInput {
            email: user.email.clone(),
            password_hash: "$argon2id$other".to_string(),
            full_name: "Someone Else".to_string(),
            role: UserRole::Finance,
            team_id: None,
            department_id: None,
            telegram: None,
        })
        .await;

    assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
}

#[tokio::test]
#[ignore = "requires a migrated Postgres at DATABASE_URL"]
async fn test_deactivate_keeps_row() {
    let db = common::connect().await;
    let repo = UserRepository::new(db.clone());
    let user = common::user(&db, UserRole::Buyer, None).await;

    let deactivated = repo.deactivate(user.id).await.expect("Failed to deactivate");
    assert!(!deactivated.is_active);

    let page = repo
        .list(
            UserFilter {
                is_active: Some(false),
                search: Some(user.email.clone()),
                ..UserFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .expect("Failed to list users");
    assert_eq!(page.meta.total, 1);
    assert_eq!(page.items[0].id, user.id);
}
