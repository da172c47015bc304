//! Integration tests for salary and partner payment status changes.

mod common;

use rust_decimal_macros::dec;

use affdesk_core::workflow::WorkflowError;
use affdesk_db::entities::sea_orm_active_enums::{PaymentStatus, SalaryStatus, UserRole};
use affdesk_db::repositories::{
    CreatePaymentInput, CreateSalaryInput, PaymentError, PaymentRepository, SalaryError,
    SalaryRepository, UpdateSalaryInput,
};

fn salary_input(user_id: uuid::Uuid, created_by: uuid::Uuid) -> CreateSalaryInput {
    CreateSalaryInput {
        user_id,
        period_year: 2026,
        period_month: 3,
        base_amount: dec!(1500.00),
        bonus_amount: dec!(250.00),
        currency: "USD".to_string(),
        comment: None,
        created_by,
    }
}

#[tokio::test]
#[ignore = "requires a migrated Postgres at DATABASE_URL"]
async fn test_salary_lifecycle() {
    let db = common::connect().await;
    let employee = common::user(&db, UserRole::Buyer, None).await;
    let finance = common::user(&db, UserRole::Finance, None).await;
    let repo = SalaryRepository::new(db.clone());

    let salary = repo
        .create(salary_input(employee.id, finance.id))
        .await
        .expect("create salary");
    assert_eq!(salary.status, SalaryStatus::Pending);

    let approved = repo.approve(salary.id, finance.id).await.expect("approve");
    assert_eq!(approved.status, SalaryStatus::Approved);
    assert_eq!(approved.reviewed_by, Some(finance.id));

    let edit = repo
        .update(
            salary.id,
            UpdateSalaryInput {
                bonus_amount: Some(dec!(300)),
                ..UpdateSalaryInput::default()
            },
        )
        .await;
    assert!(matches!(
        edit,
        Err(SalaryError::Workflow(WorkflowError::NotModifiable { .. }))
    ));

    let paid = repo.pay(salary.id).await.expect("pay");
    assert_eq!(paid.status, SalaryStatus::Paid);
    assert!(paid.paid_at.is_some());

    let reject = repo.reject(salary.id, finance.id, "too late").await;
    assert!(matches!(
        reject,
        Err(SalaryError::Workflow(WorkflowError::InvalidTransition { .. }))
    ));
}

#[tokio::test]
#[ignore = "requires a migrated Postgres at DATABASE_URL"]
async fn test_salary_unique_per_period() {
    let db = common::connect().await;
    let employee = common::user(&db, UserRole::Buyer, None).await;
    let repo = SalaryRepository::new(db.clone());

    repo.create(salary_input(employee.id, employee.id))
        .await
        .expect("first salary");
    let duplicate = repo.create(salary_input(employee.id, employee.id)).await;

    assert!(matches!(
        duplicate,
        Err(SalaryError::DuplicatePeriod { year: 2026, month: 3 })
    ));
}

#[tokio::test]
#[ignore = "requires a migrated Postgres at DATABASE_URL"]
async fn test_payment_transitions() {
    let db = common::connect().await;
    let author = common::user(&db, UserRole::Finance, None).await;
    let brand = common::brand(&db).await;
    let repo = PaymentRepository::new(db.clone());

    let payment = repo
        .create(CreatePaymentInput {
            brand_id: brand.id,
            flow_id: None,
            payment_method_id: None,
            amount: dec!(1200.00),
            currency: "USDT".to_string(),
            reference: None,
            period_from: None,
            period_to: None,
            comment: None,
            created_by: author.id,
        })
        .await
        .expect("create payment");

    let processing = repo
        .change_status(payment.id, PaymentStatus::Processing, None)
        .await
        .expect("to processing");
    assert!(processing.status_changed_at >= payment.status_changed_at);

    let completed = repo
        .change_status(payment.id, PaymentStatus::Completed, Some("wired".to_string()))
        .await
        .expect("to completed");
    assert_eq!(completed.comment.as_deref(), Some("wired"));

    let back = repo
        .change_status(payment.id, PaymentStatus::Pending, None)
        .await;
    assert!(matches!(back, Err(PaymentError::Workflow(_))));

    let delete = repo.delete(payment.id).await;
    assert!(matches!(delete, Err(PaymentError::Workflow(_))));
}
