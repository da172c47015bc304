//! Integration tests for threaded communications.

mod common;

use affdesk_core::auth::{Actor, UserRole as CoreRole};
use affdesk_core::communication::{MAX_REPLY_DEPTH, ThreadError, build_thread};
use affdesk_db::entities::sea_orm_active_enums::{ContextType, UserRole};
use affdesk_db::repositories::{
    BizdevRepository, CommunicationError, CommunicationRepository, CreateBizdevInput,
    CreateMessageInput, FlowRepository,
};

fn message(
    context_type: ContextType,
    context_id: uuid::Uuid,
    author_id: uuid::Uuid,
    parent_id: Option<uuid::Uuid>,
    body: &str,
) -> CreateMessageInput {
    CreateMessageInput {
        context_type,
        context_id,
        parent_id,
        author_id,
        message: body.to_string(),
    }
}

#[tokio::test]
#[ignore = "requires a migrated Postgres at DATABASE_URL"]
async fn test_thread_nests_replies() {
    let db = common::connect().await;
    let (flow, owner) = common::spend_flow(&db).await;
    let repo = CommunicationRepository::new(db.clone());

    let root = repo
        .create(message(ContextType::Flow, flow.id, owner.id, None, "  first  "))
        .await
        .expect("root");
    assert_eq!(root.message, "first");

    repo.create(message(ContextType::Flow, flow.id, owner.id, Some(root.id), "reply"))
        .await
        .expect("reply");

    let thread = build_thread(repo.thread(ContextType::Flow, flow.id).await.expect("thread"));
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].replies.len(), 1);
    assert_eq!(thread[0].message.author_name, owner.full_name);
}

#[tokio::test]
#[ignore = "requires a migrated Postgres at DATABASE_URL"]
async fn test_parent_from_other_context_rejected() {
    let db = common::connect().await;
    let (flow, owner) = common::spend_flow(&db).await;
    let request = BizdevRepository::new(db.clone())
        .create(CreateBizdevInput {
            title: common::unique("request"),
            description: None,
            brand_id: None,
            geo_id: None,
            assignee_id: None,
            created_by: owner.id,
        })
        .await
        .expect("bizdev request");
    let repo = CommunicationRepository::new(db.clone());

    let on_flow = repo
        .create(message(ContextType::Flow, flow.id, owner.id, None, "flow note"))
        .await
        .expect("flow message");
    let result = repo
        .create(message(
            ContextType::BizdevRequest,
            request.id,
            owner.id,
            Some(on_flow.id),
            "cross reply",
        ))
        .await;

    assert!(matches!(
        result,
        Err(CommunicationError::Thread(ThreadError::ParentInOtherContext))
    ));
}

#[tokio::test]
#[ignore = "requires a migrated Postgres at DATABASE_URL"]
async fn test_reply_below_depth_limit_rejected() {
    let db = common::connect().await;
    let (flow, owner) = common::spend_flow(&db).await;
    let repo = CommunicationRepository::new(db.clone());

    let mut parent = None;
    for level in 0..=MAX_REPLY_DEPTH {
        let body = format!("level {level}");
        let posted = repo
            .create(message(ContextType::Flow, flow.id, owner.id, parent, &body))
            .await
            .expect("reply within limit");
        parent = Some(posted.id);
    }

    let result = repo
        .create(message(ContextType::Flow, flow.id, owner.id, parent, "too deep"))
        .await;
    assert!(matches!(
        result,
        Err(CommunicationError::Thread(ThreadError::TooDeep))
    ));
}

#[tokio::test]
#[ignore = "requires a migrated Postgres at DATABASE_URL"]
async fn test_edit_by_author_only_and_flow_delete_cleans_up() {
    let db = common::connect().await;
    let (flow, owner) = common::spend_flow(&db).await;
    let other = common::user(&db, UserRole::Buyer, None).await;
    let repo = CommunicationRepository::new(db.clone());

    let posted = repo
        .create(message(ContextType::Flow, flow.id, owner.id, None, "draft"))
        .await
        .expect("post");

    let stranger = Actor::new(other.id, CoreRole::Buyer, None);
    let denied = repo.update_message(posted.id, &stranger, "hijack").await;
    assert!(matches!(
        denied,
        Err(CommunicationError::Thread(ThreadError::NotAuthor))
    ));

    let author = Actor::new(owner.id, CoreRole::Buyer, None);
    let edited = repo
        .update_message(posted.id, &author, "final")
        .await
        .expect("edit");
    assert!(edited.is_edited);

    FlowRepository::new(db.clone())
        .delete(flow.id)
        .await
        .expect("delete flow");
    assert!(matches!(
        repo.get(posted.id).await,
        Err(CommunicationError::NotFound(_))
    ));
}
