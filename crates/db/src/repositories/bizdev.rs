//! Bizdev request repository.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use affdesk_shared::AppError;
use affdesk_shared::types::{PageRequest, PageResponse};

use super::{db_error, ensure_exists};
use crate::entities::{
    bizdev_requests, brands, communications, geos,
    sea_orm_active_enums::{BizdevStatus, ContextType},
    users,
};

/// Error types for bizdev request operations.
#[derive(Debug, thiserror::Error)]
pub enum BizdevError {
    /// Request not found.
    #[error("Bizdev request not found: {0}")]
    NotFound(Uuid),

    /// A referenced record does not exist.
    #[error("{field} does not exist: {id}")]
    UnknownReference {
        /// Input field name.
        field: &'static str,
        /// Referenced id.
        id: Uuid,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<BizdevError> for AppError {
    fn from(err: BizdevError) -> Self {
        match err {
            BizdevError::NotFound(_) => Self::NotFound(err.to_string()),
            BizdevError::UnknownReference { field, .. } => Self::field(field, err.to_string()),
            BizdevError::Database(e) => db_error(e),
        }
    }
}

/// Input for opening a request.
#[derive(Debug, Clone)]
pub struct CreateBizdevInput {
    /// Title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Brand concerned.
    pub brand_id: Option<Uuid>,
    /// Geo concerned.
    pub geo_id: Option<Uuid>,
    /// Assignee.
    pub assignee_id: Option<Uuid>,
    /// Author.
    pub created_by: Uuid,
}

/// Input for updating a request.
#[derive(Debug, Clone, Default)]
pub struct UpdateBizdevInput {
    /// Title.
    pub title: Option<String>,
    /// Description.
    pub description: Option<Option<String>>,
    /// Brand.
    pub brand_id: Option<Option<Uuid>>,
    /// Geo.
    pub geo_id: Option<Option<Uuid>>,
    /// Status.
    pub status: Option<BizdevStatus>,
    /// Assignee.
    pub assignee_id: Option<Option<Uuid>>,
}

/// Filter options for listing requests.
#[derive(Debug, Clone, Default)]
pub struct BizdevFilter {
    /// Status.
    pub status: Option<BizdevStatus>,
    /// Brand.
    pub brand_id: Option<Uuid>,
    /// Geo.
    pub geo_id: Option<Uuid>,
}

/// Bizdev request repository.
#[derive(Debug, Clone)]
pub struct BizdevRepository {
    db: DatabaseConnection,
}

impl BizdevRepository {
    /// Creates a new bizdev repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists requests, newest first.
    pub async fn list(
        &self,
        filter: BizdevFilter,
        page: PageRequest,
    ) -> Result<PageResponse<bizdev_requests::Model>, BizdevError> {
        let mut query = bizdev_requests::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(bizdev_requests::Column::Status.eq(status));
        }
        if let Some(brand_id) = filter.brand_id {
            query = query.filter(bizdev_requests::Column::BrandId.eq(brand_id));
        }
        if let Some(geo_id) = filter.geo_id {
            query = query.filter(bizdev_requests::Column::GeoId.eq(geo_id));
        }

        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_desc(bizdev_requests::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(items, page, total))
    }

    /// Finds a request by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<bizdev_requests::Model>, DbErr> {
        bizdev_requests::Entity::find_by_id(id).one(&self.db).await
    }

    /// Loads a request or fails with `BizdevError::NotFound`.
    pub async fn get(&self, id: Uuid) -> Result<bizdev_requests::Model, BizdevError> {
        self.find_by_id(id).await?.ok_or(BizdevError::NotFound(id))
    }

    async fn check_refs(
        &self,
        brand_id: Option<Uuid>,
        geo_id: Option<Uuid>,
        assignee_id: Option<Uuid>,
    ) -> Result<(), BizdevError> {
        if let Some(id) = brand_id {
            ensure_exists!(&self.db, brands::Entity, id, BizdevError::UnknownReference { field: "brand_id", id });
        }
        if let Some(id) = geo_id {
            ensure_exists!(&self.db, geos::Entity, id, BizdevError::UnknownReference { field: "geo_id", id });
        }
        if let Some(id) = assignee_id {
            ensure_exists!(&self.db, users::Entity, id, BizdevError::UnknownReference { field: "assignee_id", id });
        }
        Ok(())
    }

    /// Opens a request.
    pub async fn create(
        &self,
        input: CreateBizdevInput,
    ) -> Result<bizdev_requests::Model, BizdevError> {
        self.check_refs(input.brand_id, input.geo_id, input.assignee_id)
            .await?;

        let now = chrono::Utc::now().into();
        let request = bizdev_requests::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title),
            description: Set(input.description),
            brand_id: Set(input.brand_id),
            geo_id: Set(input.geo_id),
            status: Set(BizdevStatus::Open),
            created_by: Set(input.created_by),
            assignee_id: Set(input.assignee_id),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(request.insert(&self.db).await?)
    }

    /// Updates a request.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateBizdevInput,
    ) -> Result<bizdev_requests::Model, BizdevError> {
        let request = self.get(id).await?;
        self.check_refs(
            input.brand_id.flatten(),
            input.geo_id.flatten(),
            input.assignee_id.flatten(),
        )
        .await?;

        let mut active: bizdev_requests::ActiveModel = request.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(brand_id) = input.brand_id {
            active.brand_id = Set(brand_id);
        }
        if let Some(geo_id) = input.geo_id {
            active.geo_id = Set(geo_id);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(assignee_id) = input.assignee_id {
            active.assignee_id = Set(assignee_id);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a request and its discussion.
    pub async fn delete(&self, id: Uuid) -> Result<(), BizdevError> {
        self.get(id).await?;

        let txn = self.db.begin().await?;
        communications::Entity::delete_many()
            .filter(communications::Column::ContextType.eq(ContextType::BizdevRequest))
            .filter(communications::Column::ContextId.eq(id))
            .exec(&txn)
            .await?;
        bizdev_requests::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        Ok(())
    }
}
