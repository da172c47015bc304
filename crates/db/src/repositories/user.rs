//! User repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::{Expr, Func},
};
use uuid::Uuid;

use affdesk_shared::AppError;
use affdesk_shared::types::{PageRequest, PageResponse};

use super::{db_error, ensure_exists};
use crate::entities::{departments, sea_orm_active_enums::UserRole, teams, users};

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// Email already registered.
    #[error("Email '{0}' is already registered")]
    DuplicateEmail(String),

    /// User not found.
    #[error("User not found: {0}")]
    NotFound(Uuid),

    /// Referenced team does not exist.
    #[error("Team does not exist: {0}")]
    UnknownTeam(Uuid),

    /// Referenced department does not exist.
    #[error("Department does not exist: {0}")]
    UnknownDepartment(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::DuplicateEmail(_) => Self::Conflict(err.to_string()),
            UserError::NotFound(_) => Self::NotFound(err.to_string()),
            UserError::UnknownTeam(_) => Self::field("team_id", err.to_string()),
            UserError::UnknownDepartment(_) => Self::field("department_id", err.to_string()),
            UserError::Database(e) => db_error(e),
        }
    }
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Login email; stored lower case.
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Display name.
    pub full_name: String,
    /// Role.
    pub role: UserRole,
    /// Team.
    pub team_id: Option<Uuid>,
    /// Department.
    pub department_id: Option<Uuid>,
    /// Telegram handle.
    pub telegram: Option<String>,
}

/// Input for updating a user.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// Login email.
    pub email: Option<String>,
    /// New password hash.
    pub password_hash: Option<String>,
    /// Display name.
    pub full_name: Option<String>,
    /// Role.
    pub role: Option<UserRole>,
    /// Team.
    pub team_id: Option<Option<Uuid>>,
    /// Department.
    pub department_id: Option<Option<Uuid>>,
    /// Telegram handle.
    pub telegram: Option<Option<String>>,
    /// Active flag.
    pub is_active: Option<bool>,
}

/// Filter options for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Filter by role.
    pub role: Option<UserRole>,
    /// Filter by team.
    pub team_id: Option<Uuid>,
    /// Filter by department.
    pub department_id: Option<Uuid>,
    /// Filter by active flag.
    pub is_active: Option<bool>,
    /// Case-insensitive substring of name or email.
    pub search: Option<String>,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Loads a user or fails with `UserError::NotFound`.
    pub async fn get(&self, id: Uuid) -> Result<users::Model, UserError> {
        self.find_by_id(id).await?.ok_or(UserError::NotFound(id))
    }

    /// Lists users matching `filter`, ordered by name.
    pub async fn list(
        &self,
        filter: UserFilter,
        page: PageRequest,
    ) -> Result<PageResponse<users::Model>, UserError> {
        let mut query = users::Entity::find();

        if let Some(role) = filter.role {
            query = query.filter(users::Column::Role.eq(role));
        }
        if let Some(team_id) = filter.team_id {
            query = query.filter(users::Column::TeamId.eq(team_id));
        }
        if let Some(department_id) = filter.department_id {
            query = query.filter(users::Column::DepartmentId.eq(department_id));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(users::Column::IsActive.eq(is_active));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            let pattern = format!("%{}%", search.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(users::Column::FullName))).like(&pattern))
                    .add(Expr::expr(Func::lower(Expr::col(users::Column::Email))).like(&pattern)),
            );
        }

        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_asc(users::Column::FullName)
            .order_by_asc(users::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(items, page, total))
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, DbErr> {
        let mut query = users::Entity::find().filter(users::Column::Email.eq(email));
        if let Some(id) = except {
            query = query.filter(users::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    async fn check_refs(
        &self,
        team_id: Option<Uuid>,
        department_id: Option<Uuid>,
    ) -> Result<(), UserError> {
        if let Some(id) = team_id {
            ensure_exists!(&self.db, teams::Entity, id, UserError::UnknownTeam(id));
        }
        if let Some(id) = department_id {
            ensure_exists!(&self.db, departments::Entity, id, UserError::UnknownDepartment(id));
        }
        Ok(())
    }

    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is taken or a referenced team or
    /// department does not exist.
    pub async fn create(&self, input: CreateUserInput) -> Result<users::Model, UserError> {
        let email = input.email.trim().to_lowercase();
        if self.email_taken(&email, None).await? {
            return Err(UserError::DuplicateEmail(email));
        }
        self.check_refs(input.team_id, input.department_id).await?;

        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            password_hash: Set(input.password_hash),
            full_name: Set(input.full_name),
            role: Set(input.role),
            team_id: Set(input.team_id),
            department_id: Set(input.department_id),
            telegram: Set(input.telegram),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(user.insert(&self.db).await?)
    }

    /// Updates a user.
    pub async fn update(&self, id: Uuid, input: UpdateUserInput) -> Result<users::Model, UserError> {
        let user = self.get(id).await?;
        let email = input.email.map(|e| e.trim().to_lowercase());

        if let Some(email) = &email
            && *email != user.email
            && self.email_taken(email, Some(id)).await?
        {
            return Err(UserError::DuplicateEmail(email.clone()));
        }
        self.check_refs(input.team_id.flatten(), input.department_id.flatten())
            .await?;

        let mut active: users::ActiveModel = user.into();
        if let Some(email) = email {
            active.email = Set(email);
        }
        if let Some(password_hash) = input.password_hash {
            active.password_hash = Set(password_hash);
        }
        if let Some(full_name) = input.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(role) = input.role {
            active.role = Set(role);
        }
        if let Some(team_id) = input.team_id {
            active.team_id = Set(team_id);
        }
        if let Some(department_id) = input.department_id {
            active.department_id = Set(department_id);
        }
        if let Some(telegram) = input.telegram {
            active.telegram = Set(telegram);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deactivates a user. Users are never hard-deleted because statistics,
    /// salaries and messages keep referencing them.
    pub async fn deactivate(&self, id: Uuid) -> Result<users::Model, UserError> {
        self.update(
            id,
            UpdateUserInput {
                is_active: Some(false),
                ..UpdateUserInput::default()
            },
        )
        .await
    }

    /// Returns display names for `ids`.
    pub async fn names(&self, ids: &[Uuid]) -> Result<Vec<(Uuid, String)>, DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        users::Entity::find()
            .select_only()
            .column(users::Column::Id)
            .column(users::Column::FullName)
            .filter(users::Column::Id.is_in(ids.iter().copied()))
            .into_tuple::<(Uuid, String)>()
            .all(&self.db)
            .await
    }
}
