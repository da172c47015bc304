//! Organization repository: departments and teams.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use affdesk_shared::AppError;

use super::{db_error, ensure_exists};
use crate::entities::{departments, flows, teams, users};

/// Error types for department and team operations.
#[derive(Debug, thiserror::Error)]
pub enum OrganizationError {
    /// Department name already exists.
    #[error("Department '{0}' already exists")]
    DuplicateDepartment(String),

    /// Team name already exists.
    #[error("Team '{0}' already exists")]
    DuplicateTeam(String),

    /// Department not found.
    #[error("Department not found: {0}")]
    DepartmentNotFound(Uuid),

    /// Team not found.
    #[error("Team not found: {0}")]
    TeamNotFound(Uuid),

    /// Referenced department does not exist.
    #[error("Department does not exist: {0}")]
    UnknownDepartment(Uuid),

    /// Team lead user not found.
    #[error("Team lead not found: {0}")]
    LeadNotFound(Uuid),

    /// Record still referenced elsewhere.
    #[error("{0} is still referenced by {1}")]
    InUse(&'static str, &'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<OrganizationError> for AppError {
    fn from(err: OrganizationError) -> Self {
        match err {
            OrganizationError::DuplicateDepartment(_) | OrganizationError::DuplicateTeam(_) => {
                Self::Conflict(err.to_string())
            }
            OrganizationError::DepartmentNotFound(_) | OrganizationError::TeamNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            OrganizationError::UnknownDepartment(_) => {
                Self::field("department_id", err.to_string())
            }
            OrganizationError::LeadNotFound(_) => Self::field("lead_id", err.to_string()),
            OrganizationError::InUse(..) => Self::BusinessRule(err.to_string()),
            OrganizationError::Database(e) => db_error(e),
        }
    }
}

/// Input for creating a department.
#[derive(Debug, Clone)]
pub struct CreateDepartmentInput {
    /// Unique name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
}

/// Input for updating a department.
#[derive(Debug, Clone, Default)]
pub struct UpdateDepartmentInput {
    /// Unique name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<Option<String>>,
}

/// Input for creating a team.
#[derive(Debug, Clone)]
pub struct CreateTeamInput {
    /// Unique name.
    pub name: String,
    /// Owning department.
    pub department_id: Option<Uuid>,
    /// Team lead.
    pub lead_id: Option<Uuid>,
}

/// Input for updating a team.
#[derive(Debug, Clone, Default)]
pub struct UpdateTeamInput {
    /// Unique name.
    pub name: Option<String>,
    /// Owning department.
    pub department_id: Option<Option<Uuid>>,
    /// Team lead.
    pub lead_id: Option<Option<Uuid>>,
}

/// Organization repository for departments and teams.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    db: DatabaseConnection,
}

impl OrganizationRepository {
    /// Creates a new organization repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========================================================================
    // Departments
    // ========================================================================

    /// Lists departments ordered by name.
    pub async fn list_departments(&self) -> Result<Vec<departments::Model>, OrganizationError> {
        Ok(departments::Entity::find()
            .order_by_asc(departments::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Finds a department by ID.
    pub async fn find_department(
        &self,
        id: Uuid,
    ) -> Result<departments::Model, OrganizationError> {
        departments::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(OrganizationError::DepartmentNotFound(id))
    }

    async fn department_name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, DbErr> {
        let mut query = departments::Entity::find().filter(departments::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(departments::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    /// Creates a department.
    pub async fn create_department(
        &self,
        input: CreateDepartmentInput,
    ) -> Result<departments::Model, OrganizationError> {
        if self.department_name_taken(&input.name, None).await? {
            return Err(OrganizationError::DuplicateDepartment(input.name));
        }

        let now = chrono::Utc::now().into();
        let department = departments::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(department.insert(&self.db).await?)
    }

    /// Updates a department.
    pub async fn update_department(
        &self,
        id: Uuid,
        input: UpdateDepartmentInput,
    ) -> Result<departments::Model, OrganizationError> {
        let department = self.find_department(id).await?;

        if let Some(name) = &input.name
            && *name != department.name
            && self.department_name_taken(name, Some(id)).await?
        {
            return Err(OrganizationError::DuplicateDepartment(name.clone()));
        }

        let mut active: departments::ActiveModel = department.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a department that has no teams and no users.
    pub async fn delete_department(&self, id: Uuid) -> Result<(), OrganizationError> {
        self.find_department(id).await?;

        let team_count = teams::Entity::find()
            .filter(teams::Column::DepartmentId.eq(id))
            .count(&self.db)
            .await?;
        if team_count > 0 {
            return Err(OrganizationError::InUse("Department", "teams"));
        }
        let user_count = users::Entity::find()
            .filter(users::Column::DepartmentId.eq(id))
            .count(&self.db)
            .await?;
        if user_count > 0 {
            return Err(OrganizationError::InUse("Department", "users"));
        }

        departments::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    // ========================================================================
    // Teams
    // ========================================================================

    /// Lists teams ordered by name, optionally within one department.
    pub async fn list_teams(
        &self,
        department_id: Option<Uuid>,
    ) -> Result<Vec<teams::Model>, OrganizationError> {
        let mut query = teams::Entity::find().order_by_asc(teams::Column::Name);
        if let Some(department_id) = department_id {
            query = query.filter(teams::Column::DepartmentId.eq(department_id));
        }
        Ok(query.all(&self.db).await?)
    }

    /// Finds a team by ID.
    pub async fn find_team(&self, id: Uuid) -> Result<teams::Model, OrganizationError> {
        teams::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(OrganizationError::TeamNotFound(id))
    }

    async fn team_name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, DbErr> {
        let mut query = teams::Entity::find().filter(teams::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(teams::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    async fn check_team_refs(
        &self,
        department_id: Option<Uuid>,
        lead_id: Option<Uuid>,
    ) -> Result<(), OrganizationError> {
        if let Some(id) = department_id {
            ensure_exists!(
                &self.db,
                departments::Entity,
                id,
                OrganizationError::UnknownDepartment(id)
            );
        }
        if let Some(id) = lead_id {
            ensure_exists!(&self.db, users::Entity, id, OrganizationError::LeadNotFound(id));
        }
        Ok(())
    }

    /// Creates a team.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the department or lead does
    /// not exist.
    pub async fn create_team(
        &self,
        input: CreateTeamInput,
    ) -> Result<teams::Model, OrganizationError> {
        if self.team_name_taken(&input.name, None).await? {
            return Err(OrganizationError::DuplicateTeam(input.name));
        }
        self.check_team_refs(input.department_id, input.lead_id)
            .await?;

        let now = chrono::Utc::now().into();
        let team = teams::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            department_id: Set(input.department_id),
            lead_id: Set(input.lead_id),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(team.insert(&self.db).await?)
    }

    /// Updates a team.
    pub async fn update_team(
        &self,
        id: Uuid,
        input: UpdateTeamInput,
    ) -> Result<teams::Model, OrganizationError> {
        let team = self.find_team(id).await?;

        if let Some(name) = &input.name
            && *name != team.name
            && self.team_name_taken(name, Some(id)).await?
        {
            return Err(OrganizationError::DuplicateTeam(name.clone()));
        }
        self.check_team_refs(input.department_id.flatten(), input.lead_id.flatten())
            .await?;

        let mut active: teams::ActiveModel = team.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(department_id) = input.department_id {
            active.department_id = Set(department_id);
        }
        if let Some(lead_id) = input.lead_id {
            active.lead_id = Set(lead_id);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a team that has no members and no flows.
    pub async fn delete_team(&self, id: Uuid) -> Result<(), OrganizationError> {
        self.find_team(id).await?;

        let user_count = users::Entity::find()
            .filter(users::Column::TeamId.eq(id))
            .count(&self.db)
            .await?;
        if user_count > 0 {
            return Err(OrganizationError::InUse("Team", "users"));
        }
        let flow_count = flows::Entity::find()
            .filter(flows::Column::TeamId.eq(id))
            .count(&self.db)
            .await?;
        if flow_count > 0 {
            return Err(OrganizationError::InUse("Team", "flows"));
        }

        teams::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}
