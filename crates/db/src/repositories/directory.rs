//! Directory repository: brands, geos and payment methods.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use affdesk_shared::AppError;

use super::db_error;
use crate::entities::{brands, flows, geos, partner_payments, payment_methods};

/// Error types for directory operations.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// Name or code already taken.
    #[error("{kind} '{value}' already exists")]
    Duplicate {
        /// Record kind.
        kind: &'static str,
        /// The duplicate value.
        value: String,
    },

    /// Record not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind.
        kind: &'static str,
        /// Requested id.
        id: Uuid,
    },

    /// Record still referenced elsewhere.
    #[error("{kind} is used by existing {used_by}")]
    InUse {
        /// Record kind.
        kind: &'static str,
        /// Referencing records.
        used_by: &'static str,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Duplicate { .. } => Self::Conflict(err.to_string()),
            DirectoryError::NotFound { .. } => Self::NotFound(err.to_string()),
            DirectoryError::InUse { .. } => Self::BusinessRule(err.to_string()),
            DirectoryError::Database(e) => db_error(e),
        }
    }
}

/// Input for creating a brand.
#[derive(Debug, Clone)]
pub struct CreateBrandInput {
    /// Unique name.
    pub name: String,
    /// Website.
    pub website: Option<String>,
    /// Whether the brand is active.
    pub is_active: bool,
}

/// Input for updating a brand.
#[derive(Debug, Clone, Default)]
pub struct UpdateBrandInput {
    /// Unique name.
    pub name: Option<String>,
    /// Website.
    pub website: Option<Option<String>>,
    /// Whether the brand is active.
    pub is_active: Option<bool>,
}

/// Input for creating a geo.
#[derive(Debug, Clone)]
pub struct CreateGeoInput {
    /// ISO 3166-1 alpha-2 code; stored upper case.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// Input for updating a geo.
#[derive(Debug, Clone, Default)]
pub struct UpdateGeoInput {
    /// ISO 3166-1 alpha-2 code.
    pub code: Option<String>,
    /// Display name.
    pub name: Option<String>,
}

/// Input for creating a payment method.
#[derive(Debug, Clone)]
pub struct CreatePaymentMethodInput {
    /// Unique name.
    pub name: String,
    /// Wallet, account or other details.
    pub details: Option<String>,
    /// Whether the method is active.
    pub is_active: bool,
}

/// Input for updating a payment method.
#[derive(Debug, Clone, Default)]
pub struct UpdatePaymentMethodInput {
    /// Unique name.
    pub name: Option<String>,
    /// Details.
    pub details: Option<Option<String>>,
    /// Whether the method is active.
    pub is_active: Option<bool>,
}

/// Directory repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    db: DatabaseConnection,
}

impl DirectoryRepository {
    /// Creates a new directory repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========================================================================
    // Brands
    // ========================================================================

    /// Lists brands ordered by name.
    pub async fn list_brands(&self) -> Result<Vec<brands::Model>, DirectoryError> {
        Ok(brands::Entity::find()
            .order_by_asc(brands::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Finds a brand by ID.
    pub async fn find_brand(&self, id: Uuid) -> Result<brands::Model, DirectoryError> {
        brands::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DirectoryError::NotFound { kind: "Brand", id })
    }

    async fn brand_name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, DbErr> {
        let mut query = brands::Entity::find().filter(brands::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(brands::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    /// Creates a brand.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Duplicate` if the name is taken.
    pub async fn create_brand(
        &self,
        input: CreateBrandInput,
    ) -> Result<brands::Model, DirectoryError> {
        if self.brand_name_taken(&input.name, None).await? {
            return Err(DirectoryError::Duplicate {
                kind: "Brand",
                value: input.name,
            });
        }

        let now = chrono::Utc::now().into();
        let brand = brands::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            website: Set(input.website),
            is_active: Set(input.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(brand.insert(&self.db).await?)
    }

    /// Updates a brand.
    pub async fn update_brand(
        &self,
        id: Uuid,
        input: UpdateBrandInput,
    ) -> Result<brands::Model, DirectoryError> {
        let brand = self.find_brand(id).await?;

        if let Some(name) = &input.name
            && *name != brand.name
            && self.brand_name_taken(name, Some(id)).await?
        {
            return Err(DirectoryError::Duplicate {
                kind: "Brand",
                value: name.clone(),
            });
        }

        let mut active: brands::ActiveModel = brand.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(website) = input.website {
            active.website = Set(website);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a brand that no flow or payment references.
    pub async fn delete_brand(&self, id: Uuid) -> Result<(), DirectoryError> {
        self.find_brand(id).await?;

        let flow_count = flows::Entity::find()
            .filter(flows::Column::BrandId.eq(id))
            .count(&self.db)
            .await?;
        if flow_count > 0 {
            return Err(DirectoryError::InUse {
                kind: "Brand",
                used_by: "flows",
            });
        }
        let payment_count = partner_payments::Entity::find()
            .filter(partner_payments::Column::BrandId.eq(id))
            .count(&self.db)
            .await?;
        if payment_count > 0 {
            return Err(DirectoryError::InUse {
                kind: "Brand",
                used_by: "partner payments",
            });
        }

        brands::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    // ========================================================================
    // Geos
    // ========================================================================

    /// Lists geos ordered by code.
    pub async fn list_geos(&self) -> Result<Vec<geos::Model>, DirectoryError> {
        Ok(geos::Entity::find()
            .order_by_asc(geos::Column::Code)
            .all(&self.db)
            .await?)
    }

    /// Finds a geo by ID.
    pub async fn find_geo(&self, id: Uuid) -> Result<geos::Model, DirectoryError> {
        geos::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DirectoryError::NotFound { kind: "Geo", id })
    }

    async fn geo_code_taken(&self, code: &str, except: Option<Uuid>) -> Result<bool, DbErr> {
        let mut query = geos::Entity::find().filter(geos::Column::Code.eq(code));
        if let Some(id) = except {
            query = query.filter(geos::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    /// Creates a geo; the code is stored upper case.
    pub async fn create_geo(&self, input: CreateGeoInput) -> Result<geos::Model, DirectoryError> {
        let code = input.code.trim().to_uppercase();
        if self.geo_code_taken(&code, None).await? {
            return Err(DirectoryError::Duplicate {
                kind: "Geo",
                value: code,
            });
        }

        let now = chrono::Utc::now().into();
        let geo = geos::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            name: Set(input.name),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(geo.insert(&self.db).await?)
    }

    /// Updates a geo.
    pub async fn update_geo(
        &self,
        id: Uuid,
        input: UpdateGeoInput,
    ) -> Result<geos::Model, DirectoryError> {
        let geo = self.find_geo(id).await?;
        let code = input.code.map(|c| c.trim().to_uppercase());

        if let Some(code) = &code
            && *code != geo.code
            && self.geo_code_taken(code, Some(id)).await?
        {
            return Err(DirectoryError::Duplicate {
                kind: "Geo",
                value: code.clone(),
            });
        }

        let mut active: geos::ActiveModel = geo.into();
        if let Some(code) = code {
            active.code = Set(code);
        }
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a geo that no flow references.
    pub async fn delete_geo(&self, id: Uuid) -> Result<(), DirectoryError> {
        self.find_geo(id).await?;

        let flow_count = flows::Entity::find()
            .filter(flows::Column::GeoId.eq(id))
            .count(&self.db)
            .await?;
        if flow_count > 0 {
            return Err(DirectoryError::InUse {
                kind: "Geo",
                used_by: "flows",
            });
        }

        geos::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    // ========================================================================
    // Payment methods
    // ========================================================================

    /// Lists payment methods ordered by name.
    pub async fn list_payment_methods(
        &self,
    ) -> Result<Vec<payment_methods::Model>, DirectoryError> {
        Ok(payment_methods::Entity::find()
            .order_by_asc(payment_methods::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Finds a payment method by ID.
    pub async fn find_payment_method(
        &self,
        id: Uuid,
    ) -> Result<payment_methods::Model, DirectoryError> {
        payment_methods::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DirectoryError::NotFound {
                kind: "Payment method",
                id,
            })
    }

    async fn method_name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, DbErr> {
        let mut query =
            payment_methods::Entity::find().filter(payment_methods::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(payment_methods::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    /// Creates a payment method.
    pub async fn create_payment_method(
        &self,
        input: CreatePaymentMethodInput,
    ) -> Result<payment_methods::Model, DirectoryError> {
        if self.method_name_taken(&input.name, None).await? {
            return Err(DirectoryError::Duplicate {
                kind: "Payment method",
                value: input.name,
            });
        }

        let now = chrono::Utc::now().into();
        let method = payment_methods::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            details: Set(input.details),
            is_active: Set(input.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(method.insert(&self.db).await?)
    }

    /// Updates a payment method.
    pub async fn update_payment_method(
        &self,
        id: Uuid,
        input: UpdatePaymentMethodInput,
    ) -> Result<payment_methods::Model, DirectoryError> {
        let method = self.find_payment_method(id).await?;

        if let Some(name) = &input.name
            && *name != method.name
            && self.method_name_taken(name, Some(id)).await?
        {
            return Err(DirectoryError::Duplicate {
                kind: "Payment method",
                value: name.clone(),
            });
        }

        let mut active: payment_methods::ActiveModel = method.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(details) = input.details {
            active.details = Set(details);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a payment method that no partner payment references.
    pub async fn delete_payment_method(&self, id: Uuid) -> Result<(), DirectoryError> {
        self.find_payment_method(id).await?;

        let payment_count = partner_payments::Entity::find()
            .filter(partner_payments::Column::PaymentMethodId.eq(id))
            .count(&self.db)
            .await?;
        if payment_count > 0 {
            return Err(DirectoryError::InUse {
                kind: "Payment method",
                used_by: "partner payments",
            });
        }

        payment_methods::Entity::delete_by_id(id)
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
