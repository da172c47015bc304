//! Initial database migration.
//!
//! Creates enums, directory tables, users, flows and their statistics,
//! finance tables and communications.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: ORGANIZATION & DIRECTORY
        // ============================================================
        db.execute_unprepared(DEPARTMENTS_SQL).await?;
        db.execute_unprepared(USERS_TEAMS_SQL).await?;
        db.execute_unprepared(DIRECTORY_SQL).await?;

        // ============================================================
        // PART 3: FLOWS & STATISTICS
        // ============================================================
        db.execute_unprepared(FLOWS_SQL).await?;
        db.execute_unprepared(FLOW_STATS_SQL).await?;

        // ============================================================
        // PART 4: FINANCE
        // ============================================================
        db.execute_unprepared(SALARIES_SQL).await?;
        db.execute_unprepared(PARTNER_PAYMENTS_SQL).await?;
        db.execute_unprepared(EXPENSES_SQL).await?;
        db.execute_unprepared(INVESTMENTS_SQL).await?;

        // ============================================================
        // PART 5: BIZDEV & COMMUNICATIONS
        // ============================================================
        db.execute_unprepared(BIZDEV_SQL).await?;
        db.execute_unprepared(COMMUNICATIONS_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE user_role AS ENUM ('admin', 'finance', 'teamlead', 'buyer', 'bizdev');
CREATE TYPE flow_type AS ENUM ('cpa', 'spend');
CREATE TYPE flow_status AS ENUM ('active', 'paused', 'archived');
CREATE TYPE kpi_metric AS ENUM ('roi', 'oas', 'inst2reg', 'reg2dep', 'rd', 'urd', 'cpd');
CREATE TYPE salary_status AS ENUM ('pending', 'approved', 'rejected', 'paid');
CREATE TYPE payment_status AS ENUM (
    'pending',
    'processing',
    'hold',
    'completed',
    'failed',
    'cancelled'
);
CREATE TYPE investment_operation_type AS ENUM ('deposit', 'withdrawal', 'profit', 'fee');
CREATE TYPE bizdev_status AS ENUM ('open', 'in_progress', 'done', 'rejected');
CREATE TYPE communication_context AS ENUM ('flow', 'bizdev_request');
";

const DEPARTMENTS_SQL: &str = r"
CREATE TABLE departments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_departments_name UNIQUE (name)
);
";

// teams.lead_id and users.team_id reference each other, so the lead FK is
// added after both tables exist.
const USERS_TEAMS_SQL: &str = r"
CREATE TABLE teams (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    department_id UUID REFERENCES departments(id) ON DELETE RESTRICT,
    lead_id UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_teams_name UNIQUE (name)
);

CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    email VARCHAR(255) NOT NULL,
    password_hash VARCHAR(255) NOT NULL,
    full_name VARCHAR(255) NOT NULL,
    role user_role NOT NULL,
    team_id UUID REFERENCES teams(id) ON DELETE RESTRICT,
    department_id UUID REFERENCES departments(id) ON DELETE RESTRICT,
    telegram VARCHAR(64),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_users_email UNIQUE (email)
);

ALTER TABLE teams
    ADD CONSTRAINT fk_teams_lead FOREIGN KEY (lead_id) REFERENCES users(id) ON DELETE SET NULL;

CREATE INDEX idx_users_team ON users(team_id);
CREATE INDEX idx_users_department ON users(department_id);
CREATE INDEX idx_teams_department ON teams(department_id);
";

const DIRECTORY_SQL: &str = r"
CREATE TABLE brands (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    website VARCHAR(512),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_brands_name UNIQUE (name)
);

CREATE TABLE geos (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    code CHAR(2) NOT NULL,
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_geos_code UNIQUE (code),
    CONSTRAINT chk_geos_code_upper CHECK (code = upper(code))
);

CREATE TABLE payment_methods (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    details TEXT,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_payment_methods_name UNIQUE (name)
);
";

const FLOWS_SQL: &str = r"
CREATE TABLE flows (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    brand_id UUID NOT NULL REFERENCES brands(id) ON DELETE RESTRICT,
    geo_id UUID NOT NULL REFERENCES geos(id) ON DELETE RESTRICT,
    team_id UUID REFERENCES teams(id) ON DELETE RESTRICT,
    owner_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    flow_type flow_type NOT NULL,
    status flow_status NOT NULL DEFAULT 'active',
    kpi_metric kpi_metric NOT NULL,
    kpi_target NUMERIC(18, 4) NOT NULL DEFAULT 0,
    percentage_ranges JSONB NOT NULL DEFAULT '[]'::jsonb,
    cpa_rate NUMERIC(18, 2),
    currency VARCHAR(8) NOT NULL DEFAULT 'USD',
    start_date DATE,
    end_date DATE,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_flows_name UNIQUE (name),
    CONSTRAINT chk_flows_cpa_rate CHECK (flow_type <> 'cpa' OR cpa_rate > 0),
    CONSTRAINT chk_flows_dates CHECK (end_date IS NULL OR start_date IS NULL OR end_date >= start_date)
);

CREATE INDEX idx_flows_team ON flows(team_id);
CREATE INDEX idx_flows_owner ON flows(owner_id);
CREATE INDEX idx_flows_brand ON flows(brand_id);

CREATE TABLE flow_users (
    flow_id UUID NOT NULL REFERENCES flows(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (flow_id, user_id)
);

CREATE INDEX idx_flow_users_user ON flow_users(user_id);
";

const FLOW_STATS_SQL: &str = r"
CREATE TABLE flow_stats (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    flow_id UUID NOT NULL REFERENCES flows(id) ON DELETE RESTRICT,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    stat_date DATE NOT NULL,
    spend NUMERIC(18, 2) NOT NULL DEFAULT 0,
    revenue NUMERIC(18, 2) NOT NULL DEFAULT 0,
    installs BIGINT NOT NULL DEFAULT 0,
    registrations BIGINT NOT NULL DEFAULT 0,
    deposits BIGINT NOT NULL DEFAULT 0,
    redeposits BIGINT NOT NULL DEFAULT 0,
    unique_redeposits BIGINT NOT NULL DEFAULT 0,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_flow_stats_day UNIQUE (flow_id, user_id, stat_date),
    CONSTRAINT chk_flow_stats_non_negative CHECK (
        spend >= 0 AND revenue >= 0 AND installs >= 0 AND registrations >= 0
        AND deposits >= 0 AND redeposits >= 0 AND unique_redeposits >= 0
    )
);

CREATE INDEX idx_flow_stats_flow_date ON flow_stats(flow_id, stat_date);
CREATE INDEX idx_flow_stats_user_date ON flow_stats(user_id, stat_date);
";

const SALARIES_SQL: &str = r"
CREATE TABLE salaries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    period_year INTEGER NOT NULL,
    period_month INTEGER NOT NULL,
    base_amount NUMERIC(18, 2) NOT NULL DEFAULT 0,
    bonus_amount NUMERIC(18, 2) NOT NULL DEFAULT 0,
    currency VARCHAR(8) NOT NULL DEFAULT 'USD',
    status salary_status NOT NULL DEFAULT 'pending',
    comment TEXT,
    reviewed_by UUID REFERENCES users(id) ON DELETE SET NULL,
    reviewed_at TIMESTAMPTZ,
    paid_at TIMESTAMPTZ,
    created_by UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_salaries_period UNIQUE (user_id, period_year, period_month),
    CONSTRAINT chk_salaries_month CHECK (period_month BETWEEN 1 AND 12),
    CONSTRAINT chk_salaries_amounts CHECK (base_amount >= 0 AND bonus_amount >= 0)
);
";

const PARTNER_PAYMENTS_SQL: &str = r"
CREATE TABLE partner_payments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    brand_id UUID NOT NULL REFERENCES brands(id) ON DELETE RESTRICT,
    flow_id UUID REFERENCES flows(id) ON DELETE RESTRICT,
    payment_method_id UUID REFERENCES payment_methods(id) ON DELETE RESTRICT,
    amount NUMERIC(18, 2) NOT NULL,
    currency VARCHAR(8) NOT NULL DEFAULT 'USD',
    status payment_status NOT NULL DEFAULT 'pending',
    reference VARCHAR(255),
    period_from DATE,
    period_to DATE,
    comment TEXT,
    created_by UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    status_changed_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_partner_payments_amount CHECK (amount > 0)
);

CREATE INDEX idx_partner_payments_brand ON partner_payments(brand_id);
CREATE INDEX idx_partner_payments_status ON partner_payments(status);
";

const EXPENSES_SQL: &str = r"
CREATE TABLE expenses (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    category VARCHAR(100) NOT NULL,
    amount NUMERIC(18, 2) NOT NULL,
    currency VARCHAR(8) NOT NULL DEFAULT 'USD',
    expense_date DATE NOT NULL,
    description TEXT,
    department_id UUID REFERENCES departments(id) ON DELETE RESTRICT,
    team_id UUID REFERENCES teams(id) ON DELETE RESTRICT,
    flow_id UUID REFERENCES flows(id) ON DELETE RESTRICT,
    created_by UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_expenses_amount CHECK (amount > 0)
);

CREATE INDEX idx_expenses_date ON expenses(expense_date);
";

const INVESTMENTS_SQL: &str = r"
CREATE TABLE investment_operations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    investor VARCHAR(255) NOT NULL,
    operation_type investment_operation_type NOT NULL,
    amount NUMERIC(18, 2) NOT NULL,
    currency VARCHAR(8) NOT NULL DEFAULT 'USD',
    operation_date DATE NOT NULL,
    comment TEXT,
    created_by UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_investment_operations_amount CHECK (amount > 0)
);

CREATE INDEX idx_investment_operations_date ON investment_operations(operation_date);
";

const BIZDEV_SQL: &str = r"
CREATE TABLE bizdev_requests (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    title VARCHAR(255) NOT NULL,
    description TEXT,
    brand_id UUID REFERENCES brands(id) ON DELETE SET NULL,
    geo_id UUID REFERENCES geos(id) ON DELETE SET NULL,
    status bizdev_status NOT NULL DEFAULT 'open',
    created_by UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const COMMUNICATIONS_SQL: &str = r"
CREATE TABLE communications (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    context_type communication_context NOT NULL,
    context_id UUID NOT NULL,
    parent_id UUID REFERENCES communications(id) ON DELETE CASCADE,
    author_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    message TEXT NOT NULL,
    is_edited BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_communications_message CHECK (char_length(message) BETWEEN 1 AND 5000)
);

CREATE INDEX idx_communications_context ON communications(context_type, context_id, created_at);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

DO $$
DECLARE
    t TEXT;
BEGIN
    FOREACH t IN ARRAY ARRAY[
        'departments', 'teams', 'users', 'brands', 'geos', 'payment_methods',
        'flows', 'flow_stats', 'salaries', 'partner_payments', 'expenses',
        'investment_operations', 'bizdev_requests', 'communications'
    ]
    LOOP
        EXECUTE format(
            'CREATE TRIGGER trg_%s_updated_at BEFORE UPDATE ON %I
             FOR EACH ROW EXECUTE FUNCTION set_updated_at()',
            t, t
        );
    END LOOP;
END;
$$;
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS communications CASCADE;
DROP TABLE IF EXISTS bizdev_requests CASCADE;
DROP TABLE IF EXISTS investment_operations CASCADE;
DROP TABLE IF EXISTS expenses CASCADE;
DROP TABLE IF EXISTS partner_payments CASCADE;
DROP TABLE IF EXISTS salaries CASCADE;
DROP TABLE IF EXISTS flow_stats CASCADE;
DROP TABLE IF EXISTS flow_users CASCADE;
DROP TABLE IF EXISTS flows CASCADE;
DROP TABLE IF EXISTS payment_methods CASCADE;
DROP TABLE IF EXISTS geos CASCADE;
DROP TABLE IF EXISTS brands CASCADE;
ALTER TABLE IF EXISTS teams DROP CONSTRAINT IF EXISTS fk_teams_lead;
DROP TABLE IF EXISTS users CASCADE;
DROP TABLE IF EXISTS teams CASCADE;
DROP TABLE IF EXISTS departments CASCADE;

DROP FUNCTION IF EXISTS set_updated_at() CASCADE;

DROP TYPE IF EXISTS communication_context;
DROP TYPE IF EXISTS bizdev_status;
DROP TYPE IF EXISTS investment_operation_type;
DROP TYPE IF EXISTS payment_status;
DROP TYPE IF EXISTS salary_status;
DROP TYPE IF EXISTS kpi_metric;
DROP TYPE IF EXISTS flow_status;
DROP TYPE IF EXISTS flow_type;
DROP TYPE IF EXISTS user_role;
";
