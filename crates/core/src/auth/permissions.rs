//! Role → permission table and row-scope checks.

use uuid::Uuid;

use super::UserRole;

/// Coarse capabilities checked before any handler touches the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Writes on brands, geos, payment methods, departments and teams.
    ManageDirectory,
    /// Create, update and deactivate users.
    ManageUsers,
    /// List and read users.
    ViewUsers,
    /// Create and edit flows and their members.
    ManageFlows,
    /// Upsert and delete daily flow statistics.
    WriteStats,
    /// Company-wide statistics rollup.
    ViewCompanyStats,
    /// Team statistics rollup.
    ViewTeamStats,
    /// Full salary management, including approval and payout.
    ManageSalaries,
    /// Partner payment writes.
    ManagePayments,
    /// Partner payment reads.
    ViewPayments,
    /// Expense reads and writes.
    ManageExpenses,
    /// Investment operation writes.
    ManageInvestments,
    /// Investment operation reads and summary.
    ViewInvestments,
    /// Bizdev request writes.
    ManageBizdevRequests,
}

impl Permission {
    /// Roles granted this permission.
    #[must_use]
    pub const fn roles(self) -> &'static [UserRole] {
        use UserRole::{Admin, BizDev, Buyer, Finance, TeamLead};

        match self {
            Self::ManageDirectory | Self::ManageUsers | Self::ManageInvestments => &[Admin],
            Self::ViewUsers | Self::ViewTeamStats => &[Admin, Finance, TeamLead],
            Self::ManageFlows => &[Admin, TeamLead],
            Self::WriteStats => &[Admin, TeamLead, Buyer],
            Self::ViewCompanyStats
            | Self::ManageSalaries
            | Self::ManagePayments
            | Self::ViewPayments
            | Self::ManageExpenses
            | Self::ViewInvestments => &[Admin, Finance],
            Self::ManageBizdevRequests => &[Admin, BizDev],
        }
    }

    /// Returns true if `role` holds this permission.
    #[must_use]
    pub fn allows(self, role: UserRole) -> bool {
        self.roles().contains(&role)
    }
}

impl UserRole {
    /// Returns true if this role holds `permission`.
    #[must_use]
    pub fn can(self, permission: Permission) -> bool {
        permission.allows(self)
    }
}

/// The authenticated caller as seen by scope checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Caller's user id.
    pub user_id: Uuid,
    /// Caller's role.
    pub role: UserRole,
    /// Caller's team, if any.
    pub team_id: Option<Uuid>,
}

impl Actor {
    /// Creates a new actor.
    #[must_use]
    pub const fn new(user_id: Uuid, role: UserRole, team_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            role,
            team_id,
        }
    }

    /// Returns true if the actor holds `permission`.
    #[must_use]
    pub fn can(&self, permission: Permission) -> bool {
        self.role.can(permission)
    }

    /// Whether the actor may act on records belonging to `team_id`.
    ///
    /// Admin and finance reach every team. A team lead reaches only their own
    /// team; a record without a team is out of their reach.
    #[must_use]
    pub fn reaches_team(&self, team_id: Option<Uuid>) -> bool {
        match self.role {
            UserRole::Admin | UserRole::Finance => true,
            UserRole::TeamLead => self.team_id.is_some() && self.team_id == team_id,
            UserRole::Buyer | UserRole::BizDev => false,
        }
    }

    /// Whether the actor may act on the user `user_id` in team `user_team`.
    #[must_use]
    pub fn reaches_user(&self, user_id: Uuid, user_team: Option<Uuid>) -> bool {
        self.user_id == user_id || self.reaches_team(user_team)
    }

    /// Whether the actor may see a flow.
    ///
    /// Buyers see flows they own or are a member of; bizdev users see every
    /// flow read-only.
    #[must_use]
    pub fn sees_flow(&self, flow_team: Option<Uuid>, owner_id: Uuid, is_member: bool) -> bool {
        match self.role {
            UserRole::Admin | UserRole::Finance | UserRole::BizDev => true,
            UserRole::TeamLead => {
                self.reaches_team(flow_team) || owner_id == self.user_id || is_member
            }
            UserRole::Buyer => owner_id == self.user_id || is_member,
        }
    }

    /// Whether the actor may edit a flow and its members.
    #[must_use]
    pub fn manages_flow(&self, flow_team: Option<Uuid>) -> bool {
        match self.role {
            UserRole::Admin => true,
            UserRole::TeamLead => self.reaches_team(flow_team),
            _ => false,
        }
    }

    /// Whether the actor may write statistics rows for `target_user` on a flow.
    ///
    /// Buyers write only their own rows. Team leads write for flows of their team
    /// and for their own rows.
    #[must_use]
    pub fn writes_stats_for(&self, target_user: Uuid, flow_team: Option<Uuid>) -> bool {
        if !self.can(Permission::WriteStats) {
            return false;
        }
        match self.role {
            UserRole::Admin => true,
            UserRole::TeamLead => target_user == self.user_id || self.reaches_team(flow_team),
            _ => target_user == self.user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Permission::ManageDirectory, &[UserRole::Admin])]
    #[case(Permission::ManageUsers, &[UserRole::Admin])]
    #[case(Permission::ViewUsers, &[UserRole::Admin, UserRole::Finance, UserRole::TeamLead])]
    #[case(Permission::ManageFlows, &[UserRole::Admin, UserRole::TeamLead])]
    #[case(Permission::WriteStats, &[UserRole::Admin, UserRole::TeamLead, UserRole::Buyer])]
    #[case(Permission::ViewCompanyStats, &[UserRole::Admin, UserRole::Finance])]
    #[case(Permission::ViewTeamStats, &[UserRole::Admin, UserRole::Finance, UserRole::TeamLead])]
    #[case(Permission::ManageSalaries, &[UserRole::Admin, UserRole::Finance])]
    #[case(Permission::ManagePayments, &[UserRole::Admin, UserRole::Finance])]
    #[case(Permission::ViewPayments, &[UserRole::Admin, UserRole::Finance])]
    #[case(Permission::ManageExpenses, &[UserRole::Admin, UserRole::Finance])]
    #[case(Permission::ManageInvestments, &[UserRole::Admin])]
    #[case(Permission::ViewInvestments, &[UserRole::Admin, UserRole::Finance])]
    #[case(Permission::ManageBizdevRequests, &[UserRole::Admin, UserRole::BizDev])]
    fn test_permission_table(#[case] permission: Permission, #[case] granted: &[UserRole]) {
        for role in UserRole::ALL {
            assert_eq!(
                role.can(permission),
                granted.contains(&role),
                "{permission:?} for {role}"
            );
        }
    }

    #[test]
    fn test_teamlead_reaches_only_own_team() {
        let team = Uuid::new_v4();
        let lead = Actor::new(Uuid::new_v4(), UserRole::TeamLead, Some(team));

        assert!(lead.reaches_team(Some(team)));
        assert!(!lead.reaches_team(Some(Uuid::new_v4())));
        assert!(!lead.reaches_team(None));
    }

    #[test]
    fn test_teamlead_without_team_reaches_nothing() {
        let lead = Actor::new(Uuid::new_v4(), UserRole::TeamLead, None);
        assert!(!lead.reaches_team(None));
    }

    #[test]
    fn test_buyer_reaches_only_self() {
        let me = Uuid::new_v4();
        let team = Some(Uuid::new_v4());
        let buyer = Actor::new(me, UserRole::Buyer, team);

        assert!(buyer.reaches_user(me, team));
        assert!(!buyer.reaches_user(Uuid::new_v4(), team));
    }

    #[test]
    fn test_buyer_sees_owned_or_member_flows() {
        let me = Uuid::new_v4();
        let buyer = Actor::new(me, UserRole::Buyer, None);
        let other = Uuid::new_v4();

        assert!(buyer.sees_flow(None, me, false));
        assert!(buyer.sees_flow(None, other, true));
        assert!(!buyer.sees_flow(None, other, false));
    }

    #[test]
    fn test_stats_write_scope() {
        let team = Some(Uuid::new_v4());
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        let buyer = Actor::new(me, UserRole::Buyer, team);
        assert!(buyer.writes_stats_for(me, team));
        assert!(!buyer.writes_stats_for(other, team));

        let lead = Actor::new(me, UserRole::TeamLead, team);
        assert!(lead.writes_stats_for(other, team));
        assert!(!lead.writes_stats_for(other, Some(Uuid::new_v4())));

        let finance = Actor::new(me, UserRole::Finance, None);
        assert!(!finance.writes_stats_for(me, team));
    }
}
