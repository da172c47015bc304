//! Entity aliases.

pub use super::bizdev_requests::Entity as BizdevRequests;
pub use super::brands::Entity as Brands;
pub use super::communications::Entity as Communications;
pub use super::departments::Entity as Departments;
pub use super::expenses::Entity as Expenses;
pub use super::flow_stats::Entity as FlowStats;
pub use super::flow_users::Entity as FlowUsers;
pub use super::flows::Entity as Flows;
pub use super::geos::Entity as Geos;
pub use super::investment_operations::Entity as InvestmentOperations;
pub use super::partner_payments::Entity as PartnerPayments;
pub use super::payment_methods::Entity as PaymentMethods;
pub use super::salaries::Entity as Salaries;
pub use super::teams::Entity as Teams;
pub use super::users::Entity as Users;
