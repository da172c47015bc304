//! Status workflows for salaries and partner payments.
//!
//! # Modules
//!
//! - `salary` - salary review and payout lifecycle
//! - `payment` - partner payment lifecycle
//! - `error` - `WorkflowError`

pub mod error;
pub mod payment;
pub mod salary;

#[cfg(test)]
mod workflow_props;

pub use error::WorkflowError;
pub use payment::{PaymentStatus, PaymentWorkflow};
pub use salary::{SalaryAction, SalaryStatus, SalaryWorkflow};
