pub mod assignment;
pub mod callback;
pub mod payment;
pub mod payment_plan;

pub use assignment::{AssignmentStatus, StudentFeeAssignment};
pub use callback::{CallbackOutcome, CallbackPayload, GatewayCallback, GatewayProfile};
pub use payment::{Payment, PaymentContext, PaymentStatus, PaymentTransaction};
pub use payment_plan::{InstallmentSpec, PaymentPlan, PlanType, FULL_PAYMENT_LABEL};
