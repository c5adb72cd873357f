mod deadline;
mod payment_signature;

pub use deadline::{with_deadline, DeadlineExceeded};
pub use payment_signature::{PaymentSignatureError, PaymentVerifier};
