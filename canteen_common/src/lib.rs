mod helpers;
mod paise;
mod secret;

pub use helpers::parse_boolean_flag;
pub use paise::{Paise, INR_CURRENCY_CODE};
pub use secret::Secret;
