pub mod forecast;
pub mod money;
pub mod period;
pub mod transaction;

pub use forecast::ForecastPoint;
pub use money::Money;
pub use period::DateRange;
pub use transaction::{Flow, TransactionRecord};
