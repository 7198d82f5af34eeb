pub mod amount;
pub mod percentage;

pub use amount::Amount;
pub use percentage::Percentage;
