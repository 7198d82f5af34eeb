pub mod irm;
pub mod pool;
pub mod token;

// Re-export for easier access
pub use irm::IrmParams;
pub use pool::Pool;
pub use token::Token;
