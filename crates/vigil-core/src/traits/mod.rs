pub mod recipients;
pub mod source;
pub mod timezone;

pub use recipients::RecipientResolver;
pub use source::AlertDataSource;
pub use timezone::TimezoneOracle;
