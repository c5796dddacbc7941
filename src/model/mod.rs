//! Pure data structures implementing the [`DomainEntity`](crate::framework::DomainEntity) trait.

pub mod product;
pub mod user;

pub use product::*;
pub use user::*;
