//! Base contract system

pub use rc_core::result::ValidationResult;

/// Base contract trait
pub trait Contract<T: ?Sized>: Send + Sync {
    /// Validate the entity
    fn validate(&self, entity: &T) -> ValidationResult;
}
