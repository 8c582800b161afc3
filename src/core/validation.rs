//! Configuration validation support.

use crate::error::ValidationError;

/// Trait for configuration validation.
///
/// [`OverlayMerge`](crate::merge::OverlayMerge) calls this on every merged value
/// before handing it to the cache, so a file that parses but describes an
/// unusable configuration is rejected like a syntax error and the previous
/// value stays cached.
///
/// # Examples
///
/// ```rust
/// use meshconfig_cache::core::Validate;
/// use meshconfig_cache::error::ValidationError;
///
/// struct ListenerConfig {
///     port: u16,
/// }
///
/// impl Validate for ListenerConfig {
///     fn validate(&self) -> Result<(), ValidationError> {
///         if self.port == 0 {
///             return Err(ValidationError::invalid_field("port", "must not be 0"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validate {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Should return a `ValidationError` describing what validation failed.
    fn validate(&self) -> Result<(), ValidationError>;
}
