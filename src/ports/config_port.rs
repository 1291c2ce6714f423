//! Configuration access port trait.

use crate::domain::error::PostesterError;

/// Key/value access to sectioned configuration.
///
/// Missing keys are `Ok(None)`. A key that is present but cannot be read as
/// the requested type is an error.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, PostesterError>;
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, PostesterError>;
}
