//! Configuration validation

use super::error::ConfigResult;

/// A configuration section that can check its own invariants
pub trait Validatable {
    /// `Err` names the offending field and the accepted range
    fn validate(&self) -> ConfigResult<()>;

    /// Dotted YAML path of the section, used as the field prefix in errors
    fn section(&self) -> &'static str;

    /// Validate and hand the value back
    fn validated(self) -> ConfigResult<Self>
    where
        Self: Sized,
    {
        self.validate()?;
        Ok(self)
    }
}
