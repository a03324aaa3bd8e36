//! Arbitrary-precision integers held behind handles

use super::Bindings;
use crate::error::BindResult;
use crate::handle::Handle;
use crate::marshal::BigInteger;

impl Bindings {
    /// Parses unsigned decimal digits
    pub fn big_integer_from_str(&self, digits: &str) -> BindResult<Handle> {
        let value: BigInteger = digits.parse()?;
        Ok(self.handles.wrap(value))
    }

    pub fn big_integer_from_u64(&self, value: u64) -> BindResult<Handle> {
        Ok(self.handles.wrap(BigInteger::from(value)))
    }

    /// Integer quotient as a new handle. A zero divisor is an error.
    pub fn big_integer_divided_by(&self, dividend: Handle, divisor: Handle) -> BindResult<Handle> {
        let dividend = self.get::<BigInteger>(dividend)?;
        let divisor = self.get::<BigInteger>(divisor)?;
        Ok(self.handles.wrap(dividend.divided_by(&divisor)?))
    }

    pub fn big_integer_to_f64(&self, value: Handle) -> BindResult<f64> {
        Ok(self.get::<BigInteger>(value)?.to_f64())
    }

    pub fn big_integer_to_string(&self, value: Handle) -> BindResult<String> {
        Ok(self.get::<BigInteger>(value)?.to_string())
    }
}
