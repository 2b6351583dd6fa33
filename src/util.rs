use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;
use std::fmt::Write;

use num_traits::ToPrimitive;

/// Formats a value with an SI prefix, three decimals of mantissa.
pub struct Engineering<N>(pub N);

impl<N: ToPrimitive + Display> Display for Engineering<N> {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        let value = self.0.to_f64().ok_or(Error)?;
        if value == 0.0 || !value.is_finite() {
            return write!(f, "{}", self.0);
        }

        let exp = (value.abs().log10() / 3.0).floor() as i32 * 3;
        let mantissa = value / 10f64.powi(exp);
        write!(f, "{:.3}", mantissa)?;
        match exp {
            0 => {}
            -3 => f.write_char('m')?,
            -6 => f.write_char('µ')?,
            -9 => f.write_char('n')?,
            -12 => f.write_char('p')?,
            -15 => f.write_char('f')?,
            -18 => f.write_char('a')?,
            -21 => f.write_char('z')?,
            -24 => f.write_char('y')?,
            3 => f.write_char('k')?,
            6 => f.write_char('M')?,
            9 => f.write_char('G')?,
            12 => f.write_char('T')?,
            15 => f.write_char('P')?,
            18 => f.write_char('E')?,
            21 => f.write_char('Z')?,
            24 => f.write_char('Y')?,
            exp => write!(f, "e{}", exp)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Engineering;

    #[test]
    fn prefixes() {
        assert_eq!(Engineering(1.5e-6).to_string(), "1.500µ");
        assert_eq!(Engineering(-2200.0).to_string(), "-2.200k");
        assert_eq!(Engineering(0.2).to_string(), "200.000m");
        assert_eq!(Engineering(3.0).to_string(), "3.000");
        assert_eq!(Engineering(0.0).to_string(), "0");
    }

    #[test]
    fn out_of_range_exponent() {
        assert_eq!(Engineering(2.5e-48).to_string(), "2.500e-48");
    }
}
