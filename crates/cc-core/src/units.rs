// cc-core/src/units.rs

use tracing::warn;
use uom::si::f64::ThermodynamicTemperature as UomThermodynamicTemperature;

pub type Temperature = UomThermodynamicTemperature;

/// Offset between the Celsius and Kelvin scales.
pub const CELSIUS_OFFSET: f64 = 273.15;

/// Temperatures below this are taken to be Celsius by the database lookups.
pub const CELSIUS_GUESS_LIMIT: f64 = 50.0;

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn deg_c(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_celsius;
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn to_kelvin(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::kelvin;
    t.get::<kelvin>()
}

#[inline]
pub fn celsius_to_kelvin(t_c: f64) -> f64 {
    to_kelvin(deg_c(t_c))
}

/// Return `t` as Kelvin, treating values below 50 as Celsius.
pub fn normalize_kelvin(t: f64) -> f64 {
    if t < CELSIUS_GUESS_LIMIT {
        let converted = celsius_to_kelvin(t);
        warn!(
            given = t,
            converted, "temperature looks like Celsius, converting to Kelvin"
        );
        converted
    } else {
        t
    }
}
