//! Apparent solar coordinates from the low-order polynomial series.
//!
//! All series coefficients are fixed astronomical constants (Meeus,
//! *Astronomical Algorithms*, chapters 22, 25 and 28).

/// The quantities the sunset computation needs for one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    /// Geometric mean longitude of the sun, degrees in [0, 360).
    pub mean_longitude: f64,
    /// Mean anomaly of the sun, degrees in [0, 360).
    pub mean_anomaly: f64,
    /// Eccentricity of Earth's orbit.
    pub eccentricity: f64,
    /// Apparent longitude, corrected for nutation and aberration, degrees.
    pub apparent_longitude: f64,
    /// True obliquity of the ecliptic, degrees.
    pub obliquity: f64,
    /// Declination, radians.
    pub declination: f64,
    /// Apparent minus mean solar time, minutes.
    pub equation_of_time: f64,
}

impl SolarPosition {
    /// Evaluate the series at `t` Julian centuries from J2000.0.
    pub fn at(t: f64) -> Self {
        let mean_longitude = (280.46646 + t * (36000.76983 + t * 0.0003032)).rem_euclid(360.0);
        let mean_anomaly = (357.52911 + t * (35999.05029 - t * 0.0001537)).rem_euclid(360.0);
        let eccentricity = 0.016708634 - t * (0.000042037 + t * 0.0000001267);

        let m = mean_anomaly.to_radians();
        let equation_of_center = m.sin() * (1.914602 - t * (0.004817 + t * 0.000014))
            + (2.0 * m).sin() * (0.019993 - t * 0.000101)
            + (3.0 * m).sin() * 0.000289;
        let true_longitude = mean_longitude + equation_of_center;

        // Longitude of the moon's ascending node drives the nutation terms.
        let omega = (125.04 - 1934.136 * t).to_radians();
        let apparent_longitude = true_longitude - 0.00569 - 0.00478 * omega.sin();

        let mean_obliquity = 23.0 + 26.0 / 60.0 + 21.448 / 3600.0
            - (46.8150 * t + 0.00059 * t * t - 0.001813 * t * t * t) / 3600.0;
        let obliquity = mean_obliquity + 0.00256 * omega.cos();

        let eps = obliquity.to_radians();
        let declination = (eps.sin() * apparent_longitude.to_radians().sin()).asin();

        let y = (eps / 2.0).tan().powi(2);
        let l0 = mean_longitude.to_radians();
        let e = eccentricity;
        let equation_of_time = 4.0
            * (y * (2.0 * l0).sin() - 2.0 * e * m.sin()
                + 4.0 * e * y * m.sin() * (2.0 * l0).cos()
                - 0.5 * y * y * (4.0 * l0).sin()
                - 1.25 * e * e * (2.0 * m).sin())
            .to_degrees();

        Self {
            mean_longitude,
            mean_anomaly,
            eccentricity,
            apparent_longitude,
            obliquity,
            declination,
            equation_of_time,
        }
    }

    pub fn declination_degrees(&self) -> f64 {
        self.declination.to_degrees()
    }
}
