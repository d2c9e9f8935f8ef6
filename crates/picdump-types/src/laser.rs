use crate::error::TypeError;
use crate::schema::Record;

/// Laser drive parameters, the last record of the configuration file.
#[derive(Clone, Debug, PartialEq)]
pub struct LaserConfig {
    pub rlw: f64,
    pub x0: f64,
    pub x1: f64,
    pub y1: f64,
    pub rlx: f64,
    pub rly: f64,
    pub e0: f64,
    pub is_laser_rise: bool,
    /// Polarization code, e.g. `"p"` or `"s"`.
    pub polarize: String,
    pub direction: i32,
    pub a0_0: f64,
    pub tau0: f64,
    pub t_0: f64,
    pub lambda: f64,
    pub dy0: f64,
    pub laser_focus: bool,
    pub focus_length: f64,
    pub external_current: f64,
    pub estc: [f64; 3],
}

impl LaserConfig {
    /// # Errors
    ///
    /// Any record lookup error.
    pub fn from_record(record: &Record) -> Result<Self, TypeError> {
        Ok(Self {
            rlw: record.f64("rlw")?,
            x0: record.f64("x0")?,
            x1: record.f64("x1")?,
            y1: record.f64("y1")?,
            rlx: record.f64("rlx")?,
            rly: record.f64("rly")?,
            e0: record.f64("e0")?,
            is_laser_rise: record.logical("is_laser_rise")?,
            polarize: record.text("polarize")?.to_string(),
            direction: record.i32("direction")?,
            a0_0: record.f64("a0_0")?,
            tau0: record.f64("tau0")?,
            t_0: record.f64("t_0")?,
            lambda: record.f64("lambda")?,
            dy0: record.f64("dy0")?,
            laser_focus: record.logical("laser_focus")?,
            focus_length: record.f64("focus_length")?,
            external_current: record.f64("external_current")?,
            estc: record.f64_array("estc")?,
        })
    }

    #[must_use]
    pub fn to_record(&self) -> Record {
        let mut r = Record::new();
        r.put_f64("rlw", self.rlw);
        r.put_f64("x0", self.x0);
        r.put_f64("x1", self.x1);
        r.put_f64("y1", self.y1);
        r.put_f64("rlx", self.rlx);
        r.put_f64("rly", self.rly);
        r.put_f64("e0", self.e0);
        r.put_logical("is_laser_rise", self.is_laser_rise);
        r.put_text("polarize", &self.polarize);
        r.put_i32("direction", self.direction);
        r.put_f64("a0_0", self.a0_0);
        r.put_f64("tau0", self.tau0);
        r.put_f64("t_0", self.t_0);
        r.put_f64("lambda", self.lambda);
        r.put_f64("dy0", self.dy0);
        r.put_logical("laser_focus", self.laser_focus);
        r.put_f64("focus_length", self.focus_length);
        r.put_f64("external_current", self.external_current);
        r.put_f64s("estc", &self.estc);
        r
    }
}

impl Default for LaserConfig {
    fn default() -> Self {
        Self {
            rlw: 1.0,
            x0: 0.0,
            x1: 0.0,
            y1: 0.0,
            rlx: 0.0,
            rly: 0.0,
            e0: 0.0,
            is_laser_rise: true,
            polarize: "p".to_string(),
            direction: 1,
            a0_0: 1.0,
            tau0: 10.0,
            t_0: 0.0,
            lambda: 0.8,
            dy0: 5.0,
            laser_focus: false,
            focus_length: 0.0,
            external_current: 0.0,
            estc: [0.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_roundtrip() {
        let laser = LaserConfig {
            laser_focus: true,
            focus_length: 12.5,
            estc: [1.0, 2.0, 3.0],
            ..LaserConfig::default()
        };
        assert_eq!(LaserConfig::from_record(&laser.to_record()).unwrap(), laser);
    }

    #[test]
    fn missing_field_is_named() {
        let mut record = LaserConfig::default().to_record();
        record.set("estc", Vec::new());
        assert!(matches!(
            LaserConfig::from_record(&record),
            Err(TypeError::LengthMismatch { field: "estc", expected: 3, actual: 0 })
        ));
        assert!(matches!(
            LaserConfig::from_record(&Record::new()),
            Err(TypeError::MissingField { field: "rlw" })
        ));
    }
}
