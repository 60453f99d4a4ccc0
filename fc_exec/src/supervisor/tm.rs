//! Per-tick control telemetry record

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::SupervisorState;
use crate::{
    ahrs::Attitude,
    pid::{AxisTerms, PidTerms},
    pipeline::{FlightMode, PipelineOutput},
    rate_ctrl::Rates,
};
use fc_if::eqpt::motor::MotorDems;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One row of the control telemetry archive.
///
/// Rates are in degrees/second, angles in hundredths of a degree and
/// pulses in microseconds. Desired values and controller terms are zero on
/// ticks where the pipeline did not run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ControlTm {
    pub time_ms: u64,
    pub state: Option<SupervisorState>,
    pub flight_mode: Option<FlightMode>,
    pub throttle_us: u16,

    pub des_rate_roll: i32,
    pub des_rate_pitch: i32,
    pub des_rate_yaw: i32,
    pub act_rate_roll: i32,
    pub act_rate_pitch: i32,
    pub act_rate_yaw: i32,

    pub des_att_roll: i32,
    pub des_att_pitch: i32,
    pub des_att_yaw: i32,
    pub act_att_roll: i32,
    pub act_att_pitch: i32,
    pub act_att_yaw: i32,

    pub out_roll: i32,
    pub out_pitch: i32,
    pub out_yaw: i32,

    pub rate_p_roll: f64,
    pub rate_i_roll: f64,
    pub rate_d_roll: f64,
    pub rate_p_pitch: f64,
    pub rate_i_pitch: f64,
    pub rate_d_pitch: f64,
    pub rate_p_yaw: f64,
    pub rate_i_yaw: f64,
    pub rate_d_yaw: f64,

    pub att_p_roll: f64,
    pub att_i_roll: f64,
    pub att_d_roll: f64,
    pub att_p_pitch: f64,
    pub att_i_pitch: f64,
    pub att_d_pitch: f64,
    pub att_p_yaw: f64,
    pub att_i_yaw: f64,
    pub att_d_yaw: f64,

    pub motor_fl_us: u32,
    pub motor_fr_us: u32,
    pub motor_bl_us: u32,
    pub motor_br_us: u32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ControlTm {
    /// Start a record with the values known on every tick.
    pub fn new(
        time_ms: u64,
        state: SupervisorState,
        flight_mode: FlightMode,
        throttle_us: u16
    ) -> Self {
        Self {
            time_ms,
            state: Some(state),
            flight_mode: Some(flight_mode),
            throttle_us,
            ..Self::default()
        }
    }

    pub fn set_actual(&mut self, attitude: &Attitude, rates: &Rates) {
        self.act_att_roll = attitude.roll;
        self.act_att_pitch = attitude.pitch;
        self.act_att_yaw = attitude.yaw;
        self.act_rate_roll = rates.roll;
        self.act_rate_pitch = rates.pitch;
        self.act_rate_yaw = rates.yaw;
    }

    /// Fill in everything the pipeline produced.
    pub fn set_pipeline(&mut self, out: &PipelineOutput) {
        self.des_rate_roll = out.desired_rates.roll;
        self.des_rate_pitch = out.desired_rates.pitch;
        self.des_rate_yaw = out.desired_rates.yaw;

        if let Some(att) = out.desired_attitude {
            self.des_att_roll = att.roll;
            self.des_att_pitch = att.pitch;
            self.des_att_yaw = att.yaw;
        }

        self.out_roll = out.axis_outputs.roll;
        self.out_pitch = out.axis_outputs.pitch;
        self.out_yaw = out.axis_outputs.yaw;

        let (r, p, y) = flatten(&out.rate_terms);
        self.rate_p_roll = r.p;
        self.rate_i_roll = r.i;
        self.rate_d_roll = r.d;
        self.rate_p_pitch = p.p;
        self.rate_i_pitch = p.i;
        self.rate_d_pitch = p.d;
        self.rate_p_yaw = y.p;
        self.rate_i_yaw = y.i;
        self.rate_d_yaw = y.d;

        let (r, p, y) = flatten(&out.att_terms);
        self.att_p_roll = r.p;
        self.att_i_roll = r.i;
        self.att_d_roll = r.d;
        self.att_p_pitch = p.p;
        self.att_i_pitch = p.i;
        self.att_d_pitch = p.d;
        self.att_p_yaw = y.p;
        self.att_i_yaw = y.i;
        self.att_d_yaw = y.d;
    }

    pub fn set_motors(&mut self, dems: &MotorDems) {
        let [fl, fr, bl, br] = dems.pulse_us;
        self.motor_fl_us = fl;
        self.motor_fr_us = fr;
        self.motor_bl_us = bl;
        self.motor_br_us = br;
    }
}

fn flatten(terms: &AxisTerms) -> (PidTerms, PidTerms, PidTerms) {
    (terms.roll, terms.pitch, terms.yaw)
}

#[cfg(test)]
mod test {
    use super::*;
    use util::archive::Archiver;

    #[test]
    fn test_archives_as_flat_row() {
        let path = std::env::temp_dir()
            .join(format!("fc_tm_test_{}", std::process::id()))
            .join("control_tm.csv");

        let mut tm = ControlTm::new(
            5, SupervisorState::Armed, FlightMode::Rate, 1500);
        tm.set_motors(&MotorDems::uniform(1500));

        let mut arch = Archiver::from_abs_path(&path).unwrap();
        arch.serialise(tm).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("time_ms,state,flight_mode,throttle_us,"));
        assert!(header.ends_with("motor_bl_us,motor_br_us"));

        let row = lines.next().unwrap();
        assert!(row.starts_with("5,Armed,Rate,1500,"));
        assert!(row.ends_with("1500,1500,1500,1500"));

        std::fs::remove_file(&path).ok();
    }
}
