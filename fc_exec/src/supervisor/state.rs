//! Implementations for the Supervisor state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::Arc;

// Internal
use super::{
    ArmDecision, ControlTm, Freshness, Params, StaleInput, Sticks,
    SupervisorError, SupervisorState
};
use crate::{
    ahrs::{OrientationSample, HALF_TURN_CDEG},
    pipeline::{ControlPipeline, FlightMode, Setpoint},
};
use fc_if::eqpt::{motor::{MotorDems, NUM_MOTORS}, rc::PpmFrame};
use util::{
    archive::Archiver,
    maths::wrap_half_turn,
    module::State,
    session::Session
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Flight supervisor state
#[derive(Debug)]
pub struct Supervisor {
    params: Params,

    pipeline: ControlPipeline,

    /// Input timestamps, shared with the watchdog thread.
    freshness: Arc<Freshness>,

    arch_tm: Option<Archiver>,

    state: SupervisorState,

    flight_mode: FlightMode,

    /// Time of the first tick, from which the ESC startup hold is measured.
    startup_ms: Option<u64>,

    last_sticks: Option<Sticks>,

    last_orientation: Option<OrientationSample>,

    /// Heading held in attitude mode.
    ///
    /// Units: hundredths of a degree
    heading_target_cdeg: f64,

    /// An arm request is currently being refused.
    arm_refused: bool,

    /// The mixer clamped at least one motor on the last tick.
    motors_clamped: bool,

    /// Trip from the watchdog thread, reported on the next tick.
    tripped: Option<StaleInput>,
}

/// Data needed to initialise the supervisor.
#[derive(Debug)]
pub struct InitData {
    pub params: Params,
    pub pipeline: ControlPipeline,
    pub freshness: Arc<Freshness>,
}

/// Input data to the supervisor.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Current time of the shared clock.
    ///
    /// Units: milliseconds
    pub now_ms: u64,

    /// A frame received since the last tick.
    pub ppm: Option<PpmFrame>,

    /// An orientation sample published since the last tick.
    pub orientation: Option<OrientationSample>,
}

/// Output of one supervisor tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputData {
    /// Demands to apply to the motors.
    pub dems: MotorDems,

    pub state: SupervisorState,
}

/// Status report for supervisor processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub state: SupervisorState,

    pub flight_mode: FlightMode,

    pub new_ppm: bool,

    pub new_orientation: bool,

    /// The control pipeline ran this tick.
    pub pipeline_ran: bool,

    pub motors_clamped: [bool; NUM_MOTORS],

    pub arm_refused: bool,

    /// The input that sent the supervisor into fail-safe on this tick.
    pub stale: Option<StaleInput>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Supervisor {
    /// Create a new supervisor, validating the parameters.
    ///
    /// Telemetry is not archived until an archiver is attached.
    pub fn new(
        params: Params,
        pipeline: ControlPipeline,
        freshness: Arc<Freshness>
    ) -> Result<Self, SupervisorError> {
        params.validate()?;

        Ok(Self::with_parts(params, pipeline, freshness))
    }

    fn with_parts(
        params: Params,
        pipeline: ControlPipeline,
        freshness: Arc<Freshness>
    ) -> Self {
        Self {
            params,
            pipeline,
            freshness,
            arch_tm: None,
            state: SupervisorState::WaitingForLowThrottle,
            flight_mode: FlightMode::Rate,
            startup_ms: None,
            last_sticks: None,
            last_orientation: None,
            heading_target_cdeg: 0.0,
            arm_refused: false,
            motors_clamped: false,
            tripped: None,
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn flight_mode(&self) -> FlightMode {
        self.flight_mode
    }

    pub fn is_fail_safe(&self) -> bool {
        self.state == SupervisorState::FailSafe
    }

    pub fn freshness(&self) -> &Arc<Freshness> {
        &self.freshness
    }

    /// Enter fail-safe on a trip reported by the watchdog thread.
    pub fn trip(&mut self, stale: StaleInput) {
        if !self.is_fail_safe() {
            self.enter_fail_safe(stale);
            self.tripped = Some(stale);
        }
    }

    /// Hold the motors until the ESCs have finished starting and the pilot
    /// has closed the throttle.
    fn startup_gate(&mut self, now_ms: u64, new_ppm: bool) {
        let start_ms = *self.startup_ms.get_or_insert(now_ms);

        if now_ms.saturating_sub(start_ms) < self.params.esc_startup_hold_ms {
            return;
        }

        let sticks = match (new_ppm, self.last_sticks) {
            (true, Some(s)) => s,
            _ => return,
        };

        if sticks.throttle_low(&self.params) {
            info!("ESC startup complete and throttle low, supervision started");
            self.state = SupervisorState::Disarmed;
            self.freshness.start(now_ms);
        }
        else {
            debug!("Waiting for low throttle ({} us)", sticks.throttle_us);
        }
    }

    fn update_arming(&mut self, sticks: &Sticks, report: &mut StatusReport) {
        let armed = self.state == SupervisorState::Armed;

        match sticks.arm_decision(armed, &self.params) {
            ArmDecision::Arm => {
                info!("Armed");
                self.state = SupervisorState::Armed;
                self.pipeline.reset();
                self.heading_target_cdeg = self.last_orientation
                    .map(|o| o.attitude.yaw as f64)
                    .unwrap_or(0.0);
                self.arm_refused = false;
            },
            ArmDecision::Disarm => {
                info!("Disarmed");
                self.state = SupervisorState::Disarmed;
                self.pipeline.reset();
            },
            ArmDecision::Refuse => {
                if !self.arm_refused {
                    warn!(
                        "Arm refused, throttle ({} us) must be at or below {} us",
                        sticks.throttle_us,
                        self.params.throttle_low_threshold_us
                    );
                }
                self.arm_refused = true;
                report.arm_refused = true;
            },
            ArmDecision::Hold => self.arm_refused = false,
        }
    }

    /// Produce the motor demands for an armed or disarmed tick.
    fn fly(&mut self, tm: &mut ControlTm, report: &mut StatusReport) -> MotorDems {
        let (sticks, sample) = match (self.last_sticks, self.last_orientation) {
            (Some(s), Some(o)) => (s, o),
            _ => {
                self.pipeline.reset();
                return MotorDems::idle();
            }
        };

        tm.set_actual(&sample.attitude, &sample.rates);

        let mode = sticks.flight_mode(&self.params);
        if mode != self.flight_mode {
            info!("Flight mode changed to {:?}", mode);
            self.flight_mode = mode;
            self.heading_target_cdeg = sample.attitude.yaw as f64;
            self.pipeline.reset();
        }

        if self.state != SupervisorState::Armed
            || sticks.throttle_low(&self.params)
        {
            self.pipeline.reset();
            return MotorDems::idle();
        }

        let setpoint = match mode {
            FlightMode::Rate => Setpoint::Rate(sticks.desired_rates(&self.params)),
            FlightMode::Attitude => {
                let yaw_rate_dps = sticks.desired_rates(&self.params).yaw;

                if self.pipeline.att_ctrl.controls_yaw() {
                    // The yaw stick moves the held heading
                    self.heading_target_cdeg = wrap_half_turn(
                        self.heading_target_cdeg
                            + yaw_rate_dps as f64
                                * 100.0
                                * self.params.control_period_s(),
                        HALF_TURN_CDEG as f64
                    );
                }

                Setpoint::Attitude {
                    attitude: sticks.desired_attitude(
                        self.heading_target_cdeg.round() as i32,
                        &self.params
                    ),
                    yaw_rate_dps,
                }
            }
        };

        let out = self.pipeline.tick(
            sticks.throttle_us as u32,
            &setpoint,
            &sample.attitude,
            &sample.rates
        );

        let clamped = out.mix.any_clamped();
        if clamped && !self.motors_clamped {
            warn!("Motor demands clamped: {:?}", out.mix.clamped);
        }
        self.motors_clamped = clamped;

        report.pipeline_ran = true;
        report.motors_clamped = out.mix.clamped;
        tm.set_pipeline(&out);

        out.mix.dems
    }

    fn enter_fail_safe(&mut self, stale: StaleInput) {
        error!("Entering fail-safe from {:?}: {}", self.state, stale);

        self.state = SupervisorState::FailSafe;
        self.pipeline.reset();
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::with_parts(
            Params::default(),
            ControlPipeline::default(),
            Arc::new(Freshness::new())
        )
    }
}

impl State for Supervisor {
    type InitData = InitData;
    type InitError = SupervisorError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = SupervisorError;

    /// Initialise the supervisor, creating the telemetry archive if enabled.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        *self = Self::new(
            init_data.params, init_data.pipeline, init_data.freshness)?;

        if self.params.archive_tm {
            self.arch_tm = Some(Archiver::from_path(
                session, "supervisor/control_tm.csv")?);
        }

        Ok(())
    }

    /// Run one control tick.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let now_ms = input_data.now_ms;
        let supervising = self.freshness.is_started();

        let mut report = StatusReport {
            state: self.state,
            flight_mode: self.flight_mode,
            new_ppm: input_data.ppm.is_some(),
            new_orientation: input_data.orientation.is_some(),
            pipeline_ran: false,
            motors_clamped: [false; NUM_MOTORS],
            arm_refused: false,
            stale: None,
        };

        if let Some(frame) = input_data.ppm.as_ref() {
            self.last_sticks = Some(Sticks::from_frame(frame, &self.params));
            if supervising {
                self.freshness.mark_ppm(now_ms);
            }
        }

        if let Some(sample) = input_data.orientation {
            self.last_orientation = Some(sample);
            if supervising {
                self.freshness.mark_orientation(now_ms);
            }
        }

        let throttle_us = self.last_sticks.map(|s| s.throttle_us).unwrap_or(0);
        let mut tm = ControlTm::new(
            now_ms, self.state, self.flight_mode, throttle_us);

        let dems = match self.state {
            SupervisorState::FailSafe => {
                report.stale = self.tripped.take();
                MotorDems::idle()
            },
            SupervisorState::WaitingForLowThrottle => {
                self.startup_gate(now_ms, report.new_ppm);
                MotorDems::idle()
            },
            SupervisorState::Armed | SupervisorState::Disarmed => {
                let stale = self.freshness.check(
                    now_ms, &self.params.timeouts(), false);

                match stale {
                    Some(stale) => {
                        self.enter_fail_safe(stale);
                        report.stale = Some(stale);
                        MotorDems::idle()
                    },
                    None => {
                        if let (true, Some(sticks)) = (report.new_ppm, self.last_sticks) {
                            self.update_arming(&sticks, &mut report);
                        }
                        self.fly(&mut tm, &mut report)
                    }
                }
            }
        };

        self.freshness.mark_loop(now_ms);

        report.state = self.state;
        report.flight_mode = self.flight_mode;

        tm.state = Some(self.state);
        tm.flight_mode = Some(self.flight_mode);
        tm.set_motors(&dems);

        if let Some(arch) = self.arch_tm.as_mut() {
            if let Err(e) = arch.serialise(tm) {
                warn!("Could not archive control telemetry: {}", e);
            }
        }

        Ok((OutputData { dems, state: self.state }, report))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{ahrs::Attitude, rate_ctrl::Rates};

    const THROTTLE_LOW: u16 = 1000;
    const SWITCH_OFF: u16 = 1000;
    const SWITCH_ON: u16 = 2000;

    fn params() -> Params {
        Params {
            esc_startup_hold_ms: 100,
            archive_tm: false,
            ..Params::default()
        }
    }

    fn supervisor() -> Supervisor {
        Supervisor::new(
            params(),
            ControlPipeline::default(),
            Arc::new(Freshness::new())
        ).unwrap()
    }

    fn frame(throttle_us: u16, arm_us: u16, mode_us: u16) -> PpmFrame {
        let mut frame = PpmFrame::uniform(1500);
        frame.signals_us[2] = throttle_us;
        frame.signals_us[4] = mode_us;
        frame.signals_us[5] = arm_us;
        frame
    }

    fn level(timestamp_ms: u64) -> OrientationSample {
        OrientationSample {
            attitude: Attitude::default(),
            rates: Rates::default(),
            timestamp_ms,
        }
    }

    fn tick(
        sup: &mut Supervisor,
        now_ms: u64,
        ppm: Option<PpmFrame>
    ) -> (OutputData, StatusReport) {
        sup.proc(&InputData {
            now_ms,
            ppm,
            orientation: Some(level(now_ms)),
        }).unwrap()
    }

    /// Drive the supervisor through startup and arm it, returning the time
    /// of the last tick.
    fn armed() -> (Supervisor, u64) {
        let mut sup = supervisor();
        let idle = frame(THROTTLE_LOW, SWITCH_OFF, SWITCH_OFF);

        let mut t = 0;
        while t <= 100 {
            tick(&mut sup, t, Some(idle));
            t += 5;
        }
        assert_eq!(sup.state(), SupervisorState::Disarmed);

        tick(&mut sup, t, Some(frame(THROTTLE_LOW, SWITCH_ON, SWITCH_OFF)));
        assert_eq!(sup.state(), SupervisorState::Armed);

        (sup, t)
    }

    #[test]
    fn test_startup_holds_for_esc() {
        let mut sup = supervisor();
        let idle = frame(THROTTLE_LOW, SWITCH_OFF, SWITCH_OFF);

        for t in (0..100).step_by(5) {
            let (out, _) = tick(&mut sup, t, Some(idle));
            assert_eq!(out.state, SupervisorState::WaitingForLowThrottle);
            assert!(out.dems.is_idle());
        }

        // Nothing is supervised before startup completes
        assert!(!sup.freshness().is_started());

        tick(&mut sup, 100, Some(idle));
        assert_eq!(sup.state(), SupervisorState::Disarmed);
        assert!(sup.freshness().is_started());
    }

    #[test]
    fn test_startup_needs_low_throttle() {
        let mut sup = supervisor();

        for t in (0..500).step_by(5) {
            let (out, _) = tick(&mut sup, t, Some(frame(1500, SWITCH_OFF, SWITCH_OFF)));
            assert_eq!(out.state, SupervisorState::WaitingForLowThrottle);
            assert!(out.dems.is_idle());
        }

        // Arming from this state is impossible even with a low throttle
        tick(&mut sup, 500, Some(frame(THROTTLE_LOW, SWITCH_ON, SWITCH_OFF)));
        assert_eq!(sup.state(), SupervisorState::Disarmed);
    }

    #[test]
    fn test_arm_and_fly() {
        let (mut sup, t) = armed();

        // Throttle still low so the motors stay idle
        let (out, report) = tick(&mut sup, t + 5, Some(frame(THROTTLE_LOW, SWITCH_ON, SWITCH_OFF)));
        assert!(out.dems.is_idle());
        assert!(!report.pipeline_ran);

        // Level and still with sticks centred, so all motors get the throttle
        let (out, report) = tick(&mut sup, t + 10, Some(frame(1400, SWITCH_ON, SWITCH_OFF)));
        assert!(report.pipeline_ran);
        assert_eq!(out.dems, MotorDems::uniform(1400));
    }

    #[test]
    fn test_arm_refused_with_throttle_open() {
        let mut sup = supervisor();
        let idle = frame(THROTTLE_LOW, SWITCH_OFF, SWITCH_OFF);

        let mut t = 0;
        while t <= 100 {
            tick(&mut sup, t, Some(idle));
            t += 5;
        }

        let (out, report) = tick(&mut sup, t, Some(frame(1500, SWITCH_ON, SWITCH_OFF)));
        assert!(report.arm_refused);
        assert_eq!(out.state, SupervisorState::Disarmed);
        assert!(out.dems.is_idle());

        // Closing the throttle with the switch still on arms
        tick(&mut sup, t + 5, Some(frame(THROTTLE_LOW, SWITCH_ON, SWITCH_OFF)));
        assert_eq!(sup.state(), SupervisorState::Armed);
    }

    #[test]
    fn test_no_disarm_in_flight() {
        let (mut sup, t) = armed();

        let (out, _) = tick(&mut sup, t + 5, Some(frame(1500, SWITCH_OFF, SWITCH_OFF)));
        assert_eq!(out.state, SupervisorState::Armed);
        assert!(!out.dems.is_idle());

        let (out, _) = tick(&mut sup, t + 10, Some(frame(THROTTLE_LOW, SWITCH_OFF, SWITCH_OFF)));
        assert_eq!(out.state, SupervisorState::Disarmed);
        assert!(out.dems.is_idle());
    }

    #[test]
    fn test_stale_orientation_fails_safe() {
        let (mut sup, t) = armed();
        let flying = frame(1500, SWITCH_ON, SWITCH_OFF);

        let (out, _) = tick(&mut sup, t + 5, Some(flying));
        assert!(!out.dems.is_idle());

        // RC keeps coming but the orientation stops
        let mut now = t + 5;
        let mut tripped = None;
        for _ in 0..10 {
            now += 5;
            let (out, report) = sup.proc(&InputData {
                now_ms: now,
                ppm: Some(flying),
                orientation: None,
            }).unwrap();

            if report.stale.is_some() {
                assert!(out.dems.is_idle());
                tripped = report.stale;
                break;
            }
        }

        assert_eq!(tripped, Some(StaleInput::Orientation(30)));
        assert!(sup.is_fail_safe());

        // Fail-safe holds even once the inputs recover
        for i in 1..20 {
            let (out, _) = tick(&mut sup, now + i * 5, Some(flying));
            assert_eq!(out.state, SupervisorState::FailSafe);
            assert!(out.dems.is_idle());
        }
    }

    #[test]
    fn test_stale_ppm_fails_safe() {
        let (mut sup, t) = armed();

        let mut now = t;
        let mut last = None;
        while now < t + 1100 {
            now += 5;
            last = Some(tick(&mut sup, now, None));
            if sup.is_fail_safe() {
                break;
            }
        }

        let (out, report) = last.unwrap();
        assert!(matches!(report.stale, Some(StaleInput::Ppm(age)) if age > 1000));
        assert!(out.dems.is_idle());
    }

    #[test]
    fn test_attitude_mode_levels() {
        let (mut sup, t) = armed();

        // Roll stick right in attitude mode demands a bank, so the left
        // motors speed up
        let mut f = frame(1500, SWITCH_ON, SWITCH_ON);
        f.signals_us[0] = 1750;

        let (out, report) = tick(&mut sup, t + 5, Some(f));
        assert_eq!(report.flight_mode, FlightMode::Attitude);
        assert!(report.pipeline_ran);
        assert!(out.dems.pulse_us[0] > out.dems.pulse_us[1]);
    }

    #[test]
    fn test_heading_hold_across_half_turn() {
        use crate::{att_ctrl::{self, AttCtrl}, mixer::Mixer, rate_ctrl::RateCtrl};

        let att_ctrl = AttCtrl::new(att_ctrl::Params {
            control_yaw: true,
            ..att_ctrl::Params::default()
        }).unwrap();
        let mut sup = Supervisor::new(
            params(),
            ControlPipeline::new(att_ctrl, RateCtrl::default(), Mixer::default()),
            Arc::new(Freshness::new())
        ).unwrap();

        let facing = |yaw, now_ms| OrientationSample {
            attitude: Attitude { roll: 0, pitch: 0, yaw },
            rates: Rates::default(),
            timestamp_ms: now_ms,
        };
        let step = |sup: &mut Supervisor, now_ms, ppm, yaw| {
            sup.proc(&InputData {
                now_ms,
                ppm: Some(ppm),
                orientation: Some(facing(yaw, now_ms)),
            }).unwrap()
        };

        let idle = frame(THROTTLE_LOW, SWITCH_OFF, SWITCH_ON);
        let mut t = 0;
        while t <= 100 {
            step(&mut sup, t, idle, 17500);
            t += 5;
        }

        // Heading captured on arming
        t += 5;
        step(&mut sup, t, frame(THROTTLE_LOW, SWITCH_ON, SWITCH_ON), 17500);
        assert_eq!(sup.state(), SupervisorState::Armed);
        assert_eq!(sup.heading_target_cdeg, 17500.0);

        // Drifting through 180 to -175 leaves a -10 degree error the short
        // way round, so the yaw correction is negative and FL/BR speed up
        t += 5;
        let (out, report) = step(&mut sup, t, frame(1500, SWITCH_ON, SWITCH_ON), -17500);
        assert!(report.pipeline_ran);
        assert_eq!(report.flight_mode, FlightMode::Attitude);
        let m = out.dems.pulse_us;
        assert!(m[0] > m[1] && m[3] > m[2], "{:?}", m);
        assert_eq!(sup.heading_target_cdeg, 17500.0);

        // One second of full right yaw stick moves the target by 500 deg
        let mut full_yaw = frame(1500, SWITCH_ON, SWITCH_ON);
        full_yaw.signals_us[3] = 2000;
        for _ in 0..200 {
            t += 5;
            step(&mut sup, t, full_yaw, 17500);
        }
        assert!(
            (sup.heading_target_cdeg + 4500.0).abs() < 1e-6,
            "target = {}", sup.heading_target_cdeg
        );
    }

    #[test]
    fn test_external_trip() {
        let (mut sup, t) = armed();

        sup.trip(StaleInput::ControlLoop(40));
        let (out, report) = tick(&mut sup, t + 5, Some(frame(1500, SWITCH_ON, SWITCH_OFF)));

        assert_eq!(out.state, SupervisorState::FailSafe);
        assert_eq!(report.stale, Some(StaleInput::ControlLoop(40)));
        assert!(out.dems.is_idle());

        // Reported once, later trips are ignored
        sup.trip(StaleInput::Ppm(1200));
        let (out, report) = tick(&mut sup, t + 10, Some(frame(1500, SWITCH_ON, SWITCH_OFF)));
        assert_eq!(out.state, SupervisorState::FailSafe);
        assert_eq!(report.stale, None);
    }

    #[test]
    fn test_watchdog_trip_ends_in_loop() {
        use crate::{slot::LatestSlot, supervisor::{Timeouts, Watchdog}};
        use std::sync::mpsc::channel;
        use std::time::Duration;
        use util::time::MonoClock;

        let (mut sup, _) = armed();
        let clock = MonoClock::new();
        let trips = Arc::new(LatestSlot::new());

        // Nothing marks the RC link any more, so it goes stale once the
        // clock passes the last tick time
        let (done_tx, done_rx) = channel();
        let watchdog = {
            let trips = trips.clone();
            Watchdog::spawn(
                sup.freshness().clone(),
                Timeouts { ppm_ms: 1, orientation_ms: 10_000, loop_ms: 10_000 },
                clock,
                Duration::from_millis(1),
                move |stale| {
                    trips.publish(stale);
                    done_tx.send(()).ok();
                }
            ).unwrap()
        };
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        watchdog.stop();

        // Handed over on the next cycle, the tick that follows reports it
        let stale = trips.try_take().unwrap();
        assert!(matches!(stale, StaleInput::Ppm(_)));
        sup.trip(stale);

        let (out, report) = sup.proc(&InputData {
            now_ms: 200,
            ppm: None,
            orientation: None,
        }).unwrap();
        assert_eq!(out.state, SupervisorState::FailSafe);
        assert_eq!(report.stale, Some(stale));
        assert!(out.dems.is_idle());
    }
}
