//! Main flight controller executable entry point.
//!
//! # Architecture
//!
//! The executable runs four threads:
//!
//!     - rc: decodes PPM edges from the capture source into frames
//!     - sensor: reads the IMU at the sample rate and fuses it into an
//!       orientation estimate
//!     - watchdog: checks the freshness of the inputs and of the control
//!       loop. It stops the motors on a stale input and hands the trip to the
//!       control loop, or ends the process itself if the loop has stalled
//!     - main: the control loop, which runs the supervisor every control
//!       period and applies its demands to the motors
//!
//! Frames and orientation samples reach the control loop through single
//! value slots which only ever hold the newest value.
//!
//! On a host the equipment is simulated, see `fc_lib::sim`. A fail-safe
//! stops the motors and ends the process with a non-zero status, since only
//! a reset leaves fail-safe.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use fc_lib::{
    ahrs::{self, OrientationEstimator, OrientationSample},
    att_ctrl::AttCtrl,
    mixer::Mixer,
    params::FcExecParams,
    pipeline::ControlPipeline,
    ppm::RcReceiver,
    rate_ctrl::RateCtrl,
    sim::{SimImu, SimMotors, SimPpmTx},
    slot::LatestSlot,
    supervisor::{self, Freshness, StaleInput, Supervisor, Watchdog},
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, error, info, trace, warn};
use std::process;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::thread;
use std::time::Duration;
use structopt::StructOpt;

// Internal
use fc_if::eqpt::{motor::{MotorDems, MotorSink}, rc::PpmFrame};
use util::{
    host,
    logger::{logger_init, parse_level},
    module::State,
    session::Session,
    time::{MonoClock, PeriodicTimer, TimerWait},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Process exit status after a fail-safe.
const FAILSAFE_EXIT_CODE: i32 = 2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line options.
#[derive(Debug, StructOpt)]
#[structopt(name = "fc_exec", about = "Multirotor flight controller")]
struct Opts {
    /// Stop after this many control cycles, otherwise run until fail-safe.
    #[structopt(long)]
    cycles: Option<u64>,

    /// Minimum log level: info, debug or trace.
    #[structopt(long, default_value = "info")]
    log_level: String,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new(
        "fc_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    let level = parse_level(&opts.log_level)
        .wrap_err("Invalid log level")?;
    logger_init(level, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Flight Controller Executable\n");
    info!("Running on: {}", host::get_host_info());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: FcExecParams = util::params::load("fc_exec.toml")
        .wrap_err("Could not load exec params")?;
    let ahrs_params: ahrs::Params = util::params::load("ahrs.toml")
        .wrap_err("Could not load AHRS params")?;
    let sup_params: supervisor::Params = util::params::load("supervisor.toml")
        .wrap_err("Could not load Supervisor params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let clock = MonoClock::new();
    let freshness = Arc::new(Freshness::new());
    let timeouts = sup_params.timeouts();

    let mut estimator = OrientationEstimator::default();
    estimator.init(ahrs_params, &session)
        .wrap_err("Failed to initialise the OrientationEstimator")?;
    info!("OrientationEstimator init complete");

    let mut supervisor = Supervisor::default();
    supervisor.init(
        supervisor::InitData {
            params: sup_params,
            pipeline: init_pipeline()?,
            freshness: freshness.clone(),
        },
        &session
    ).wrap_err("Failed to initialise the Supervisor")?;
    info!("Supervisor init complete");

    info!("Module initialisation complete\n");

    // ---- START THREADS ----

    let stop = Arc::new(AtomicBool::new(false));
    let motors = Arc::new(Mutex::new(SimMotors::new()));
    let frame_slot = Arc::new(LatestSlot::<PpmFrame>::new());
    let orientation_slot = Arc::new(LatestSlot::<OrientationSample>::new());

    let rc_handle = {
        let mut tx = SimPpmTx::new(exec_params.sim.rc.clone(), stop.clone());
        let mut receiver = RcReceiver::new(frame_slot.clone());

        thread::Builder::new()
            .name("rc".into())
            .spawn(move || receiver.run(&mut tx))
            .wrap_err("Failed to start the RC thread")?
    };

    let sensor_handle = {
        let mut imu = SimImu::new(exec_params.sim.imu.clone());
        let slot = orientation_slot.clone();
        let stop = stop.clone();
        let period = Duration::from_secs_f64(
            estimator.params().sample_period_s());

        thread::Builder::new()
            .name("sensor".into())
            .spawn(move || {
                let mut timer = PeriodicTimer::new(period);

                while !stop.load(Ordering::Relaxed) {
                    let input = ahrs::InputData {
                        reads: estimator.read_sensors(&mut imu),
                        timestamp_ms: clock.now_ms(),
                    };

                    match estimator.proc(&input) {
                        Ok((sample, _)) => {
                            slot.publish(sample);
                        },
                        Err(e) => warn!("Error during orientation estimation: {}", e),
                    }

                    if let TimerWait::Overrun(d) = timer.wait() {
                        debug!("Sensor cycle overran by {:?}", d);
                    }
                }

                debug!("Sensor thread stopped");
            })
            .wrap_err("Failed to start the sensor thread")?
    };

    let trip_slot = Arc::new(LatestSlot::<StaleInput>::new());

    let watchdog = {
        let motors = motors.clone();
        let session = session.clone();
        let trip_slot = trip_slot.clone();

        Watchdog::spawn(
            freshness,
            timeouts,
            clock,
            Duration::from_millis(exec_params.watchdog_period_ms),
            move |stale| {
                stop_motors(&motors);

                match stale {
                    // Nothing else is left to end the process
                    StaleInput::ControlLoop(_) => {
                        error!("Watchdog fail-safe: {}", stale);
                        session.exit();
                        process::exit(FAILSAFE_EXIT_CODE);
                    },
                    _ => {
                        trip_slot.publish(stale);
                    }
                }
            }
        ).wrap_err("Failed to start the watchdog")?
    };

    info!("Threads started");

    // ---- MAIN LOOP ----

    info!("Begining control loop\n");

    let mut timer = PeriodicTimer::new(Duration::from_millis(
        supervisor.params().control_period_ms));
    let mut cycle: u64 = 0;

    loop {
        if let Some(max) = opts.cycles {
            if cycle >= max {
                info!("{} control cycles complete, stopping", max);
                break;
            }
        }

        if let Some(stale) = trip_slot.try_take() {
            supervisor.trip(stale);
        }

        let input = supervisor::InputData {
            now_ms: clock.now_ms(),
            ppm: frame_slot.try_take(),
            orientation: orientation_slot.try_take(),
        };

        let (dems, report) = match supervisor.proc(&input) {
            Ok((o, r)) => {
                trace!("Supervisor status: {:?}", r);
                (o.dems, Some(r))
            },
            Err(e) => {
                warn!("Error during Supervisor processing: {}", e);
                (MotorDems::idle(), None)
            }
        };

        {
            let mut m = motors.lock().unwrap_or_else(|p| p.into_inner());
            for e in m.apply(&dems) {
                warn!("Motor fault: {}", e);
            }
        }

        if supervisor.is_fail_safe() {
            error!("Fail-safe entered, stopping");
            stop_motors(&motors);
            stop.store(true, Ordering::Relaxed);
            if let Some(r) = report {
                session.save("failsafe_status.json", r);
            }
            session.exit();
            process::exit(FAILSAFE_EXIT_CODE);
        }

        if let TimerWait::Overrun(d) = timer.wait() {
            warn!("Control cycle {} overran by {:?}", cycle, d);
        }

        cycle += 1;
    }

    // ---- SHUTDOWN ----

    watchdog.stop();
    stop.store(true, Ordering::Relaxed);
    stop_motors(&motors);

    match rc_handle.join() {
        Ok(stats) => {
            info!("RC receiver stats: {:?}", stats);
            session.save("rc_stats.json", stats);
        },
        Err(_) => warn!("RC thread panicked"),
    }
    if sensor_handle.join().is_err() {
        warn!("Sensor thread panicked");
    }

    session.exit();

    Ok(())
}

/// Build the control pipeline from its parameter files.
fn init_pipeline() -> Result<ControlPipeline, Report> {
    let att_ctrl = AttCtrl::new(
        util::params::load("att_ctrl.toml")
            .wrap_err("Could not load AttCtrl params")?
    ).wrap_err("Failed to initialise AttCtrl")?;

    let rate_ctrl = RateCtrl::new(
        util::params::load("rate_ctrl.toml")
            .wrap_err("Could not load RateCtrl params")?
    ).wrap_err("Failed to initialise RateCtrl")?;

    let mixer = Mixer::new(
        util::params::load("mixer.toml")
            .wrap_err("Could not load Mixer params")?
    ).wrap_err("Failed to initialise the Mixer")?;

    Ok(ControlPipeline::new(att_ctrl, rate_ctrl, mixer))
}

/// Command every motor to idle.
fn stop_motors(motors: &Mutex<SimMotors>) {
    let mut m = motors.lock().unwrap_or_else(|p| p.into_inner());
    for e in m.stop_all() {
        warn!("Could not stop motor: {}", e);
    }
}
