//! # Session management
//!
//! A session is one run of an executable. It owns a timestamped directory
//! under `$FC_SW_ROOT/<sessions_dir>` holding the log file, the CSV archives
//! under `arch/` and any JSON snapshots saved during the run.
//!
//! Snapshots are written by a background thread so the control loop never
//! waits on the filesystem.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use erased_serde::Serialize;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::{channel, Receiver, Sender},
    Arc, Mutex,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

// Internal imports
use crate::time;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Format of the timestamp in session directory names.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// How long the save thread waits for new data before checking the stop flag.
const SAVE_POLL_PERIOD: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A struct storing information about the current session
#[derive(Clone)]
pub struct Session {
    /// The root directory for this session
    pub session_root: PathBuf,

    /// The root directory for this session's archives
    pub arch_root: PathBuf,

    /// The path to the session's log file
    pub log_file_path: PathBuf,

    saver: Saver,
}

/// One snapshot waiting to be written.
struct SaveRequest {
    /// Path relative to the session root.
    path: PathBuf,

    data: Box<dyn Serialize + Send>,
}

/// Handle to the background save thread, shared by all clones of a session.
#[derive(Clone)]
struct Saver {
    sender: Sender<SaveRequest>,
    stop: Arc<AtomicBool>,
    handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors associated with the session module.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable (FC_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot create the session directory: {0}")]
    CannotCreateDir(std::io::Error),

    #[error("Cannot start the save thread: {0}")]
    CannotStartSaver(std::io::Error),

    #[error("A session has already been started in this process ({0})")]
    CannotInitEpoch(conquer_once::TryInitError),

    #[error("Cannot get the epoch time, did you forget to initialise the session?")]
    CannotGetEpoch,
}

/// Errors writing a snapshot.
#[derive(Error, Debug)]
enum SaveError {
    #[error("only .json snapshots are supported")]
    UnsupportedExtension,

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start a new session within the given directory.
    ///
    /// This will create a new session directory named `{exec_name}_{timestamp}`
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        SESSION_EPOCH
            .try_init_once(Utc::now)
            .map_err(SessionError::CannotInitEpoch)?;

        let timestamp = SESSION_EPOCH
            .get()
            .ok_or(SessionError::CannotGetEpoch)?
            .format(TIMESTAMP_FORMAT);

        let session_root = crate::host::get_fc_sw_root()
            .map_err(|_| SessionError::SwRootNotSet)?
            .join(sessions_dir)
            .join(format!("{}_{}", exec_name, timestamp));

        let arch_root = session_root.join("arch");
        fs::create_dir_all(&arch_root).map_err(SessionError::CannotCreateDir)?;

        let log_file_path = session_root.join(format!("{}.log", exec_name));

        let saver = Saver::spawn(session_root.clone())
            .map_err(SessionError::CannotStartSaver)?;

        Ok(Session {
            session_root,
            arch_root,
            log_file_path,
            saver,
        })
    }

    /// Exit the session, waiting for the save thread to write everything
    /// queued so far.
    ///
    /// Calling this on any clone ends saving for all of them.
    pub fn exit(self) {
        info!("Stopping save thread");
        self.saver.stop();
        info!("Save thread exited");
    }

    /// Save the given data as JSON to the given session-relative path, in
    /// the background.
    pub fn save<P: AsRef<Path>, T: Serialize + Send + 'static>(&self, path: P, data: T) {
        let request = SaveRequest {
            path: path.as_ref().to_path_buf(),
            data: Box::new(data),
        };

        if self.saver.sender.send(request).is_err() {
            warn!(
                "Could not save to {:?}, the session has already exited",
                path.as_ref()
            );
        }
    }
}

impl Saver {
    fn spawn(session_root: PathBuf) -> std::io::Result<Self> {
        let (sender, receiver) = channel();
        let stop = Arc::new(AtomicBool::new(false));

        let thread_stop = stop.clone();
        let handle = thread::Builder::new()
            .name("save".into())
            .spawn(move || save_thread(thread_stop, session_root, receiver))?;

        Ok(Self {
            sender,
            stop,
            handle: Arc::new(Mutex::new(Some(handle))),
        })
    }

    fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);

        let handle = self.handle
            .lock()
            .map(|mut h| h.take())
            .unwrap_or(None);

        if let Some(h) = handle {
            if h.join().is_err() {
                warn!("Save thread panicked before exiting");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the number of seconds elapsed since the start of the session.
///
/// If the session has not been started yet this returns `0.0`, which allows
/// library code to log before (or without) a session.
pub fn get_elapsed_seconds() -> f64 {
    match SESSION_EPOCH.get() {
        Some(e) => time::duration_to_seconds(Utc::now() - *e)
            .unwrap_or(std::f64::NAN),
        None => 0.0,
    }
}

/// Return a reference to the session's epoch.
///
/// # Panics
/// - This function will panic if the session epoch has not been
///   initialised, which is performed on creating a new Session instance.
pub fn get_epoch() -> &'static DateTime<Utc> {
    match SESSION_EPOCH.get() {
        Some(e) => e,
        None => panic!("Cannot get the session epoch!"),
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn save_thread(
    stop: Arc<AtomicBool>,
    session_root: PathBuf,
    receiver: Receiver<SaveRequest>,
) {
    loop {
        match receiver.recv_timeout(SAVE_POLL_PERIOD) {
            Ok(req) => {
                let full_path = session_root.join(&req.path);
                match write_json(&full_path, &*req.data) {
                    Ok(()) => debug!("Saved {:?}", full_path),
                    Err(e) => warn!("Could not save {:?}: {}", full_path, e),
                }
            },
            // Only stop once the queue has drained
            Err(_) => {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
            }
        }
    }
}

fn write_json(full_path: &Path, data: &dyn Serialize) -> Result<(), SaveError> {
    if full_path.extension().and_then(|s| s.to_str()) != Some("json") {
        return Err(SaveError::UnsupportedExtension);
    }

    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = fs::File::create(full_path)?;
    serde_json::to_writer_pretty(file, data)?;

    Ok(())
}
