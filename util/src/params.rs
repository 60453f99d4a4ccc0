//! Parameter file loading
//!
//! Every module reads its parameters from a TOML file in
//! `$FC_SW_ROOT/params`. Parameter structs use `#[serde(default)]`, so a
//! file only needs the values that differ from the defaults.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use std::path::Path;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable (FC_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot open the parameter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// The file path is relative to the "$FC_SW_ROOT/params" directory
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    let root = crate::host::get_fc_sw_root()
        .map_err(|_| LoadError::SwRootNotSet)?;

    load_path(root.join("params").join(param_file_path))
}

/// Load a parameter file from an explicit path.
pub fn load_path<P, F>(path: F) -> Result<P, LoadError>
where
    P: DeserializeOwned,
    F: AsRef<Path>
{
    let text = read_to_string(path).map_err(LoadError::FileLoadError)?;
    load_str(&text)
}

/// Parse parameters from a TOML string.
pub fn load_str<P>(params_str: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    toml::from_str(params_str).map_err(LoadError::DeserialiseError)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Gains {
        k_p: f64,
        k_i: f64,
        #[serde(default)]
        k_d: f64,
    }

    #[test]
    fn test_load_str() {
        let gains: Gains = load_str("k_p = 2.0\nk_i = 0.5\n").unwrap();
        assert_eq!(gains, Gains { k_p: 2.0, k_i: 0.5, k_d: 0.0 });

        match load_str::<Gains>("k_p = \"fast\"") {
            Err(LoadError::DeserialiseError(_)) => (),
            r => panic!("Expected a deserialise error, got {:?}", r)
        }
    }

    #[test]
    fn test_load_path_missing() {
        match load_path::<Gains, _>("/does/not/exist/gains.toml") {
            Err(LoadError::FileLoadError(_)) => (),
            r => panic!("Expected a file load error, got {:?}", r)
        }
    }
}
