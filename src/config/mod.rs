use std::collections::HashMap;
use std::path::Path;
use std::{fs, io};

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::levels::DisplayMode;

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Root {
    /// Keypad settings.
    #[serde(default)]
    pub settings: Settings,
    /// DMX output devices.
    #[serde(default)]
    pub hosts: HashMap<String, Host>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Units levels are typed and shown in.
    #[serde(default)]
    pub display_mode: DisplayMode,
}

/// Host device configuration.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Host {
    Enttec {
        /// Path to a serial device.
        path: Option<String>,
    },
}

/// Read a configuration file, picking the format by extension.
pub fn read_config<T: AsRef<Path>>(path: T) -> io::Result<Root> {
    let path = path.as_ref();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => read_config_json(path),
        _ => read_config_yaml(path),
    }
}

pub fn read_config_yaml<T: AsRef<Path>>(path: T) -> io::Result<Root> {
    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    let root: Root = serde_yaml::from_reader(reader).map_err(|err| {
        error!("Error reading config file: {}", err);
        io::Error::from(io::ErrorKind::InvalidData)
    })?;
    check_config(&root)?;
    Ok(root)
}

pub fn read_config_json<T: AsRef<Path>>(path: T) -> io::Result<Root> {
    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    let root: Root = serde_json::from_reader(reader).map_err(|err| {
        error!("Error reading config file: {}", err);
        io::Error::from(io::ErrorKind::InvalidData)
    })?;
    check_config(&root)?;
    Ok(root)
}

/// Quick sanity check for the configuration.
pub fn check_config(root: &Root) -> io::Result<()> {
    // Two hosts can't share one serial port.
    let mut paths: HashMap<&str, &str> = HashMap::new();
    for (id, host) in &root.hosts {
        match host {
            Host::Enttec { path: Some(path) } => {
                if let Some(other) = paths.insert(path, id) {
                    error!("Hosts {} and {} both use {}", other, id, path);
                    return Err(io::Error::from(io::ErrorKind::InvalidData));
                }
            }
            Host::Enttec { path: None } => {}
        }
    }
    Ok(())
}
