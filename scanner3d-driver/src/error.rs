use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScannerError {
    #[error("Serial port error: {0}")]
    SerialError(#[from] serialport::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Link to the scanner is down")]
    NotConnected,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to parse configuration: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("Failed to serialize configuration: {0}")]
    ConfigSerializeError(#[from] toml::ser::Error),
}

/// Reason a façade command was not carried out.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommandRejected {
    #[error("Scanner is not connected")]
    NotConnected,
    #[error("A scan is already running")]
    AlreadyScanning,
    #[error("Cannot move the rig manually while scanning")]
    ScanInProgress,
    #[error("Invalid command argument: {0}")]
    InvalidArgument(String),
    #[error("Failed to send command: {0}")]
    SendFailed(String),
}
