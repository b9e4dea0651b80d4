use std::io::Error as IoError;
use thiserror::Error;
use zbus::Error as ZbusError;

#[derive(Error, Debug)]
pub enum App {
    #[error("I/O operation failed")]
    Io(#[from] IoError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Player error: {0}")]
    Player(#[from] frameplay::App),
    #[error("Zbus error")]
    Zbus(#[from] ZbusError),
}
