// Crate error type. Every variant states *where* things went wrong.
// The reducer itself never fails; these come from the collaborators around it.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Window init error: {0}")]
    WindowInit(String), // Creating the window failed
    #[error("Window update error: {0}")]
    WindowUpdate(String), // Updating the window buffer failed
    #[error("Camera init error: {0}")]
    CameraInit(String), // Opening/starting the camera failed
    #[error("Camera frame error: {0}")]
    CameraFrame(String), // Grabbing/decoding a frame failed
    #[error("Config error: {0}")]
    Config(String), // Bad config file, env override or subscription option
    #[error("Image error: {0}")]
    Image(String), // PNG encode/decode of the canvas failed
    #[error("Storage error: {0}")]
    Storage(String), // Reading/writing the local store failed
}
