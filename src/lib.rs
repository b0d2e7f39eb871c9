pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod ffmpeg;
pub mod logging;
pub mod server;
#[cfg(any(test, feature = "integration-test-api"))]
pub mod test_support;

pub use editor::{Capabilities, EditorConfig, EditorSession, MoveOutcome, PointerInput, TimelineView};
pub use error::AppError;
