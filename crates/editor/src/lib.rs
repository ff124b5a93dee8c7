//! Cellgrid Editor
//!
//! The controller that ties the crates together: it loads single images or
//! image-sequence folders, keeps the grid layout and fit mode, plays
//! sequences back, and renders or records the grid.

pub mod default_content;
pub mod editor;
pub mod loader;
pub mod playback;
pub mod state;

pub use default_content::{default_circle_image, DEFAULT_IMAGE_NAME};
pub use editor::{read_folder, DecodedSequence, Editor, FolderLoad, FolderScan, LoadTicket};
pub use playback::SequencePlayer;
pub use state::{EditorState, LoadedImage, LoadedSequence};
