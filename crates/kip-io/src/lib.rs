//! kip-io: image codecs and filesystem collaborators for the kip
//! pipeline executor.
//!
//! `kip-pipeline` never touches files or codecs; this crate supplies the
//! loader and saver closures an
//! [`ExecutorConfig`](kip_pipeline::ExecutorConfig) plugs in, plus the
//! underlying decode/encode and path helpers.

pub mod codec;
pub mod error;
pub mod files;

pub use codec::{decode, encode, encode_png};
pub use error::IoError;
pub use files::{
    extension, format_for, history_saver, load_path, loader, save_all_steps, save_top, saver,
};
pub use image::ImageFormat;
