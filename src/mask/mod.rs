//! Segmentation masks and the file helpers used by the tools.

pub mod io;
pub mod traits;
pub mod view;

pub use self::traits::{MaskView, Rows};
pub use self::view::{MaskF32, MaskU8, F32_FOREGROUND_THRESHOLD, U8_FOREGROUND_THRESHOLD};
