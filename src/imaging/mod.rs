//! Image decoding and cropping utilities.

mod crop;
mod decode;

pub use crop::crop_box;
pub use decode::{decode_image, decode_image_bytes};
