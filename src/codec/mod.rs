// Symbol encoders. Both are pure: they build the symbol in local state and
// only touch the caller's surface once encoding has fully succeeded.

pub mod code128;
pub mod qr;
pub mod svg;

pub use code128::{Code128Options, Code128Symbol};
pub use qr::{QrMatrix, QrOptions};
pub use svg::{Rect, SvgDocument, VectorSurface};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("payload is empty")]
    EmptyPayload,

    #[error("character {ch:?} at position {position} is not in Code 128 set B")]
    UnsupportedCharacter { ch: char, position: usize },

    #[error("QR payload must contain digits only")]
    NotNumeric,

    #[error("payload has {len} characters, at most {max} fit")]
    TooLong { len: usize, max: usize },

    #[error("bit stream needs {bits} bits but only {capacity} are available")]
    CapacityExceeded { bits: usize, capacity: usize },
}
