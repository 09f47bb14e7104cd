use std::{error::Error, fmt};

/// The error returned by every recoverable codec operation.
///
/// A `SerdeErr` always means "not enough buffer space to write" or "not
/// enough remaining bits to read" (or a payload that cannot be decoded,
/// such as invalid UTF-8 in a string). The operation that returned it left
/// the reader/writer state untouched, so the caller may retry with a larger
/// buffer, skip the value, or drop the peer.
///
/// Invalid arguments (a bit count above the type's capacity, `min > max`,
/// a value outside its declared range) are programming errors and panic at
/// the call site instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SerdeErr;

impl fmt::Display for SerdeErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "bit serialization/deserialization error")
    }
}

impl Error for SerdeErr {}
