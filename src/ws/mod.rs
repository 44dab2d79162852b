//! Relay wire layer: values, protocol, codecs and transport

pub mod codec;
pub mod protocol;
pub mod transport;
pub mod value;
