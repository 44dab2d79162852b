//! Client application: session context, event loop and input source

pub mod pointer;
pub mod runtime;
pub mod session;

pub use pointer::PointerInput;
pub use runtime::run;
pub use session::Session;
