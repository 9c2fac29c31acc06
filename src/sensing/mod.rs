pub mod capture;

pub use capture::{attach_context, ContextCapture};
