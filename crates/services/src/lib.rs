//! # services
//!
//! Application services for word-draw. Each service is wired with `Arc`'d
//! port implementations so the binary can choose storage at startup.

pub mod clock;
pub mod draw_service;
pub mod picker;
pub mod word_service;
pub mod work_service;

pub use clock::SystemClock;
pub use draw_service::DrawService;
pub use picker::RandomPicker;
pub use word_service::{ImportSummary, WordService};
pub use work_service::WorkService;

#[cfg(any(test, feature = "testing"))]
pub use clock::ManualClock;
#[cfg(any(test, feature = "testing"))]
pub use picker::FirstPicker;
