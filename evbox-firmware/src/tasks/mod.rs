//! Embassy tasks

mod evbox;

pub use evbox::{evbox_task, Controller};
