mod document;
mod event;

pub use document::Document;
pub use event::{DocumentEvent, EventType};
