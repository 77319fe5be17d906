pub mod errors;
pub mod events;
pub mod id;
pub mod types;

pub use errors::{ConfigError, TesseraError};
pub use events::EventBus;
pub use id::{new_token, CallbackId, HandleAllocator, WidgetHandle, WindowId};
pub use types::{Orientation, Size, WidgetKind};

pub type Result<T> = std::result::Result<T, TesseraError>;
