pub mod component;
pub mod config;
pub mod entity;
pub mod error;
pub mod group;
pub mod registry;
pub mod storage;
pub(crate) mod util;
pub mod view;

pub use component::Component;
pub use config::{Config, Recycle};
pub use entity::Entity;
pub use error::Error;
pub use group::{Owned, Partial};
pub use registry::Registry;
pub use view::View;
