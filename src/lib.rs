#[macro_use]
pub mod logging;

pub mod cli;
pub mod config;
pub mod convert;
pub mod notifications;
pub mod routing;
pub mod server;
pub mod service;
pub mod watcher;

pub use config::Settings;
pub use convert::{AsciidoctorConverter, ConvertError, Converter, DocumentMetadata};
pub use notifications::{Broadcast, NotificationBroadcaster, ServerEvent};
pub use routing::{IncludedFile, NavEntry, PathFilter, Route, RouteInfo, RouteTable};
pub use service::{RouteService, RouteServiceHandle};
pub use watcher::{ChangeNotifier, FsEvent, FsWatcher};
