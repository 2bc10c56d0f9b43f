//! Widget cards, providers, device-aware views and the bounded activity
//! timeline.
//!
//! A widget is a plain data card produced by a tool execution or an explicit
//! create call. Views render cards as HTML fragments; which view runs is
//! decided by a composite context (view kind x device class), resolved from
//! the request's User-Agent when only the view kind is known.

pub mod card;
pub mod device;
pub mod provider;
pub mod renderer;
pub mod timeline;
pub mod views;

pub use card::{WidgetAction, WidgetCard};
pub use device::{classify, DeviceClass};
pub use provider::WidgetProvider;
pub use renderer::{ViewRegistry, ViewRegistryError};
pub use timeline::Timeline;
pub use views::{
    escape_html, CardView, DetailView, ListView, MobileCardView, ViewContext, ViewRequest,
    WidgetView,
};
