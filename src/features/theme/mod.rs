//! 主题内容接口：详情（含形状分类）与公开列表。

mod fetcher;
pub mod handler;
pub mod lister;
pub mod models;
pub mod service;
mod shapes;

pub use handler::create_theme_router;
pub use models::{GetThemeRequest, ListThemesRequest, ThemePage, ThemeView};
pub use service::ThemeService;
