use serde_json::Value;

use crate::error::{AppError, codes};
use crate::store::str_field;

use super::models::{GetThemeRequest, THEME_COLLECTION, ThemeView};
use super::service::{TARGET, ThemeService};

impl ThemeService {
    /// 主题详情：解析封面/分享图链接，按需附带形状分类。
    pub async fn get(&self, req: GetThemeRequest) -> Result<ThemeView, AppError> {
        let theme_id = match req.theme_id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => self.default_theme_id().await?.ok_or_else(|| {
                AppError::precondition(codes::THEME_ID_UNSET, "未成功设置themeID")
            })?,
        };

        let reply = self.store.get(THEME_COLLECTION, &theme_id).await?;
        let fetched_ok = reply.ok;
        let Some(doc) = reply.data else {
            return Err(AppError::empty(codes::THEME_NOT_FOUND, "主题不存在"));
        };

        let cover_image_url = self.resolver.resolve(str_field(&doc, "coverImage")).await?;
        let share_image_url = self.resolver.resolve(str_field(&doc, "shareImage")).await?;
        let mut view = ThemeView::new(doc, cover_image_url, share_image_url);

        if req.need_shapes && fetched_ok {
            view.shape_category_list = self.shape_categories(&theme_id).await?;
        }
        Ok(view)
    }

    /// 读取默认主题配置中的 `themeId`
    async fn default_theme_id(&self) -> Result<Option<String>, AppError> {
        let name = &self.settings.default_config_name;
        let data = self.config_source.get(name).await?;
        let theme_id = data
            .as_ref()
            .and_then(|d| d.get("themeId"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        tracing::debug!(target: TARGET, "default theme from config {name}: {theme_id:?}");
        Ok(theme_id)
    }
}
