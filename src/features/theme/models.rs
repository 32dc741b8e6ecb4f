use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::store::Document;

/// 主题集合
pub const THEME_COLLECTION: &str = "hiface-themes";
/// 形状分类集合
pub const SHAPE_CATEGORY_COLLECTION: &str = "hiface-shape-categories";
/// 形状集合
pub const SHAPE_COLLECTION: &str = "hiface-shapes";

/// 主题详情：原文档字段 + 派生的访问链接
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeView {
    #[serde(flatten)]
    pub fields: Document,
    pub cover_image_url: String,
    pub share_image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_category_list: Option<Vec<ShapeCategoryView>>,
}

impl ThemeView {
    /// 派生字段不回显文档中的同名旧值
    pub fn new(mut fields: Document, cover_image_url: String, share_image_url: String) -> Self {
        for key in ["coverImageUrl", "shareImageUrl", "shapeCategoryList"] {
            fields.remove(key);
        }
        Self {
            fields,
            cover_image_url,
            share_image_url,
            shape_category_list: None,
        }
    }
}

/// 形状分类及其下的形状列表
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeCategoryView {
    #[serde(flatten)]
    pub fields: Document,
    pub category_image_url: String,
    pub shape_list: Vec<ShapeView>,
}

/// 形状；源 ID 为空时不输出对应链接
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeView {
    #[serde(flatten)]
    pub fields: Document,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_reverse_url: Option<String>,
}

/// 分页结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePage {
    pub items: Vec<ThemeView>,
    pub next_page: bool,
    pub page_no: u64,
    pub total: u64,
}

/// 成功响应：`{ code: 0, message: "ok", data }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i64,
    pub message: &'static str,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 0,
            message: "ok",
            data,
        }
    }
}

/// 主题详情请求（JSON body 或 query string）
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct GetThemeRequest {
    /// 主题 ID；缺省时读取默认配置
    #[serde(default)]
    pub theme_id: Option<String>,
    /// 是否附带形状分类（支持 true/1/yes/on）
    #[serde(default, deserialize_with = "deserialize_truthy")]
    #[schema(value_type = Option<bool>)]
    #[param(value_type = Option<bool>)]
    pub need_shapes: bool,
}

/// 主题列表请求
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListThemesRequest {
    /// 页码（从 1 开始，默认 1）
    #[serde(default)]
    pub page_no: Option<i64>,
    /// 每页条数（默认 10）
    #[serde(default)]
    pub page_size: Option<i64>,
    /// 附加等值条件，例如 `{"tag": "summer"}`
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub condition: Option<Map<String, Value>>,
    /// 排序字段与方向
    #[serde(default)]
    pub order_by: Option<OrderByParam>,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderByParam {
    pub field: Option<String>,
    /// asc / desc（默认 desc）
    pub order_type: Option<String>,
}

/// 宽松布尔：bool 原样；数字非 0；字符串 1/true/yes/on（不区分大小写）
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        _ => false,
    }
}

fn deserialize_truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(is_truthy(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthy_accepts_loose_forms() {
        for v in [json!(true), json!(1), json!("YES"), json!(" on "), json!("1")] {
            assert!(is_truthy(&v), "{v}");
        }
        for v in [json!(false), json!(0), json!("no"), json!(null), json!({})] {
            assert!(!is_truthy(&v), "{v}");
        }
    }

    #[test]
    fn get_request_parses_from_json_and_query() {
        let req: GetThemeRequest =
            serde_json::from_value(json!({"themeId": "t1", "needShapes": "true"})).unwrap();
        assert_eq!(req.theme_id.as_deref(), Some("t1"));
        assert!(req.need_shapes);

        let req: GetThemeRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.theme_id.is_none());
        assert!(!req.need_shapes);
    }

    #[test]
    fn theme_view_flattens_fields_without_duplicates() {
        let mut doc = Document::new();
        doc.insert("_id".into(), json!("t1"));
        doc.insert("coverImageUrl".into(), json!("stale"));
        let view = ThemeView::new(doc, "https://a/c.png".into(), String::new());
        let v = serde_json::to_value(&view).unwrap();
        assert_eq!(
            v,
            json!({"_id": "t1", "coverImageUrl": "https://a/c.png", "shareImageUrl": ""})
        );
    }
}
