use crate::config::ThemeConfig;
use crate::error::{AppError, codes};
use crate::features::storage::representative;
use crate::store::{Filter, FindQuery, OrderBy, SortDirection, is_valid_field_path, str_field};

use super::models::{ListThemesRequest, THEME_COLLECTION, ThemePage, ThemeView};
use super::service::{TARGET, ThemeService};

/// 规范化后的分页参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page_no: u64,
    pub page_size: u64,
}

impl PageParams {
    /// pageNo 小于 1 按 1 处理；pageSize 限制在 `[1, max_page_size]`
    pub fn normalize(page_no: Option<i64>, page_size: Option<i64>, cfg: &ThemeConfig) -> Self {
        let max = cfg.max_page_size.max(1);
        let page_size = match page_size {
            Some(n) => u64::try_from(n).unwrap_or(0).clamp(1, max),
            None => cfg.default_page_size.clamp(1, max),
        };
        let page_no = page_no.map_or(1, |n| u64::try_from(n).unwrap_or(0).max(1));
        Self { page_no, page_size }
    }

    pub fn skip(&self) -> u64 {
        self.page_size.saturating_mul(self.page_no - 1)
    }
}

/// ceil(total / page_size)
pub fn page_total(total: u64, page_size: u64) -> u64 {
    total.div_ceil(page_size.max(1))
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::precondition(codes::LIST_FAILED, message)
}

impl ThemeService {
    /// 公开主题分页列表，封面/分享图链接按页统一改写。
    pub async fn list(&self, req: ListThemesRequest) -> Result<ThemePage, AppError> {
        let page = PageParams::normalize(req.page_no, req.page_size, &self.settings);

        let filter = match &req.condition {
            Some(condition) => Filter::from_condition(condition),
            None => Ok(Filter::new()),
        }
        .and_then(|f| f.eq("isPublic", true))
        .map_err(|e| invalid(e.to_string()))?;

        let order_by = match req.order_by.as_ref().and_then(|o| {
            o.field
                .as_deref()
                .filter(|f| !f.is_empty())
                .map(|f| (f, o.order_type.as_deref()))
        }) {
            Some((field, order_type)) => {
                if !is_valid_field_path(field) {
                    return Err(invalid(format!("无效的排序字段: {field}")));
                }
                let direction = match order_type {
                    Some(raw) => SortDirection::parse(raw)
                        .ok_or_else(|| invalid(format!("无效的排序方向: {raw}")))?,
                    None => SortDirection::Desc,
                };
                OrderBy {
                    field: field.to_string(),
                    direction,
                }
            }
            None => OrderBy {
                field: "order".to_string(),
                direction: SortDirection::Asc,
            },
        };

        let count_filter = if self.settings.count_respects_condition {
            filter.clone()
        } else {
            Filter::new()
        };
        let total = self.store.count(THEME_COLLECTION, &count_filter).await?;
        let pages = page_total(total, page.page_size);
        if page.page_no > pages {
            tracing::debug!(
                target: TARGET,
                "page {} beyond page total {pages} (total {total})",
                page.page_no
            );
            return Ok(ThemePage {
                items: Vec::new(),
                next_page: false,
                page_no: page.page_no,
                total,
            });
        }

        let query = FindQuery {
            filter,
            skip: page.skip(),
            limit: page.page_size,
            order_by: Some(order_by),
        };
        let docs = self.store.find(THEME_COLLECTION, &query).await?.data;
        if docs.is_empty() {
            return Err(AppError::empty(codes::LIST_EMPTY, "数据不存在"));
        }

        let sample = representative(
            docs.iter()
                .map(|d| str_field(d, "coverImage"))
                .chain(docs.iter().map(|d| str_field(d, "shareImage"))),
        );
        let mapping = self.resolver.mapping_for(sample).await?;

        let items = docs
            .into_iter()
            .map(|doc| {
                let cover = mapping.apply(str_field(&doc, "coverImage"));
                let share = mapping.apply(str_field(&doc, "shareImage"));
                ThemeView::new(doc, cover, share)
            })
            .collect();

        Ok(ThemePage {
            items,
            next_page: pages > page.page_no,
            page_no: page.page_no,
            total,
        })
    }
}
