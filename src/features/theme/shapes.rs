use serde_json::Value;

use crate::error::CollaboratorError;
use crate::features::storage::{PrefixMapping, representative};
use crate::store::{Document, ID_FIELD, LookupJoin, str_field};

use super::models::{SHAPE_CATEGORY_COLLECTION, SHAPE_COLLECTION, ShapeCategoryView, ShapeView};
use super::service::{TARGET, ThemeService};

const SHAPE_LIST: &str = "shapeList";

impl ThemeService {
    /// 主题下的形状分类（左连接形状）。
    ///
    /// 聚合失败或没有分类时返回 `None`，调用方按“无形状”处理。
    pub async fn shape_categories(
        &self,
        theme_id: &str,
    ) -> Result<Option<Vec<ShapeCategoryView>>, CollaboratorError> {
        let join = LookupJoin {
            collection: SHAPE_CATEGORY_COLLECTION.to_string(),
            match_field: "belongThemes".to_string(),
            match_value: Value::String(theme_id.to_string()),
            from: SHAPE_COLLECTION.to_string(),
            local_field: ID_FIELD.to_string(),
            foreign_field: "belongShapeCategory".to_string(),
            as_field: SHAPE_LIST.to_string(),
        };
        let reply = self.store.lookup(&join).await?;
        if !reply.ok || reply.data.is_empty() {
            tracing::debug!(target: TARGET, "theme {theme_id} has no shape categories");
            return Ok(None);
        }

        let categories = reply.data;
        let sample = representative_of(&categories);
        let mapping = self.resolver.mapping_for(sample).await?;
        Ok(Some(annotate_categories(categories, &mapping)))
    }
}

fn shapes_of(category: &Document) -> impl Iterator<Item = &Document> {
    category
        .get(SHAPE_LIST)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

/// 代表 ID：按文档顺序取第一个非空的 imageFileID，
/// 其次 imageReverseFileID，最后 categoryImage。
fn representative_of(categories: &[Document]) -> Option<&str> {
    let field_of_shapes = |field: &'static str| {
        categories
            .iter()
            .flat_map(shapes_of)
            .map(move |shape| str_field(shape, field))
    };
    representative(
        field_of_shapes("imageFileID")
            .chain(field_of_shapes("imageReverseFileID"))
            .chain(categories.iter().map(|c| str_field(c, "categoryImage"))),
    )
}

fn annotate_categories(categories: Vec<Document>, mapping: &PrefixMapping) -> Vec<ShapeCategoryView> {
    categories
        .into_iter()
        .map(|mut fields| {
            let shape_list = match fields.remove(SHAPE_LIST) {
                Some(Value::Array(shapes)) => shapes
                    .into_iter()
                    .filter_map(|s| match s {
                        Value::Object(shape) => Some(annotate_shape(shape, mapping)),
                        _ => None,
                    })
                    .collect(),
                _ => Vec::new(),
            };
            fields.remove("categoryImageUrl");
            let category_image_url = mapping.apply(str_field(&fields, "categoryImage"));
            ShapeCategoryView {
                fields,
                category_image_url,
                shape_list,
            }
        })
        .collect()
}

fn annotate_shape(mut fields: Document, mapping: &PrefixMapping) -> ShapeView {
    fields.remove("imageUrl");
    fields.remove("imageReverseUrl");
    let rewrite = |id: &str| (!id.is_empty()).then(|| mapping.apply(id));
    ShapeView {
        image_url: rewrite(str_field(&fields, "imageFileID")),
        image_reverse_url: rewrite(str_field(&fields, "imageReverseFileID")),
        fields,
    }
}
