//! 文档数据库抽象。
//!
//! 业务层只读：取单条、计数、条件分页查询、match + lookup 聚合。
//! 每个操作返回带成功标记的 [`StoreReply`] 或 [`CollaboratorError`]。

mod sqlite;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::CollaboratorError;

pub use sqlite::SqliteDocumentStore;

/// 一条文档（JSON 对象，含 `_id`）
pub type Document = Map<String, Value>;

/// 文档主键字段
pub const ID_FIELD: &str = "_id";

/// 协作方回执：`ok` 对应 `*:ok` 成功标记
#[derive(Debug, Clone)]
pub struct StoreReply<T> {
    pub ok: bool,
    pub data: T,
}

impl<T> StoreReply<T> {
    pub fn ok(data: T) -> Self {
        Self { ok: true, data }
    }
}

/// 读取文档中的字符串字段，缺失或非字符串时视为空串。
pub fn str_field<'a>(doc: &'a Document, field: &str) -> &'a str {
    doc.get(field).and_then(Value::as_str).unwrap_or("")
}

/// 校验字段路径：由 `[A-Za-z0-9_]` 组成的段，以 `.` 连接。
pub fn is_valid_field_path(path: &str) -> bool {
    !path.is_empty()
        && path.split('.').all(|seg| {
            !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
        })
}

/// 等值过滤条件（字段路径 → 标量值）。
///
/// 对数组字段按“包含”匹配，与云数据库 `where({ field: value })` 的语义一致。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("无效的字段名: {0}")]
    InvalidField(String),
    #[error("字段 {0} 的取值必须是字符串/数字/布尔/null")]
    NonScalarValue(String),
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从调用方传入的条件对象构建过滤器。
    pub fn from_condition(condition: &Map<String, Value>) -> Result<Self, FilterError> {
        let mut filter = Self::new();
        for (field, value) in condition {
            filter.insert(field, value.clone())?;
        }
        Ok(filter)
    }

    /// 追加等值条件，同名字段覆盖旧值。
    pub fn insert(&mut self, field: &str, value: Value) -> Result<(), FilterError> {
        if !is_valid_field_path(field) {
            return Err(FilterError::InvalidField(field.to_string()));
        }
        if value.is_object() || value.is_array() {
            return Err(FilterError::NonScalarValue(field.to_string()));
        }
        self.conditions.insert(field.to_string(), value);
        Ok(())
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Result<Self, FilterError> {
        self.insert(field, value.into())?;
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.conditions.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// 解析 `asc` / `desc`（不区分大小写）
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

/// where(...).skip().limit().orderBy().get()
#[derive(Debug, Clone, Default)]
pub struct FindQuery {
    pub filter: Filter,
    pub skip: u64,
    pub limit: u64,
    pub order_by: Option<OrderBy>,
}

/// aggregate().match({ match_field: match_value }).lookup({...}).end()
#[derive(Debug, Clone)]
pub struct LookupJoin {
    pub collection: String,
    pub match_field: String,
    pub match_value: Value,
    pub from: String,
    pub local_field: String,
    pub foreign_field: String,
    pub as_field: String,
}

/// 文档数据库协作方
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 探活
    async fn ping(&self) -> Result<(), CollaboratorError>;

    /// doc(id).get()；文档不存在时 `data` 为 None
    async fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<StoreReply<Option<Document>>, CollaboratorError>;

    /// count()
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, CollaboratorError>;

    /// where(...).skip().limit().orderBy().get()
    async fn find(
        &self,
        collection: &str,
        query: &FindQuery,
    ) -> Result<StoreReply<Vec<Document>>, CollaboratorError>;

    /// 左连接聚合：每个匹配文档附带 `as_field` 数组
    async fn lookup(&self, join: &LookupJoin) -> Result<StoreReply<Vec<Document>>, CollaboratorError>;
}
