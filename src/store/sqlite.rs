use std::{collections::HashMap, path::Path, str::FromStr};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    ConnectOptions, QueryBuilder, Row, Sqlite, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
};

use crate::error::CollaboratorError;

use super::{Document, DocumentStore, Filter, FindQuery, ID_FIELD, LookupJoin, StoreReply};

const TARGET: &str = "hiface_backend::store";

/// 以 SQLite 表存放 JSON 文档的文档库实现。
///
/// 所有集合共用一张 `documents` 表，按 `(collection, id)` 定位；
/// 字段过滤与排序通过 JSON1 函数完成，插入顺序（rowid）作为稳定的次级排序。
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pub pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub async fn connect_sqlite(path: &str, wal: bool) -> Result<Self, CollaboratorError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CollaboratorError::Database(format!("create db dir: {e}")))?;
        }

        let opt = SqliteConnectOptions::new()
            .filename(Path::new(path))
            .create_if_missing(true)
            .disable_statement_logging();
        let pool = SqlitePool::connect_with(opt).await?;
        if wal {
            sqlx::query("PRAGMA journal_mode=WAL;")
                .execute(&pool)
                .await
                .ok();
        }
        Ok(Self { pool })
    }

    /// 单连接的内存库（测试与本地演示用）；连接不回收，保证数据在进程内存活。
    pub async fn connect_in_memory() -> Result<Self, CollaboratorError> {
        let opt = SqliteConnectOptions::from_str("sqlite::memory:")?.disable_statement_logging();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opt)
            .await?;
        Ok(Self { pool })
    }

    pub async fn init_schema(&self) -> Result<(), CollaboratorError> {
        let ddl = r#"
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            body TEXT NOT NULL,
            PRIMARY KEY(collection, id)
        );
        CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
        "#;
        sqlx::query(ddl).execute(&self.pool).await?;
        Ok(())
    }

    /// 写入（或覆盖）一条文档，返回其 `_id`。缺少 `_id` 时自动生成。
    ///
    /// 仅供数据导入与测试夹具使用，业务接口不写库。
    pub async fn insert(&self, collection: &str, doc: Value) -> Result<String, CollaboratorError> {
        let Value::Object(mut doc) = doc else {
            return Err(CollaboratorError::InvalidResponse(
                "document must be a JSON object".into(),
            ));
        };
        let id = match doc.get(ID_FIELD).and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => uuid::Uuid::new_v4().simple().to_string(),
        };
        doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        let body = serde_json::to_string(&doc)?;

        sqlx::query(
            "INSERT INTO documents(collection, id, body) VALUES(?, ?, ?)
             ON CONFLICT(collection, id) DO UPDATE SET body = excluded.body",
        )
        .bind(collection)
        .bind(&id)
        .bind(body)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }
}

fn json_path(field: &str) -> String {
    format!("$.{field}")
}

fn decode_body(row: &SqliteRow) -> Result<Document, CollaboratorError> {
    let raw: String = row.try_get("body")?;
    match serde_json::from_str::<Value>(&raw)? {
        Value::Object(doc) => Ok(doc),
        other => Err(CollaboratorError::InvalidResponse(format!(
            "stored document is not an object: {other}"
        ))),
    }
}

/// `je.type = ... AND je.value = ?`：类型与值都须一致（`true` 不等于 `1`）。
fn push_typed_match(qb: &mut QueryBuilder<'_, Sqlite>, value: &Value) {
    match value {
        Value::Bool(true) => {
            qb.push("je.type = 'true'");
        }
        Value::Bool(false) => {
            qb.push("je.type = 'false'");
        }
        Value::Number(n) => {
            qb.push("je.type IN ('integer', 'real') AND je.value = ");
            if let Some(i) = n.as_i64() {
                qb.push_bind(i);
            } else {
                qb.push_bind(n.as_f64().unwrap_or_default());
            }
        }
        Value::String(s) => {
            qb.push("je.type = 'text' AND je.value = ");
            qb.push_bind(s.clone());
        }
        // Filter 只接受标量
        _ => {
            qb.push("0");
        }
    }
}

/// 追加 `AND ...` 过滤子句。数组字段按“包含”匹配，标量字段按相等匹配；对象字段不参与匹配。
fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &Filter) {
    for (field, value) in filter.iter() {
        if value.is_null() {
            qb.push(" AND json_extract(d.body, ");
            qb.push_bind(json_path(field));
            qb.push(") IS NULL");
            continue;
        }
        qb.push(" AND json_type(d.body, ");
        qb.push_bind(json_path(field));
        qb.push(") <> 'object'");
        qb.push(" AND EXISTS (SELECT 1 FROM json_each(d.body, ");
        qb.push_bind(json_path(field));
        qb.push(") AS je WHERE ");
        push_typed_match(qb, value);
        qb.push(")");
    }
}

fn key_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn ping(&self) -> Result<(), CollaboratorError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<StoreReply<Option<Document>>, CollaboratorError> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let doc = row.as_ref().map(decode_body).transpose()?;
        Ok(StoreReply::ok(doc))
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, CollaboratorError> {
        let mut qb =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(1) AS c FROM documents d WHERE d.collection = ");
        qb.push_bind(collection.to_string());
        push_filter(&mut qb, filter);

        let row = qb.build().fetch_one(&self.pool).await?;
        let c: i64 = row.try_get("c")?;
        Ok(u64::try_from(c).unwrap_or(0))
    }

    async fn find(
        &self,
        collection: &str,
        query: &FindQuery,
    ) -> Result<StoreReply<Vec<Document>>, CollaboratorError> {
        let mut qb =
            QueryBuilder::<Sqlite>::new("SELECT d.body FROM documents d WHERE d.collection = ");
        qb.push_bind(collection.to_string());
        push_filter(&mut qb, &query.filter);

        match &query.order_by {
            Some(order) => {
                qb.push(" ORDER BY json_extract(d.body, ");
                qb.push_bind(json_path(&order.field));
                qb.push(") ");
                qb.push(order.direction.as_sql());
                qb.push(", d.rowid ASC");
            }
            None => {
                qb.push(" ORDER BY d.rowid ASC");
            }
        }

        // limit = 0 表示不限条数（SQLite 中 LIMIT -1）
        let limit = if query.limit == 0 {
            -1
        } else {
            i64::try_from(query.limit).unwrap_or(i64::MAX)
        };
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(query.skip).unwrap_or(i64::MAX));

        let rows = qb.build().fetch_all(&self.pool).await?;
        let docs = rows.iter().map(decode_body).collect::<Result<Vec<_>, _>>()?;
        Ok(StoreReply::ok(docs))
    }

    async fn lookup(&self, join: &LookupJoin) -> Result<StoreReply<Vec<Document>>, CollaboratorError> {
        let filter = Filter::new()
            .eq(&join.match_field, join.match_value.clone())
            .map_err(|e| CollaboratorError::Database(format!("invalid match stage: {e}")))?;
        let base = self
            .find(
                &join.collection,
                &FindQuery {
                    filter,
                    ..FindQuery::default()
                },
            )
            .await?;
        let mut docs = base.data;

        let mut keys: Vec<String> = docs
            .iter()
            .filter_map(|d| key_of(d.get(&join.local_field)))
            .collect();
        keys.sort();
        keys.dedup();

        let mut grouped: HashMap<String, Vec<Value>> = HashMap::with_capacity(keys.len());
        if !keys.is_empty() {
            let mut qb =
                QueryBuilder::<Sqlite>::new("SELECT d.body FROM documents d WHERE d.collection = ");
            qb.push_bind(join.from.clone());
            qb.push(" AND json_extract(d.body, ");
            qb.push_bind(json_path(&join.foreign_field));
            qb.push(") IN (");
            let mut separated = qb.separated(", ");
            for key in &keys {
                separated.push_bind(key.clone());
            }
            separated.push_unseparated(") ORDER BY d.rowid ASC");

            let rows = qb.build().fetch_all(&self.pool).await?;
            for row in &rows {
                let foreign = decode_body(row)?;
                if let Some(key) = key_of(foreign.get(&join.foreign_field)) {
                    grouped.entry(key).or_default().push(Value::Object(foreign));
                }
            }
        }

        for doc in docs.iter_mut() {
            let joined = key_of(doc.get(&join.local_field))
                .and_then(|k| grouped.get(&k).cloned())
                .unwrap_or_default();
            doc.insert(join.as_field.clone(), Value::Array(joined));
        }

        tracing::debug!(
            target: TARGET,
            "lookup {} -> {}: {} docs, {} keys",
            join.collection,
            join.from,
            docs.len(),
            keys.len()
        );
        Ok(StoreReply::ok(docs))
    }
}
