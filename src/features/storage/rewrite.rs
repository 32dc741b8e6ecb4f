/// 存储 ID 中稳定部分的分隔标记：`<prefix>/uploads/<rest>`
pub const UPLOADS_MARKER: &str = "/uploads/";

/// 一批文件 ID 共用的前缀替换规则（旧前缀 → 新前缀）。
///
/// 由同一批次中的一个代表 ID 及其签发结果推导，随后在本地对同批其余 ID 重放，
/// 避免逐个调用签发接口。前提是同一批 ID 由同一存储前缀签发。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrefixMapping {
    old_prefix: String,
    new_prefix: String,
}

impl PrefixMapping {
    pub fn new(old_prefix: impl Into<String>, new_prefix: impl Into<String>) -> Self {
        Self {
            old_prefix: old_prefix.into(),
            new_prefix: new_prefix.into(),
        }
    }

    /// 不做任何替换的映射
    pub fn identity() -> Self {
        Self::default()
    }

    /// 由代表 ID 与其签发后的 URL 推导映射：双方各取 `/uploads/` 之前的部分。
    pub fn derive(file_id: &str, resolved_url: &str) -> Self {
        Self::new(prefix_of(file_id), prefix_of(resolved_url))
    }

    pub fn old_prefix(&self) -> &str {
        &self.old_prefix
    }

    pub fn new_prefix(&self) -> &str {
        &self.new_prefix
    }

    pub fn is_identity(&self) -> bool {
        self.old_prefix == self.new_prefix
    }

    /// 字面替换首次出现的旧前缀；空 ID 返回空串，不含旧前缀时原样返回。
    ///
    /// 旧前缀为空时等价于在 ID 前补上新前缀。
    pub fn apply(&self, file_id: &str) -> String {
        if file_id.is_empty() {
            return file_id.to_string();
        }
        file_id.replacen(&self.old_prefix, &self.new_prefix, 1)
    }
}

/// `/uploads/` 之前的部分；没有标记时为整个字符串。
fn prefix_of(s: &str) -> &str {
    s.split_once(UPLOADS_MARKER).map_or(s, |(prefix, _)| prefix)
}

/// 按顺序取第一个非空 ID 作为本批次的代表。
pub fn representative<'a>(candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    candidates.into_iter().find(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_ID: &str = "cloud://prod-7g2.7072-prod-7g2-1300/uploads/shapes/a.png";
    const SAMPLE_URL: &str = "https://7072-prod-7g2-1300.tcb.qcloud.la/uploads/shapes/a.png";

    #[test]
    fn derive_splits_on_uploads_marker() {
        let m = PrefixMapping::derive(SAMPLE_ID, SAMPLE_URL);
        assert_eq!(m.old_prefix(), "cloud://prod-7g2.7072-prod-7g2-1300");
        assert_eq!(m.new_prefix(), "https://7072-prod-7g2-1300.tcb.qcloud.la");
    }

    #[test]
    fn siblings_keep_their_uploads_suffix() {
        let m = PrefixMapping::derive(SAMPLE_ID, SAMPLE_URL);
        for rest in ["shapes/b.png", "covers/2024/09/x y.jpg", "a/uploads/nested.png"] {
            let id = format!("cloud://prod-7g2.7072-prod-7g2-1300/uploads/{rest}");
            let url = m.apply(&id);
            assert!(url.starts_with("https://7072-prod-7g2-1300.tcb.qcloud.la"));
            assert!(url.ends_with(&format!("/uploads/{rest}")), "{url}");
        }
    }

    #[test]
    fn unchanged_prefix_is_idempotent() {
        let m = PrefixMapping::new("cloud://a", "cloud://a");
        assert!(m.is_identity());
        assert_eq!(m.apply("cloud://a/uploads/x.png"), "cloud://a/uploads/x.png");
    }

    #[test]
    fn empty_and_foreign_ids() {
        let m = PrefixMapping::derive(SAMPLE_ID, SAMPLE_URL);
        assert_eq!(m.apply(""), "");
        assert_eq!(m.apply("cloud://other/uploads/x.png"), "cloud://other/uploads/x.png");
    }

    #[test]
    fn bare_uploads_id_gets_resolved_authority() {
        let m = PrefixMapping::derive(
            "/uploads/covers/a.png",
            "https://cdn.example/uploads/covers/a.png",
        );
        assert_eq!(m.old_prefix(), "");
        assert!(!m.is_identity());
        assert_eq!(
            m.apply("/uploads/covers/a.png"),
            "https://cdn.example/uploads/covers/a.png"
        );
        assert_eq!(
            m.apply("/uploads/covers/b.png"),
            "https://cdn.example/uploads/covers/b.png"
        );
        assert_eq!(m.apply(""), "");
    }

    #[test]
    fn only_first_occurrence_is_replaced() {
        let m = PrefixMapping::new("a", "b");
        assert_eq!(m.apply("a/uploads/a.png"), "b/uploads/a.png");
    }

    #[test]
    fn identity_mapping_never_rewrites() {
        let m = PrefixMapping::identity();
        assert_eq!(m.apply("cloud://x/uploads/y"), "cloud://x/uploads/y");
    }

    #[test]
    fn representative_skips_empty_ids() {
        assert_eq!(representative(["", "b", "c"]), Some("b"));
        assert_eq!(representative(["", ""]), None);
    }
}
