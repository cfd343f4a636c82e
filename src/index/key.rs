use serde::{Deserialize, Serialize};

/// 把任意字符串转换为可安全用作文件名的key
///
/// `[A-Za-z0-9_]` 以外的每个字符都替换为 `_`，字符数保持不变。
/// 不同关键词可能得到相同的key，它们共享同一个索引。
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// 持久化索引的确定性key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey(String);

impl EntityKey {
    pub fn for_subject(subject_id: &str) -> Self {
        Self(sanitize(subject_id))
    }

    pub fn for_keyword(keyword: &str) -> Self {
        Self(sanitize(keyword))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 索引内容的来源，用于在缺失或重建时重新拉取文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Subject {
        subject_id: String,
    },
    Related {
        keyword: String,
        excluding_subject_id: String,
    },
}

/// 一个索引的句柄：key + 文档来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHandle {
    pub key: EntityKey,
    pub source: DocumentSource,
}

impl IndexHandle {
    pub fn subject(subject_id: &str) -> Self {
        Self {
            key: EntityKey::for_subject(subject_id),
            source: DocumentSource::Subject {
                subject_id: subject_id.to_string(),
            },
        }
    }

    pub fn related(keyword: &str, subject_id: &str) -> Self {
        Self {
            key: EntityKey::for_keyword(keyword),
            source: DocumentSource::Related {
                keyword: keyword.to_string(),
                excluding_subject_id: subject_id.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_key_safe(s: &str) -> bool {
        s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    #[test]
    fn test_sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize("wireless mouse"), "wireless_mouse");
        assert_eq!(sanitize("usb-c/hub 3.0"), "usb_c_hub_3_0");
        assert_eq!(sanitize("B07ZPML7NP"), "B07ZPML7NP");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_sanitize_properties() {
        let inputs = [
            "wireless mouse",
            "écouteurs sans fil",
            "../../etc/passwd",
            "日本語 キーボード",
            "tab\tand\nnewline",
            "already_safe_123",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert!(is_key_safe(&once), "{:?} -> {:?}", input, once);
            assert_eq!(once.chars().count(), input.chars().count());
            assert_eq!(sanitize(&once), once);
            assert_eq!(sanitize(input), once);
        }
    }

    #[test]
    fn test_colliding_keywords_share_a_key() {
        assert_eq!(
            EntityKey::for_keyword("wireless mouse"),
            EntityKey::for_keyword("wireless-mouse")
        );
    }

    #[test]
    fn test_handles() {
        let subject = IndexHandle::subject("X1");
        assert_eq!(subject.key.as_str(), "X1");

        let related = IndexHandle::related("wireless mouse", "X1");
        assert_eq!(related.key.to_string(), "wireless_mouse");
        assert_eq!(
            related.source,
            DocumentSource::Related {
                keyword: "wireless mouse".to_string(),
                excluding_subject_id: "X1".to_string(),
            }
        );
    }
}
