use std::num::NonZeroUsize;

use lru::LruCache;

use crate::accept::{AcceptEntry, AcceptKind};

/// 解析结果缓存的键：同一个原始头部值在不同种类下语义不同
fn cache_key(raw: &str, kind: AcceptKind) -> String {
    match kind {
        AcceptKind::Mime => format!("mime:{}", raw),
        AcceptKind::Language => format!("lang:{}", raw),
    }
}

/// Accept 头解析结果的 LRU 缓存。
///
/// 繁忙的服务器会反复收到完全相同的 Accept 字符串（同一浏览器家族的
/// 头部值高度趋同），缓存解析结果可以避免重复的正则匹配开销。
pub struct AcceptCache {
    cache: LruCache<String, Vec<AcceptEntry>>,
}

impl AcceptCache {
    // 根据容量构造
    pub fn from_capacity(capacity: usize) -> Self {
        if capacity == 0 {
            panic!("调用from_capacity时指定的大小是0。如果需要自动设置大小，请在调用处进行处理，而不是传入0");
        }
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap()),
        }
    }

    // 放入
    pub fn push(&mut self, raw: &str, kind: AcceptKind, entries: Vec<AcceptEntry>) {
        self.cache.put(cache_key(raw, kind), entries);
    }

    // 查询
    pub fn find(&mut self, raw: &str, kind: AcceptKind) -> Option<&Vec<AcceptEntry>> {
        self.cache.get(&cache_key(raw, kind))
    }

    // 测试
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accept::parse_header;

    #[test]
    fn test_cache_creation() {
        let cache = AcceptCache::from_capacity(10);
        assert_eq!(cache.capacity(), 10);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    #[should_panic(expected = "调用from_capacity时指定的大小是0")]
    fn test_cache_zero_capacity_panics() {
        AcceptCache::from_capacity(0);
    }

    #[test]
    fn test_cache_push_and_find() {
        let mut cache = AcceptCache::from_capacity(3);
        let raw = "text/html;q=0.9,*/*;q=0.1";
        let entries = parse_header(raw, AcceptKind::Mime);

        cache.push(raw, AcceptKind::Mime, entries.clone());
        assert_eq!(cache.len(), 1);

        let found = cache.find(raw, AcceptKind::Mime);
        assert!(found.is_some());
        assert_eq!(found.unwrap(), &entries);
    }

    #[test]
    fn test_cache_kind_is_part_of_key() {
        let mut cache = AcceptCache::from_capacity(3);
        let raw = "en_us";

        cache.push(raw, AcceptKind::Language, parse_header(raw, AcceptKind::Language));

        assert!(cache.find(raw, AcceptKind::Language).is_some());
        assert!(cache.find(raw, AcceptKind::Mime).is_none());
    }

    #[test]
    fn test_cache_lru_eviction() {
        let mut cache = AcceptCache::from_capacity(2);

        cache.push("a", AcceptKind::Mime, parse_header("a", AcceptKind::Mime));
        cache.push("b", AcceptKind::Mime, parse_header("b", AcceptKind::Mime));
        assert_eq!(cache.len(), 2);

        cache.find("a", AcceptKind::Mime);

        cache.push("c", AcceptKind::Mime, parse_header("c", AcceptKind::Mime));
        assert_eq!(cache.len(), 2);

        assert!(cache.find("b", AcceptKind::Mime).is_none());
        assert!(cache.find("a", AcceptKind::Mime).is_some());
        assert!(cache.find("c", AcceptKind::Mime).is_some());
    }

    #[test]
    fn test_cache_not_found() {
        let mut cache = AcceptCache::from_capacity(3);
        assert!(cache.find("nonexistent", AcceptKind::Mime).is_none());
    }
}
