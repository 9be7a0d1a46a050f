// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 缓存策略模块
//!
//! `CachePolicy` 把抽象的缓存意图（禁用/公开/私有 + 过期秒数）翻译为
//! `Cache-Control` / `Pragma` / `Expires` 三件套响应头。
//!
//! 注意两个时间语义：
//! - `set_expire_at` / `set_expire_duration` 在**配置时刻**折算为秒数快照，
//!   之后不再重新求值。
//! - `Expires` 头的绝对时间在**生成响应头时刻**由当前墙钟加秒数算出，
//!   长寿命请求上反复调用会反映流逝的时间。

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::util::http_date;

/// 缓存可见性
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheVisibility {
    /// 禁止缓存（默认）
    Disable,
    /// 允许共享缓存（CDN、代理）存储
    Public,
    /// 仅允许客户端私有缓存存储
    Private,
}

impl CacheVisibility {
    /// `Cache-Control` 头中使用的标识符
    fn as_str(&self) -> &'static str {
        match self {
            CacheVisibility::Disable => "no-cache",
            CacheVisibility::Public => "public",
            CacheVisibility::Private => "private",
        }
    }
}

/// 一条缓存策略。`expire_seconds` 为 `-1` 表示未设置。
///
/// 不变量：可见性为 `Disable` 或过期秒数不为正时，
/// 生成的响应头总是指示「不缓存」，与可见性枚举的取值无关。
#[derive(Debug, Clone, PartialEq)]
pub struct CachePolicy {
    visibility: CacheVisibility,
    expire_seconds: i64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            visibility: CacheVisibility::Disable,
            expire_seconds: -1,
        }
    }
}

impl CachePolicy {
    pub fn new(visibility: CacheVisibility) -> Self {
        Self {
            visibility,
            expire_seconds: -1,
        }
    }

    pub fn visibility(&self) -> CacheVisibility {
        self.visibility
    }

    pub fn expire_seconds(&self) -> i64 {
        self.expire_seconds
    }

    pub fn set_visibility(&mut self, visibility: CacheVisibility) -> &mut Self {
        self.visibility = visibility;
        self
    }

    /// 设置「从现在起多少秒后过期」
    pub fn set_expire_seconds(&mut self, seconds: i64) -> &mut Self {
        self.expire_seconds = seconds;
        self
    }

    /// 以时长形式设置过期时间，调用时刻折算为秒数
    pub fn set_expire_duration(&mut self, duration: Duration) -> &mut Self {
        self.expire_seconds = duration.as_secs() as i64;
        self
    }

    /// 以绝对时间形式设置过期时间。
    /// 在调用时刻计算 `target - now` 并快照为秒数，之后不再重新求值。
    pub fn set_expire_at(&mut self, target: DateTime<Utc>) -> &mut Self {
        self.expire_seconds = (target - Utc::now()).num_seconds();
        self
    }

    /// 生成缓存相关的响应头（以当前墙钟时间求值 `Expires`）
    pub fn headers(&self) -> HashMap<String, String> {
        self.headers_at(Utc::now())
    }

    /// 以给定时钟生成缓存相关的响应头。测试可以注入固定时钟。
    pub fn headers_at(&self, now: DateTime<Utc>) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        if self.visibility == CacheVisibility::Disable || self.expire_seconds <= 0 {
            // 纪元零点的 Expires 是历史悠久的「立即过期」写法
            let epoch = DateTime::<Utc>::from_timestamp(0, 0).unwrap_or(now);
            headers.insert("Cache-Control".to_string(), "no-cache".to_string());
            headers.insert("Pragma".to_string(), "no-cache".to_string());
            headers.insert("Expires".to_string(), http_date(&epoch));
        } else {
            let max_age = self.expire_seconds;
            let expires = now + chrono::Duration::seconds(max_age);
            headers.insert(
                "Cache-Control".to_string(),
                format!("{}, max-age={}", self.visibility.as_str(), max_age),
            );
            headers.insert("Pragma".to_string(), format!("max-age={}", max_age));
            headers.insert("Expires".to_string(), http_date(&expires));
        }
        headers
    }
}
