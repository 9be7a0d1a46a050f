// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求结果累加器模块
//!
//! [`ProcessResult`] 在一次请求的处理管线中被所有处理器共享，
//! 累积响应头、Cookie、缓存策略与最终选定的 Response。
//!
//! ## 合并规则
//! - 响应头键名统一规范化为 `Title-Case-With-Dashes`，因此
//!   `content-type` 与 `Content-Type` 指向同一个槽位。
//! - Cookie 按名称（大小写敏感）索引，后写者覆盖先写者。
//! - 缓存策略：Response 自带的策略优先于 Result 自身的兜底策略。
//! - `all_headers()` 的覆盖顺序：自身头 → Response 头 → 缓存策略头，
//!   键冲突时缓存头总是获胜。

use std::collections::HashMap;

use log::error;

use crate::cache_policy::CachePolicy;
use crate::cookie::Cookie;
use crate::response::Response;

/// 将头名称规范化为 `Title-Case-With-Dashes`：
/// 首字母及每个 `-` 之后的字母大写，其余小写。
pub fn normalize_header_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut uppercase_next = true;
    for c in name.chars() {
        if c == '-' {
            result.push('-');
            uppercase_next = true;
        } else if uppercase_next {
            result.extend(c.to_uppercase());
            uppercase_next = false;
        } else {
            result.extend(c.to_lowercase());
        }
    }
    result
}

/// 一次请求的输出累加器。
pub struct ProcessResult {
    headers: HashMap<String, String>,
    cookies: HashMap<String, Cookie>,
    cache_policy: CachePolicy,
    response: Option<Box<dyn Response>>,
    buffer: String,
}

impl Default for ProcessResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessResult {
    pub fn new() -> Self {
        Self {
            headers: HashMap::new(),
            cookies: HashMap::new(),
            cache_policy: CachePolicy::default(),
            response: None,
            buffer: String::new(),
        }
    }

    // --- 响应头 ---

    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers
            .insert(normalize_header_name(name), value.to_string());
    }

    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers.get(&normalize_header_name(name))
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(&normalize_header_name(name))
    }

    pub fn unset_header(&mut self, name: &str) {
        self.headers.remove(&normalize_header_name(name));
    }

    // --- Cookie ---

    pub fn add_cookie(&mut self, cookie: Cookie) {
        self.cookies.insert(cookie.name().to_string(), cookie);
    }

    pub fn get_cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies.get(name)
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub fn delete_cookie(&mut self, name: &str) {
        self.cookies.remove(name);
    }

    pub fn cookies(&self) -> Vec<&Cookie> {
        self.cookies.values().collect()
    }

    // --- Response 槽位 ---

    pub fn set_response(&mut self, response: Box<dyn Response>) {
        self.response = Some(response);
    }

    pub fn response(&self) -> Option<&dyn Response> {
        self.response.as_deref()
    }

    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    /// 取走 Response（Responder 消费用）
    pub fn take_response(&mut self) -> Option<Box<dyn Response>> {
        self.response.take()
    }

    // --- 缓存策略 ---

    pub fn set_cache_policy(&mut self, policy: CachePolicy) {
        self.cache_policy = policy;
    }

    /// 解析后的缓存策略：Response 自带的优先，否则用自身兜底策略
    pub fn cache_policy(&self) -> &CachePolicy {
        match self.response.as_ref().and_then(|r| r.cache_policy()) {
            Some(policy) => policy,
            None => &self.cache_policy,
        }
    }

    // --- 输出缓冲 ---

    /// 处理器的散落输出（诊断用途）。这些内容不会下发给客户端，
    /// Responder 会在输出前排空并记入日志。
    pub fn echo(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// 排空散落输出缓冲
    pub fn take_buffer(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }

    /// 分层合并后的全部响应头。
    ///
    /// 自身头打底，Response 声明的头覆盖之，缓存策略头最后覆盖。
    /// Response 头计算失败时记录日志并以已合并的部分继续（尽力而为）。
    pub fn all_headers(&self) -> HashMap<String, String> {
        let mut merged = self.headers.clone();
        if let Some(response) = &self.response {
            match response.headers() {
                Ok(headers) => {
                    for (name, value) in headers {
                        merged.insert(normalize_header_name(&name), value);
                    }
                }
                Err(e) => {
                    error!("计算Response响应头失败：{}，以已合并的部分头继续", e);
                }
            }
        }
        for (name, value) in self.cache_policy().headers() {
            merged.insert(normalize_header_name(&name), value);
        }
        merged
    }
}
