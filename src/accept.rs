// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 内容协商模块
//!
//! 该模块是请求处理核心的协商引擎，负责将 HTTP `Accept` / `Accept-Language`
//! 风格的头部解析为按权重排列的偏好列表，并回答两类问题：
//! 1. 「客户端是否接受类型 X，权重是多少？」——见 [`Accept::accepts`]。
//! 2. 「在一组候选类型中，哪个最合适？」——见 [`Accept::best_of`] 与
//!    [`Accept::choose_response`]。
//!
//! 通配符（`*`、`type/*`）按大小写不敏感的 glob 语义匹配；
//! 精确条目与通配条目共用同一套权重排序比较器。

use std::cmp::Ordering;

use lazy_static::lazy_static;
use log::warn;
use regex::Regex;

use crate::param::{DEFAULT_ACCEPT, MIME_SHORTCUTS};

lazy_static! {
    /// q 值切分正则。凡是 `;` 之后不符合该格式的参数一律视为没有 q 值。
    static ref Q_VALUE_RE: Regex = Regex::new(r"^([^;]+);q=([\d.]+)$").unwrap();
}

/// 头部种类。决定空头部的兜底行为以及条目的规范化方式。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AcceptKind {
    /// MIME 类型列表（`Accept`）。空头部按 [`DEFAULT_ACCEPT`] 处理。
    Mime,
    /// 语言列表（`Accept-Language`）。条目会做地区标签规范化；
    /// 空头部表示接受任意语言。
    Language,
}

/// 解析后的单个偏好条目。
///
/// 不变量：`priority` 总是落在 `[0.0, 1.0]` 区间内；
/// 未显式给出 q 值的条目权重为 `1.0`。
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptEntry {
    /// 类型或语言标签（可能含通配符）
    pub value: String,
    /// 权重（q 值）
    pub priority: f64,
}

/// 一个已解析的偏好列表。
///
/// 条目保持头部中的书写顺序；`accepts` 按该顺序返回第一个命中的权重。
#[derive(Debug, Clone)]
pub struct Accept {
    kind: AcceptKind,
    entries: Vec<AcceptEntry>,
}

impl Accept {
    /// 从原始头部值构建偏好列表。
    ///
    /// # 兜底规则
    /// - `Mime` 且头部为空：按 `"text/html;q=1.0,*/*;q=0.9"` 解析。
    /// - `Language` 且头部为空：条目列表为空，此时 [`Self::accepts`]
    ///   对任意输入返回 `1.0`（完全开放）。
    pub fn from_header(raw: &str, kind: AcceptKind) -> Self {
        Self {
            kind,
            entries: parse_header(raw, kind),
        }
    }

    /// 从已解析的条目直接构建（配合解析缓存使用）
    pub fn from_entries(entries: Vec<AcceptEntry>, kind: AcceptKind) -> Self {
        Self { kind, entries }
    }

    /// 获取解析出的条目列表
    pub fn entries(&self) -> &[AcceptEntry] {
        &self.entries
    }

    /// 头部种类
    pub fn kind(&self) -> AcceptKind {
        self.kind
    }

    /// 查询客户端对给定类型的接受权重。
    ///
    /// 按条目书写顺序匹配：含 `*` 的条目按大小写不敏感的 glob 匹配，
    /// 其余条目做大小写不敏感的精确比较，返回第一个命中条目的权重。
    ///
    /// 返回 `0.0` 表示「被拒绝」。零权重是哨兵值，必须与
    /// 「合法但很低的非零权重」区分开，因此本方法不返回 `Option`。
    pub fn accepts(&self, value: &str) -> f64 {
        // 空列表意味着完全开放（仅 Language 等场景会出现）
        if self.entries.is_empty() {
            return 1.0;
        }
        for entry in &self.entries {
            if entry.value.contains('*') {
                if glob_match(&entry.value, value) {
                    return entry.priority;
                }
            } else if entry.value.eq_ignore_ascii_case(value) {
                return entry.priority;
            }
        }
        0.0
    }

    /// 用快捷名称查询接受权重，例如 `accepts_shortcut("json")`。
    ///
    /// 名称不在快捷表中时返回 `None`；在表中则返回对应 MIME 的权重。
    pub fn accepts_shortcut(&self, name: &str) -> Option<f64> {
        MIME_SHORTCUTS
            .get(name.to_ascii_lowercase().as_str())
            .map(|mime| self.accepts(mime))
    }

    /// 在候选类型中选出客户端最偏好的一个。
    ///
    /// 排序依据是 [`compare`]：权重高者在前，权重相同时先声明的候选获胜。
    /// 所有候选权重均为零（全部被拒绝）或候选为空时返回 `None`。
    pub fn best_of<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        let mut best: Option<(&'a str, f64)> = None;
        for candidate in candidates {
            let priority = self.accepts(candidate);
            if priority <= 0.0 {
                continue;
            }
            // 严格大于才替换，等价于 compare 的平局规则：先声明者保留
            match best {
                Some((_, best_priority)) if priority <= best_priority => {}
                _ => best = Some((candidate, priority)),
            }
        }
        best.map(|(candidate, _)| candidate)
    }

    /// 对一组按偏好排列的「MIME -> 载荷」映射应用同样的排序，
    /// 返回客户端接受的最佳键值对。映射为空或全部被拒绝时返回 `None`。
    pub fn choose_response<'a, T>(&self, options: &'a [(String, T)]) -> Option<(&'a str, &'a T)> {
        let mut best: Option<(&'a str, &'a T, f64)> = None;
        for (mime, payload) in options {
            let priority = self.accepts(mime);
            if priority <= 0.0 {
                continue;
            }
            match best {
                Some((_, _, best_priority)) if priority <= best_priority => {}
                _ => best = Some((mime.as_str(), payload, priority)),
            }
        }
        best.map(|(mime, payload, _)| (mime, payload))
    }
}

/// 权重排序比较器：权重高者排在前面。
///
/// 注意平局行为：两个权重相等时本函数返回 `Ordering::Less`（左操作数在前），
/// 永远不返回 `Equal`。这个看似不对称的规则是刻意保留的兼容行为，
/// 它让先声明的候选在平局时获胜。该比较器只用于排名，不是通用全序，
/// 不要把它交给 `slice::sort_by` 之类要求全序的接口。
pub fn compare(l: f64, r: f64) -> Ordering {
    if r > l {
        Ordering::Greater
    } else {
        Ordering::Less
    }
}

/// 将原始头部值解析为条目列表。
///
/// 规则（与对外协议逐字节一致）：
/// - 以 `,` 切分；每个 token 去除首尾空白。
/// - token 匹配 `^([^;]+);q=([\d.]+)$` 时提取类型与权重，否则整个 token
///   作为类型、权重取默认值 `1.0`（其他 `;` 参数语法不会导致解析错误）。
/// - 权重被钳制到 `[0.0, 1.0]`。
/// - `Language` 类型的条目会做地区标签规范化（如 `en_us` -> `en-US`）。
pub fn parse_header(raw: &str, kind: AcceptKind) -> Vec<AcceptEntry> {
    let effective = if raw.trim().is_empty() {
        match kind {
            AcceptKind::Mime => DEFAULT_ACCEPT,
            AcceptKind::Language => return vec![],
        }
    } else {
        raw
    };

    let mut entries = Vec::new();
    for token in effective.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (value, priority) = match Q_VALUE_RE.captures(token) {
            Some(caps) => {
                let value = caps[1].trim().to_string();
                let priority = match caps[2].parse::<f64>() {
                    Ok(p) => p.clamp(0.0, 1.0),
                    Err(_) => {
                        warn!("无法解析q值：{}，按默认权重1.0处理", &caps[2]);
                        1.0
                    }
                };
                (value, priority)
            }
            None => (token.to_string(), 1.0),
        };
        let value = match kind {
            AcceptKind::Language => canonical_locale(&value),
            AcceptKind::Mime => value,
        };
        entries.push(AcceptEntry { value, priority });
    }
    entries
}

/// 地区标签规范化：`en_us` -> `en-US`，`zh_hans_cn` -> `zh-Hans-CN`。
///
/// 规则：分隔符统一为 `-`；首个子标签小写；两字母子标签大写（地区码）；
/// 四字母子标签首字母大写（文字码）；其余保持小写。通配符原样保留。
pub fn canonical_locale(token: &str) -> String {
    if token == "*" {
        return token.to_string();
    }
    let parts: Vec<String> = token
        .split(['-', '_'])
        .enumerate()
        .map(|(i, part)| {
            if i == 0 {
                part.to_ascii_lowercase()
            } else if part.len() == 2 {
                part.to_ascii_uppercase()
            } else if part.len() == 4 {
                let mut s = part.to_ascii_lowercase();
                if let Some(first) = s.get_mut(..1) {
                    first.make_ascii_uppercase();
                }
                s
            } else {
                part.to_ascii_lowercase()
            }
        })
        .collect();
    parts.join("-")
}

/// 大小写不敏感的 glob 匹配：转义除 `*` 以外的所有正则元字符，
/// 再把 `*` 展开为 `.*`，整串锚定匹配。
fn glob_match(pattern: &str, value: &str) -> bool {
    let escaped = regex::escape(pattern).replace(r"\*", ".*");
    match Regex::new(&format!("(?i)^{}$", escaped)) {
        Ok(re) => re.is_match(value),
        Err(e) => {
            warn!("通配模式{}编译失败：{}，退化为精确比较", pattern, e);
            pattern.eq_ignore_ascii_case(value)
        }
    }
}
