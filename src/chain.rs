// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 处理管线模块
//!
//! [`ProcessChain`] 是一个三阶段有序管线：FILTER → PROCESS → POSTPROCESS。
//! 每个阶段由若干 [`Processor`] 组成，按 `(阶段, 优先级, 注册序号)` 升序执行。
//!
//! ## 短路语义
//! 处理器通过返回 [`Flow::Terminate`] 提交终态响应。此时执行游标直接跳到
//! POSTPROCESS 阶段：剩余的 FILTER / PROCESS 处理器全部被跳过，
//! 而所有 POSTPROCESS 处理器仍按配置顺序执行。短路是一等分支，
//! 不是异常控制流。
//!
//! ## 故障语义
//! 处理器返回 `Err` 属于编程或逻辑故障，立即作为致命错误从 `process()`
//! 向上传播，不捕获、不重试。每个处理器在一次管线运行中至多执行一次。
//!
//! ## 并发模型
//! 管线配置在启动期构建完成后即只读；`process()` 执行期间不发生任何
//! 对处理器列表的修改，因此多个请求线程可以安全地共享同一条管线。

use log::debug;

use crate::exception::Exception;
use crate::request::Request;
use crate::response::Response;
use crate::result::ProcessResult;

/// 管线阶段。判别值即排序权重。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// 前置过滤（鉴权、限流等）
    Filter = 0,
    /// 主处理（业务逻辑、路由分发）
    Process = 50,
    /// 后置处理（日志、统一响应头等），短路后仍然执行
    PostProcess = 100,
}

/// 处理器单次执行的产物：继续走管线，或提交终态响应并短路。
pub enum Flow {
    /// 继续执行后续处理器
    Continue,
    /// 提交终态响应。管线会把它写入 Result 并跳到 POSTPROCESS 阶段
    Terminate(Box<dyn Response>),
}

/// 管线处理单元。
///
/// 处理器应当是无状态的（或内部自管理同步），对同一请求的副作用
/// 限定在传入的 Request / Result 上。
pub trait Processor: Send + Sync {
    fn process(&self, request: &mut Request, result: &mut ProcessResult)
        -> Result<Flow, Exception>;
}

/// 优先级的合法区间
const PRECEDENCE_MIN: i32 = -127;
const PRECEDENCE_MAX: i32 = 127;

struct ChainEntry {
    processor: Box<dyn Processor>,
    stage: Stage,
    precedence: i8,
    sequence: u64,
}

/// 三阶段请求处理管线。
///
/// 配置期通过 `add_filter` / `add_processor` / `add_post_processor`
/// 注册处理器；任意插入顺序都不影响最终执行顺序，
/// 排序键 `(stage, precedence, sequence)` 是唯一权威。
pub struct ProcessChain {
    entries: Vec<ChainEntry>,
    next_sequence: u64,
}

impl Default for ProcessChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessChain {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_sequence: 0,
        }
    }

    /// 注册 FILTER 阶段处理器
    pub fn add_filter(&mut self, processor: Box<dyn Processor>, precedence: i32) -> &mut Self {
        self.add(processor, Stage::Filter, precedence)
    }

    /// 注册 PROCESS 阶段处理器
    pub fn add_processor(&mut self, processor: Box<dyn Processor>, precedence: i32) -> &mut Self {
        self.add(processor, Stage::Process, precedence)
    }

    /// 注册 POSTPROCESS 阶段处理器
    pub fn add_post_processor(
        &mut self,
        processor: Box<dyn Processor>,
        precedence: i32,
    ) -> &mut Self {
        self.add(processor, Stage::PostProcess, precedence)
    }

    fn add(&mut self, processor: Box<dyn Processor>, stage: Stage, precedence: i32) -> &mut Self {
        let precedence = precedence.clamp(PRECEDENCE_MIN, PRECEDENCE_MAX) as i8;
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.push(ChainEntry {
            processor,
            stage,
            precedence,
            sequence,
        });
        // 每次插入后全量重排，执行期不再排序
        self.entries
            .sort_by_key(|e| (e.stage, e.precedence, e.sequence));
        self
    }

    /// 已注册的处理器数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 对一个请求运行整条管线，返回累积的处理结果。
    ///
    /// 维护一个「当前阶段下限」游标（初始为 FILTER）：
    /// - 条目阶段低于下限 → 整体跳过（短路的实现机制）。
    /// - 否则把下限抬到该条目的阶段并执行之。
    /// - 处理器返回 `Terminate(response)` → 响应写入 Result，
    ///   下限强制抬到 POSTPROCESS。
    /// - 处理器返回 `Err` → 致命故障，立即向上传播。
    pub fn process(&self, request: &mut Request) -> Result<ProcessResult, Exception> {
        let mut result = ProcessResult::new();
        let mut floor = Stage::Filter;

        for entry in &self.entries {
            if entry.stage < floor {
                continue;
            }
            floor = entry.stage;
            match entry.processor.process(request, &mut result)? {
                Flow::Continue => {}
                Flow::Terminate(response) => {
                    debug!(
                        "处理器(阶段{:?}, 优先级{}, 序号{})提交了终态响应，管线短路至POSTPROCESS",
                        entry.stage, entry.precedence, entry.sequence
                    );
                    result.set_response(response);
                    floor = Stage::PostProcess;
                }
            }
        }
        Ok(result)
    }
}
