use num_cpus;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use core::str;
use log::{error, warn};
use std::fs::File;
use std::io::prelude::*;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    port: u16,
    worker_threads: usize,
    local: bool,
    #[serde(default = "default_accept_cache_size")]
    accept_cache_size: usize,
    #[serde(default = "default_mime")]
    default_mime: String,
    #[serde(default = "default_language")]
    default_language: String,
    #[serde(default = "default_enable_compression")]
    enable_compression: bool,
}

fn default_accept_cache_size() -> usize {
    64
}

fn default_mime() -> String {
    "text/html".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_enable_compression() -> bool {
    true
}

impl Config {
    pub fn new() -> Self {
        Self {
            port: 7878,
            worker_threads: 0,
            local: true,
            accept_cache_size: default_accept_cache_size(),
            default_mime: default_mime(),
            default_language: default_language(),
            enable_compression: default_enable_compression(),
        }
    }

    pub fn from_toml(filename: &str) -> Self {
        let mut file = match File::open(filename) {
            Ok(f) => f,
            Err(e) => panic!("no such file {} exception:{}", filename, e),
        };
        let mut str_val = String::new();
        match file.read_to_string(&mut str_val) {
            Ok(s) => s,
            Err(e) => panic!("Error Reading file: {}", e),
        };

        let mut raw_config = match toml::from_str(&str_val) {
            Ok(t) => t,
            Err(_) => {
                error!("无法成功从配置文件构建配置对象，使用默认配置");
                Config::new()
            }
        };
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        if raw_config.accept_cache_size == 0 {
            warn!("accept_cache_size被设置为0，但目前尚不支持禁用缓存，因此该值将被改为64。");
            raw_config.accept_cache_size = 64;
        }
        raw_config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn local(&self) -> bool {
        self.local
    }

    /// Accept 头解析缓存的容量
    pub fn accept_cache_size(&self) -> usize {
        self.accept_cache_size
    }

    /// 响应未声明 MIME 候选时的默认类型
    pub fn default_mime(&self) -> &str {
        &self.default_mime
    }

    /// 内容的默认语言（写入 Content-Language 等场景）
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn enable_compression(&self) -> bool {
        self.enable_compression
    }
}
