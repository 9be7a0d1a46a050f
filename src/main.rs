// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 演示服务器
//!
//! 该二进制在 Tokio 运行时上把 `webcore` 的请求处理核心组装成一个
//! 可以直接运行的小型 Web 服务：
//! - 三阶段处理管线（过滤 / 路由 / 后置）
//! - 内容协商与统一的响应输出
//! - Accept 头解析缓存
//! - 后台管理控制台（CLI 指令交互）

use webcore::{
    AcceptCache, Config, Cookie, DataResponse, ErrorResponse, Exception, Flow, OutputSink,
    ProcessChain, ProcessResult, Processor, RedirectResponse, Request, Responder, Response,
    StringResponse,
};

use log::{debug, error, info, warn};
use log4rs;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    runtime::Builder,
};

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    sync::{Arc, Mutex},
    time::Instant,
};

/// 记录访问日志并种下追踪 Cookie 的前置过滤器
struct AccessLogFilter;

impl Processor for AccessLogFilter {
    fn process(
        &self,
        request: &mut Request,
        result: &mut ProcessResult,
    ) -> Result<Flow, Exception> {
        debug!("{} {}", request.method(), request.path());
        result.add_cookie(Cookie::new("seen", "1"));
        Ok(Flow::Continue)
    }
}

/// 演示用路由：按路径分发到不同类型的响应
struct DemoRouter;

impl Processor for DemoRouter {
    fn process(
        &self,
        request: &mut Request,
        _result: &mut ProcessResult,
    ) -> Result<Flow, Exception> {
        let response: Box<dyn Response> = match request.path() {
            "/" => Box::new(StringResponse::new(
                "<html><body><h1>webcore</h1><p>It works.</p></body></html>",
            )),
            "/api/status" => Box::new(DataResponse::new(serde_json::json!({
                "status": "ok",
                "server": webcore::param::SERVER_NAME,
            }))),
            "/old" => Box::new(RedirectResponse::permanent("/")),
            path => {
                warn!("未匹配到路由：{}，返回404", path);
                Box::new(ErrorResponse::new(404, "Resource not found"))
            }
        };
        Ok(Flow::Terminate(response))
    }
}

/// 为所有响应补充默认语言标注的后置处理器。
/// 即使管线在路由阶段短路，它也会执行。
struct LanguageTagger {
    language: String,
}

impl Processor for LanguageTagger {
    fn process(
        &self,
        _request: &mut Request,
        result: &mut ProcessResult,
    ) -> Result<Flow, Exception> {
        if !result.has_header("Content-Language") {
            result.set_header("Content-Language", &self.language);
        }
        Ok(Flow::Continue)
    }
}

/// # 程序入口点
///
/// 初始化日志与配置，按配置构建异步运行时，然后进入主事件循环。
fn main() {
    // 1. 初始化日志系统：采用 log4rs，通过外部 YAML 灵活配置级别与输出目的地
    log4rs::init_file("config/log4rs.yaml", Default::default()).unwrap();

    // 2. 环境配置加载：从 TOML 文件读取运行参数
    let config = Config::from_toml("config/development.toml");
    info!("配置文件已载入");

    // 3. 异步运行时定制：根据配置文件动态分配工作线程数
    // （from_toml 已把 0 折算为 CPU 核数）
    let worker_threads = config.worker_threads();
    let runtime = Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()
        .unwrap();
    info!("异步运行时就绪，工作线程数：{}", worker_threads);

    runtime.block_on(serve(config));
}

/// 主服务循环：构建处理管线与共享资源，接收并分发连接。
async fn serve(config: Config) {
    // 4. 共享资源初始化：
    // - 管线与 Responder 构建完成后即只读，直接用 Arc 共享
    // - Accept 解析缓存是可变热点，用 Mutex 保护
    let mut chain = ProcessChain::new();
    chain.add_filter(Box::new(AccessLogFilter), 0);
    chain.add_processor(Box::new(DemoRouter), 0);
    chain.add_post_processor(
        Box::new(LanguageTagger {
            language: config.default_language().to_string(),
        }),
        0,
    );
    let chain = Arc::new(chain);
    let responder = Arc::new(Responder::from_config(&config));
    let accept_cache = Arc::new(Mutex::new(AcceptCache::from_capacity(
        config.accept_cache_size(),
    )));

    // 5. 网络层初始化：
    // 支持全地址监听 (0.0.0.0) 或本地回环监听 (127.0.0.1)
    let port: u16 = config.port();
    let address = match config.local() {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    info!("服务端将在{}:{}上监听Socket连接", address, port);
    let socket = SocketAddrV4::new(address, port);

    let listener = match TcpListener::bind(socket).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("无法绑定端口：{}，错误：{}", port, e);
            panic!("无法绑定端口：{}，错误：{}", port, e);
        }
    };
    info!("端口{}绑定完成", port);

    // 6. 服务器状态与生命周期管理
    let shutdown_flag = Arc::new(Mutex::new(false));
    let active_connection = Arc::new(Mutex::new(0u32));

    // 7. 启动交互式管理控制台任务
    // 该任务运行在后台，不阻塞监听循环，提供运维指令支持
    tokio::spawn({
        let shutdown_flag = Arc::clone(&shutdown_flag);
        let active_connection = Arc::clone(&active_connection);
        async move {
            let stdin = tokio::io::stdin();
            let mut reader = BufReader::new(stdin);
            let mut input = String::new();
            loop {
                input.clear();
                if reader.read_line(&mut input).await.is_ok() {
                    let cmd = input.trim();
                    match cmd {
                        "stop" => {
                            let mut flag = shutdown_flag.lock().unwrap();
                            *flag = true;
                            println!("停机指令已激活，服务器将在处理完下一个请求后关闭...");
                            break;
                        }
                        "help" => {
                            println!("== Webcore Help ==");
                            println!("stop   - 发出停机信号");
                            println!("status - 查看当前服务器运行状态");
                            println!("help   - 显示此帮助信息");
                            println!("==================");
                        }
                        "status" => {
                            let active_count = *active_connection.lock().unwrap();
                            println!("== Webcore 状态 ===");
                            println!("当前活跃连接数: {}", active_count);
                            println!("==================");
                        }
                        _ => {
                            println!("无效的命令：{}", cmd);
                        }
                    }
                } else {
                    break;
                }
            }
        }
    });

    let mut id: u128 = 0;

    // 8. 主事件循环 (Accept Loop)
    // 持续接收新连接并将其分发至 Tokio 线程池进行异步处理
    loop {
        if *shutdown_flag.lock().unwrap() {
            info!("主循环接收到停机指令，正在退出...");
            break;
        }

        let (mut stream, addr) = listener.accept().await.unwrap();
        debug!("新的连接：{}", addr);

        let active_connection_arc = Arc::clone(&active_connection);
        let chain_arc = Arc::clone(&chain);
        let responder_arc = Arc::clone(&responder);
        let cache_arc = Arc::clone(&accept_cache);

        debug!("[ID{}]TCP连接已建立", id);

        tokio::spawn(async move {
            {
                let mut lock = active_connection_arc.lock().unwrap();
                *lock += 1;
            }

            handle_connection(&mut stream, id, chain_arc, responder_arc, cache_arc).await;

            {
                let mut lock = active_connection_arc.lock().unwrap();
                *lock -= 1;
            }
        });
        id += 1;
    }
}

/// # 连接处理器
///
/// 负责单个 TCP 流的生命周期：读取解析请求、运行处理管线、输出响应。
async fn handle_connection(
    stream: &mut TcpStream,
    id: u128,
    chain: Arc<ProcessChain>,
    responder: Arc<Responder>,
    accept_cache: Arc<Mutex<AcceptCache>>,
) {
    let mut buffer = vec![0; 4096];

    stream.readable().await.unwrap();

    match stream.try_read(&mut buffer) {
        Ok(0) => return, // 客户端主动关闭连接
        Err(e) => {
            error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
            return;
        }
        _ => {}
    }
    debug!("[ID{}]HTTP请求接收完毕", id);

    let start_time = Instant::now();

    // 1. 协议解析阶段：将字节流转换为结构化的 Request 对象
    // 缓存锁必须在任何 .await 之前归还，否则任务无法跨线程调度
    let parsed = {
        let mut cache = accept_cache.lock().unwrap();
        Request::try_from_with_cache(&buffer, id, &mut cache)
    };
    let mut request = match parsed {
        Ok(req) => req,
        Err(e) => {
            error!("[ID{}]解析HTTP请求失败: {:?}", id, e);
            let response = "HTTP/1.1 400 Bad Request\r\nContent-Length: 11\r\n\r\nBad Request";
            let _ = stream.write_all(response.as_bytes()).await;
            return;
        }
    };
    debug!("[ID{}]成功解析HTTP请求", id);

    // 2. 管线执行阶段：处理器故障降级为 500 错误响应
    let result = match chain.process(&mut request) {
        Ok(result) => result,
        Err(e) => {
            error!("[ID{}]处理管线发生致命故障: {}", id, e);
            let mut fallback = ProcessResult::new();
            fallback.set_response(Box::new(ErrorResponse::internal("Pipeline failure")));
            fallback
        }
    };
    debug!("[ID{}]处理管线执行完毕", id);

    // 3. 响应输出阶段：先在内存中构建完整报文，再一次性写入 Socket
    let mut sink = OutputSink::new(Vec::new());
    if let Err(e) = responder.respond(&request, result, &mut sink) {
        error!("[ID{}]输出响应失败: {}", id, e);
        return;
    }
    let response_bytes = sink.into_inner();

    info!(
        "[ID{}] HTTP/{}, {}, {}, {}, 用时{}ms",
        id,
        request.version(),
        request.path(),
        request.method(),
        request.user_agent(),
        start_time.elapsed().as_millis(),
    );

    let _ = stream.write_all(&response_bytes).await;
    let _ = stream.flush().await;
}
