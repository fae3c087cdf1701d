//! # Slider Driver
//!
//! 运动控制器的设备驱动层：
//! - `Link`: 串口上的单次请求/应答轮替（指令发送、应答清洗与解码）
//! - `StatusPoller`: 轮询机器状态直到控制器报告 `Idle`
//! - `CancelToken`: 外部取消信号（Ctrl+C）
//! - `LinkBuilder`: 端口探测、复位等待、启动横幅清空
//!
//! 整个驱动层是单线程、阻塞式的：同一时刻串口上最多只有一个未完成的请求。

mod builder;
mod cancel;
mod error;
mod link;
pub mod poller;

pub use builder::{DEFAULT_PORTS, LinkBuilder};
pub use cancel::CancelToken;
pub use error::LinkError;
pub use link::{Link, LinkConfig};
pub use poller::{PollConfig, StatusPoller};
