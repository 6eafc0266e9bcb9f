//! FrameGraph：声明式 pass / 资源依赖图
//!
//! 与具体图形 API 无关，allocator 和执行上下文都由调用者以泛型参数提供。

pub mod frame_graph;

pub use frame_graph::{FgError, FgResult, FrameGraph, FrameGraphResource};
