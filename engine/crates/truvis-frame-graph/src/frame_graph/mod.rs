//! FrameGraph - 声明式 pass / 资源依赖图
//!
//! 每帧重新构建：声明 Pass 和资源 → compile 剔除无用 Pass 并计算资源生命周期 → execute。
//!
//! # 核心概念
//!
//! - **FrameGraphResource**: 资源某个版本的句柄；写入非本 Pass 创建的资源会产生新版本（重命名），旧句柄随即失效
//! - **FgResourceEntry**: 逻辑资源，同一资源的所有版本共享一个 entry，持有物理资源
//! - **FgResource**: 资源类型 trait，描述如何创建 / 销毁以及读写前的回调
//! - **FgPass / add_callback_pass**: Pass 的两种声明方式
//! - **FgPassBuilder**: setup 阶段声明 read / write / create
//! - **FgPassResources**: execute 阶段按句柄取回物理资源，只允许访问已声明的资源
//!
//! # 使用示例
//!
//! ```ignore
//! use truvis_frame_graph::frame_graph::*;
//!
//! let mut fg = FrameGraph::<HeapAllocator, CommandRecorder>::new();
//! let backbuffer = fg.import("backbuffer", backbuffer_desc, backbuffer);
//!
//! let color = fg.add_callback_pass(
//!     "draw",
//!     |builder| {
//!         let color = builder.create::<Texture>("color", color_desc);
//!         builder.write(color, COLOR_ATTACHMENT)
//!     },
//!     |&color, resources, cmd| {
//!         let texture = resources.get::<Texture>(color).unwrap();
//!         cmd.draw(texture);
//!     },
//! )?;
//!
//! fg.add_callback_pass(
//!     "present",
//!     |builder| {
//!         builder.read(color, SAMPLED)?;
//!         builder.write(backbuffer, PRESENT)
//!     },
//!     |_, _, cmd| cmd.present(),
//! )?;
//!
//! fg.compile()?;
//! fg.execute(&mut cmd, &mut allocator)?;
//! ```
//!
//! # 模块结构
//!
//! - `resource_handle`: 资源句柄和访问标记常量
//! - `resource`: 资源类型 trait 及其类型擦除
//! - `resource_entry` / `resource_node`: 逻辑资源和资源版本
//! - `resource_registry`: 资源注册表
//! - `pass` / `pass_resources`: Pass 定义、builder 和执行期访问器
//! - `graph`: 声明和 compile
//! - `executor`: execute 和执行计划打印
//! - `graphviz`: 调试输出

mod error;
mod executor;
mod graph;
mod graphviz;
mod pass;
mod pass_resources;
mod resource;
mod resource_entry;
mod resource_handle;
mod resource_node;
mod resource_registry;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports
pub use error::{FgError, FgResult};
pub use graph::FrameGraph;
pub use graphviz::{FgDebugWriter, GraphvizColors, GraphvizWriter, RankDir};
pub use pass::{FgPass, FgPassAccess, FgPassBuilder, FgPassNode};
pub use pass_resources::FgPassResources;
pub use resource::FgResource;
pub use resource_entry::FgResourceEntry;
pub use resource_handle::{FLAGS_IGNORED, FrameGraphResource, RESOURCE_INITIAL_VERSION};
pub use resource_node::FgResourceNode;
pub use resource_registry::FgResourceRegistry;
