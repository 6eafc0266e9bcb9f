//! FrameGraph 资源句柄定义
//!
//! 句柄指向某个逻辑资源的某一个版本（`FgResourceNode`），而不是逻辑资源本身。
//! 对同一资源的每次“重命名”写入都会产生一个新的句柄。

use std::fmt;

/// 访问标记：参与引用计数和执行顺序，但不触发 pre-read / pre-write 回调
pub const FLAGS_IGNORED: u32 = u32::MAX;

/// 资源条目的初始版本号
pub const RESOURCE_INITIAL_VERSION: u32 = 1;

/// Graph 内部的资源句柄
///
/// 本质上是 `FgResourceNode` 在 graph 中的索引。
/// 多个句柄可以指向同一个 `FgResourceEntry`（同一块物理资源的不同版本）。
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameGraphResource {
    pub(crate) id: u32,
}

impl FrameGraphResource {
    #[inline]
    pub(crate) fn new(id: u32) -> Self {
        Self { id }
    }

    /// 获取 node id
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub(crate) fn index(&self) -> usize {
        self.id as usize
    }
}

impl From<FrameGraphResource> for u32 {
    fn from(handle: FrameGraphResource) -> Self {
        handle.id
    }
}

impl fmt::Debug for FrameGraphResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FgResource({})", self.id)
    }
}
