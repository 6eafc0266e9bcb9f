use super::resource_handle::FrameGraphResource;

/// 资源的一个版本
///
/// 声明字段在创建后不再改变；`ref_count` 和 `producer` 是 compile 阶段的中间状态。
#[derive(Clone, Debug)]
pub struct FgResourceNode {
    name: String,
    id: u32,
    /// 所属 `FgResourceEntry` 的索引
    resource_id: u32,
    /// 创建时捕获的 entry 版本
    version: u32,

    pub(crate) ref_count: u32,
    pub(crate) producer: Option<usize>,
}

impl FgResourceNode {
    pub(crate) fn new(name: impl Into<String>, id: u32, resource_id: u32, version: u32) -> Self {
        Self {
            name: name.into(),
            id,
            resource_id,
            version,
            ref_count: 0,
            producer: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn handle(&self) -> FrameGraphResource {
        FrameGraphResource::new(self.id)
    }

    #[inline]
    pub fn resource_id(&self) -> u32 {
        self.resource_id
    }

    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// 剔除之后仍然引用该版本的 pass 数量
    #[inline]
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    /// 写入（或创建）该版本的 pass
    #[inline]
    pub fn producer(&self) -> Option<usize> {
        self.producer
    }
}
