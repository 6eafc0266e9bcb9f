//! 资源条目
//!
//! 每个逻辑资源对应一个 `FgResourceEntry`，持有物理资源的生命周期状态。
//! 同一个资源的所有版本（`FgResourceNode`）共享同一个 entry。

use super::error::{FgError, FgResult};
use super::resource::FgResourceConcept;
use super::resource_handle::{FrameGraphResource, RESOURCE_INITIAL_VERSION};

pub struct FgResourceEntry<A, C> {
    id: u32,
    /// 当前版本，每次重命名写入后递增
    pub(crate) version: u32,
    imported: bool,

    /// 创建该资源的 pass（compile 后有效）
    pub(crate) producer: Option<usize>,
    /// 最后一个使用该资源的 pass（compile 后有效），执行完后销毁
    pub(crate) last: Option<usize>,

    concept: Box<dyn FgResourceConcept<A, C>>,
}

// new & init
impl<A, C> FgResourceEntry<A, C> {
    pub(crate) fn new(id: u32, imported: bool, concept: Box<dyn FgResourceConcept<A, C>>) -> Self {
        Self {
            id,
            version: RESOURCE_INITIAL_VERSION,
            imported,
            producer: None,
            last: None,
            concept,
        }
    }
}

// lifecycle
impl<A, C> FgResourceEntry<A, C> {
    pub(crate) fn create(&mut self, allocator: &mut A) {
        debug_assert!(self.is_transient(), "imported resources are never created by the graph");
        self.concept.create(allocator);
    }

    pub(crate) fn destroy(&mut self, allocator: &mut A) {
        debug_assert!(self.is_transient(), "imported resources are never destroyed by the graph");
        self.concept.destroy(allocator);
    }

    /// `handle` 只用于错误信息
    pub(crate) fn pre_read(&self, handle: FrameGraphResource, name: &str, flags: u32, context: &mut C) -> FgResult<()> {
        self.ensure_materialized(handle, name)?;
        self.concept.pre_read(flags, context);
        Ok(())
    }

    pub(crate) fn pre_write(&self, handle: FrameGraphResource, name: &str, flags: u32, context: &mut C) -> FgResult<()> {
        self.ensure_materialized(handle, name)?;
        self.concept.pre_write(flags, context);
        Ok(())
    }

    fn ensure_materialized(&self, handle: FrameGraphResource, name: &str) -> FgResult<()> {
        if self.concept.is_materialized() {
            Ok(())
        } else {
            Err(FgError::ResourceNotCreated {
                resource: handle,
                name: name.to_string(),
            })
        }
    }

    pub(crate) fn concept(&self) -> &dyn FgResourceConcept<A, C> {
        self.concept.as_ref()
    }
}

// getter
impl<A, C> FgResourceEntry<A, C> {
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    #[inline]
    pub fn is_imported(&self) -> bool {
        self.imported
    }

    #[inline]
    pub fn is_transient(&self) -> bool {
        !self.imported
    }

    /// 物理资源当前是否存在
    #[inline]
    pub fn is_materialized(&self) -> bool {
        self.concept.is_materialized()
    }

    #[inline]
    pub fn producer(&self) -> Option<usize> {
        self.producer
    }

    #[inline]
    pub fn last(&self) -> Option<usize> {
        self.last
    }

    pub fn describe(&self) -> String {
        self.concept.describe()
    }

    pub fn type_name(&self) -> &'static str {
        self.concept.type_name()
    }
}
