use super::error::{FgError, FgResult};
use super::resource::{FgResource, FgResourceConcept, FgResourceModel};
use super::resource_entry::FgResourceEntry;
use super::resource_handle::{FrameGraphResource, RESOURCE_INITIAL_VERSION};
use super::resource_node::FgResourceNode;

/// 资源注册表
///
/// 持有所有 `FgResourceNode`（版本）和 `FgResourceEntry`（物理资源）。
/// 两者都只增不减，句柄就是 `nodes` 中的下标。
pub struct FgResourceRegistry<A, C> {
    nodes: Vec<FgResourceNode>,
    entries: Vec<FgResourceEntry<A, C>>,
}

impl<A, C> Default for FgResourceRegistry<A, C> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            entries: Vec::new(),
        }
    }
}

// new & init
impl<A, C> FgResourceRegistry<A, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&mut self, num_resources: usize) {
        self.nodes.reserve(num_resources);
        self.entries.reserve(num_resources);
    }
}

// register
impl<A, C> FgResourceRegistry<A, C> {
    /// 注册由 graph 创建的临时资源
    pub(crate) fn register_transient<T: FgResource<A, C>>(
        &mut self,
        name: impl Into<String>,
        desc: T::Desc,
    ) -> FrameGraphResource {
        let model: FgResourceModel<T, T::Desc> = FgResourceModel::transient(desc);
        self.register(name, false, Box::new(model))
    }

    /// 注册外部导入的资源，graph 不会创建或销毁它
    pub(crate) fn register_imported<T: FgResource<A, C>>(
        &mut self,
        name: impl Into<String>,
        desc: T::Desc,
        resource: T,
    ) -> FrameGraphResource {
        let model: FgResourceModel<T, T::Desc> = FgResourceModel::imported(desc, resource);
        self.register(name, true, Box::new(model))
    }

    fn register(
        &mut self,
        name: impl Into<String>,
        imported: bool,
        concept: Box<dyn FgResourceConcept<A, C>>,
    ) -> FrameGraphResource {
        let resource_id = self.entries.len() as u32;
        let entry = FgResourceEntry::new(resource_id, imported, concept);
        let version = entry.version();
        self.entries.push(entry);

        let id = self.nodes.len() as u32;
        self.nodes.push(FgResourceNode::new(name, id, resource_id, version));
        FrameGraphResource::new(id)
    }

    /// 重命名：为 `handle` 所属的资源生成下一个版本
    ///
    /// entry 版本递增之后，所有旧句柄都不再有效。
    pub(crate) fn clone_resource(&mut self, handle: FrameGraphResource) -> FgResult<FrameGraphResource> {
        let node = self.node(handle)?;
        let name = node.name().to_string();
        let resource_id = node.resource_id();

        let entry = &mut self.entries[resource_id as usize];
        entry.version += 1;
        let version = entry.version;

        let id = self.nodes.len() as u32;
        self.nodes.push(FgResourceNode::new(name, id, resource_id, version));
        Ok(FrameGraphResource::new(id))
    }
}

/// 注册表的回滚点，只记录长度
#[derive(Clone, Copy, Debug)]
pub(crate) struct FgRegistryCheckpoint {
    nodes: usize,
    entries: usize,
}

// checkpoint
impl<A, C> FgResourceRegistry<A, C> {
    pub(crate) fn checkpoint(&self) -> FgRegistryCheckpoint {
        FgRegistryCheckpoint {
            nodes: self.nodes.len(),
            entries: self.entries.len(),
        }
    }

    /// 撤销 checkpoint 之后的注册和重命名
    ///
    /// entry 的版本总是等于它最新的 node 的版本，截断 node 之后据此恢复。
    pub(crate) fn rollback(&mut self, checkpoint: FgRegistryCheckpoint) {
        self.nodes.truncate(checkpoint.nodes);
        self.entries.truncate(checkpoint.entries);

        for entry in &mut self.entries {
            entry.version = RESOURCE_INITIAL_VERSION;
        }
        for node in &self.nodes {
            let entry = &mut self.entries[node.resource_id() as usize];
            entry.version = entry.version.max(node.version());
        }
    }
}

// validity
impl<A, C> FgResourceRegistry<A, C> {
    /// 句柄捕获的版本是否等于 entry 的当前版本
    pub fn is_valid(&self, handle: FrameGraphResource) -> bool {
        self.node(handle).is_ok_and(|node| node.version() == self.entries[node.resource_id() as usize].version)
    }

    /// 与 `is_valid` 相同，失败时给出详细错误
    pub(crate) fn ensure_valid(&self, handle: FrameGraphResource, pass: &str) -> FgResult<()> {
        let node = self.node(handle)?;
        let current = self.entries[node.resource_id() as usize].version;
        if node.version() == current {
            return Ok(());
        }

        let err = FgError::InvalidResource {
            pass: pass.to_string(),
            resource: handle,
            name: node.name().to_string(),
            version: node.version(),
            current,
        };
        log::error!("{err}");
        Err(err)
    }
}

// getter & iter
impl<A, C> FgResourceRegistry<A, C> {
    #[inline]
    pub fn node(&self, handle: FrameGraphResource) -> FgResult<&FgResourceNode> {
        self.nodes.get(handle.index()).ok_or(FgError::UnknownResource(handle))
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, handle: FrameGraphResource) -> FgResult<&mut FgResourceNode> {
        self.nodes.get_mut(handle.index()).ok_or(FgError::UnknownResource(handle))
    }

    /// 句柄所属的资源条目
    #[inline]
    pub fn entry(&self, handle: FrameGraphResource) -> FgResult<&FgResourceEntry<A, C>> {
        let resource_id = self.node(handle)?.resource_id();
        Ok(&self.entries[resource_id as usize])
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self, handle: FrameGraphResource) -> FgResult<&mut FgResourceEntry<A, C>> {
        let resource_id = self.node(handle)?.resource_id();
        Ok(&mut self.entries[resource_id as usize])
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn iter_nodes(&self) -> impl Iterator<Item = &FgResourceNode> {
        self.nodes.iter()
    }

    #[inline]
    pub(crate) fn iter_nodes_mut(&mut self) -> impl Iterator<Item = &mut FgResourceNode> {
        self.nodes.iter_mut()
    }

    #[inline]
    pub fn iter_entries(&self) -> impl Iterator<Item = &FgResourceEntry<A, C>> {
        self.entries.iter()
    }

    #[inline]
    pub(crate) fn iter_entries_mut(&mut self) -> impl Iterator<Item = &mut FgResourceEntry<A, C>> {
        self.entries.iter_mut()
    }
}
