//! Pass 定义和构建器
//!
//! 提供 `FgPass` trait 用于声明式定义 Pass，
//! 以及 `FgPassBuilder` 用于在 setup 阶段声明资源依赖。

use super::error::FgResult;
use super::pass_resources::FgPassResources;
use super::resource::FgResource;
use super::resource_handle::{FLAGS_IGNORED, FrameGraphResource};
use super::resource_registry::FgResourceRegistry;

/// Pass 在 setup 阶段声明的资源访问
#[derive(Clone, Debug, Default)]
pub struct FgPassAccess {
    pub(crate) reads: Vec<(FrameGraphResource, u32)>,
    pub(crate) writes: Vec<(FrameGraphResource, u32)>,
    pub(crate) creates: Vec<FrameGraphResource>,
}

impl FgPassAccess {
    /// 读取列表：(句柄, 访问标记)
    #[inline]
    pub fn reads(&self) -> &[(FrameGraphResource, u32)] {
        &self.reads
    }

    /// 写入列表：(句柄, 访问标记)
    #[inline]
    pub fn writes(&self) -> &[(FrameGraphResource, u32)] {
        &self.writes
    }

    #[inline]
    pub fn creates(&self) -> &[FrameGraphResource] {
        &self.creates
    }

    pub fn reads_resource(&self, handle: FrameGraphResource) -> bool {
        self.reads.iter().any(|(h, _)| *h == handle)
    }

    pub fn writes_resource(&self, handle: FrameGraphResource) -> bool {
        self.writes.iter().any(|(h, _)| *h == handle)
    }

    pub fn creates_resource(&self, handle: FrameGraphResource) -> bool {
        self.creates.contains(&handle)
    }

    /// 句柄是否出现在 read / write / create 任意一个列表中
    pub fn declares(&self, handle: FrameGraphResource) -> bool {
        self.reads_resource(handle) || self.writes_resource(handle) || self.creates_resource(handle)
    }

    /// Pass 的输出：写入的版本，加上只创建未写入的资源（不重复）
    pub(crate) fn outputs(&self) -> impl Iterator<Item = FrameGraphResource> + '_ {
        self.writes
            .iter()
            .map(|(h, _)| *h)
            .chain(self.creates.iter().copied().filter(move |h| !self.writes_resource(*h)))
    }
}

/// 合并同一资源的两次访问标记
fn merge_flags(existing: u32, flags: u32) -> u32 {
    match (existing, flags) {
        (FLAGS_IGNORED, other) | (other, FLAGS_IGNORED) => other,
        (existing, flags) => existing | flags,
    }
}

/// Pass 构建器
///
/// 在 setup 阶段使用，只作用于一个 Pass。
/// 所有 read / write 都会检查句柄的有效性，过期句柄直接返回错误。
pub struct FgPassBuilder<'g, A, C> {
    name: String,
    access: FgPassAccess,
    side_effect: bool,

    /// 资源注册表引用（用于创建临时资源和重命名）
    registry: &'g mut FgResourceRegistry<A, C>,
}

impl<'g, A, C> FgPassBuilder<'g, A, C> {
    pub(crate) fn new(name: String, registry: &'g mut FgResourceRegistry<A, C>) -> Self {
        Self {
            name,
            access: FgPassAccess::default(),
            side_effect: false,
            registry,
        }
    }

    pub(crate) fn finish(self) -> (String, FgPassAccess, bool) {
        (self.name, self.access, self.side_effect)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn has_side_effect(&self) -> bool {
        self.side_effect
    }

    #[inline]
    pub fn is_valid(&self, handle: FrameGraphResource) -> bool {
        self.registry.is_valid(handle)
    }

    /// 创建临时资源
    ///
    /// 物理资源在本 Pass 执行前创建，在最后一个使用它的 Pass 执行后销毁。
    pub fn create<T: FgResource<A, C>>(&mut self, name: impl Into<String>, desc: T::Desc) -> FrameGraphResource {
        let handle = self.registry.register_transient::<T>(name, desc);
        self.access.creates.push(handle);
        log::trace!("[{}] create {:?}", self.name, handle);
        handle
    }

    /// 声明读取
    ///
    /// # 返回
    /// 返回相同的句柄
    pub fn read(&mut self, handle: FrameGraphResource, flags: u32) -> FgResult<FrameGraphResource> {
        self.registry.ensure_valid(handle, &self.name)?;
        self.access.reads.push((handle, flags));
        Ok(handle)
    }

    /// 声明写入
    ///
    /// 写入本 Pass 创建的资源时直接返回原句柄；重复写入时访问标记按位合并，
    /// `FLAGS_IGNORED` 不参与合并。
    /// 否则旧句柄以 `FLAGS_IGNORED` 记为读取，资源被重命名，返回新版本的句柄；
    /// 此后旧句柄失效，后续 Pass 只能通过新句柄访问该资源。
    ///
    /// 写入导入资源会自动把 Pass 标记为有副作用。
    pub fn write(&mut self, handle: FrameGraphResource, flags: u32) -> FgResult<FrameGraphResource> {
        self.registry.ensure_valid(handle, &self.name)?;
        if self.registry.entry(handle)?.is_imported() {
            self.set_side_effect();
        }

        if self.access.creates_resource(handle) {
            match self.access.writes.iter_mut().find(|(h, _)| *h == handle) {
                Some((_, existing)) => *existing = merge_flags(*existing, flags),
                None => self.access.writes.push((handle, flags)),
            }
            return Ok(handle);
        }

        self.access.reads.push((handle, FLAGS_IGNORED));
        let renamed = self.registry.clone_resource(handle)?;
        self.access.writes.push((renamed, flags));
        log::trace!("[{}] write {:?} renamed to {:?}", self.name, handle, renamed);
        Ok(renamed)
    }

    /// 标记为有副作用，永远不会被剔除
    pub fn set_side_effect(&mut self) -> &mut Self {
        self.side_effect = true;
        self
    }
}

/// 类型擦除的 Pass 执行器
pub(crate) trait FgPassExecutor<A, C> {
    fn execute(&mut self, resources: &FgPassResources<'_, A, C>, context: &mut C);
}

/// 包装 `FgPass` 实现的执行器
pub(crate) struct FgPassExecutorWrapper<P> {
    pub pass: P,
}

impl<A, C, P: FgPass<A, C>> FgPassExecutor<A, C> for FgPassExecutorWrapper<P> {
    fn execute(&mut self, resources: &FgPassResources<'_, A, C>, context: &mut C) {
        self.pass.execute(resources, context);
    }
}

/// 闭包形式的 Pass：setup 产生的数据在执行时传回闭包
pub(crate) struct FgCallbackExecutor<D, F> {
    pub data: D,
    pub exec: F,
}

impl<A, C, D, F> FgPassExecutor<A, C> for FgCallbackExecutor<D, F>
where
    F: FnMut(&D, &FgPassResources<'_, A, C>, &mut C),
{
    fn execute(&mut self, resources: &FgPassResources<'_, A, C>, context: &mut C) {
        (self.exec)(&self.data, resources, context);
    }
}

/// Pass 节点
pub struct FgPassNode<'a, A, C> {
    name: String,
    id: usize,
    pub(crate) access: FgPassAccess,
    side_effect: bool,

    /// 仍然需要该 Pass 输出的消费者数量（compile 后有效）
    pub(crate) ref_count: u32,

    pub(crate) executor: Box<dyn FgPassExecutor<A, C> + 'a>,
}

impl<'a, A, C> FgPassNode<'a, A, C> {
    pub(crate) fn new(
        name: String,
        id: usize,
        access: FgPassAccess,
        side_effect: bool,
        executor: Box<dyn FgPassExecutor<A, C> + 'a>,
    ) -> Self {
        Self {
            name,
            id,
            access,
            side_effect,
            ref_count: 0,
            executor,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub fn access(&self) -> &FgPassAccess {
        &self.access
    }

    #[inline]
    pub fn has_side_effect(&self) -> bool {
        self.side_effect
    }

    #[inline]
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    /// 未被剔除，或者有副作用
    #[inline]
    pub fn can_execute(&self) -> bool {
        self.ref_count > 0 || self.side_effect
    }

    pub(crate) fn execute(&mut self, registry: &FgResourceRegistry<A, C>, context: &mut C) {
        let resources = FgPassResources::new(registry, &self.name, &self.access);
        self.executor.execute(&resources, context);
    }
}

/// FgPass trait
///
/// 定义 FrameGraph 中的一个 Pass。
///
/// # 示例
///
/// ```ignore
/// struct BlurPass {
///     input: FrameGraphResource,
///     output: FrameGraphResource,
/// }
///
/// impl FgPass<GpuAllocator, CommandBuffer> for BlurPass {
///     fn setup(&mut self, builder: &mut FgPassBuilder<'_, GpuAllocator, CommandBuffer>) -> FgResult<()> {
///         builder.read(self.input, SAMPLED)?;
///         self.output = builder.write(self.output, STORAGE)?;
///         Ok(())
///     }
///
///     fn execute(&mut self, resources: &FgPassResources<'_, GpuAllocator, CommandBuffer>, cmd: &mut CommandBuffer) {
///         let input = resources.get::<Texture>(self.input).unwrap();
///         // dispatch...
///     }
/// }
/// ```
///
/// Pass 不需要是 Send + Sync，FrameGraph 只在单线程中构建和执行。
/// Pass 可以借用外部资源，生命周期由 `FrameGraph<'a, ..>` 约束。
pub trait FgPass<A, C> {
    /// 声明 Pass 的资源依赖
    fn setup(&mut self, builder: &mut FgPassBuilder<'_, A, C>) -> FgResult<()>;

    /// 执行 Pass；只有未被剔除时才会调用
    fn execute(&mut self, resources: &FgPassResources<'_, A, C>, context: &mut C);
}
