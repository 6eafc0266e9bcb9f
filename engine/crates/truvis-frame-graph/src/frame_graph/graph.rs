//! FrameGraph 声明与编译
//!
//! Pass 必须按照数据依赖的顺序声明，compile 不会重新排序，
//! 只负责剔除无用的 Pass 并计算每个资源的生命周期。

use super::error::{FgError, FgResult};
use super::pass::{FgCallbackExecutor, FgPass, FgPassAccess, FgPassBuilder, FgPassExecutor, FgPassExecutorWrapper, FgPassNode};
use super::pass_resources::FgPassResources;
use super::resource::FgResource;
use super::resource_handle::FrameGraphResource;
use super::resource_registry::FgResourceRegistry;

/// FrameGraph
///
/// # 使用流程
///
/// 1. 创建: `FrameGraph::new()`
/// 2. 导入外部资源: `fg.import::<T>(...)`
/// 3. 按依赖顺序添加 Pass: `fg.add_callback_pass(...)` / `fg.add_pass(...)`
/// 4. 编译: `fg.compile()`
/// 5. 执行: `fg.execute(&mut context, &mut allocator)`
///
/// # 泛型参数
///
/// - `'a`: Pass 可以借用的外部数据的生命周期
/// - `A`: allocator 类型，只在 execute 中使用
/// - `C`: 执行上下文类型，透传给资源回调和 Pass
pub struct FrameGraph<'a, A, C> {
    pub(crate) registry: FgResourceRegistry<A, C>,
    /// Pass 节点列表（按声明顺序）
    pub(crate) passes: Vec<FgPassNode<'a, A, C>>,
    /// 最近一次 compile 之后 graph 是否没有被修改过
    pub(crate) compiled: bool,
}

impl<A, C> Default for FrameGraph<'_, A, C> {
    fn default() -> Self {
        Self::new()
    }
}

// new & init
impl<A, C> FrameGraph<'_, A, C> {
    pub fn new() -> Self {
        Self {
            registry: FgResourceRegistry::new(),
            passes: Vec::new(),
            compiled: false,
        }
    }

    pub fn reserve(&mut self, num_passes: usize, num_resources: usize) {
        self.passes.reserve(num_passes);
        self.registry.reserve(num_resources);
    }
}

// declare
impl<'a, A, C> FrameGraph<'a, A, C> {
    /// 导入外部资源
    ///
    /// graph 不会创建或销毁导入的资源；写入导入资源的 Pass 不会被剔除。
    pub fn import<T: FgResource<A, C>>(&mut self, name: impl Into<String>, desc: T::Desc, resource: T) -> FrameGraphResource {
        self.compiled = false;
        self.registry.register_imported(name, desc, resource)
    }

    /// 添加闭包形式的 Pass
    ///
    /// - `setup`: 立即调用，通过 builder 声明资源依赖，返回 Pass 数据
    /// - `exec`: Pass 未被剔除时在 execute 中调用
    ///
    /// # 返回
    /// setup 返回的 Pass 数据（通常是一组句柄）
    pub fn add_callback_pass<D, S, E>(&mut self, name: impl Into<String>, setup: S, exec: E) -> FgResult<D>
    where
        D: Clone + 'a,
        S: FnOnce(&mut FgPassBuilder<'_, A, C>) -> FgResult<D>,
        E: FnMut(&D, &FgPassResources<'_, A, C>, &mut C) + 'a,
    {
        let (data, name, access, side_effect) = self.declare(name.into(), setup)?;

        self.push_pass(
            name,
            access,
            side_effect,
            Box::new(FgCallbackExecutor {
                data: data.clone(),
                exec,
            }),
        );
        Ok(data)
    }

    /// 添加实现了 `FgPass` 的 Pass
    ///
    /// # 返回
    /// 返回 `&mut Self` 以支持链式调用
    pub fn add_pass<P: FgPass<A, C> + 'a>(&mut self, name: impl Into<String>, mut pass: P) -> FgResult<&mut Self> {
        let ((), name, access, side_effect) = self.declare(name.into(), |builder| pass.setup(builder))?;

        self.push_pass(name, access, side_effect, Box::new(FgPassExecutorWrapper { pass }));
        Ok(self)
    }

    /// 运行 setup；失败时撤销 setup 中的 create 和重命名，之前的句柄保持有效
    fn declare<R>(
        &mut self,
        name: String,
        setup: impl FnOnce(&mut FgPassBuilder<'_, A, C>) -> FgResult<R>,
    ) -> FgResult<(R, String, FgPassAccess, bool)> {
        let checkpoint = self.registry.checkpoint();
        let mut builder = FgPassBuilder::new(name, &mut self.registry);
        match setup(&mut builder) {
            Ok(data) => {
                let (name, access, side_effect) = builder.finish();
                Ok((data, name, access, side_effect))
            }
            Err(err) => {
                log::error!("setup of pass \"{}\" failed: {err}", builder.name());
                self.registry.rollback(checkpoint);
                Err(err)
            }
        }
    }

    fn push_pass(
        &mut self,
        name: String,
        access: FgPassAccess,
        side_effect: bool,
        executor: Box<dyn FgPassExecutor<A, C> + 'a>,
    ) {
        let id = self.passes.len();
        log::trace!(
            "declare pass #{id} \"{name}\": {} reads, {} writes, {} creates",
            access.reads.len(),
            access.writes.len(),
            access.creates.len()
        );
        self.passes.push(FgPassNode::new(name, id, access, side_effect, executor));
        self.compiled = false;
    }
}

// getter
impl<'a, A, C> FrameGraph<'a, A, C> {
    /// 句柄是否仍然指向资源的最新版本
    #[inline]
    pub fn is_valid(&self, handle: FrameGraphResource) -> bool {
        self.registry.is_valid(handle)
    }

    pub fn get_descriptor<T: FgResource<A, C>>(&self, handle: FrameGraphResource) -> FgResult<&T::Desc> {
        self.registry.entry(handle)?.concept().desc_any().downcast_ref::<T::Desc>().ok_or(
            FgError::ResourceTypeMismatch {
                resource: handle,
                expected: std::any::type_name::<T>(),
            },
        )
    }

    #[inline]
    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    #[inline]
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// 逻辑资源（entry）数量，不包含重命名产生的版本
    #[inline]
    pub fn resource_count(&self) -> usize {
        self.registry.entry_count()
    }

    #[inline]
    pub fn passes(&self) -> &[FgPassNode<'a, A, C>] {
        &self.passes
    }

    #[inline]
    pub fn resources(&self) -> &FgResourceRegistry<A, C> {
        &self.registry
    }

    /// compile 之后不会执行的 Pass 数量
    pub fn culled_pass_count(&self) -> usize {
        self.passes.iter().filter(|p| !p.can_execute()).count()
    }
}

// compile
impl<A, C> FrameGraph<'_, A, C> {
    /// 编译
    ///
    /// 1. 引用计数：Pass 的计数为其输出数量，被读取的资源计数加一
    /// 2. 剔除：从计数为 0 的资源出发，反向递减生产者的计数
    /// 3. 生命周期：为每个资源条目记录创建它的 Pass 和最后使用它的 Pass
    pub fn compile(&mut self) -> FgResult<()> {
        #[cfg(feature = "profiling")]
        let _span = tracy_client::span!("FrameGraph::compile");

        let Self { registry, passes, .. } = self;

        for node in registry.iter_nodes_mut() {
            node.ref_count = 0;
            node.producer = None;
        }
        for entry in registry.iter_entries_mut() {
            entry.producer = None;
            entry.last = None;
        }

        // -- 引用计数
        for pass in passes.iter_mut() {
            pass.ref_count = pass.access.outputs().count() as u32;
            for &(handle, _) in &pass.access.reads {
                registry.node_mut(handle)?.ref_count += 1;
            }
            for handle in pass.access.outputs() {
                registry.node_mut(handle)?.producer = Some(pass.id());
            }
        }

        // 没有输出且没有副作用的 Pass 一开始就是死的，释放它的读取
        for pass in passes.iter().filter(|p| p.ref_count == 0 && !p.has_side_effect()) {
            for &(handle, _) in &pass.access.reads {
                registry.node_mut(handle)?.ref_count -= 1;
            }
        }

        // -- 剔除
        let mut unreferenced: Vec<FrameGraphResource> =
            registry.iter_nodes().filter(|n| n.ref_count == 0).map(|n| n.handle()).collect();

        while let Some(handle) = unreferenced.pop() {
            let Some(producer) = registry.node(handle)?.producer else {
                continue;
            };
            let pass = &mut passes[producer];
            if pass.has_side_effect() {
                continue;
            }

            debug_assert!(pass.ref_count >= 1);
            pass.ref_count -= 1;
            if pass.ref_count == 0 {
                log::trace!("cull pass \"{}\"", pass.name());
                for &(read, _) in &pass.access.reads {
                    let node = registry.node_mut(read)?;
                    node.ref_count -= 1;
                    if node.ref_count == 0 {
                        unreferenced.push(read);
                    }
                }
            }
        }

        // -- 资源生命周期
        for pass in passes.iter().filter(|p| p.can_execute()) {
            for &handle in &pass.access.creates {
                let entry = registry.entry_mut(handle)?;
                entry.producer = Some(pass.id());
                entry.last = Some(pass.id());
            }
            for &(handle, _) in pass.access.writes.iter().chain(pass.access.reads.iter()) {
                registry.entry_mut(handle)?.last = Some(pass.id());
            }
        }

        self.compiled = true;
        log::debug!(
            "frame graph compiled: {} passes ({} culled), {} resources, {} versions",
            self.passes.len(),
            self.culled_pass_count(),
            self.registry.entry_count(),
            self.registry.node_count()
        );
        Ok(())
    }
}
