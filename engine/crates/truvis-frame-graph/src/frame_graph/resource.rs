//! 虚拟资源 trait
//!
//! FrameGraph 不关心资源的具体类型。任何实现了 [`FgResource`] 的类型都可以
//! 作为 transient 资源由 graph 创建/销毁，或者作为 imported 资源导入。
//!
//! - `A`: allocator 类型，`create` / `destroy` 时传入
//! - `C`: 执行上下文类型（例如命令缓冲区），pre-read / pre-write 时传入

use std::any::Any;
use std::fmt;

/// FrameGraph 可以管理的资源类型
///
/// # 示例
///
/// ```ignore
/// struct Texture { raw: RawImage }
///
/// impl FgResource<GpuAllocator, CommandBuffer> for Texture {
///     type Desc = TextureDesc;
///
///     fn create(desc: &TextureDesc, allocator: &mut GpuAllocator) -> Self {
///         Texture { raw: allocator.create_image(desc) }
///     }
///
///     fn destroy(self, _desc: &TextureDesc, allocator: &mut GpuAllocator) {
///         allocator.destroy_image(self.raw);
///     }
///
///     fn pre_read(&self, _desc: &TextureDesc, flags: u32, cmd: &mut CommandBuffer) {
///         cmd.transition(&self.raw, flags);
///     }
/// }
/// ```
pub trait FgResource<A, C>: Sized + 'static {
    /// 创建资源所需的描述
    type Desc: fmt::Debug + 'static;

    fn create(desc: &Self::Desc, allocator: &mut A) -> Self;

    fn destroy(self, desc: &Self::Desc, allocator: &mut A);

    /// Pass 读取资源之前调用，通常用于插入 barrier / layout 转换
    fn pre_read(&self, _desc: &Self::Desc, _flags: u32, _context: &mut C) {}

    /// Pass 写入资源之前调用
    fn pre_write(&self, _desc: &Self::Desc, _flags: u32, _context: &mut C) {}

    /// 调试输出中使用的描述文本
    fn describe(desc: &Self::Desc) -> String {
        format!("{desc:?}")
    }
}

/// 类型擦除后的资源
pub(crate) trait FgResourceConcept<A, C> {
    fn create(&mut self, allocator: &mut A);
    fn destroy(&mut self, allocator: &mut A);
    fn pre_read(&self, flags: u32, context: &mut C);
    fn pre_write(&self, flags: u32, context: &mut C);

    fn is_materialized(&self) -> bool;
    fn describe(&self) -> String;
    fn type_name(&self) -> &'static str;

    /// 物理资源（`T`），未创建时为 None
    fn resource_any(&self) -> Option<&dyn Any>;
    /// 资源描述（`T::Desc`）
    fn desc_any(&self) -> &dyn Any;
}

/// 包装具体资源类型的 model
///
/// `D` 总是 `T::Desc`，单独作为泛型参数是为了让 model 不依赖 `A` / `C`。
pub(crate) struct FgResourceModel<T, D> {
    desc: D,
    resource: Option<T>,
}

impl<T, D> FgResourceModel<T, D> {
    pub(crate) fn transient(desc: D) -> Self {
        Self { desc, resource: None }
    }

    pub(crate) fn imported(desc: D, resource: T) -> Self {
        Self {
            desc,
            resource: Some(resource),
        }
    }
}

impl<T, D, A, C> FgResourceConcept<A, C> for FgResourceModel<T, D>
where
    T: FgResource<A, C, Desc = D>,
    D: fmt::Debug + 'static,
{
    fn create(&mut self, allocator: &mut A) {
        debug_assert!(self.resource.is_none(), "resource created twice");
        self.resource = Some(T::create(&self.desc, allocator));
    }

    fn destroy(&mut self, allocator: &mut A) {
        if let Some(resource) = self.resource.take() {
            resource.destroy(&self.desc, allocator);
        }
    }

    fn pre_read(&self, flags: u32, context: &mut C) {
        if let Some(resource) = &self.resource {
            resource.pre_read(&self.desc, flags, context);
        }
    }

    fn pre_write(&self, flags: u32, context: &mut C) {
        if let Some(resource) = &self.resource {
            resource.pre_write(&self.desc, flags, context);
        }
    }

    fn is_materialized(&self) -> bool {
        self.resource.is_some()
    }

    fn describe(&self) -> String {
        T::describe(&self.desc)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn resource_any(&self) -> Option<&dyn Any> {
        self.resource.as_ref().map(|r| r as &dyn Any)
    }

    fn desc_any(&self) -> &dyn Any {
        &self.desc
    }
}
