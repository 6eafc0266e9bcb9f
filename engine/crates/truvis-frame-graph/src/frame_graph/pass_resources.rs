use super::error::{FgError, FgResult};
use super::pass::FgPassAccess;
use super::resource::FgResource;
use super::resource_handle::FrameGraphResource;
use super::resource_registry::FgResourceRegistry;

/// Pass 执行时的资源访问器
///
/// 只能解析本 Pass 在 setup 阶段声明过（read / write / create）的句柄。
pub struct FgPassResources<'p, A, C> {
    registry: &'p FgResourceRegistry<A, C>,
    pass_name: &'p str,
    access: &'p FgPassAccess,
}

impl<'p, A, C> FgPassResources<'p, A, C> {
    pub(crate) fn new(registry: &'p FgResourceRegistry<A, C>, pass_name: &'p str, access: &'p FgPassAccess) -> Self {
        Self {
            registry,
            pass_name,
            access,
        }
    }

    #[inline]
    pub fn pass_name(&self) -> &'p str {
        self.pass_name
    }

    /// 获取物理资源
    pub fn get<T: FgResource<A, C>>(&self, handle: FrameGraphResource) -> FgResult<&'p T> {
        self.ensure_declared(handle)?;
        let registry = self.registry;

        let resource = registry.entry(handle)?.concept().resource_any().ok_or_else(|| FgError::ResourceNotCreated {
            resource: handle,
            name: registry.node(handle).map(|n| n.name().to_string()).unwrap_or_default(),
        })?;

        resource.downcast_ref::<T>().ok_or(FgError::ResourceTypeMismatch {
            resource: handle,
            expected: std::any::type_name::<T>(),
        })
    }

    /// 获取资源描述
    pub fn get_descriptor<T: FgResource<A, C>>(&self, handle: FrameGraphResource) -> FgResult<&'p T::Desc> {
        self.ensure_declared(handle)?;

        self.registry.entry(handle)?.concept().desc_any().downcast_ref::<T::Desc>().ok_or(
            FgError::ResourceTypeMismatch {
                resource: handle,
                expected: std::any::type_name::<T>(),
            },
        )
    }

    fn ensure_declared(&self, handle: FrameGraphResource) -> FgResult<()> {
        if self.access.declares(handle) {
            return Ok(());
        }

        let err = FgError::UndeclaredResource {
            pass: self.pass_name.to_string(),
            resource: handle,
        };
        log::error!("{err}");
        Err(err)
    }
}
