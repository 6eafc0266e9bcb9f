//! FrameGraph 错误类型
//!
//! 这里的错误都属于调用方的编程错误（契约违背），不存在“重试”的语义。

use super::resource_handle::FrameGraphResource;

pub type FgResult<T> = Result<T, FgError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FgError {
    /// 句柄不属于当前 graph
    #[error("unknown resource {0:?}")]
    UnknownResource(FrameGraphResource),

    /// 句柄已经过期：资源在句柄获取之后被其他 pass 写入过
    #[error(
        "pass \"{pass}\" used stale handle {resource:?} of \"{name}\" (handle version {version}, current version {current})"
    )]
    InvalidResource {
        pass: String,
        resource: FrameGraphResource,
        name: String,
        version: u32,
        current: u32,
    },

    /// Pass 执行时访问了 setup 阶段没有声明的资源
    #[error("pass \"{pass}\" accessed undeclared resource {resource:?}")]
    UndeclaredResource { pass: String, resource: FrameGraphResource },

    #[error("resource {resource:?} is not of type {expected}")]
    ResourceTypeMismatch {
        resource: FrameGraphResource,
        expected: &'static str,
    },

    /// 物理资源尚未创建（或已经销毁）
    #[error("resource \"{name}\" {resource:?} has no backing storage")]
    ResourceNotCreated { resource: FrameGraphResource, name: String },

    #[error("frame graph was modified after the last compile; call compile() before execute()")]
    NotCompiled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_resource_display() {
        let err = FgError::InvalidResource {
            pass: "lighting".to_string(),
            resource: FrameGraphResource::new(3),
            name: "hdr".to_string(),
            version: 1,
            current: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("lighting"));
        assert!(msg.contains("FgResource(3)"));
        assert!(msg.contains("current version 2"));
    }

    #[test]
    fn test_error_is_std_error() {
        let err = FgError::NotCompiled;
        let _: &dyn std::error::Error = &err;
    }
}
