//! FrameGraph 执行
//!
//! 按声明顺序执行未被剔除的 Pass，在 Pass 前后创建 / 销毁临时资源。

use itertools::Itertools;

use super::error::{FgError, FgResult};
use super::graph::FrameGraph;
use super::pass::FgPassNode;
use super::resource_handle::{FLAGS_IGNORED, FrameGraphResource};
use super::resource_registry::FgResourceRegistry;

impl<A, C> FrameGraph<'_, A, C> {
    /// 执行编译后的 graph
    ///
    /// 对每个未被剔除的 Pass：
    /// 1. 创建该 Pass 创建的临时资源
    /// 2. 对非 `FLAGS_IGNORED` 的读写调用 pre_read / pre_write
    /// 3. 调用 Pass 的执行回调
    /// 4. 销毁最后一次使用在该 Pass 的临时资源
    ///
    /// 正常执行结束后不会有临时资源残留。
    pub fn execute(&mut self, context: &mut C, allocator: &mut A) -> FgResult<()> {
        #[cfg(feature = "profiling")]
        let _span = tracy_client::span!("FrameGraph::execute");

        if !self.compiled {
            log::error!("{}", FgError::NotCompiled);
            return Err(FgError::NotCompiled);
        }

        let Self { registry, passes, .. } = self;
        let result = passes
            .iter_mut()
            .filter(|pass| pass.can_execute())
            .try_for_each(|pass| Self::execute_pass(pass, registry, context, allocator));

        debug_assert!(
            result.is_err() || registry.iter_entries().all(|e| e.is_imported() || !e.is_materialized()),
            "transient resources alive after execute"
        );
        result
    }

    fn execute_pass(
        pass: &mut FgPassNode<'_, A, C>,
        registry: &mut FgResourceRegistry<A, C>,
        context: &mut C,
        allocator: &mut A,
    ) -> FgResult<()> {
        log::trace!("execute pass #{} \"{}\"", pass.id(), pass.name());

        for &handle in pass.access().creates() {
            registry.entry_mut(handle)?.create(allocator);
        }

        for &(handle, flags) in pass.access().reads().iter().filter(|(_, flags)| *flags != FLAGS_IGNORED) {
            let name = registry.node(handle)?.name();
            registry.entry(handle)?.pre_read(handle, name, flags, context)?;
        }
        for &(handle, flags) in pass.access().writes().iter().filter(|(_, flags)| *flags != FLAGS_IGNORED) {
            let name = registry.node(handle)?.name();
            registry.entry(handle)?.pre_write(handle, name, flags, context)?;
        }

        pass.execute(registry, context);

        let pass_id = pass.id();
        for entry in registry.iter_entries_mut().filter(|e| e.last() == Some(pass_id) && e.is_transient()) {
            entry.destroy(allocator);
        }
        Ok(())
    }
}

// 调试方法
impl<A, C> FrameGraph<'_, A, C> {
    /// 打印执行计划（用于调试）
    ///
    /// 包括执行顺序、被剔除的 Pass、每个 Pass 的读写以及资源的创建 / 销毁位置。
    pub fn print_execution_plan(&self) {
        let (alive, culled): (Vec<_>, Vec<_>) = self.passes.iter().partition(|p| p.can_execute());
        let resource_name = |handle: FrameGraphResource| self.registry.node(handle).map(|n| n.name()).unwrap_or("<unknown>");

        log::info!("╔══════════════════════════════════════════════════════════════════╗");
        log::info!("║              FrameGraph Execution Plan                           ║");
        log::info!("╠══════════════════════════════════════════════════════════════════╣");
        log::info!(
            "║ Total Passes: {}  |  Execution Order: [{}]",
            self.passes.len(),
            alive.iter().map(|p| p.name()).join(" → ")
        );
        if !culled.is_empty() {
            log::info!("║ Culled: [{}]", culled.iter().map(|p| p.name()).join(", "));
        }
        if !self.compiled {
            log::info!("║ (not compiled)");
        }
        log::info!("╚══════════════════════════════════════════════════════════════════╝");

        for (order, pass) in alive.iter().enumerate() {
            log::info!("");
            log::info!("┌─────────────────────────────────────────────────────────────────┐");
            log::info!("│ [{}/{}] Pass: \"{}\"", order + 1, alive.len(), pass.name());
            log::info!("├─────────────────────────────────────────────────────────────────┤");

            let access = pass.access();
            if !access.creates().is_empty() {
                log::info!(
                    "│ Create: {}",
                    access.creates().iter().map(|h| format!("\"{}\"", resource_name(*h))).join(", ")
                );
            }
            for (handle, flags) in access.reads() {
                if *flags == FLAGS_IGNORED {
                    continue;
                }
                log::info!("│   📖 \"{}\" {:?} (flags: {:#x})", resource_name(*handle), handle, flags);
            }
            for (handle, flags) in access.writes() {
                log::info!("│   ✏️  \"{}\" {:?} (flags: {:#x})", resource_name(*handle), handle, flags);
            }

            let destroyed = self
                .registry
                .iter_entries()
                .filter(|e| e.last() == Some(pass.id()) && e.is_transient())
                .map(|e| e.describe())
                .collect_vec();
            if !destroyed.is_empty() {
                log::info!("│ Destroy: {}", destroyed.join(", "));
            }
            if pass.has_side_effect() {
                log::info!("│ (side effect)");
            }

            log::info!("└─────────────────────────────────────────────────────────────────┘");
        }

        log::info!("");
        log::info!("═══════════════════════ End of Execution Plan ═══════════════════════");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use crate::frame_graph::test_utils::{
        TestAllocator, TestBuffer, TestContext, TestGraph, TestTexture, TestTextureDesc, journal, texture_desc,
    };
    use crate::frame_graph::{FLAGS_IGNORED, FgError};

    #[test]
    fn test_single_pass_lifecycle() {
        let journal = journal();
        let mut allocator = TestAllocator::with_journal(journal.clone());
        let mut context = TestContext::with_journal(journal.clone());

        let mut fg = TestGraph::new();
        fg.add_callback_pass(
            "p0",
            |builder| {
                let r = builder.create::<TestTexture>("r", texture_desc("r"));
                builder.write(r, 7)?;
                builder.set_side_effect();
                Ok(r)
            },
            |_, _, ctx: &mut TestContext| ctx.record("exec p0"),
        )
        .unwrap();

        fg.compile().unwrap();
        fg.execute(&mut context, &mut allocator).unwrap();

        assert_eq!(*journal.borrow(), vec!["create r", "pre_write r 7", "exec p0", "destroy r"]);
        assert!(allocator.live.is_empty());
    }

    #[test]
    fn test_culled_passes_never_run() {
        let journal = journal();
        let mut allocator = TestAllocator::with_journal(journal.clone());
        let mut context = TestContext::with_journal(journal.clone());

        let mut fg = TestGraph::new();
        let r = fg
            .add_callback_pass(
                "p0",
                |builder| Ok(builder.create::<TestTexture>("r", texture_desc("r"))),
                |_, _, ctx: &mut TestContext| ctx.record("exec p0"),
            )
            .unwrap();
        fg.add_callback_pass("p1", |builder| builder.read(r, 0), |_, _, ctx: &mut TestContext| ctx.record("exec p1"))
            .unwrap();

        fg.compile().unwrap();
        fg.execute(&mut context, &mut allocator).unwrap();

        assert!(journal.borrow().is_empty());
        assert!(allocator.live.is_empty());
    }

    #[test]
    fn test_renamed_resource_shares_backing_store() {
        let journal = journal();
        let mut allocator = TestAllocator::with_journal(journal.clone());
        let mut context = TestContext::with_journal(journal.clone());

        let mut fg = TestGraph::new();
        let r = fg
            .add_callback_pass(
                "p0",
                |builder| {
                    let r = builder.create::<TestTexture>("r", texture_desc("r"));
                    builder.write(r, 0)
                },
                |_, _, ctx: &mut TestContext| ctx.record("exec p0"),
            )
            .unwrap();
        let r2 = fg
            .add_callback_pass("p1", |builder| builder.write(r, 1), |_, _, ctx: &mut TestContext| ctx.record("exec p1"))
            .unwrap();
        fg.add_callback_pass(
            "p2",
            |builder| {
                builder.read(r2, 2)?;
                builder.set_side_effect();
                Ok(())
            },
            |_, _, ctx: &mut TestContext| ctx.record("exec p2"),
        )
        .unwrap();

        fg.compile().unwrap();
        fg.execute(&mut context, &mut allocator).unwrap();

        // p1 对旧版本的读取是 FLAGS_IGNORED，不会触发 pre_read
        assert_eq!(
            *journal.borrow(),
            vec![
                "create r",
                "pre_write r 0",
                "exec p0",
                "pre_write r 1",
                "exec p1",
                "pre_read r 2",
                "exec p2",
                "destroy r",
            ]
        );
        assert!(allocator.live.is_empty());
    }

    #[test]
    fn test_imported_resource_is_never_created_or_destroyed() {
        let journal = journal();
        let mut allocator = TestAllocator::with_journal(journal.clone());
        let mut context = TestContext::with_journal(journal.clone());
        let backbuffer = allocator.external("backbuffer");

        let mut fg = TestGraph::new();
        let imported = fg.import("backbuffer", texture_desc("backbuffer"), backbuffer);
        fg.add_callback_pass(
            "present",
            |builder| builder.write(imported, 3),
            |_, _, ctx: &mut TestContext| ctx.record("exec present"),
        )
        .unwrap();

        fg.compile().unwrap();
        fg.execute(&mut context, &mut allocator).unwrap();

        assert_eq!(*journal.borrow(), vec!["pre_write backbuffer 3", "exec present"]);
        assert_eq!(allocator.live.len(), 1);
    }

    #[test]
    fn test_order_is_preserved_around_culled_pass() {
        let journal = journal();
        let mut allocator = TestAllocator::with_journal(journal.clone());
        let mut context = TestContext::with_journal(journal.clone());

        let mut fg = TestGraph::new();
        for name in ["a", "b", "c"] {
            fg.add_callback_pass(
                name,
                |builder| {
                    let r = builder.create::<TestTexture>(name, texture_desc(name));
                    builder.write(r, FLAGS_IGNORED)?;
                    if name != "b" {
                        builder.set_side_effect();
                    }
                    Ok(())
                },
                move |_, _, ctx: &mut TestContext| ctx.record(format!("exec {name}")),
            )
            .unwrap();
        }

        fg.compile().unwrap();
        fg.execute(&mut context, &mut allocator).unwrap();

        // FLAGS_IGNORED 的写入不会触发 pre_write
        assert_eq!(
            *journal.borrow(),
            vec!["create a", "exec a", "destroy a", "create c", "exec c", "destroy c"]
        );
    }

    #[test]
    fn test_repeated_execute_recreates_resources() {
        let journal = journal();
        let mut allocator = TestAllocator::with_journal(journal.clone());
        let mut context = TestContext::default();

        let mut fg = TestGraph::new();
        fg.add_callback_pass(
            "p0",
            |builder| {
                builder.create::<TestTexture>("r", texture_desc("r"));
                builder.set_side_effect();
                Ok(())
            },
            |_, _, _| {},
        )
        .unwrap();

        fg.compile().unwrap();
        fg.execute(&mut context, &mut allocator).unwrap();
        fg.execute(&mut context, &mut allocator).unwrap();

        assert_eq!(*journal.borrow(), vec!["create r", "destroy r", "create r", "destroy r"]);
        assert!(allocator.live.is_empty());
    }

    #[test]
    fn test_resolve_declared_resource() {
        let seen: RefCell<Option<(u32, &'static str)>> = RefCell::new(None);
        let mut allocator = TestAllocator::default();
        let mut context = TestContext::default();

        let mut fg = TestGraph::new();
        fg.add_callback_pass(
            "p0",
            |builder| {
                let r = builder.create::<TestTexture>("r", TestTextureDesc {
                    label: "r",
                    width: 16,
                    height: 9,
                });
                builder.set_side_effect();
                Ok(r)
            },
            |r, resources, _: &mut TestContext| {
                let texture = resources.get::<TestTexture>(*r).unwrap();
                let desc = resources.get_descriptor::<TestTexture>(*r).unwrap();
                *seen.borrow_mut() = Some((desc.width, texture.label));
            },
        )
        .unwrap();

        fg.compile().unwrap();
        fg.execute(&mut context, &mut allocator).unwrap();
        drop(fg);

        assert_eq!(seen.into_inner(), Some((16, "r")));
    }

    #[test]
    fn test_undeclared_resource_is_rejected() {
        let seen: RefCell<Option<FgError>> = RefCell::new(None);
        let mut allocator = TestAllocator::default();
        let mut context = TestContext::default();

        let mut fg = TestGraph::new();
        let other = fg
            .add_callback_pass(
                "p0",
                |builder| {
                    let r = builder.create::<TestTexture>("other", texture_desc("other"));
                    builder.set_side_effect();
                    Ok(r)
                },
                |_, _, _: &mut TestContext| {},
            )
            .unwrap();
        fg.add_callback_pass(
            "p1",
            |builder| {
                builder.set_side_effect();
                Ok(())
            },
            |_, resources, _: &mut TestContext| {
                *seen.borrow_mut() = resources.get::<TestTexture>(other).err();
            },
        )
        .unwrap();

        fg.compile().unwrap();
        fg.execute(&mut context, &mut allocator).unwrap();
        drop(fg);

        assert_eq!(
            seen.into_inner(),
            Some(FgError::UndeclaredResource {
                pass: "p1".to_string(),
                resource: other,
            })
        );
    }

    #[test]
    fn test_wrong_resource_type_is_rejected() {
        let seen: RefCell<Option<FgError>> = RefCell::new(None);
        let mut allocator = TestAllocator::default();
        let mut context = TestContext::default();

        let mut fg = TestGraph::new();
        fg.add_callback_pass(
            "p0",
            |builder| {
                let r = builder.create::<TestTexture>("r", texture_desc("r"));
                builder.set_side_effect();
                Ok(r)
            },
            |r, resources, _: &mut TestContext| {
                *seen.borrow_mut() = resources.get::<TestBuffer>(*r).err();
            },
        )
        .unwrap();

        fg.compile().unwrap();
        fg.execute(&mut context, &mut allocator).unwrap();
        drop(fg);

        assert!(matches!(seen.into_inner(), Some(FgError::ResourceTypeMismatch { .. })));
    }

    #[test]
    fn test_execute_requires_compile() {
        let mut allocator = TestAllocator::default();
        let mut context = TestContext::default();

        let mut fg = TestGraph::new();
        assert_eq!(fg.execute(&mut context, &mut allocator), Err(FgError::NotCompiled));

        fg.compile().unwrap();
        fg.execute(&mut context, &mut allocator).unwrap();

        fg.add_callback_pass(
            "late",
            |builder| {
                builder.set_side_effect();
                Ok(())
            },
            |_, _, _| {},
        )
        .unwrap();
        assert_eq!(fg.execute(&mut context, &mut allocator), Err(FgError::NotCompiled));
    }

    #[test]
    fn test_print_execution_plan() {
        truvis_crate_tools::init_log::init_test_log();

        let mut allocator = TestAllocator::default();
        let mut fg = TestGraph::new();
        let backbuffer = fg.import("backbuffer", texture_desc("backbuffer"), allocator.external("backbuffer"));
        let color = fg
            .add_callback_pass(
                "draw",
                |builder| {
                    let color = builder.create::<TestTexture>("color", texture_desc("color"));
                    builder.write(color, 1)
                },
                |_, _, _| {},
            )
            .unwrap();
        let presented = fg
            .add_callback_pass(
                "present",
                |builder| {
                    builder.read(color, 2)?;
                    builder.write(backbuffer, 3)
                },
                |_, _, _| {},
            )
            .unwrap();
        fg.compile().unwrap();
        fg.print_execution_plan();

        assert_eq!(fg.culled_pass_count(), 0);
        assert_ne!(presented, backbuffer);
        assert!(fg.is_valid(presented));
        assert!(!fg.is_valid(backbuffer));
    }

}
