//! 测试用的资源、allocator 和执行上下文
//!
//! allocator 和 context 共享同一个 journal，按发生顺序记录 create / destroy / pre_read / pre_write / 执行回调。

use std::cell::RefCell;
use std::rc::Rc;

use slotmap::SlotMap;

use super::graph::FrameGraph;
use super::resource::FgResource;

slotmap::new_key_type! {
    pub(crate) struct TestTextureKey;
}

pub(crate) type Journal = Rc<RefCell<Vec<String>>>;

pub(crate) type TestGraph<'a> = FrameGraph<'a, TestAllocator, TestContext>;

pub(crate) fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

#[derive(Clone, Debug)]
pub(crate) struct TestTextureDesc {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
}

pub(crate) fn texture_desc(label: &'static str) -> TestTextureDesc {
    TestTextureDesc {
        label,
        width: 4,
        height: 4,
    }
}

#[derive(Debug)]
pub(crate) struct TestTexture {
    pub key: TestTextureKey,
    pub label: &'static str,
}

/// 和 `TestTexture` 类型不同的资源，用于类型检查测试
#[derive(Debug)]
pub(crate) struct TestBuffer;

#[derive(Default)]
pub(crate) struct TestAllocator {
    /// 当前存活的纹理
    pub live: SlotMap<TestTextureKey, &'static str>,
    pub journal: Journal,
}

impl TestAllocator {
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            live: SlotMap::with_key(),
            journal,
        }
    }

    /// graph 外部创建的纹理，不写入 journal
    pub fn external(&mut self, label: &'static str) -> TestTexture {
        TestTexture {
            key: self.live.insert(label),
            label,
        }
    }
}

#[derive(Default)]
pub(crate) struct TestContext {
    pub journal: Journal,
}

impl TestContext {
    pub fn with_journal(journal: Journal) -> Self {
        Self { journal }
    }

    pub fn record(&mut self, event: impl Into<String>) {
        self.journal.borrow_mut().push(event.into());
    }
}

impl FgResource<TestAllocator, TestContext> for TestTexture {
    type Desc = TestTextureDesc;

    fn create(desc: &TestTextureDesc, allocator: &mut TestAllocator) -> Self {
        allocator.journal.borrow_mut().push(format!("create {}", desc.label));
        TestTexture {
            key: allocator.live.insert(desc.label),
            label: desc.label,
        }
    }

    fn destroy(self, desc: &TestTextureDesc, allocator: &mut TestAllocator) {
        assert!(allocator.live.remove(self.key).is_some(), "texture destroyed twice");
        allocator.journal.borrow_mut().push(format!("destroy {}", desc.label));
    }

    fn pre_read(&self, _desc: &TestTextureDesc, flags: u32, context: &mut TestContext) {
        context.record(format!("pre_read {} {flags}", self.label));
    }

    fn pre_write(&self, _desc: &TestTextureDesc, flags: u32, context: &mut TestContext) {
        context.record(format!("pre_write {} {flags}", self.label));
    }

    fn describe(desc: &TestTextureDesc) -> String {
        format!("{} ({}x{})", desc.label, desc.width, desc.height)
    }
}

impl FgResource<TestAllocator, TestContext> for TestBuffer {
    type Desc = u64;

    fn create(_size: &u64, _allocator: &mut TestAllocator) -> Self {
        TestBuffer
    }

    fn destroy(self, _size: &u64, _allocator: &mut TestAllocator) {}
}
