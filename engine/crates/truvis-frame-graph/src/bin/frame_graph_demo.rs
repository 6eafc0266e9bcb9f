//! FrameGraph 示例
//!
//! 构建一个简化的延迟渲染帧：gbuffer → light cull → lighting → tonemap → backbuffer，
//! 外加一个没有消费者、会被剔除的 debug pass。
//!
//! 执行结束后把 graph 以 dot 格式输出到 stdout：
//!
//! ```text
//! cargo run --bin frame-graph-demo | dot -Tsvg -o frame.svg
//! ```

use bitflags::bitflags;
use itertools::Itertools;
use slotmap::SlotMap;
use truvis_crate_tools::init_log::init_log;
use truvis_frame_graph::frame_graph::{
    FgPass, FgPassBuilder, FgPassResources, FgResource, FgResult, FrameGraph, FrameGraphResource,
};

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TextureAccess: u32 {
        const SAMPLED = 1 << 0;
        const STORAGE = 1 << 1;
        const COLOR_ATTACHMENT = 1 << 2;
        const DEPTH_ATTACHMENT = 1 << 3;
        const PRESENT = 1 << 4;
    }
}

slotmap::new_key_type! {
    pub struct AllocationKey;
}

/// 模拟的显存堆
#[derive(Default)]
struct HeapAllocator {
    allocations: SlotMap<AllocationKey, (String, u64)>,
    peak_bytes: u64,
}

impl HeapAllocator {
    fn alloc(&mut self, label: &str, bytes: u64) -> AllocationKey {
        let key = self.allocations.insert((label.to_string(), bytes));
        self.peak_bytes = self.peak_bytes.max(self.used_bytes());
        log::debug!("alloc \"{label}\" {bytes} bytes");
        key
    }

    fn free(&mut self, key: AllocationKey) {
        if let Some((label, bytes)) = self.allocations.remove(key) {
            log::debug!("free \"{label}\" {bytes} bytes");
        }
    }

    fn used_bytes(&self) -> u64 {
        self.allocations.values().map(|(_, bytes)| bytes).sum()
    }
}

/// 模拟的命令缓冲区
#[derive(Default)]
struct CommandRecorder {
    commands: Vec<String>,
}

impl CommandRecorder {
    fn record(&mut self, command: impl Into<String>) {
        self.commands.push(command.into());
    }
}

#[derive(Clone, Debug)]
struct TextureDesc {
    width: u32,
    height: u32,
    format: &'static str,
    bytes_per_pixel: u32,
}

impl TextureDesc {
    fn new(width: u32, height: u32, format: &'static str, bytes_per_pixel: u32) -> Self {
        Self {
            width,
            height,
            format,
            bytes_per_pixel,
        }
    }

    fn size(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.bytes_per_pixel as u64
    }
}

#[derive(Debug)]
struct Texture {
    allocation: Option<AllocationKey>,
}

impl FgResource<HeapAllocator, CommandRecorder> for Texture {
    type Desc = TextureDesc;

    fn create(desc: &TextureDesc, allocator: &mut HeapAllocator) -> Self {
        Texture {
            allocation: Some(allocator.alloc(desc.format, desc.size())),
        }
    }

    fn destroy(self, _desc: &TextureDesc, allocator: &mut HeapAllocator) {
        if let Some(allocation) = self.allocation {
            allocator.free(allocation);
        }
    }

    fn pre_read(&self, desc: &TextureDesc, flags: u32, cmd: &mut CommandRecorder) {
        cmd.record(format!("barrier {} -> {:?}", desc.format, TextureAccess::from_bits_truncate(flags)));
    }

    fn pre_write(&self, desc: &TextureDesc, flags: u32, cmd: &mut CommandRecorder) {
        cmd.record(format!("barrier {} -> {:?}", desc.format, TextureAccess::from_bits_truncate(flags)));
    }

    fn describe(desc: &TextureDesc) -> String {
        format!("{}x{} {}", desc.width, desc.height, desc.format)
    }
}

#[derive(Debug)]
struct Buffer {
    allocation: AllocationKey,
}

impl FgResource<HeapAllocator, CommandRecorder> for Buffer {
    type Desc = u64;

    fn create(size: &u64, allocator: &mut HeapAllocator) -> Self {
        Buffer {
            allocation: allocator.alloc("buffer", *size),
        }
    }

    fn destroy(self, _size: &u64, allocator: &mut HeapAllocator) {
        allocator.free(self.allocation);
    }

    fn describe(size: &u64) -> String {
        format!("{size} bytes")
    }
}

#[derive(Clone, Copy)]
struct GBuffer {
    albedo: FrameGraphResource,
    normal: FrameGraphResource,
    depth: FrameGraphResource,
}

/// tonemap 借用外部的曝光参数
struct TonemapPass<'a> {
    hdr: FrameGraphResource,
    backbuffer: FrameGraphResource,
    exposure: &'a f32,
}

impl FgPass<HeapAllocator, CommandRecorder> for TonemapPass<'_> {
    fn setup(&mut self, builder: &mut FgPassBuilder<'_, HeapAllocator, CommandRecorder>) -> FgResult<()> {
        builder.read(self.hdr, TextureAccess::SAMPLED.bits())?;
        self.backbuffer = builder.write(self.backbuffer, TextureAccess::COLOR_ATTACHMENT.bits())?;
        Ok(())
    }

    fn execute(&mut self, resources: &FgPassResources<'_, HeapAllocator, CommandRecorder>, cmd: &mut CommandRecorder) {
        match resources.get_descriptor::<Texture>(self.backbuffer) {
            Ok(desc) => cmd.record(format!("tonemap exposure={} -> {}x{}", self.exposure, desc.width, desc.height)),
            Err(err) => log::error!("tonemap: {err}"),
        }
    }
}

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;

fn main() -> anyhow::Result<()> {
    init_log();

    let exposure = 1.5_f32;
    let mut allocator = HeapAllocator::default();
    let mut cmd = CommandRecorder::default();

    let backbuffer_desc = TextureDesc::new(WIDTH, HEIGHT, "bgra8_srgb", 4);
    let backbuffer = Texture {
        allocation: Some(allocator.alloc("swapchain", backbuffer_desc.size())),
    };

    let mut fg = FrameGraph::<HeapAllocator, CommandRecorder>::new();
    fg.reserve(5, 8);
    let backbuffer = fg.import("backbuffer", backbuffer_desc, backbuffer);

    let gbuffer = fg.add_callback_pass(
        "gbuffer",
        |builder| {
            let albedo = builder.create::<Texture>("albedo", TextureDesc::new(WIDTH, HEIGHT, "rgba8", 4));
            let normal = builder.create::<Texture>("normal", TextureDesc::new(WIDTH, HEIGHT, "rgb10a2", 4));
            let depth = builder.create::<Texture>("depth", TextureDesc::new(WIDTH, HEIGHT, "d32", 4));
            Ok(GBuffer {
                albedo: builder.write(albedo, TextureAccess::COLOR_ATTACHMENT.bits())?,
                normal: builder.write(normal, TextureAccess::COLOR_ATTACHMENT.bits())?,
                depth: builder.write(depth, TextureAccess::DEPTH_ATTACHMENT.bits())?,
            })
        },
        |_, _, cmd| cmd.record("draw scene"),
    )?;

    let light_list = fg.add_callback_pass(
        "light cull",
        |builder| {
            builder.read(gbuffer.depth, TextureAccess::SAMPLED.bits())?;
            let lights = builder.create::<Buffer>("light list", 64 * 1024);
            builder.write(lights, TextureAccess::STORAGE.bits())
        },
        |&lights, resources, cmd| match resources.get::<Buffer>(lights) {
            Ok(buffer) => cmd.record(format!("dispatch light cull -> {:?}", buffer.allocation)),
            Err(err) => log::error!("light cull: {err}"),
        },
    )?;

    let hdr = fg.add_callback_pass(
        "lighting",
        |builder| {
            for input in [gbuffer.albedo, gbuffer.normal, gbuffer.depth] {
                builder.read(input, TextureAccess::SAMPLED.bits())?;
            }
            builder.read(light_list, TextureAccess::STORAGE.bits())?;
            let hdr = builder.create::<Texture>("hdr", TextureDesc::new(WIDTH, HEIGHT, "rgba16f", 8));
            builder.write(hdr, TextureAccess::STORAGE.bits())
        },
        |_, _, cmd| cmd.record("dispatch lighting"),
    )?;

    // 没有任何 pass 读取 debug 输出，会被剔除
    fg.add_callback_pass(
        "debug normals",
        |builder| {
            builder.read(gbuffer.normal, TextureAccess::SAMPLED.bits())?;
            let debug = builder.create::<Texture>("debug", TextureDesc::new(WIDTH, HEIGHT, "rgba8", 4));
            builder.write(debug, TextureAccess::COLOR_ATTACHMENT.bits())
        },
        |_, _, cmd| cmd.record("draw debug normals"),
    )?;

    fg.add_pass(
        "tonemap",
        TonemapPass {
            hdr,
            backbuffer,
            exposure: &exposure,
        },
    )?;

    fg.compile()?;
    fg.print_execution_plan();

    fg.execute(&mut cmd, &mut allocator)?;

    log::info!("recorded commands:\n  {}", cmd.commands.iter().join("\n  "));
    log::info!(
        "heap: peak {} KiB, {} allocation(s) still alive",
        allocator.peak_bytes / 1024,
        allocator.allocations.len()
    );

    println!("{fg}");
    Ok(())
}
