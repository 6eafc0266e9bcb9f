//! 调试输出
//!
//! `FgDebugWriter` 只读取 graph 的声明和 compile 结果，不会影响 compile / execute。
//! 默认实现 `GraphvizWriter` 输出 dot 格式，可以直接交给 `dot -Tsvg` 渲染。

use std::fmt;

use itertools::Itertools;

use super::graph::FrameGraph;
use super::resource_handle::FLAGS_IGNORED;

/// graph 的调试输出格式
pub trait FgDebugWriter {
    fn write<A, C>(&self, graph: &FrameGraph<'_, A, C>, out: &mut dyn fmt::Write) -> fmt::Result;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RankDir {
    #[default]
    LeftRight,
    TopBottom,
}

impl RankDir {
    fn as_dot(self) -> &'static str {
        match self {
            RankDir::LeftRight => "LR",
            RankDir::TopBottom => "TB",
        }
    }
}

/// Graphviz 输出使用的颜色
#[derive(Clone, Debug)]
pub struct GraphvizColors {
    pub pass: &'static str,
    pub culled_pass: &'static str,
    pub transient: &'static str,
    pub imported: &'static str,
    pub create_edge: &'static str,
    pub write_edge: &'static str,
    pub read_edge: &'static str,
}

impl Default for GraphvizColors {
    fn default() -> Self {
        Self {
            pass: "orange",
            culled_pass: "lightgray",
            transient: "skyblue",
            imported: "steelblue",
            create_edge: "gray40",
            write_edge: "orangered",
            read_edge: "olivedrab3",
        }
    }
}

#[derive(Clone, Debug)]
pub struct GraphvizWriter {
    pub font_name: String,
    pub font_size: u32,
    pub rank_dir: RankDir,
    pub colors: GraphvizColors,
}

impl Default for GraphvizWriter {
    fn default() -> Self {
        Self {
            font_name: "Consolas".to_string(),
            font_size: 10,
            rank_dir: RankDir::default(),
            colors: GraphvizColors::default(),
        }
    }
}

/// dot 字符串中需要转义的字符
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

impl FgDebugWriter for GraphvizWriter {
    fn write<A, C>(&self, graph: &FrameGraph<'_, A, C>, out: &mut dyn fmt::Write) -> fmt::Result {
        let colors = &self.colors;
        let registry = graph.resources();

        writeln!(out, "digraph FrameGraph {{")?;
        writeln!(out, "  graph [rankdir={}, ordering=out, splines=spline]", self.rank_dir.as_dot())?;
        writeln!(
            out,
            "  node [shape=box, fontname=\"{}\", fontsize={}, margin=\"0.2,0.03\"]",
            escape(&self.font_name),
            self.font_size
        )?;
        writeln!(out)?;

        writeln!(out, "  // passes")?;
        for pass in graph.passes() {
            let fill = if pass.can_execute() { colors.pass } else { colors.culled_pass };
            let mut label = format!("{}\\nid: {}  refs: {}", escape(pass.name()), pass.id(), pass.ref_count());
            if pass.has_side_effect() {
                label.push_str("\\nside effect");
            }
            writeln!(out, "  P{} [label=\"{label}\", style=\"rounded,filled\", fillcolor={fill}]", pass.id())?;
        }
        writeln!(out)?;

        writeln!(out, "  // resources")?;
        for node in registry.iter_nodes() {
            let Ok(entry) = registry.entry(node.handle()) else {
                continue;
            };
            let fill = if entry.is_imported() { colors.imported } else { colors.transient };
            let mut label = format!(
                "{}\\nid: {}  version: {}  refs: {}\\n{}",
                escape(node.name()),
                node.handle().id(),
                node.version(),
                node.ref_count(),
                escape(&entry.describe())
            );
            if let (Some(producer), Some(last)) = (entry.producer(), entry.last()) {
                label.push_str(&format!("\\nlifetime: P{producer} .. P{last}"));
            } else if entry.is_imported() {
                label.push_str("\\nimported");
            }
            writeln!(out, "  R{} [label=\"{label}\", style=filled, fillcolor={fill}]", node.handle().id())?;
        }
        writeln!(out)?;

        writeln!(out, "  // edges")?;
        for pass in graph.passes() {
            let access = pass.access();
            for handle in access.creates() {
                writeln!(out, "  P{} -> R{} [color={}, style=bold]", pass.id(), handle.id(), colors.create_edge)?;
            }
            for (handle, _) in access.writes().iter().filter(|(h, _)| !access.creates_resource(*h)) {
                writeln!(out, "  P{} -> R{} [color={}]", pass.id(), handle.id(), colors.write_edge)?;
            }
            for (handle, flags) in access.reads().iter().unique_by(|(h, _)| *h) {
                let style = if *flags == FLAGS_IGNORED { ", style=dashed" } else { "" };
                writeln!(out, "  R{} -> P{} [color={}{style}]", handle.id(), pass.id(), colors.read_edge)?;
            }
        }

        writeln!(out, "}}")
    }
}

// debug output
impl<A, C> FrameGraph<'_, A, C> {
    pub fn debug_output(&self, out: &mut dyn fmt::Write, writer: &impl FgDebugWriter) -> fmt::Result {
        writer.write(self, out)
    }
}

impl<A, C> fmt::Display for FrameGraph<'_, A, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.debug_output(f, &GraphvizWriter::default())
    }
}
