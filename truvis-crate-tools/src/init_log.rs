use std::io::Write;

/// 构建带颜色的日志 builder
///
/// 默认等级为 `default_level`，可以通过 `RUST_LOG` 环境变量覆盖。
fn log_builder(default_level: log::LevelFilter) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder
        .format(|buf, record| {
            let info_style = buf
                .default_level_style(log::Level::Info)
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green)));
            let warn_style = buf
                .default_level_style(log::Level::Warn)
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow)));
            let error_style = buf
                .default_level_style(log::Level::Error)
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red)));

            let level_style = match record.level() {
                log::Level::Info => info_style,
                log::Level::Warn => warn_style,
                log::Level::Error => error_style,
                _ => buf.default_level_style(record.level()),
            };
            let grey_style = info_style.fg_color(Some(anstyle::Color::Rgb(anstyle::RgbColor(110, 110, 110))));

            let line = record.line().unwrap_or(!0);
            let file = record.file().unwrap_or("").rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or("");
            let time = chrono::Local::now().format("%H:%M:%S%.3f");
            let level = record.level();

            writeln!(
                buf,
                "{level_style}[{time}] {level:<5}{level_style:#} {grey_style}[{file}:{line}]{grey_style:#} {}",
                record.args()
            )
        })
        .filter(None, default_level)
        .parse_default_env();
    builder
}

/// 初始化全局日志，默认等级 Info
pub fn init_log() {
    init_log_with_level(log::LevelFilter::Info);
}

/// 以指定的默认等级初始化全局日志
pub fn init_log_with_level(default_level: log::LevelFilter) {
    log_builder(default_level).init();
}

/// 测试中使用的日志初始化
///
/// 输出交给 libtest 捕获；多个测试重复调用是安全的。
pub fn init_test_log() {
    let _ = log_builder(log::LevelFilter::Trace).is_test(true).try_init();
}
