use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use extraction_core::{logging::init_logging, AppConfig};
use extraction_scheduler::Application;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let matches = build_cli().get_matches();

    // 加载配置，命令行参数覆盖日志设置
    let config_path = matches.get_one::<String>("config").map(String::as_str);
    let mut config = AppConfig::load(config_path)
        .with_context(|| format!("加载配置失败: {}", config_path.unwrap_or("<默认路径>")))?;

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.observability.log_level = level.clone();
    }
    if let Some(format) = matches.get_one::<String>("log-format") {
        config.observability.log_format = format.clone();
    }

    // 初始化日志系统
    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    )?;

    let metrics_handle = if config.observability.metrics_enabled {
        Some(install_metrics_recorder()?)
    } else {
        None
    };

    let app = Application::new(config);

    match matches.subcommand() {
        Some(("plan", sub)) => {
            let (files, workers) = batch_args(sub);
            let plan = app.plan(&files, workers);
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Some(("run", sub)) => {
            let (files, workers) = batch_args(sub);
            info!("启动提取: {} 个文件, {} 个Worker", files.len(), workers);

            let report = app.run_files(&files, workers).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if let (Some(handle), Some(path)) =
                (metrics_handle.as_ref(), sub.get_one::<String>("metrics-file"))
            {
                std::fs::write(path, handle.render())
                    .with_context(|| format!("写入指标文件失败: {path}"))?;
                info!("指标已写入: {path}");
            }
        }
        _ => anyhow::bail!("缺少子命令"),
    }

    Ok(())
}

fn build_cli() -> Command {
    let files = Arg::new("files")
        .value_name("FILE")
        .help("要处理的文件")
        .num_args(1..)
        .required(true);

    let workers = Arg::new("workers")
        .short('w')
        .long("workers")
        .value_name("N")
        .help("Worker数量")
        .value_parser(value_parser!(usize))
        .default_value("4");

    Command::new("extraction-scheduler")
        .version("1.0.0")
        .about("文件元数据提取的分布式调度器")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .global(true),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式")
                .value_parser(["json", "pretty"])
                .global(true),
        )
        .subcommand(
            Command::new("plan")
                .about("输出批次的排序与Worker分配，不执行提取")
                .arg(files.clone())
                .arg(workers.clone()),
        )
        .subcommand(
            Command::new("run")
                .about("分布式提取文件元数据并输出结果与指标")
                .arg(files)
                .arg(workers)
                .arg(
                    Arg::new("metrics-file")
                        .long("metrics-file")
                        .value_name("FILE")
                        .help("运行结束后写入Prometheus格式的指标"),
                ),
        )
}

fn batch_args(matches: &ArgMatches) -> (Vec<String>, usize) {
    let files = matches
        .get_many::<String>("files")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let workers = matches.get_one::<usize>("workers").copied().unwrap_or(1);
    (files, workers)
}

/// 安装Prometheus指标记录器
fn install_metrics_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("安装Prometheus指标记录器失败")
}
