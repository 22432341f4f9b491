// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// src/bin/benchmark_repeatshot.rs - 重复识别基准测试
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use anyhow::Result;
use clap::Parser;
use url::Url;

use shanan_vin::{
  FromUrl,
  model::VinScannerBuilder,
  task::{DEFAULT_REPEAT_TIMES, RepeatShotTask, Task},
  vin::VinValidatorBuilder,
};
use tracing::info;

/// Shanan VIN 参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测参数，例如 yolo://?size=640&conf=0.5
  #[arg(long, value_name = "MODEL", default_value = "yolo://")]
  pub model: Url,
  /// 车架号校验参数，例如 vin://?policy=strict
  #[arg(long, value_name = "VALIDATOR", default_value = "vin://")]
  pub validator: Url,
  /// 输入来源
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径
  #[arg(long, value_name = "OUTPUT", default_value = "stdout://")]
  pub output: Url,
  /// 重复次数
  #[arg(long, value_name = "REPEAT", default_value_t = DEFAULT_REPEAT_TIMES)]
  pub repeat: usize,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("检测参数: {}", args.model);
  info!("校验参数: {}", args.validator);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let input = shanan_vin::input::InputWrapper::from_url(&args.input)?;
  let validator = VinValidatorBuilder::from_url(&args.validator)?.build()?;
  let model = VinScannerBuilder::from_url(&args.model)?
    .validator(validator)
    .build()?;
  let output = shanan_vin::output::OutputWrapper::from_url(&args.output)?;

  RepeatShotTask::default()
    .with_repeat_times(args.repeat)
    .run_task(input, model, output)?;

  Ok(())
}
