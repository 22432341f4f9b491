// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// src/bin/vin_check.rs - 命令行车架号校验
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

use std::io::{BufRead, Write};

use anyhow::Result;
use clap::Parser;
use url::Url;

use shanan_vin::{
  FromUrl,
  vin::{VinValidationResult, VinValidatorBuilder},
};
use tracing::{debug, info};

/// 校验命令行或标准输入中的车架号文本
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 车架号校验参数，例如 vin://?policy=lenient&depth=2
  #[arg(long, value_name = "VALIDATOR", default_value = "vin://")]
  pub validator: Url,
  /// 以 JSON 行输出结果
  #[arg(long)]
  pub json: bool,
  /// 待校验文本，省略时从标准输入逐行读取
  #[arg(long = "text", value_name = "TEXT")]
  pub texts: Vec<String>,
}

fn print_result<W: Write>(
  out: &mut W,
  text: &str,
  result: &VinValidationResult,
  json: bool,
) -> Result<()> {
  if json {
    serde_json::to_writer(&mut *out, result)?;
    writeln!(out)?;
    return Ok(());
  }

  match result.accepted_vin() {
    Some(vin) => match result.error_reason {
      Some(reason) => writeln!(out, "{}\t{}\t警告: {}", text, vin, reason)?,
      None => writeln!(out, "{}\t{}", text, vin)?,
    },
    None => writeln!(
      out,
      "{}\t-\t{}",
      text,
      result.error_reason.map(|r| r.message()).unwrap_or("unknown")
    )?,
  }
  Ok(())
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  info!("校验参数: {}", args.validator);

  let validator = VinValidatorBuilder::from_url(&args.validator)?.build()?;

  let texts = if args.texts.is_empty() {
    debug!("从标准输入读取文本");
    std::io::stdin()
      .lock()
      .lines()
      .collect::<Result<Vec<_>, _>>()?
  } else {
    args.texts
  };

  let stdout = std::io::stdout();
  let mut out = stdout.lock();
  let mut accepted = 0;
  for text in texts.iter().filter(|t| !t.trim().is_empty()) {
    let result = validator.validate(text);
    if result.is_valid {
      accepted += 1;
    }
    print_result(&mut out, text, &result, args.json)?;
  }
  info!("共 {} 条文本, 有效 {} 条", texts.len(), accepted);

  Ok(())
}
