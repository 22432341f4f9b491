// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// src/input/json_lines.rs - JSON 行输入（每行一帧）
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

use std::io::{BufRead, Lines, StdinLock};

use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::ScanFrame};

#[derive(Error, Debug)]
pub enum JsonLinesInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 逐行读取扫描帧，无法解析的行会被跳过
pub struct JsonLinesInput<R> {
  lines: Lines<R>,
  line_number: usize,
}

pub type StdinInput = JsonLinesInput<StdinLock<'static>>;

impl<R: BufRead> JsonLinesInput<R> {
  pub fn new(reader: R) -> Self {
    Self {
      lines: reader.lines(),
      line_number: 0,
    }
  }
}

impl<R: BufRead> Iterator for JsonLinesInput<R> {
  type Item = ScanFrame;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      let line = match self.lines.next()? {
        Ok(line) => line,
        Err(e) => {
          error!("读取第 {} 行失败: {}", self.line_number + 1, e);
          return None;
        }
      };
      self.line_number += 1;

      if line.trim().is_empty() {
        continue;
      }

      match serde_json::from_str::<ScanFrame>(&line) {
        Ok(frame) => return Some(frame),
        Err(e) => warn!("跳过第 {} 行, 解析失败: {}", self.line_number, e),
      }
    }
  }
}

impl FromUrlWithScheme for StdinInput {
  const SCHEME: &'static str = "stdin";
}

impl FromUrl for StdinInput {
  type Error = JsonLinesInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(JsonLinesInputError::SchemeMismatch);
    }

    info!("从标准输入读取扫描帧");
    Ok(JsonLinesInput::new(std::io::stdin().lock()))
  }
}
