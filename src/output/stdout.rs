// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// src/output/stdout.rs - 标准输出
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

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, frame::ScanFrame, model::ScanResult, output::Render, query_param,
};

#[derive(Error, Debug)]
pub enum StdoutOutputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("参数错误: {0}")]
  InvalidParameter(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdoutFormat {
  #[default]
  Text,
  /// 每帧一行 JSON
  Json,
}

impl std::str::FromStr for StdoutFormat {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "text" => Ok(StdoutFormat::Text),
      "json" => Ok(StdoutFormat::Json),
      _ => Err(format!("未知的输出格式: {}", s)),
    }
  }
}

pub struct StdoutOutput {
  format: StdoutFormat,
  frame_counter: AtomicUsize,
}

impl FromUrlWithScheme for StdoutOutput {
  const SCHEME: &'static str = "stdout";
}

impl FromUrl for StdoutOutput {
  type Error = StdoutOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(StdoutOutputError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let format = query_param(uri, "format", StdoutFormat::default())
      .map_err(StdoutOutputError::InvalidParameter)?;

    Ok(StdoutOutput::new(format))
  }
}

impl StdoutOutput {
  pub fn new(format: StdoutFormat) -> Self {
    Self {
      format,
      frame_counter: AtomicUsize::new(0),
    }
  }

  pub fn format(&self) -> StdoutFormat {
    self.format
  }

  /// 将一帧结果写入任意输出流
  pub fn write_result<W: Write>(
    &self,
    out: &mut W,
    frame: &ScanFrame,
    result: &ScanResult,
  ) -> Result<(), StdoutOutputError> {
    let index = self.frame_counter.fetch_add(1, Ordering::Relaxed) + 1;

    match self.format {
      StdoutFormat::Json => {
        serde_json::to_writer(&mut *out, result)?;
        writeln!(out)?;
      }
      StdoutFormat::Text => {
        writeln!(
          out,
          "帧 {} ({}x{}): 检测到 {} 个区域, {} 条文本",
          index,
          frame.width,
          frame.height,
          result.detections.len(),
          result.candidates.len()
        )?;
        for (i, det) in result.detections.iter().enumerate() {
          writeln!(
            out,
            "  - 区域 {}: {:.2}% at ({:.3}, {:.3}, {:.3}, {:.3})",
            i,
            det.confidence * 100.0,
            det.left,
            det.top,
            det.right,
            det.bottom
          )?;
        }
        for candidate in &result.candidates {
          let r = &candidate.result;
          let vin = r.vin.as_deref().unwrap_or("-");
          match (r.is_valid, r.error_reason) {
            (true, None) => writeln!(out, "  - 文本 {}: {} 有效", candidate.text_index, vin)?,
            (true, Some(reason)) => writeln!(
              out,
              "  - 文本 {}: {} 有效 (警告: {})",
              candidate.text_index, vin, reason
            )?,
            (false, reason) => writeln!(
              out,
              "  - 文本 {}: {} 无效 ({})",
              candidate.text_index,
              vin,
              reason.map(|r| r.message()).unwrap_or("unknown")
            )?,
          }
          if let Some(variant) = &r.checksum_variant {
            writeln!(out, "    校正为: {}", variant)?;
          }
        }
      }
    }

    Ok(())
  }
}

impl Render<ScanFrame, ScanResult> for StdoutOutput {
  type Error = StdoutOutputError;

  fn render_result(&self, frame: &ScanFrame, result: &ScanResult) -> Result<(), Self::Error> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    self.write_result(&mut lock, frame, result)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{BoundingBox, RawTensor, VinCandidate};
  use crate::vin;

  fn sample() -> (ScanFrame, ScanResult) {
    let frame = ScanFrame::new(
      1280,
      960,
      RawTensor::from_shape_vec(vec![1, 5, 1], vec![0.0; 5]).unwrap(),
    );
    let result = ScanResult {
      detections: vec![BoundingBox {
        left: 0.1,
        top: 0.2,
        right: 0.3,
        bottom: 0.4,
        confidence: 0.9,
      }],
      candidates: vec![
        VinCandidate {
          text_index: 0,
          bbox: None,
          result: vin::validate("1HG8H41JXMN109186"),
        },
        VinCandidate {
          text_index: 1,
          bbox: None,
          result: vin::validate("ERA:PPSNAE234439G161"),
        },
      ],
    };
    (frame, result)
  }

  #[test]
  fn text_format_lists_regions_and_texts() {
    let (frame, result) = sample();
    let output = StdoutOutput::new(StdoutFormat::Text);
    let mut buf = Vec::new();
    output.write_result(&mut buf, &frame, &result).unwrap();

    let text = String::from_utf8(buf).unwrap();
    assert!(text.starts_with("帧 1 (1280x960)"));
    assert!(text.contains("90.00%"));
    assert!(text.contains("1HG8H41JXMN109186 有效"));
    assert!(text.contains("校正为: 1HGBH41JXMN109186"));
    assert!(text.contains("invalid characters in middle"));
  }

  #[test]
  fn json_format_writes_one_line_per_frame() {
    let (frame, result) = sample();
    let output = StdoutOutput::new(StdoutFormat::Json);
    let mut buf = Vec::new();
    output.write_result(&mut buf, &frame, &result).unwrap();
    output.write_result(&mut buf, &frame, &result).unwrap();

    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);

    let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(value["candidates"][0]["result"]["is_valid"], true);
    assert_eq!(
      value["candidates"][1]["result"]["error_reason"],
      "invalid_characters_in_middle"
    );
  }

  #[test]
  fn format_is_read_from_url() {
    let output = StdoutOutput::from_url(&Url::parse("stdout://?format=json").unwrap()).unwrap();
    assert_eq!(output.format(), StdoutFormat::Json);
    assert!(StdoutOutput::from_url(&Url::parse("stdout://?format=xml").unwrap()).is_err());
  }
}
