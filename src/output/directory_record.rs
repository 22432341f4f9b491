// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU16, Ordering};

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  FromUrl, FromUrlWithScheme, frame::ScanFrame, model::ScanResult, output::Render, url_file_path,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ScanRecord<'a> {
  scanned_at: String,
  width: u32,
  height: u32,
  #[serde(flatten)]
  result: &'a ScanResult,
}

/// 按日期分目录保存每帧的识别记录
///
/// 路径形如 `<root>/YYYY/MM/DD/HH-MM-SS-XXXX.json`，其中 `XXXX` 为十六进制帧序号。
/// 默认只记录识别出有效车架号的帧，`?always` 时记录全部帧。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  frame_counter: AtomicU16,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let always = uri.query_pairs().any(|(k, _)| k == "always");
    let directory = PathBuf::from(url_file_path(uri));
    info!("识别记录目录: {}, always = {}", directory.display(), always);

    Ok(DirectoryRecordOutput::new(directory, always))
  }
}

impl DirectoryRecordOutput {
  pub fn new<P: AsRef<Path>>(directory: P, always: bool) -> Self {
    Self {
      directory: directory.as_ref().to_path_buf(),
      frame_counter: AtomicU16::new(0),
      always,
    }
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  fn frame_id(&self) -> u16 {
    self.frame_counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
  }

  fn record_path(&self, now: &DateTime<Utc>) -> Result<PathBuf, std::io::Error> {
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    Ok(directory.join(format!(
      "{}-{:04X}.json",
      now.format("%H-%M-%S"),
      self.frame_id()
    )))
  }
}

impl Render<ScanFrame, ScanResult> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &ScanFrame, result: &ScanResult) -> Result<(), Self::Error> {
    if !self.always && !result.has_valid_vin() {
      return Ok(());
    }

    let now = Utc::now();
    let path = self.record_path(&now)?;
    let record = ScanRecord {
      scanned_at: now.to_rfc3339(),
      width: frame.width,
      height: frame.height,
      result,
    };

    let writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(writer, &record)?;
    debug!("写入识别记录: {}", path.display());
    Ok(())
  }
}
