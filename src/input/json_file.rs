// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// src/input/json_file.rs - JSON 文件输入
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
use std::io::BufReader;

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, frame::ScanFrame, input::JsonLinesInput, url_file_path,
};

#[derive(Error, Debug)]
pub enum JsonFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON parse error: {0}")]
  ParseError(#[from] serde_json::Error),
}

/// 文件内容可以是单个帧，也可以是帧数组
#[derive(Deserialize)]
#[serde(untagged)]
enum FrameDocument {
  Many(Vec<ScanFrame>),
  One(ScanFrame),
}

pub struct JsonFileInput {
  frames: std::vec::IntoIter<ScanFrame>,
}

impl JsonFileInput {
  pub fn len(&self) -> usize {
    self.frames.len()
  }

  pub fn is_empty(&self) -> bool {
    self.frames.len() == 0
  }
}

impl FromUrlWithScheme for JsonFileInput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonFileInput {
  type Error = JsonFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(JsonFileInputError::SchemaMismatch);
    }

    let path = url_file_path(url);
    let reader = BufReader::new(File::open(&path)?);
    let frames = match serde_json::from_reader(reader)? {
      FrameDocument::Many(frames) => frames,
      FrameDocument::One(frame) => vec![frame],
    };
    info!("从 {} 读取 {} 帧", path, frames.len());

    Ok(JsonFileInput {
      frames: frames.into_iter(),
    })
  }
}

impl Iterator for JsonFileInput {
  type Item = ScanFrame;

  fn next(&mut self) -> Option<Self::Item> {
    self.frames.next()
  }
}

pub type JsonLinesFileInput = JsonLinesInput<BufReader<File>>;

impl FromUrlWithScheme for JsonLinesFileInput {
  const SCHEME: &'static str = "jsonl";
}

impl FromUrl for JsonLinesFileInput {
  type Error = JsonFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(JsonFileInputError::SchemaMismatch);
    }

    let path = url_file_path(url);
    info!("逐行读取扫描帧: {}", path);
    Ok(JsonLinesInput::new(BufReader::new(File::open(&path)?)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  const FRAME: &str = r#"{"width": 640, "height": 640, "tensor": {"shape": [1, 5, 1], "data": [320, 320, 10, 10, 0.9]}}"#;

  fn file_url(file: &tempfile::NamedTempFile, scheme: &str) -> Url {
    Url::parse(&format!("{}://{}", scheme, file.path().display())).unwrap()
  }

  #[test]
  fn single_frame_document() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", FRAME).unwrap();

    let input = JsonFileInput::from_url(&file_url(&file, "json")).unwrap();
    assert_eq!(input.len(), 1);
    assert_eq!(input.count(), 1);
  }

  #[test]
  fn frame_array_document() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[{}, {}, {}]", FRAME, FRAME, FRAME).unwrap();

    let input = JsonFileInput::from_url(&file_url(&file, "json")).unwrap();
    assert_eq!(input.count(), 3);
  }

  #[test]
  fn json_lines_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{}", FRAME).unwrap();
    writeln!(file, "{}", FRAME).unwrap();

    let input = JsonLinesFileInput::from_url(&file_url(&file, "jsonl")).unwrap();
    assert_eq!(input.count(), 2);
  }

  #[test]
  fn broken_document_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();

    assert!(matches!(
      JsonFileInput::from_url(&file_url(&file, "json")),
      Err(JsonFileInputError::ParseError(_))
    ));
  }

  #[test]
  fn missing_file_is_an_error() {
    let url = Url::parse("json:///nonexistent/shanan-vin/frame.json").unwrap();
    assert!(matches!(
      JsonFileInput::from_url(&url),
      Err(JsonFileInputError::IoError(_))
    ));
  }
}
