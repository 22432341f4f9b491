// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// src/input.rs - 扫描帧输入
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

use thiserror::Error;

use crate::{FromUrl, FromUrlWithScheme, frame::ScanFrame};

mod json_lines;
pub use self::json_lines::{JsonLinesInput, JsonLinesInputError, StdinInput};

#[cfg(feature = "json_input")]
mod json_file;
#[cfg(feature = "json_input")]
pub use self::json_file::{JsonFileInput, JsonFileInputError, JsonLinesFileInput};

#[derive(Error, Debug)]
pub enum InputError {
  #[cfg(feature = "json_input")]
  #[error("JSON 文件输入错误: {0}")]
  JsonFileInputError(#[from] JsonFileInputError),
  #[error("JSON 行输入错误: {0}")]
  JsonLinesInputError(#[from] JsonLinesInputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum InputWrapper {
  #[cfg(feature = "json_input")]
  JsonFile(JsonFileInput),
  #[cfg(feature = "json_input")]
  JsonLinesFile(JsonLinesFileInput),
  Stdin(StdinInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      #[cfg(feature = "json_input")]
      JsonFileInput::SCHEME => Ok(InputWrapper::JsonFile(JsonFileInput::from_url(url)?)),
      #[cfg(feature = "json_input")]
      JsonLinesFileInput::SCHEME => Ok(InputWrapper::JsonLinesFile(
        JsonLinesFileInput::from_url(url)?,
      )),
      StdinInput::SCHEME => Ok(InputWrapper::Stdin(StdinInput::from_url(url)?)),
      _ => Err(InputError::SchemeMismatch),
    }
  }
}

impl Iterator for InputWrapper {
  type Item = ScanFrame;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      #[cfg(feature = "json_input")]
      InputWrapper::JsonFile(input) => input.next(),
      #[cfg(feature = "json_input")]
      InputWrapper::JsonLinesFile(input) => input.next(),
      InputWrapper::Stdin(input) => input.next(),
    }
  }
}
