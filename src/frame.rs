// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// src/frame.rs - 扫描帧定义
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

use serde::Deserialize;

use crate::model::RawTensor;

/// 一帧的上游输出：检测模型张量与各区域的 OCR 文本
///
/// `texts[i]` 对应 NMS 后的第 i 个检测框，多出的文本不配对检测框。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScanFrame {
  /// 原始图像宽度
  pub width: u32,
  /// 原始图像高度
  pub height: u32,
  pub tensor: RawTensor,
  #[serde(default)]
  pub texts: Vec<String>,
}

impl ScanFrame {
  pub fn new(width: u32, height: u32, tensor: RawTensor) -> Self {
    Self {
      width,
      height,
      tensor,
      texts: Vec::new(),
    }
  }

  pub fn with_texts<I, S>(mut self, texts: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.texts = texts.into_iter().map(Into::into).collect();
    self
  }
}

/// 张量的 JSON 表示: `{ "shape": [1, 6, 8400], "data": [...] }`
#[derive(Debug, Deserialize)]
struct TensorRecord {
  shape: Vec<usize>,
  data: Vec<f32>,
}

impl TryFrom<TensorRecord> for RawTensor {
  type Error = ndarray::ShapeError;

  fn try_from(record: TensorRecord) -> Result<Self, Self::Error> {
    RawTensor::from_shape_vec(record.shape, record.data)
  }
}

impl<'de> Deserialize<'de> for RawTensor {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    let record = TensorRecord::deserialize(deserializer)?;
    RawTensor::try_from(record).map_err(serde::de::Error::custom)
  }
}
