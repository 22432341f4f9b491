// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// src/model.rs - 检测模型输出定义
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

use ndarray::{ArrayD, ArrayViewD, IxDyn, ShapeError};
use serde::{Deserialize, Serialize};

use crate::geometry::{self, Rect};
use crate::vin::VinValidationResult;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 归一化边界框，坐标范围 [0, 1]，相对于原始图像
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
  pub left: f32,
  pub top: f32,
  pub right: f32,
  pub bottom: f32,
  pub confidence: f32,
}

impl BoundingBox {
  /// 由角点矩形构造，退化矩形返回 None
  pub fn from_rect(rect: Rect, confidence: f32) -> Option<Self> {
    if !geometry::is_proper(&rect) {
      return None;
    }

    Some(Self {
      left: rect[0],
      top: rect[1],
      right: rect[2],
      bottom: rect[3],
      confidence,
    })
  }

  pub fn rect(&self) -> Rect {
    [self.left, self.top, self.right, self.bottom]
  }

  pub fn width(&self) -> f32 {
    self.right - self.left
  }

  pub fn height(&self) -> f32 {
    self.bottom - self.top
  }

  pub fn area(&self) -> f32 {
    geometry::area(&self.rect())
  }

  pub fn iou(&self, other: &BoundingBox) -> f32 {
    geometry::iou(&self.rect(), &other.rect())
  }
}

/// 检测模型的原始输出张量，形状应为 [1, dim_a, dim_b]
#[derive(Debug, Clone, PartialEq)]
pub struct RawTensor {
  data: ArrayD<f32>,
}

impl RawTensor {
  pub fn from_shape_vec(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, ShapeError> {
    let data = ArrayD::from_shape_vec(IxDyn(&shape), data)?;
    Ok(Self { data })
  }

  pub fn shape(&self) -> &[usize] {
    self.data.shape()
  }

  pub fn view(&self) -> ArrayViewD<'_, f32> {
    self.data.view()
  }
}

impl From<ArrayD<f32>> for RawTensor {
  fn from(data: ArrayD<f32>) -> Self {
    Self { data }
  }
}

/// 单条 OCR 文本的校验结果，`bbox` 为与之配对的检测框
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VinCandidate {
  pub text_index: usize,
  pub bbox: Option<BoundingBox>,
  pub result: VinValidationResult,
}

/// 一帧的识别结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanResult {
  pub detections: Vec<BoundingBox>,
  pub candidates: Vec<VinCandidate>,
}

impl ScanResult {
  /// 最可信的候选：优先校验位通过的，其次仅格式有效的
  pub fn best(&self) -> Option<&VinCandidate> {
    self
      .candidates
      .iter()
      .find(|c| c.result.is_valid && c.result.checksum_valid)
      .or_else(|| self.candidates.iter().find(|c| c.result.is_valid))
  }

  pub fn has_valid_vin(&self) -> bool {
    self.best().is_some()
  }

  pub fn is_empty(&self) -> bool {
    self.detections.is_empty() && self.candidates.is_empty()
  }
}

mod decoder;
mod letterbox;
mod nms;
mod scanner;

pub use self::decoder::{DecodeError, DetectionDecoder, PROPERTY_AXIS_SIZES, TensorLayout};
pub use self::letterbox::LetterboxTransform;
pub use self::nms::NonMaxSuppressor;
pub use self::scanner::{DetectionBuilderError, VinScanner, VinScannerBuilder};

#[cfg(test)]
mod tests {
  use super::*;
  use crate::vin::VinValidator;

  #[test]
  fn degenerate_rect_is_not_a_box() {
    assert!(BoundingBox::from_rect([0.5, 0.1, 0.5, 0.4], 0.9).is_none());
    assert!(BoundingBox::from_rect([0.1, 0.4, 0.5, 0.3], 0.9).is_none());
    let b = BoundingBox::from_rect([0.1, 0.2, 0.5, 0.6], 0.9).unwrap();
    assert!((b.width() - 0.4).abs() < 1e-6);
    assert!((b.area() - 0.16).abs() < 1e-6);
  }

  #[test]
  fn raw_tensor_rejects_mismatched_data() {
    assert!(RawTensor::from_shape_vec(vec![1, 2, 3], vec![0.0; 5]).is_err());
    let t = RawTensor::from_shape_vec(vec![1, 2, 3], vec![0.0; 6]).unwrap();
    assert_eq!(t.shape(), &[1, 2, 3]);
  }

  #[test]
  fn best_prefers_checksum_valid_candidates() {
    let lenient = VinValidator::builder()
      .policy(crate::vin::ChecksumPolicy::Lenient)
      .build()
      .unwrap();
    let soft = lenient.validate("1HGBH41J2MN109186");
    let hard = lenient.validate("1HGBH41JXMN109186");
    assert!(soft.is_valid && !soft.checksum_valid);

    let result = ScanResult {
      detections: vec![],
      candidates: vec![
        VinCandidate {
          text_index: 0,
          bbox: None,
          result: soft,
        },
        VinCandidate {
          text_index: 1,
          bbox: None,
          result: hard,
        },
      ],
    };

    assert_eq!(result.best().map(|c| c.text_index), Some(1));
    assert!(result.has_valid_vin());
  }
}
