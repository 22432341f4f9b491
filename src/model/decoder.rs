// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// src/model/decoder.rs - 检测输出张量解码
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

use ndarray::{ArrayView3, Ix3};
use thiserror::Error;
use tracing::{debug, error};

use crate::geometry;
use crate::model::{BoundingBox, LetterboxTransform, RawTensor};

/// 已知的属性轴长度：4 个几何量 + 目标置信度 (+ 类别分数)
pub const PROPERTY_AXIS_SIZES: [usize; 4] = [5, 6, 84, 85];

const GEOMETRY_SLOTS: usize = 4;
const OBJECTNESS_SLOT: usize = 4;
const CLASS_SLOT_START: usize = 5;

#[derive(Error, Debug, PartialEq)]
pub enum DecodeError {
  #[error("张量维度无效: 期望 3 维, 实际 {0} 维")]
  InvalidRank(usize),
  #[error("批大小无效: 期望 1, 实际 {0}")]
  InvalidBatch(usize),
  #[error("属性轴长度 {0} 不足以容纳边界框")]
  PropertiesTooSmall(usize),
  #[error("图像尺寸无效: {width}x{height}")]
  InvalidImageSize { width: u32, height: u32 },
}

/// 张量的轴布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorLayout {
  /// [1, 属性, 候选]
  PropertiesFirst { properties: usize, candidates: usize },
  /// [1, 候选, 属性]
  CandidatesFirst { properties: usize, candidates: usize },
}

impl TensorLayout {
  /// 根据形状判断哪一个轴是属性轴
  ///
  /// 优先匹配已知的属性轴长度，均不匹配时取较小的轴为属性轴。
  pub fn detect(dim_a: usize, dim_b: usize) -> Self {
    if PROPERTY_AXIS_SIZES.contains(&dim_a) {
      TensorLayout::PropertiesFirst {
        properties: dim_a,
        candidates: dim_b,
      }
    } else if PROPERTY_AXIS_SIZES.contains(&dim_b) {
      TensorLayout::CandidatesFirst {
        properties: dim_b,
        candidates: dim_a,
      }
    } else if dim_a <= dim_b {
      debug!("属性轴长度未知 ({} / {}), 取较小的轴", dim_a, dim_b);
      TensorLayout::PropertiesFirst {
        properties: dim_a,
        candidates: dim_b,
      }
    } else {
      debug!("属性轴长度未知 ({} / {}), 取较小的轴", dim_a, dim_b);
      TensorLayout::CandidatesFirst {
        properties: dim_b,
        candidates: dim_a,
      }
    }
  }

  pub fn properties(&self) -> usize {
    match *self {
      TensorLayout::PropertiesFirst { properties, .. } => properties,
      TensorLayout::CandidatesFirst { properties, .. } => properties,
    }
  }

  pub fn candidates(&self) -> usize {
    match *self {
      TensorLayout::PropertiesFirst { candidates, .. } => candidates,
      TensorLayout::CandidatesFirst { candidates, .. } => candidates,
    }
  }

  fn get(&self, view: &ArrayView3<f32>, candidate: usize, property: usize) -> f32 {
    match self {
      TensorLayout::PropertiesFirst { .. } => view[[0, property, candidate]],
      TensorLayout::CandidatesFirst { .. } => view[[0, candidate, property]],
    }
  }
}

/// 检测模型输出解码器
#[derive(Debug, Clone)]
pub struct DetectionDecoder {
  model_size: u32,
  confidence_floor: f32,
  normalized_coordinates: bool,
}

impl DetectionDecoder {
  pub fn new(model_size: u32) -> Self {
    Self {
      model_size,
      confidence_floor: 0.0,
      normalized_coordinates: false,
    }
  }

  /// 置信度下限，过低的阈值会产生大量低质量框
  pub fn with_confidence_floor(mut self, floor: f32) -> Self {
    self.confidence_floor = floor;
    self
  }

  /// 模型输出的几何量为 [0, 1] 归一化值时设为 true
  pub fn with_normalized_coordinates(mut self, normalized: bool) -> Self {
    self.normalized_coordinates = normalized;
    self
  }

  pub fn model_size(&self) -> u32 {
    self.model_size
  }

  pub fn confidence_floor(&self) -> f32 {
    self.confidence_floor
  }

  pub fn effective_threshold(&self, requested: f32) -> f32 {
    requested.max(self.confidence_floor)
  }

  /// 将原始张量解码为原图归一化坐标下的边界框（未做 NMS）
  pub fn decode(
    &self,
    tensor: &RawTensor,
    image_width: u32,
    image_height: u32,
    confidence_threshold: f32,
  ) -> Result<Vec<BoundingBox>, DecodeError> {
    if image_width == 0 || image_height == 0 {
      error!("图像尺寸无效: {}x{}", image_width, image_height);
      return Err(DecodeError::InvalidImageSize {
        width: image_width,
        height: image_height,
      });
    }

    let rank = tensor.shape().len();
    let view = tensor
      .view()
      .into_dimensionality::<Ix3>()
      .map_err(|_| {
        error!("张量维度无效: {:?}", tensor.shape());
        DecodeError::InvalidRank(rank)
      })?;

    let (batch, dim_a, dim_b) = view.dim();
    if batch != 1 {
      error!("批大小无效: {:?}", tensor.shape());
      return Err(DecodeError::InvalidBatch(batch));
    }

    let layout = TensorLayout::detect(dim_a, dim_b);
    let properties = layout.properties();
    if properties < GEOMETRY_SLOTS {
      error!("属性轴长度 {} 不足以容纳边界框", properties);
      return Err(DecodeError::PropertiesTooSmall(properties));
    }

    let threshold = self.effective_threshold(confidence_threshold);
    let letterbox = LetterboxTransform::new(image_width, image_height, self.model_size);
    let scale = if self.normalized_coordinates {
      self.model_size as f32
    } else {
      1.0
    };

    debug!(
      "张量布局: {:?}, 有效阈值: {:.3}, 信箱变换: {:?}",
      layout, threshold, letterbox
    );

    let mut boxes = Vec::new();
    for i in 0..layout.candidates() {
      let objectness = if properties > OBJECTNESS_SLOT {
        layout.get(&view, i, OBJECTNESS_SLOT)
      } else {
        1.0
      };

      let class_score = (CLASS_SLOT_START..properties)
        .map(|p| layout.get(&view, i, p))
        .reduce(f32::max)
        .unwrap_or(1.0);

      let confidence = objectness * class_score;
      // NaN 也在此被过滤
      if !(confidence >= threshold) {
        continue;
      }

      let cx = layout.get(&view, i, 0) * scale;
      let cy = layout.get(&view, i, 1) * scale;
      let w = layout.get(&view, i, 2) * scale;
      let h = layout.get(&view, i, 3) * scale;

      let model_rect = geometry::center_to_corners(cx, cy, w, h);
      let rect = letterbox.map_rect(&model_rect);

      if let Some(bbox) = BoundingBox::from_rect(rect, confidence) {
        boxes.push(bbox);
      }
    }

    debug!("解码得到 {} 个候选框", boxes.len());
    Ok(boxes)
  }
}
