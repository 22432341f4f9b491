// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// src/model/scanner.rs - 检测与 VIN 校验流水线
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
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::ScanFrame,
  model::{
    BoundingBox, DecodeError, DetectionDecoder, Model, NonMaxSuppressor, RawTensor, ScanResult,
    VinCandidate,
  },
  query_param,
  vin::VinValidator,
};

const DEFAULT_MODEL_SIZE: u32 = 640;
const DEFAULT_CONFIDENCE_FLOOR: f32 = 0.25;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

#[derive(Error, Debug)]
pub enum DetectionBuilderError {
  #[error("模型路径必须使用 {0} 方案")]
  SchemeMismatch(&'static str),
  #[error("参数错误: {0}")]
  InvalidParameter(String),
}

/// 一帧的完整处理：解码 → NMS → 逐条校验 OCR 文本
#[derive(Debug, Clone)]
pub struct VinScanner {
  decoder: DetectionDecoder,
  suppressor: NonMaxSuppressor,
  confidence_threshold: f32,
  validator: VinValidator,
}

impl VinScanner {
  pub fn decoder(&self) -> &DetectionDecoder {
    &self.decoder
  }

  pub fn validator(&self) -> &VinValidator {
    &self.validator
  }

  /// 解码并去重，返回按置信度降序排列的检测框
  pub fn detect(
    &self,
    tensor: &RawTensor,
    image_width: u32,
    image_height: u32,
  ) -> Result<Vec<BoundingBox>, DecodeError> {
    let boxes = self
      .decoder
      .decode(tensor, image_width, image_height, self.confidence_threshold)?;
    Ok(self.suppressor.suppress(boxes))
  }

  /// 逐条校验 OCR 文本，`texts[i]` 与 `detections[i]` 配对
  pub fn read_texts<S: AsRef<str>>(
    &self,
    detections: &[BoundingBox],
    texts: &[S],
  ) -> Vec<VinCandidate> {
    texts
      .iter()
      .enumerate()
      .map(|(text_index, text)| VinCandidate {
        text_index,
        bbox: detections.get(text_index).copied(),
        result: self.validator.validate(text.as_ref()),
      })
      .collect()
  }
}

impl Model for VinScanner {
  type Input = ScanFrame;
  type Output = ScanResult;
  type Error = DecodeError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let detections = self.detect(&input.tensor, input.width, input.height)?;
    let candidates = self.read_texts(&detections, &input.texts);

    debug!(
      "检测到 {} 个区域, 校验 {} 条文本",
      detections.len(),
      candidates.len()
    );

    Ok(ScanResult {
      detections,
      candidates,
    })
  }
}

#[derive(Debug, Clone)]
pub struct VinScannerBuilder {
  model_size: u32,
  confidence_floor: f32,
  confidence_threshold: f32,
  iou_threshold: f32,
  max_detections: Option<usize>,
  normalized_coordinates: bool,
  validator: VinValidator,
}

impl Default for VinScannerBuilder {
  fn default() -> Self {
    Self {
      model_size: DEFAULT_MODEL_SIZE,
      confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
      confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      iou_threshold: DEFAULT_IOU_THRESHOLD,
      max_detections: None,
      normalized_coordinates: false,
      validator: VinValidator::default(),
    }
  }
}

impl FromUrlWithScheme for VinScannerBuilder {
  const SCHEME: &'static str = "yolo";
}

impl FromUrl for VinScannerBuilder {
  type Error = DetectionBuilderError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(DetectionBuilderError::SchemeMismatch(Self::SCHEME));
    }

    let defaults = Self::default();
    let max: usize = query_param(url, "max", 0).map_err(DetectionBuilderError::InvalidParameter)?;

    Ok(Self {
      model_size: query_param(url, "size", defaults.model_size)
        .map_err(DetectionBuilderError::InvalidParameter)?,
      confidence_floor: query_param(url, "floor", defaults.confidence_floor)
        .map_err(DetectionBuilderError::InvalidParameter)?,
      confidence_threshold: query_param(url, "conf", defaults.confidence_threshold)
        .map_err(DetectionBuilderError::InvalidParameter)?,
      iou_threshold: query_param(url, "iou", defaults.iou_threshold)
        .map_err(DetectionBuilderError::InvalidParameter)?,
      max_detections: (max > 0).then_some(max),
      normalized_coordinates: query_param(url, "normalized", defaults.normalized_coordinates)
        .map_err(DetectionBuilderError::InvalidParameter)?,
      validator: defaults.validator,
    })
  }
}

impl VinScannerBuilder {
  pub fn model_size(mut self, model_size: u32) -> Self {
    self.model_size = model_size;
    self
  }

  pub fn confidence_floor(mut self, floor: f32) -> Self {
    self.confidence_floor = floor;
    self
  }

  pub fn confidence_threshold(mut self, threshold: f32) -> Self {
    self.confidence_threshold = threshold;
    self
  }

  pub fn iou_threshold(mut self, threshold: f32) -> Self {
    self.iou_threshold = threshold;
    self
  }

  pub fn max_detections(mut self, max_detections: Option<usize>) -> Self {
    self.max_detections = max_detections;
    self
  }

  pub fn normalized_coordinates(mut self, normalized: bool) -> Self {
    self.normalized_coordinates = normalized;
    self
  }

  pub fn validator(mut self, validator: VinValidator) -> Self {
    self.validator = validator;
    self
  }

  pub fn build(self) -> Result<VinScanner, DetectionBuilderError> {
    if self.model_size == 0 {
      return Err(DetectionBuilderError::InvalidParameter(
        "模型输入尺寸不能为 0".to_string(),
      ));
    }

    for (name, value) in [
      ("floor", self.confidence_floor),
      ("conf", self.confidence_threshold),
      ("iou", self.iou_threshold),
    ] {
      if !(0.0..=1.0).contains(&value) {
        return Err(DetectionBuilderError::InvalidParameter(format!(
          "{} 必须在 [0, 1] 范围内, 实际为 {}",
          name, value
        )));
      }
    }

    info!(
      "检测参数: 输入尺寸 {}, 置信度 {} (下限 {}), IoU {}, 最大检测数 {:?}",
      self.model_size,
      self.confidence_threshold,
      self.confidence_floor,
      self.iou_threshold,
      self.max_detections
    );

    let decoder = DetectionDecoder::new(self.model_size)
      .with_confidence_floor(self.confidence_floor)
      .with_normalized_coordinates(self.normalized_coordinates);
    let suppressor =
      NonMaxSuppressor::new(self.iou_threshold).with_max_detections(self.max_detections);

    Ok(VinScanner {
      decoder,
      suppressor,
      confidence_threshold: self.confidence_threshold,
      validator: self.validator,
    })
  }
}
