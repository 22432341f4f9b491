// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// src/model/nms.rs - 非极大值抑制
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

use tracing::debug;

use crate::model::BoundingBox;

#[derive(Debug, Clone, Copy)]
pub struct NonMaxSuppressor {
  iou_threshold: f32,
  max_detections: Option<usize>,
}

impl NonMaxSuppressor {
  pub fn new(iou_threshold: f32) -> Self {
    Self {
      iou_threshold,
      max_detections: None,
    }
  }

  pub fn with_max_detections(mut self, max_detections: Option<usize>) -> Self {
    self.max_detections = max_detections;
    self
  }

  pub fn iou_threshold(&self) -> f32 {
    self.iou_threshold
  }

  /// 贪心抑制，结果按选中顺序（置信度降序）排列
  pub fn suppress(&self, mut boxes: Vec<BoundingBox>) -> Vec<BoundingBox> {
    // 稳定排序，置信度相同的框保持输入顺序
    boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let limit = self.max_detections.unwrap_or(usize::MAX);
    let mut suppressed = vec![false; boxes.len()];
    let mut keep = Vec::new();

    for i in 0..boxes.len() {
      if keep.len() >= limit {
        break;
      }
      if suppressed[i] {
        continue;
      }

      let best = boxes[i];
      keep.push(best);

      for j in (i + 1)..boxes.len() {
        if !suppressed[j] && best.iou(&boxes[j]) > self.iou_threshold {
          suppressed[j] = true;
        }
      }
    }

    debug!("NMS: {} 个候选框保留 {} 个", boxes.len(), keep.len());
    keep
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn bbox(left: f32, top: f32, right: f32, bottom: f32, confidence: f32) -> BoundingBox {
    BoundingBox {
      left,
      top,
      right,
      bottom,
      confidence,
    }
  }

  #[test]
  fn overlapping_lower_confidence_box_is_dropped() {
    let a = bbox(0.1, 0.1, 0.5, 0.5, 0.9);
    let b = bbox(0.12, 0.12, 0.52, 0.52, 0.6);

    let kept = NonMaxSuppressor::new(0.45).suppress(vec![b, a]);
    assert_eq!(kept, vec![a]);
  }

  #[test]
  fn disjoint_boxes_are_kept_in_confidence_order() {
    let a = bbox(0.0, 0.0, 0.2, 0.2, 0.5);
    let b = bbox(0.5, 0.5, 0.7, 0.7, 0.8);
    let c = bbox(0.3, 0.0, 0.4, 0.1, 0.7);

    let kept = NonMaxSuppressor::new(0.45).suppress(vec![a, b, c]);
    assert_eq!(kept, vec![b, c, a]);
  }

  #[test]
  fn equal_confidence_keeps_input_order() {
    let a = bbox(0.1, 0.1, 0.5, 0.5, 0.7);
    let b = bbox(0.11, 0.11, 0.51, 0.51, 0.7);

    assert_eq!(NonMaxSuppressor::new(0.45).suppress(vec![a, b]), vec![a]);
    assert_eq!(NonMaxSuppressor::new(0.45).suppress(vec![b, a]), vec![b]);
  }

  #[test]
  fn suppressed_box_does_not_suppress_others() {
    // b 被 a 抑制，c 只与 b 重叠，应当保留
    let a = bbox(0.0, 0.0, 0.4, 0.4, 0.9);
    let b = bbox(0.1, 0.0, 0.5, 0.4, 0.8);
    let c = bbox(0.35, 0.0, 0.75, 0.4, 0.7);

    let kept = NonMaxSuppressor::new(0.45).suppress(vec![a, b, c]);
    assert_eq!(kept, vec![a, c]);
  }

  #[test]
  fn max_detections_caps_the_result() {
    let boxes: Vec<BoundingBox> = (0..5)
      .map(|i| {
        let x = i as f32 * 0.2;
        bbox(x, 0.0, x + 0.1, 0.1, 0.5 + i as f32 * 0.1)
      })
      .collect();

    let kept = NonMaxSuppressor::new(0.45)
      .with_max_detections(Some(2))
      .suppress(boxes.clone());
    assert_eq!(kept, vec![boxes[4], boxes[3]]);
  }

  #[test]
  fn empty_input_yields_empty_output() {
    assert!(NonMaxSuppressor::new(0.45).suppress(vec![]).is_empty());
  }
}
